use mock_server::MockCredentials;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let defaults = MockCredentials::default();
    let credentials = MockCredentials {
        app_id: std::env::var("MOCK_APP_ID").unwrap_or(defaults.app_id),
        app_secret: std::env::var("MOCK_APP_SECRET").unwrap_or(defaults.app_secret),
    };
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("listening on {addr}");
    mock_server::run(listener, credentials).await
}
