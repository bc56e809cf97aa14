use std::sync::Arc;

use axum::{
    extract::{OriginalUri, State},
    http::{HeaderMap, Method, StatusCode},
    routing::any,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const APP_ID_HEADER: &str = "x-parllay-app-id";
pub const APP_SECRET_HEADER: &str = "x-parllay-app-secret";

/// The app id / secret pair the server accepts on `/me`.
#[derive(Clone, Debug)]
pub struct MockCredentials {
    pub app_id: String,
    pub app_secret: String,
}

impl Default for MockCredentials {
    fn default() -> Self {
        Self {
            app_id: "test-app".to_string(),
            app_secret: "test-secret".to_string(),
        }
    }
}

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    pub environment: String,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: String,
    pub app_id: Option<String>,
    pub user_agent: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Clone)]
struct Environment {
    name: &'static str,
    credentials: Arc<MockCredentials>,
}

pub fn app(credentials: MockCredentials) -> Router {
    let credentials = Arc::new(credentials);
    Router::new()
        .nest(
            "/1.0",
            api(Environment {
                name: "production",
                credentials: credentials.clone(),
            }),
        )
        .nest(
            "/ppe/1.0",
            api(Environment {
                name: "sandbox",
                credentials,
            }),
        )
}

fn api(environment: Environment) -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/me", any(me))
        .route("/error/opaque", any(opaque_error))
        .route("/malformed", any(malformed))
        .with_state(environment)
}

pub async fn run(listener: TcpListener, credentials: MockCredentials) -> Result<(), std::io::Error> {
    axum::serve(listener, app(credentials)).await
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn echo(
    State(env): State<Environment>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: String,
) -> Json<Echo> {
    Json(Echo {
        environment: env.name.to_string(),
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        body,
        app_id: header(&headers, APP_ID_HEADER),
        user_agent: header(&headers, "user-agent"),
        content_type: header(&headers, "content-type"),
    })
}

async fn me(State(env): State<Environment>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let app_id = header(&headers, APP_ID_HEADER);
    let app_secret = header(&headers, APP_SECRET_HEADER);
    let expected = &env.credentials;

    if app_id.as_deref() == Some(expected.app_id.as_str())
        && app_secret.as_deref() == Some(expected.app_secret.as_str())
    {
        return (
            StatusCode::OK,
            Json(json!({"id": expected.app_id, "environment": env.name})),
        );
    }
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": {
                "code": 190,
                "message": "Invalid app credentials",
                "type": "OAuthException"
            }
        })),
    )
}

async fn opaque_error() -> Json<Value> {
    Json(json!({"error": "oops"}))
}

async fn malformed() -> &'static str {
    "<html>not json</html>"
}
