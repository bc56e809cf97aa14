use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo, MockCredentials, APP_ID_HEADER, APP_SECRET_HEADER};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn authed_request(method: &str, uri: &str, app_id: &str, app_secret: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(APP_ID_HEADER, app_id)
        .header(APP_SECRET_HEADER, app_secret)
        .body(String::new())
        .unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_reports_query_and_app_id() {
    let resp = app(MockCredentials::default())
        .oneshot(authed_request("GET", "/1.0/echo?a=1&b=2", "test-app", "test-secret"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.environment, "production");
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.path, "/1.0/echo");
    assert_eq!(echo.query.as_deref(), Some("a=1&b=2"));
    assert_eq!(echo.app_id.as_deref(), Some("test-app"));
}

#[tokio::test]
async fn echo_reports_form_body() {
    let req = Request::builder()
        .method("POST")
        .uri("/1.0/echo")
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("a=1&b=2".to_string())
        .unwrap();
    let resp = app(MockCredentials::default()).oneshot(req).await.unwrap();

    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.body, "a=1&b=2");
    assert!(echo.query.is_none());
    assert_eq!(echo.content_type.as_deref(), Some("application/x-www-form-urlencoded"));
}

#[tokio::test]
async fn sandbox_echo_names_its_environment() {
    let resp = app(MockCredentials::default())
        .oneshot(Request::builder().uri("/ppe/1.0/echo").body(String::new()).unwrap())
        .await
        .unwrap();

    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.environment, "sandbox");
    assert_eq!(echo.path, "/ppe/1.0/echo");
}

#[tokio::test]
async fn head_echo_has_empty_body() {
    let resp = app(MockCredentials::default())
        .oneshot(Request::builder().method("HEAD").uri("/1.0/echo").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
}

// --- me ---

#[tokio::test]
async fn me_accepts_matching_credentials() {
    let resp = app(MockCredentials::default())
        .oneshot(authed_request("GET", "/1.0/me", "test-app", "test-secret"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["id"], "test-app");
    assert_eq!(body["environment"], "production");
}

#[tokio::test]
async fn me_rejects_wrong_secret_with_envelope() {
    let resp = app(MockCredentials::default())
        .oneshot(authed_request("GET", "/1.0/me", "test-app", "wrong"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"]["code"], 190);
    assert_eq!(body["error"]["type"], "OAuthException");
}

#[tokio::test]
async fn me_rejects_missing_headers() {
    let resp = app(MockCredentials::default())
        .oneshot(Request::builder().uri("/ppe/1.0/me").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_uses_configured_credentials() {
    let creds = MockCredentials {
        app_id: "other".to_string(),
        app_secret: "pw".to_string(),
    };
    let resp = app(creds)
        .oneshot(authed_request("POST", "/1.0/me", "other", "pw"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

// --- canned failures ---

#[tokio::test]
async fn opaque_error_is_a_plain_string() {
    let resp = app(MockCredentials::default())
        .oneshot(Request::builder().uri("/1.0/error/opaque").body(String::new()).unwrap())
        .await
        .unwrap();

    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "oops");
}

#[tokio::test]
async fn malformed_is_not_json() {
    let resp = app(MockCredentials::default())
        .oneshot(Request::builder().uri("/1.0/malformed").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert!(serde_json::from_slice::<Value>(&body).is_err());
}

#[tokio::test]
async fn unknown_route_is_404() {
    let resp = app(MockCredentials::default())
        .oneshot(Request::builder().uri("/2.0/me").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
