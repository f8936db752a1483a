#![allow(dead_code)]

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use cookiegate::{
    config::GateConfig,
    create_app,
    jwt::{JwtConfig, Role, unix_now},
};
use tower::ServiceExt;
use url::Url;
use wiremock::MockServer;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-integration-tests";

pub fn jwt() -> JwtConfig {
    JwtConfig::new(TEST_SECRET)
}

pub fn test_config(auth_service_url: &str) -> GateConfig {
    GateConfig::new(
        TEST_SECRET,
        Url::parse(auth_service_url).expect("Invalid URL"),
        false,
    )
}

/// Create a test app whose Auth Service is the given mock server.
pub fn create_test_app(server: &MockServer) -> Router {
    create_app(&test_config(&server.uri())).expect("Failed to create app")
}

/// Create a test app with a short Auth Service timeout.
pub fn create_test_app_with_timeout(server: &MockServer, timeout: Duration) -> Router {
    let mut config = test_config(&server.uri());
    config.auth_service_timeout = timeout;
    create_app(&config).expect("Failed to create app")
}

/// URL on localhost where nothing is listening.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let port = listener.local_addr().expect("No local address").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

pub fn access_token(subject: &str, role: Role) -> String {
    jwt().issue_access(subject, role).unwrap().token
}

/// Access token that expired an hour ago.
pub fn expired_access_token(subject: &str, role: Role) -> String {
    jwt()
        .issue_access_at(subject, role, unix_now() - 2 * 60 * 60)
        .unwrap()
        .token
}

pub fn refresh_token(subject: &str) -> String {
    jwt().issue_refresh(subject).unwrap().token
}

pub fn cookie_header(access: Option<&str>, refresh: Option<&str>) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(access) = access {
        parts.push(format!("token={}", access));
    }
    if let Some(refresh) = refresh {
        parts.push(format!("refresh_token={}", refresh));
    }
    (!parts.is_empty()).then(|| parts.join("; "))
}

pub async fn send(
    app: Router,
    method: &str,
    path: &str,
    cookies: Option<String>,
    json_body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(cookies) = cookies {
        builder = builder.header(header::COOKIE, cookies);
    }
    let body = match json_body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, path: &str, cookies: Option<String>) -> Response<Body> {
    send(app, "GET", path, cookies, None).await
}

pub async fn post_json(
    app: Router,
    path: &str,
    cookies: Option<String>,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, "POST", path, cookies, Some(body)).await
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract Set-Cookie headers from response
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Value of the named cookie among Set-Cookie headers.
pub fn set_cookie_value(cookies: &[String], name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    cookies
        .iter()
        .find(|c| c.starts_with(&prefix))
        .and_then(|c| c[prefix.len()..].split(';').next())
        .map(|s| s.to_string())
}

pub async fn body_string(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
