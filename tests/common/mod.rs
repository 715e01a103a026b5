//! Shared helpers for the integration tests.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use catalog_api::config::{ApiConfig, Environment};
use catalog_api::HttpServer;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

/// Defaults with rate limiting off so tests can send as much as they like.
pub fn test_config() -> ApiConfig {
    let mut config = ApiConfig::default();
    config.server.environment = Environment::Test;
    config.rate_limit.enabled = false;
    config
}

pub fn app() -> Router {
    app_with(test_config())
}

pub fn app_with(config: ApiConfig) -> Router {
    HttpServer::new(config).router()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Send one request through the full middleware stack.
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    TestResponse { status, headers, body }
}

pub async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(app, request).await
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send_json(app, "GET", uri, None).await
}

/// Field names of a validation failure, in order.
pub fn error_fields(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e["field"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}
