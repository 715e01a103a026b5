mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::LazyLock;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use catalog_api::config::Environment;
use catalog_api::http::server::apply_layers;
use catalog_api::validation::{FieldRule, RuleSet, Validate, ValidatedJson};
use common::{app_with, error_fields, get as get_path, send, send_json, test_config};
use serde::Deserialize;
use serde_json::json;

static HANDLER_CALLS: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Deserialize)]
struct Restock {
    stock: u32,
}

static RESTOCK_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new().field(
        FieldRule::integer("stock")
            .required("Stock is required")
            .min(0.0, "Stock cannot be negative"),
    )
});

impl Validate for Restock {
    fn rules() -> &'static RuleSet {
        &RESTOCK_RULES
    }
}

async fn restock(ValidatedJson(body): ValidatedJson<Restock>) -> String {
    HANDLER_CALLS.fetch_add(1, Ordering::SeqCst);
    body.stock.to_string()
}

async fn boom() -> &'static str {
    panic!("inventory ledger corrupted")
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(3)).await;
    "finally"
}

fn fault_app(environment: Environment) -> Router {
    let mut config = test_config();
    config.server.environment = environment;
    config.timeouts.request_secs = 1;

    let routes = Router::new()
        .route("/restock", post(restock))
        .route("/boom", get(boom))
        .route("/slow", get(slow));
    apply_layers(routes, &config)
}

#[tokio::test]
async fn test_gate_blocks_handler() {
    let app = fault_app(Environment::Test);

    let rejected = send_json(&app, "POST", "/restock", Some(json!({"stock": -1}))).await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&rejected.body), vec!["stock"]);
    assert_eq!(HANDLER_CALLS.load(Ordering::SeqCst), 0);

    let accepted = send_json(&app, "POST", "/restock", Some(json!({"stock": " 7 "}))).await;
    assert_eq!(accepted.status, StatusCode::OK);
    assert_eq!(accepted.body, json!(7));
    assert_eq!(HANDLER_CALLS.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_panic_becomes_envelope() {
    let dev = send_json(&fault_app(Environment::Development), "GET", "/boom", None).await;
    assert_eq!(dev.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(dev.body["success"], false);
    assert_eq!(dev.body["statusCode"], 500);
    assert_eq!(dev.body["error"], "inventory ledger corrupted");

    let prod = send_json(&fault_app(Environment::Production), "GET", "/boom", None).await;
    assert_eq!(prod.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(prod.body["error"], "Internal server error");
}

#[tokio::test]
async fn test_timeout_becomes_envelope() {
    let response = send_json(&fault_app(Environment::Test), "GET", "/slow", None).await;
    assert_eq!(response.status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(response.body["error"], "Request timeout");
    assert_eq!(response.body["statusCode"], 408);
}

#[tokio::test]
async fn test_rate_limit() {
    let mut config = test_config();
    config.rate_limit.enabled = true;
    config.rate_limit.max_requests = 2;
    let app = app_with(config);

    for _ in 0..2 {
        let ok = get_path(&app, "/api/users").await;
        assert_eq!(ok.status, StatusCode::OK);
        assert!(ok.headers.contains_key("ratelimit-remaining"));
    }

    let limited = get_path(&app, "/api/users").await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["statusCode"], 429);
    assert_eq!(
        limited.body["error"],
        "Too many requests from this IP, please try again later"
    );
    assert_eq!(limited.headers["ratelimit-remaining"], "0");
    assert!(limited.headers.contains_key("retry-after"));

    // Health checks are never limited.
    assert_eq!(get_path(&app, "/health").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_declared_body_too_large() {
    let mut config = test_config();
    config.security.max_body_size = 64;
    let app = app_with(config);

    let payload = json!({"name": "x".repeat(200), "email": "big@x.com"}).to_string();
    let response = send(
        &app,
        Request::post("/api/users")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, payload.len())
            .body(Body::from(payload))
            .unwrap(),
    )
    .await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.body["error"], "Request entity too large");
}
