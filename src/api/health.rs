//! Liveness, readiness, process status and service info.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::http::response::ApiResponse;
use crate::http::server::AppState;

const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Seconds since the state was created.
    pub uptime: f64,
    pub environment: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub ready: bool,
    pub users: usize,
    pub products: usize,
}

/// Identity of the running process.
#[derive(Debug, Serialize)]
pub struct ProcessStatus {
    pub service: &'static str,
    pub version: &'static str,
    pub platform: &'static str,
    pub arch: &'static str,
    pub pid: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/health", get(health))
        .route("/api/ready", get(ready))
        .route("/api/status", get(status))
        .route("/api", get(info))
}

fn health_status(state: &AppState) -> HealthStatus {
    HealthStatus {
        status: "healthy",
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs_f64(),
        environment: state.environment.as_str(),
        service: SERVICE_NAME,
        version: VERSION,
    }
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-store, no-cache, must-revalidate")],
        ApiResponse::ok(health_status(&state), "Service is healthy"),
    )
}

async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let readiness = Readiness {
        ready: true,
        users: state.users.count(),
        products: state.products.count(),
    };
    (
        [(header::CACHE_CONTROL, "no-store, no-cache, must-revalidate")],
        ApiResponse::ok(readiness, "Service is ready"),
    )
}

async fn status() -> ApiResponse<ProcessStatus> {
    tracing::info!("Status check performed");
    ApiResponse::ok(
        ProcessStatus {
            service: SERVICE_NAME,
            version: VERSION,
            platform: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            pid: std::process::id(),
            timestamp: Utc::now(),
        },
        "Status retrieved successfully",
    )
}

async fn info() -> ApiResponse<ApiInfo> {
    ApiResponse::ok(
        ApiInfo {
            name: SERVICE_NAME,
            version: VERSION,
            endpoints: vec![
                "GET /health",
                "GET /api/health",
                "GET /api/ready",
                "GET /api/status",
                "GET /api/users",
                "POST /api/users",
                "GET /api/users/{id}",
                "PUT /api/users/{id}",
                "PATCH /api/users/{id}",
                "DELETE /api/users/{id}",
                "GET /api/products",
                "POST /api/products",
                "GET /api/products/in-stock",
                "GET /api/products/category/{category}",
                "GET /api/products/{id}",
                "PUT /api/products/{id}",
                "PATCH /api/products/{id}",
                "PATCH /api/products/{id}/stock",
                "DELETE /api/products/{id}",
            ],
        },
        "Catalog API",
    )
}
