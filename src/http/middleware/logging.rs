//! Request/response logging.
//!
//! Emits one event when a request arrives and one when its response leaves,
//! at a level chosen by the final status, and records request metrics.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::http::request::RequestIdExt;
use crate::observability::metrics;

pub async fn log_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let request_id = request.request_id().to_owned();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_owned();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        user_agent = %user_agent,
        "Incoming request"
    );

    let response = next.run(request).await;
    let status = response.status();
    let latency_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(request_id = %request_id, method = %method, path = %path, status = status.as_u16(), latency_ms, "Server error response");
    } else if status.is_client_error() {
        tracing::warn!(request_id = %request_id, method = %method, path = %path, status = status.as_u16(), latency_ms, "Client error response");
    } else {
        tracing::info!(request_id = %request_id, method = %method, path = %path, status = status.as_u16(), latency_ms, "Request completed");
    }

    metrics::record_request(method.as_str(), status.as_u16(), &route, start);
    response
}
