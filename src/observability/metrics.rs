//! Metrics collection and exposition.
//!
//! # Metrics
//! - `api_requests_total` (counter): requests by method, route, status
//! - `api_request_duration_seconds` (histogram): latency by method, route
//! - `api_rate_limited_total` (counter): requests refused by the rate limiter
//! - `api_validation_failures_total` (counter): gate rejections by route
//! - `api_validation_errors_total` (counter): field errors by route
//!
//! # Design Decisions
//! - Routes are labelled by their matched pattern (`/api/users/{id}`), never
//!   the raw path, to keep label cardinality bounded

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    counter!(
        "api_requests_total",
        "method" => method.to_owned(),
        "route" => route.to_owned(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "api_request_duration_seconds",
        "method" => method.to_owned(),
        "route" => route.to_owned()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(route: &str) {
    counter!("api_rate_limited_total", "route" => route.to_owned()).increment(1);
}

pub fn record_validation_failure(route: &str, field_errors: usize) {
    counter!("api_validation_failures_total", "route" => route.to_owned()).increment(1);
    counter!("api_validation_errors_total", "route" => route.to_owned()).increment(field_errors as u64);
}
