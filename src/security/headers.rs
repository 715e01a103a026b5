//! Security response headers and CORS.
//!
//! # Responsibilities
//! - Add hardening headers to every response
//! - Answer CORS preflight requests for the configured origins
//!
//! # Design Decisions
//! - Headers overwrite anything a handler set
//! - Credentials are only allowed with an explicit origin list

use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::SecurityConfig;
use crate::http::request::X_REQUEST_ID;

const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("strict-transport-security", "max-age=31536000; includeSubDomains"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    (
        "content-security-policy",
        "default-src 'self'; object-src 'none'; frame-src 'none'",
    ),
];

/// Wrap `router` with the security headers (when enabled) and CORS.
pub fn apply(router: Router, config: &SecurityConfig) -> Router {
    let router = if config.enable_headers {
        SECURITY_HEADERS.iter().fold(router, |router, &(name, value)| {
            router.layer(SetResponseHeaderLayer::overriding(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            ))
        })
    } else {
        router
    };
    router.layer(cors_layer(config))
}

pub fn cors_layer(config: &SecurityConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers([HeaderName::from_static(X_REQUEST_ID)])
        .max_age(Duration::from_secs(24 * 60 * 60));

    if config.cors_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(origins).allow_credentials(true)
}
