//! Per-client fixed-window rate limiting.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, MatchedPath, Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::config::RateLimitConfig;
use crate::http::error::ApiError;
use crate::observability::metrics;

/// Paths that are never counted.
const EXEMPT_PATHS: &[&str] = &["/health", "/api/health"];

/// Windows kept before expired ones are swept.
const SWEEP_THRESHOLD: usize = 10_000;

struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32, reset_secs: u64 },
    Limited { reset_secs: u64 },
}

/// State for the rate limiter.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn check(&self, key: &str) -> Decision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Decision {
        let window_len = Duration::from_secs(self.config.window_secs);
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, w| now.duration_since(w.started) < window_len);
        }

        let window = windows.entry(key.to_owned()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= window_len {
            window.started = now;
            window.count = 0;
        }

        let reset_secs = window_len
            .saturating_sub(now.duration_since(window.started))
            .as_secs();

        if window.count >= self.config.max_requests {
            return Decision::Limited { reset_secs };
        }
        window.count += 1;
        Decision::Allowed {
            remaining: self.config.max_requests - window.count,
            reset_secs,
        }
    }

    fn write_headers(&self, headers: &mut HeaderMap, remaining: u32, reset_secs: u64) {
        headers.insert("ratelimit-limit", HeaderValue::from(self.config.max_requests));
        headers.insert("ratelimit-remaining", HeaderValue::from(remaining));
        headers.insert("ratelimit-reset", HeaderValue::from(reset_secs));
    }
}

/// Connection address, then the first `X-Forwarded-For` hop.
pub(crate) fn client_key(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Middleware function for rate limiting.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.config.enabled || EXEMPT_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let key = client_key(&request);
    match limiter.check(&key) {
        Decision::Allowed {
            remaining,
            reset_secs,
        } => {
            let mut response = next.run(request).await;
            limiter.write_headers(response.headers_mut(), remaining, reset_secs);
            response
        }
        Decision::Limited { reset_secs } => {
            let route = request
                .extensions()
                .get::<MatchedPath>()
                .map(|p| p.as_str())
                .unwrap_or("unmatched");
            tracing::warn!(client = %key, route = %route, "Rate limit exceeded");
            metrics::record_rate_limited(route);

            let mut response = ApiError::rejected(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests from this IP, please try again later",
            )
            .into_response();
            limiter.write_headers(response.headers_mut(), 0, reset_secs);
            response
                .headers_mut()
                .insert("retry-after", HeaderValue::from(reset_secs));
            response
        }
    }
}
