//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Reject unknown log levels and formats
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ApiConfig → Result<(), Vec<ConfigIssue>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ApiConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["pretty", "json"];

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Dotted path of the offending key, e.g. `rate_limit.window_secs`.
    pub key: &'static str,
    pub reason: String,
}

impl ConfigIssue {
    fn new(key: &'static str, reason: impl Into<String>) -> Self {
        Self {
            key,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)
    }
}

/// Check every semantic constraint and report all violations.
pub fn validate_config(config: &ApiConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    if config.server.port == 0 {
        issues.push(ConfigIssue::new("server.port", "must be between 1 and 65535"));
    }
    if config.server.host.trim().is_empty() {
        issues.push(ConfigIssue::new("server.host", "must not be empty"));
    }
    if config.timeouts.request_secs == 0 {
        issues.push(ConfigIssue::new("timeouts.request_secs", "must be greater than zero"));
    }
    if config.rate_limit.enabled {
        if config.rate_limit.window_secs == 0 {
            issues.push(ConfigIssue::new("rate_limit.window_secs", "must be greater than zero"));
        }
        if config.rate_limit.max_requests == 0 {
            issues.push(ConfigIssue::new("rate_limit.max_requests", "must be greater than zero"));
        }
    }
    if config.security.max_body_size == 0 {
        issues.push(ConfigIssue::new("security.max_body_size", "must be greater than zero"));
    }
    if !LOG_LEVELS.contains(&config.observability.log_level.to_ascii_lowercase().as_str()) {
        issues.push(ConfigIssue::new(
            "observability.log_level",
            format!("must be one of: {}", LOG_LEVELS.join(", ")),
        ));
    }
    if !LOG_FORMATS.contains(&config.observability.log_format.to_ascii_lowercase().as_str()) {
        issues.push(ConfigIssue::new(
            "observability.log_format",
            format!("must be one of: {}", LOG_FORMATS.join(", ")),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        issues.push(ConfigIssue::new(
            "observability.metrics_address",
            "must be a socket address like 0.0.0.0:9090",
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
