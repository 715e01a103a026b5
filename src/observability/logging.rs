//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber from configuration
//! - Redact sensitive fields before request bodies are logged
//!
//! # Design Decisions
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` overrides the configured level

use serde_json::Value;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Keys containing any of these are redacted.
const SENSITIVE_FRAGMENTS: &[&str] = &["password", "token", "secret", "authorization"];
/// Keys equal to one of these (ignoring case) are redacted.
const SENSITIVE_KEYS: &[&str] = &["apikey", "api_key", "creditcard", "credit_card", "cvv", "ssn"];
const REDACTED: &str = "[REDACTED]";

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed (tests, embedding).
pub fn init(config: &ObservabilityConfig) -> bool {
    let level = config.log_level.to_ascii_lowercase();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("catalog_api={level},tower_http={level}")));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.log_format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };
    installed.is_ok()
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_FRAGMENTS.iter().any(|f| key.contains(f)) || SENSITIVE_KEYS.contains(&key.as_str())
}

/// Copy of `value` with sensitive members replaced, at any depth.
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| {
                    let v = if is_sensitive(key) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact(v)
                    };
                    (key.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}
