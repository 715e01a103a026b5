//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ApiConfig;
use crate::config::validation::{validate_config, ConfigIssue};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    Env { key: &'static str, reason: String },

    #[error("Validation failed: {}", join_issues(.0))]
    Validation(Vec<ConfigIssue>),
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration.
///
/// The TOML file is optional; environment variables are applied on top of
/// whatever it (or the defaults) provide.
pub fn load_config(path: Option<&Path>) -> Result<ApiConfig, ConfigError> {
    let config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => ApiConfig::default(),
    };

    let config = apply_env_overrides(config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML document into a config without validating it.
pub fn parse_config(content: &str) -> Result<ApiConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Overlay recognised environment variables onto `config`.
///
/// `lookup` abstracts `std::env::var` so the mapping can be exercised
/// without touching process state.
pub fn apply_env_overrides<F>(mut config: ApiConfig, lookup: F) -> Result<ApiConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(env) = lookup("APP_ENV") {
        config.server.environment = env
            .parse()
            .map_err(|reason| ConfigError::Env { key: "APP_ENV", reason })?;
    }
    if let Some(host) = lookup("HOST") {
        config.server.host = host;
    }
    if let Some(port) = lookup("PORT") {
        config.server.port = parse_number("PORT", &port)?;
    }
    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    match lookup("LOG_FORMAT") {
        Some(format) => config.observability.log_format = format,
        None if config.server.environment.is_production() => {
            config.observability.log_format = "json".to_string();
        }
        None => {}
    }
    if let Some(origins) = lookup("CORS_ORIGIN") {
        config.security.cors_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(max) = lookup("RATE_LIMIT_MAX") {
        config.rate_limit.max_requests = parse_number("RATE_LIMIT_MAX", &max)?;
    }
    if let Some(window) = lookup("RATE_LIMIT_WINDOW_SECS") {
        config.rate_limit.window_secs = parse_number("RATE_LIMIT_WINDOW_SECS", &window)?;
    }
    if let Some(timeout) = lookup("REQUEST_TIMEOUT_SECS") {
        config.timeouts.request_secs = parse_number("REQUEST_TIMEOUT_SECS", &timeout)?;
    }
    if let Some(size) = lookup("MAX_BODY_SIZE") {
        config.security.max_body_size = parse_number("MAX_BODY_SIZE", &size)?;
    }

    Ok(config)
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Env {
        key,
        reason: format!("'{raw}' is not a valid number"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Environment;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = parse_config(
            r#"
            [server]
            port = 8081
            environment = "production"

            [rate_limit]
            max_requests = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.environment, Environment::Production);
        assert_eq!(config.rate_limit.max_requests, 5);
        // Untouched sections keep their defaults
        assert_eq!(config.rate_limit.window_secs, 900);
        assert_eq!(config.timeouts.request_secs, 30);
    }

    #[test]
    fn test_env_overrides() {
        let config = apply_env_overrides(
            ApiConfig::default(),
            env(&[
                ("APP_ENV", "test"),
                ("PORT", "4000"),
                ("CORS_ORIGIN", "http://a.example, http://b.example"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.environment, Environment::Test);
        assert_eq!(config.server.port, 4000);
        assert_eq!(
            config.security.cors_origins,
            vec!["http://a.example", "http://b.example"]
        );
    }

    #[test]
    fn test_production_defaults_to_json_logs() {
        let config = apply_env_overrides(ApiConfig::default(), env(&[("APP_ENV", "production")])).unwrap();
        assert_eq!(config.observability.log_format, "json");

        let config = apply_env_overrides(
            ApiConfig::default(),
            env(&[("APP_ENV", "prod"), ("LOG_FORMAT", "pretty")]),
        )
        .unwrap();
        assert_eq!(config.observability.log_format, "pretty");
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        let err = apply_env_overrides(ApiConfig::default(), env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: "PORT", .. }));

        let err = apply_env_overrides(ApiConfig::default(), env(&[("APP_ENV", "staging")])).unwrap_err();
        assert!(err.to_string().contains("APP_ENV"));
    }
}
