//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment variable {var}: {message}")]
    Env { var: &'static str, message: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServiceConfig::default(),
    };

    let config = apply_env_overrides(config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay deployment environment variables on `config`.
///
/// `lookup` resolves a variable name; blank values are ignored.
pub fn apply_env_overrides<F>(mut config: ServiceConfig, lookup: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(value) = get("APP_ENV") {
        config.app.environment = value
            .trim()
            .parse()
            .map_err(|message| ConfigError::Env { var: "APP_ENV", message })?;
    }

    if let Some(value) = get("APP_DEBUG") {
        config.app.debug = parse_bool("APP_DEBUG", &value)?;
    }

    if let Some(value) = get("BIND_ADDRESS") {
        config.listener.bind_address = value.trim().to_string();
    }

    if let Some(value) = get("REDIS_CLUSTER_NODES") {
        config.cache.nodes = value
            .split(',')
            .map(str::trim)
            .filter(|node| !node.is_empty())
            .map(String::from)
            .collect();
    }

    if let Some(value) = get("REDIS_QUORUM") {
        config.cache.quorum = parse_number("REDIS_QUORUM", &value)?;
    }

    if let Some(value) = get("REDIS_TIMEOUT") {
        config.cache.connect_timeout_ms = parse_number::<u64>("REDIS_TIMEOUT", &value)?.saturating_mul(1000);
    }

    if let Some(value) = get("REDIS_PING_TIMEOUT") {
        config.cache.ping_timeout_ms = parse_number::<u64>("REDIS_PING_TIMEOUT", &value)?.saturating_mul(1000);
    }

    if let Some(value) = get("REDIS_CHECK_INTERVAL") {
        config.health_check.interval_secs = parse_number("REDIS_CHECK_INTERVAL", &value)?;
    }

    if let Some(value) = get("LOG_LEVEL") {
        config.observability.log_level = value.trim().to_lowercase();
    }

    Ok(config)
}

fn parse_number<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        message: format!("'{}' is not a valid number: {}", value.trim(), e),
    })
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Env {
            var,
            message: format!("'{}' is not a boolean", other),
        }),
    }
}
