//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits ordered)
//! - Check quorum against the configured node list
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - A quorum below a strict majority is allowed; it is an operational choice

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.validation.max_length == 0 {
        errors.push(ValidationError::new("validation.max_length", "must be at least 1"));
    }

    let cache = &config.cache;
    if cache.nodes.is_empty() {
        errors.push(ValidationError::new("cache.nodes", "at least one node is required"));
    }

    let mut seen = HashSet::new();
    for node in &cache.nodes {
        if node.trim().is_empty() {
            errors.push(ValidationError::new("cache.nodes", "node address must not be blank"));
        } else if !seen.insert(node.as_str()) {
            errors.push(ValidationError::new(
                "cache.nodes",
                format!("duplicate node '{}'", node),
            ));
        }
    }

    if cache.quorum == 0 {
        errors.push(ValidationError::new("cache.quorum", "must be at least 1"));
    } else if cache.quorum > cache.nodes.len() {
        errors.push(ValidationError::new(
            "cache.quorum",
            format!(
                "quorum {} exceeds the {} configured nodes",
                cache.quorum,
                cache.nodes.len()
            ),
        ));
    }

    if cache.connect_timeout_ms == 0 {
        errors.push(ValidationError::new("cache.connect_timeout_ms", "must be greater than 0"));
    }
    if cache.ping_timeout_ms == 0 {
        errors.push(ValidationError::new("cache.ping_timeout_ms", "must be greater than 0"));
    }

    if config.health_check.monitor_enabled && config.health_check.interval_secs == 0 {
        errors.push(ValidationError::new("health_check.interval_secs", "must be greater than 0"));
    }

    let stats = &config.stats;
    if stats.history_limit == 0 {
        errors.push(ValidationError::new("stats.history_limit", "must be at least 1"));
    }
    if stats.recent_limit == 0 || stats.recent_limit > stats.history_limit {
        errors.push(ValidationError::new(
            "stats.recent_limit",
            format!("must be between 1 and history_limit ({})", stats.history_limit),
        ));
    }
    if stats.queue_capacity == 0 {
        errors.push(ValidationError::new("stats.queue_capacity", "must be at least 1"));
    }
    if stats.write_timeout_ms == 0 {
        errors.push(ValidationError::new("stats.write_timeout_ms", "must be greater than 0"));
    }
    if stats.read_timeout_ms == 0 {
        errors.push(ValidationError::new("stats.read_timeout_ms", "must be greater than 0"));
    }
    if stats.drain_timeout_ms == 0 {
        errors.push(ValidationError::new("stats.drain_timeout_ms", "must be greater than 0"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
