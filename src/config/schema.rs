//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the bracket service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Deployment posture.
    pub app: AppConfig,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Bracket validation limits.
    pub validation: ValidationConfig,

    /// Replicated cache cluster.
    pub cache: CacheConfig,

    /// Background health monitoring.
    pub health_check: HealthCheckConfig,

    /// Validation statistics.
    pub stats: StatsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            other => Err(format!(
                "invalid environment '{}', expected one of: development, production",
                other
            )),
        }
    }
}

/// Application posture.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// `development` or `production`.
    pub environment: Environment,

    /// Verbose diagnostics (debug-level logging unless overridden).
    pub debug: bool,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Bracket validation limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Maximum input length in characters, after trimming.
    pub max_length: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { max_length: 30 }
    }
}

/// Which cache implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Redis cluster.
    #[default]
    Redis,
    /// Process-local store, for development.
    Memory,
}

/// Replicated cache cluster configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,

    /// Cluster nodes as `host:port`.
    pub nodes: Vec<String>,

    /// Reachable nodes required to report the cluster as connected.
    /// Not necessarily a majority.
    pub quorum: usize,

    /// Client construction timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Per-node ping timeout in milliseconds.
    pub ping_timeout_ms: u64,
}

impl CacheConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    /// Whether the quorum is a strict majority of the configured nodes.
    pub fn quorum_is_majority(&self) -> bool {
        self.quorum > self.nodes.len() / 2
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            nodes: (1..=10).map(|i| format!("redis-node{}:6379", i)).collect(),
            quorum: 3,
            connect_timeout_ms: 5000,
            ping_timeout_ms: 1000,
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Run the background cluster monitor.
    pub monitor_enabled: bool,

    /// Monitor interval in seconds.
    pub interval_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            monitor_enabled: true,
            interval_secs: 30,
        }
    }
}

/// Validation statistics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Record validation outcomes in the cache.
    pub enabled: bool,

    /// Entries kept in the history list.
    pub history_limit: usize,

    /// Entries returned by a stats query.
    pub recent_limit: usize,

    /// Pending events buffered before new ones are dropped.
    pub queue_capacity: usize,

    /// Budget for one record operation in milliseconds.
    pub write_timeout_ms: u64,

    /// Budget for one stats query in milliseconds.
    pub read_timeout_ms: u64,

    /// Budget for flushing the queue at shutdown in milliseconds.
    pub drain_timeout_ms: u64,
}

impl StatsConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            history_limit: 100,
            recent_limit: 10,
            queue_capacity: 1024,
            write_timeout_ms: 500,
            read_timeout_ms: 1000,
            drain_timeout_ms: 2000,
        }
    }
}

/// Timeout configuration for request handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 16 * 1024,
        }
    }
}
