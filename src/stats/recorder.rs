//! Validation statistics stored in the cache.
//!
//! Best effort throughout: a failed write is logged and dropped, a failed
//! read yields an empty snapshot carrying an error message.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time;

use crate::cache::{CacheError, CacheHandle};
use crate::config::StatsConfig;
use crate::observability::metrics;

pub const VALID_COUNT_KEY: &str = "stats:valid";
pub const INVALID_COUNT_KEY: &str = "stats:invalid";
pub const HISTORY_KEY: &str = "stats:history";

/// Why recording failed.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("failed to encode history entry: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("stats write timed out after {0:?}")]
    Timeout(Duration),
}

/// One history record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsEntry {
    pub string: String,
    pub valid: bool,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

/// Counters and recent history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub valid_count: u64,
    pub invalid_count: u64,
    /// Newest first.
    pub recent_history: Vec<StatsEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatsSnapshot {
    fn unavailable() -> Self {
        Self {
            error: Some("Statistics unavailable: cache unreachable".to_string()),
            ..Self::default()
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn parse_counter(value: Option<String>) -> u64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

/// Records validation outcomes as counters plus a bounded history list.
pub struct StatsRecorder {
    cache: Arc<CacheHandle>,
    history_limit: usize,
    recent_limit: usize,
    write_timeout: Duration,
    read_timeout: Duration,
}

impl StatsRecorder {
    pub fn new(cache: Arc<CacheHandle>, config: &StatsConfig) -> Self {
        Self {
            cache,
            history_limit: config.history_limit,
            recent_limit: config.recent_limit,
            write_timeout: config.write_timeout(),
            read_timeout: config.read_timeout(),
        }
    }

    /// Record one outcome. Never fails.
    pub async fn record(&self, input: &str, is_valid: bool) {
        let outcome = match time::timeout(self.write_timeout, self.try_record(input, is_valid)).await {
            Ok(result) => result,
            Err(_) => Err(StatsError::Timeout(self.write_timeout)),
        };

        match outcome {
            Ok(()) => metrics::record_stats_event("recorded"),
            Err(e) => {
                tracing::warn!(error = %e, valid = is_valid, "Failed to record validation stats");
                metrics::record_stats_event("failed");
            }
        }
    }

    /// Increment the counter, push the entry, then trim the history.
    pub async fn try_record(&self, input: &str, is_valid: bool) -> Result<(), StatsError> {
        let cache = self.cache.get().await?;

        let key = if is_valid { VALID_COUNT_KEY } else { INVALID_COUNT_KEY };
        cache.incr(key).await?;

        let entry = serde_json::to_string(&StatsEntry {
            string: input.to_string(),
            valid: is_valid,
            timestamp: unix_now(),
        })?;

        cache.lpush(HISTORY_KEY, entry).await?;
        cache.ltrim(HISTORY_KEY, 0, self.history_limit as isize - 1).await?;
        Ok(())
    }

    /// Read counters and the most recent entries.
    pub async fn get_stats(&self) -> StatsSnapshot {
        let outcome = match time::timeout(self.read_timeout, self.try_get_stats()).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.read_timeout)),
        };

        match outcome {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read validation stats");
                StatsSnapshot::unavailable()
            }
        }
    }

    async fn try_get_stats(&self) -> Result<StatsSnapshot, CacheError> {
        let cache = self.cache.get().await?;

        let valid_count = parse_counter(cache.get(VALID_COUNT_KEY).await?);
        let invalid_count = parse_counter(cache.get(INVALID_COUNT_KEY).await?);

        let raw = cache.lrange(HISTORY_KEY, 0, self.recent_limit as isize - 1).await?;
        let recent_history = raw
            .iter()
            .filter_map(|item| match serde_json::from_str::<StatsEntry>(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping malformed history entry");
                    None
                }
            })
            .collect();

        Ok(StatsSnapshot {
            valid_count,
            invalid_count,
            recent_history,
            error: None,
        })
    }
}
