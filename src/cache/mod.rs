//! Replicated cache collaborator.
//!
//! # Data Flow
//! ```text
//! health / stats
//!     → CacheHandle::get (lazy connect through a CacheConnector)
//!     → dyn ClusterCache (redis_cluster.rs or memory.rs)
//! ```
//!
//! # Design Decisions
//! - The core depends only on the primitive operations of `ClusterCache`
//! - Failing to build a client is a distinct error from a failed command
//! - A failed connection attempt is retried on the next `get`

pub mod memory;
pub mod redis_cluster;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::{CacheBackend, CacheConfig};

pub use self::memory::InMemoryCache;
pub use self::redis_cluster::RedisClusterCache;

/// Errors raised by cache operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// The cluster client could not be constructed.
    #[error("failed to connect to cache cluster: {0}")]
    Connect(String),

    /// A command reached the cluster and failed.
    #[error("cache command failed: {0}")]
    Command(String),

    /// The node is not part of the configured cluster.
    #[error("unknown cache node '{0}'")]
    UnknownNode(String),

    /// The node did not answer.
    #[error("cache node '{0}' is unreachable")]
    Unreachable(String),

    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Raw reply to a node ping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingReply {
    Integer(i64),
    Status(String),
    Other(String),
}

/// Primitive operations the service needs from the cache.
///
/// Index arguments follow Redis list semantics: negative values count from
/// the tail and `stop` is inclusive.
#[async_trait]
pub trait ClusterCache: Send + Sync {
    /// Ping a single node of the cluster.
    async fn ping(&self, node: &str) -> Result<PingReply, CacheError>;

    /// Atomically increment an integer counter, returning the new value.
    async fn incr(&self, key: &str) -> Result<i64, CacheError>;

    /// Push a value onto the head of a list.
    async fn lpush(&self, key: &str, value: String) -> Result<(), CacheError>;

    /// Trim a list to the inclusive range `[start, stop]`.
    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), CacheError>;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, CacheError>;
}

/// Builds a cache client.
#[async_trait]
pub trait CacheConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn ClusterCache>, CacheError>;
}

/// Connector driven by [`CacheConfig`].
pub struct ConfigConnector {
    config: CacheConfig,
}

impl ConfigConnector {
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CacheConnector for ConfigConnector {
    async fn connect(&self) -> Result<Arc<dyn ClusterCache>, CacheError> {
        match self.config.backend {
            CacheBackend::Redis => {
                let cache = RedisClusterCache::connect(&self.config).await?;
                Ok(Arc::new(cache))
            }
            CacheBackend::Memory => Ok(Arc::new(InMemoryCache::with_nodes(&self.config.nodes))),
        }
    }
}

/// Lazily connected, shared cache client.
pub struct CacheHandle {
    connector: Box<dyn CacheConnector>,
    cache: OnceCell<Arc<dyn ClusterCache>>,
}

impl CacheHandle {
    /// Connect on first use.
    pub fn lazy(connector: impl CacheConnector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            cache: OnceCell::new(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::lazy(ConfigConnector::new(config.clone()))
    }

    /// Wrap an already connected client.
    pub fn ready(cache: Arc<dyn ClusterCache>) -> Self {
        Self {
            connector: Box::new(ReadyConnector(cache.clone())),
            cache: OnceCell::new_with(Some(cache)),
        }
    }

    /// Get the client, connecting if needed.
    pub async fn get(&self) -> Result<Arc<dyn ClusterCache>, CacheError> {
        let cache = self
            .cache
            .get_or_try_init(|| async {
                tracing::debug!("Connecting to cache cluster");
                let cache = self.connector.connect().await;
                if let Err(e) = &cache {
                    tracing::error!(error = %e, "Cache cluster connection failed");
                }
                cache
            })
            .await?;
        Ok(cache.clone())
    }
}

struct ReadyConnector(Arc<dyn ClusterCache>);

#[async_trait]
impl CacheConnector for ReadyConnector {
    async fn connect(&self) -> Result<Arc<dyn ClusterCache>, CacheError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyConnector {
        attempts: Arc<AtomicUsize>,
        fail_first: usize,
    }

    #[async_trait]
    impl CacheConnector for FlakyConnector {
        async fn connect(&self) -> Result<Arc<dyn ClusterCache>, CacheError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_first {
                Err(CacheError::Connect("cluster down".into()))
            } else {
                Ok(Arc::new(InMemoryCache::with_nodes(&["n1:6379".to_string()])))
            }
        }
    }

    #[tokio::test]
    async fn test_failed_connect_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let handle = CacheHandle::lazy(FlakyConnector {
            attempts: attempts.clone(),
            fail_first: 1,
        });

        assert!(matches!(handle.get().await, Err(CacheError::Connect(_))));
        assert!(handle.get().await.is_ok());
        assert!(handle.get().await.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_memory_backend_from_config() {
        let config = CacheConfig {
            backend: CacheBackend::Memory,
            nodes: vec!["a:1".into(), "b:2".into()],
            ..CacheConfig::default()
        };
        let handle = CacheHandle::from_config(&config);
        let cache = handle.get().await.unwrap();
        assert_eq!(cache.ping("a:1").await.unwrap(), PingReply::Status("PONG".into()));
    }
}
