//! Cluster health with a quorum rule.
//!
//! # Responsibilities
//! - Ping every configured node concurrently, each with its own timeout
//! - Classify each reply through one success predicate
//! - Compare the reachable count against the configured quorum
//!
//! # Design Decisions
//! - Per-node failures are recorded, never propagated
//! - Failure to obtain a cluster client at all is a separate, fatal error
//! - Nothing is cached between calls

use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

use crate::cache::{CacheError, CacheHandle, ClusterCache, PingReply};
use crate::config::CacheConfig;
use crate::observability::metrics;

/// Fatal health check failure.
#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    /// No cluster client could be formed.
    #[error("cache cluster unavailable: {0}")]
    ClusterUnavailable(#[source] CacheError),
}

/// Aggregate cluster state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterState {
    Connected,
    Disconnected,
}

/// Outcome of pinging one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum NodeHealth {
    /// Answered with an accepted acknowledgement.
    Connected,
    /// Answered with something else.
    Disconnected,
    /// Failed or timed out.
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub node: String,
    #[serde(flatten)]
    pub health: NodeHealth,
}

impl NodeStatus {
    pub fn is_reachable(&self) -> bool {
        self.health == NodeHealth::Connected
    }
}

/// Snapshot of the cluster produced by one health check.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterStatus {
    #[serde(rename = "redis_cluster")]
    pub state: ClusterState,
    pub connected_count: usize,
    pub total_nodes: usize,
    pub required_quorum: usize,
    pub quorum_met: bool,
    pub nodes: Vec<NodeStatus>,
}

impl ClusterStatus {
    /// Apply the quorum rule to per-node results.
    pub fn from_nodes(nodes: Vec<NodeStatus>, required_quorum: usize) -> Self {
        let connected_count = nodes.iter().filter(|n| n.is_reachable()).count();
        let quorum_met = connected_count >= required_quorum;
        Self {
            state: if quorum_met {
                ClusterState::Connected
            } else {
                ClusterState::Disconnected
            },
            connected_count,
            total_nodes: nodes.len(),
            required_quorum,
            quorum_met,
            nodes,
        }
    }
}

/// Whether a ping reply counts as the node being up.
///
/// Accepts the integer `1` and the `PONG` acknowledgement, with or without
/// the RESP status prefix.
pub fn is_success_reply(reply: &PingReply) -> bool {
    match reply {
        PingReply::Integer(n) => *n == 1,
        PingReply::Status(s) => {
            let s = s.trim();
            s == "PONG" || s == "+PONG" || s == "1"
        }
        PingReply::Other(_) => false,
    }
}

/// Pings cache nodes and derives cluster health.
pub struct ClusterHealthChecker {
    cache: Arc<CacheHandle>,
    nodes: Vec<String>,
    quorum: usize,
    ping_timeout: Duration,
}

impl ClusterHealthChecker {
    pub fn new(cache: Arc<CacheHandle>, nodes: Vec<String>, quorum: usize, ping_timeout: Duration) -> Self {
        Self {
            cache,
            nodes,
            quorum,
            ping_timeout,
        }
    }

    pub fn from_config(cache: Arc<CacheHandle>, config: &CacheConfig) -> Self {
        Self::new(cache, config.nodes.clone(), config.quorum, config.ping_timeout())
    }

    pub fn required_quorum(&self) -> usize {
        self.quorum
    }

    /// Check every node and apply the quorum rule.
    pub async fn check(&self) -> Result<ClusterStatus, HealthError> {
        let cache = self.cache.get().await.map_err(HealthError::ClusterUnavailable)?;

        let probes = self.nodes.iter().map(|node| self.probe(cache.as_ref(), node));
        let nodes = join_all(probes).await;

        let status = ClusterStatus::from_nodes(nodes, self.quorum);
        metrics::record_cluster_health(&status);

        tracing::debug!(
            connected = status.connected_count,
            total = status.total_nodes,
            quorum = status.required_quorum,
            state = ?status.state,
            "Cluster health checked"
        );

        Ok(status)
    }

    async fn probe(&self, cache: &dyn ClusterCache, node: &str) -> NodeStatus {
        let health = match time::timeout(self.ping_timeout, cache.ping(node)).await {
            Ok(Ok(reply)) if is_success_reply(&reply) => NodeHealth::Connected,
            Ok(Ok(reply)) => {
                tracing::warn!(node = %node, reply = ?reply, "Unexpected ping reply");
                NodeHealth::Disconnected
            }
            Ok(Err(e)) => {
                tracing::warn!(node = %node, error = %e, "Ping failed");
                NodeHealth::Error { error: e.to_string() }
            }
            Err(_) => {
                tracing::warn!(node = %node, timeout = ?self.ping_timeout, "Ping timed out");
                NodeHealth::Error {
                    error: CacheError::Timeout(self.ping_timeout).to_string(),
                }
            }
        };

        NodeStatus {
            node: node.to_string(),
            health,
        }
    }
}
