//! Redis cluster adapter.
//!
//! Data commands are routed through a cluster connection. Pings go to the
//! addressed node over its own connection so that one node's answer says
//! nothing about the others. Node connections are opened on first use and
//! reused until a ping on them fails.

use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::MultiplexedConnection;
use redis::cluster::ClusterClient;
use redis::cluster_async::ClusterConnection;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time;

use crate::cache::{CacheError, ClusterCache, PingReply};
use crate::config::CacheConfig;

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        CacheError::Command(e.to_string())
    }
}

/// [`ClusterCache`] backed by a Redis cluster.
pub struct RedisClusterCache {
    cluster: ClusterConnection,
    nodes: NodeConnections,
}

/// Per-node clients plus the live connection for each, if any.
struct NodeConnections {
    clients: HashMap<String, redis::Client>,
    live: DashMap<String, MultiplexedConnection>,
    connect_timeout: Duration,
}

impl NodeConnections {
    fn new(nodes: &[String], connect_timeout: Duration) -> Result<Self, CacheError> {
        let mut clients = HashMap::with_capacity(nodes.len());
        for node in nodes {
            let client = redis::Client::open(node_url(node).as_str())
                .map_err(|e| CacheError::Connect(format!("invalid node '{}': {}", node, e)))?;
            clients.insert(node.clone(), client);
        }
        Ok(Self {
            clients,
            live: DashMap::new(),
            connect_timeout,
        })
    }

    /// The cached connection for `node`, or a fresh one.
    async fn get(&self, node: &str) -> Result<MultiplexedConnection, CacheError> {
        if let Some(conn) = self.live.get(node) {
            return Ok(conn.value().clone());
        }

        let client = self
            .clients
            .get(node)
            .ok_or_else(|| CacheError::UnknownNode(node.to_string()))?;

        let conn = match time::timeout(self.connect_timeout, client.get_multiplexed_async_connection()).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                tracing::debug!(node = %node, error = %e, "Node connection failed");
                return Err(CacheError::Unreachable(node.to_string()));
            }
            Err(_) => return Err(CacheError::Timeout(self.connect_timeout)),
        };

        self.live.insert(node.to_string(), conn.clone());
        Ok(conn)
    }

    fn evict(&self, node: &str) {
        if self.live.remove(node).is_some() {
            tracing::debug!(node = %node, "Dropped node connection");
        }
    }
}

/// Turn `host:port` into a connection URL; full URLs pass through.
fn node_url(node: &str) -> String {
    if node.contains("://") {
        node.to_string()
    } else {
        format!("redis://{}", node)
    }
}

impl RedisClusterCache {
    /// Build the cluster client and open the cluster connection.
    ///
    /// Any failure here is a [`CacheError::Connect`].
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let urls: Vec<String> = config.nodes.iter().map(|n| node_url(n)).collect();
        let connect_timeout = config.connect_timeout();
        let nodes = NodeConnections::new(&config.nodes, connect_timeout)?;

        let client = ClusterClient::new(urls).map_err(|e| CacheError::Connect(e.to_string()))?;
        let cluster = match time::timeout(connect_timeout, client.get_async_connection()).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => return Err(CacheError::Connect(e.to_string())),
            Err(_) => {
                return Err(CacheError::Connect(format!(
                    "timed out after {:?}",
                    connect_timeout
                )))
            }
        };

        tracing::info!(nodes = config.nodes.len(), "Connected to Redis cluster");

        Ok(Self { cluster, nodes })
    }
}

fn ping_reply(value: redis::Value) -> PingReply {
    if let redis::Value::Int(n) = value {
        return PingReply::Integer(n);
    }
    match redis::from_redis_value::<String>(&value) {
        Ok(s) => PingReply::Status(s),
        Err(_) => PingReply::Other(format!("{:?}", value)),
    }
}

#[async_trait]
impl ClusterCache for RedisClusterCache {
    async fn ping(&self, node: &str) -> Result<PingReply, CacheError> {
        let mut conn = self.nodes.get(node).await?;
        let reply: Result<redis::Value, _> = redis::cmd("PING").query_async(&mut conn).await;
        match reply {
            Ok(reply) => Ok(ping_reply(reply)),
            Err(e) => {
                self.nodes.evict(node);
                Err(e.into())
            }
        }
    }

    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        let mut conn = self.cluster.clone();
        let value: i64 = conn.incr(key, 1).await?;
        Ok(value)
    }

    async fn lpush(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut conn = self.cluster.clone();
        let _: i64 = conn.lpush(key, value).await?;
        Ok(())
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), CacheError> {
        let mut conn = self.cluster.clone();
        let _: () = conn.ltrim(key, start, stop).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.cluster.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, CacheError> {
        let mut conn = self.cluster.clone();
        let values: Vec<String> = conn.lrange(key, start, stop).await?;
        Ok(values)
    }
}
