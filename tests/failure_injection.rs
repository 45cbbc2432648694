//! Failure injection tests for the bracket service.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bracket_service::cache::{CacheConnector, CacheError, CacheHandle, ClusterCache, InMemoryCache, PingReply};

mod common;

struct DeadConnector;

#[async_trait]
impl CacheConnector for DeadConnector {
    async fn connect(&self) -> Result<Arc<dyn ClusterCache>, CacheError> {
        Err(CacheError::Connect("connection refused".into()))
    }
}

/// Fails the first `fail_first` attempts, then hands out `cache`.
struct RecoveringConnector {
    attempts: AtomicUsize,
    fail_first: usize,
    cache: Arc<InMemoryCache>,
}

#[async_trait]
impl CacheConnector for RecoveringConnector {
    async fn connect(&self) -> Result<Arc<dyn ClusterCache>, CacheError> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) < self.fail_first {
            return Err(CacheError::Connect("cluster still forming".into()));
        }
        Ok(self.cache.clone())
    }
}

/// Delegates to an in-memory cache but stalls every write.
struct StallingCache {
    inner: Arc<InMemoryCache>,
    stall: Duration,
}

#[async_trait]
impl ClusterCache for StallingCache {
    async fn ping(&self, node: &str) -> Result<PingReply, CacheError> {
        self.inner.ping(node).await
    }
    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        tokio::time::sleep(self.stall).await;
        self.inner.incr(key).await
    }
    async fn lpush(&self, key: &str, value: String) -> Result<(), CacheError> {
        tokio::time::sleep(self.stall).await;
        self.inner.lpush(key, value).await
    }
    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), CacheError> {
        self.inner.ltrim(key, start, stop).await
    }
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.inner.get(key).await
    }
    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, CacheError> {
        self.inner.lrange(key, start, stop).await
    }
}

#[tokio::test]
async fn test_unreachable_cluster_is_503_but_validation_still_works() {
    let config = common::test_config();
    let cache = Arc::new(InMemoryCache::default());
    let server = common::start_server_with_handle(config, Arc::new(CacheHandle::lazy(DeadConnector)), cache).await;

    let res = server.client.cluster_status().await.unwrap();
    assert_eq!(res.http_status, 503);
    assert_eq!(res.error_message(), Some("Cache cluster unavailable"));
    assert!(!res.body.to_string().contains("connection refused"));

    let res = server.client.validate("(())").await.unwrap();
    assert_eq!(res.http_status, 200);
    assert_eq!(res.status(), Some("valid"));

    let res = server.client.stats().await.unwrap();
    assert_eq!(res.http_status, 200);
    assert_eq!(res.body["valid_count"], 0);
    assert_eq!(res.body["invalid_count"], 0);
    assert_eq!(res.body["recent_history"].as_array().unwrap().len(), 0);
    assert!(res.body["error"].is_string());

    server.stop().await;
}

#[tokio::test]
async fn test_cluster_connection_is_retried() {
    let config = common::test_config();
    let cache = Arc::new(InMemoryCache::with_nodes(&config.cache.nodes));
    let connector = RecoveringConnector {
        attempts: AtomicUsize::new(0),
        fail_first: 1,
        cache: cache.clone(),
    };
    let server = common::start_server_with_handle(config, Arc::new(CacheHandle::lazy(connector)), cache).await;

    assert_eq!(server.client.cluster_status().await.unwrap().http_status, 503);

    let res = server.client.cluster_status().await.unwrap();
    assert_eq!(res.http_status, 200);
    assert_eq!(res.body["redis_cluster"], "connected");

    server.stop().await;
}

#[tokio::test]
async fn test_quorum_tracks_node_failures() {
    let config = common::test_config();
    let nodes = config.cache.nodes.clone();
    let server = common::start_server(config).await;

    // Ten nodes, quorum three: connected until only two answer.
    for (down, node) in nodes.iter().enumerate().map(|(i, n)| (i + 1, n)) {
        server.cache.set_node_reachable(node, false);

        let res = server.client.cluster_status().await.unwrap();
        assert_eq!(res.http_status, 200, "status is 200 regardless of quorum");
        let up = nodes.len() - down;
        assert_eq!(res.body["connected_count"], up);

        let expected = if up >= 3 { "connected" } else { "disconnected" };
        assert_eq!(res.body["redis_cluster"], expected, "{} nodes up", up);
        assert_eq!(res.body["quorum_met"], up >= 3);
        assert_eq!(res.body["nodes"][down - 1]["status"], "error");
    }

    for node in &nodes {
        server.cache.set_node_reachable(node, true);
    }
    let res = server.client.cluster_status().await.unwrap();
    assert_eq!(res.body["redis_cluster"], "connected");
    assert_eq!(res.body["connected_count"], 10);

    server.stop().await;
}

#[tokio::test]
async fn test_stats_write_failures_do_not_affect_validation() {
    let server = common::start_server(common::test_config()).await;
    server.cache.set_fail_writes(true);

    for _ in 0..5 {
        let res = server.client.validate("()").await.unwrap();
        assert_eq!(res.http_status, 200);
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    server.cache.set_fail_writes(false);
    let res = server.client.stats().await.unwrap();
    assert_eq!(res.body["valid_count"], 0);

    server.client.validate("(").await.unwrap();
    let client = &server.client;
    assert!(
        common::eventually(Duration::from_secs(2), move || async move {
            client.stats().await.unwrap().body["invalid_count"] == 1
        })
        .await
    );

    server.stop().await;
}

#[tokio::test]
async fn test_stats_read_failure_is_reported_in_body() {
    let server = common::start_server(common::test_config()).await;
    server.cache.set_fail_reads(true);

    let res = server.client.stats().await.unwrap();
    assert_eq!(res.http_status, 200);
    assert_eq!(res.body["valid_count"], 0);
    assert!(res.body["error"].is_string());

    server.stop().await;
}

#[tokio::test]
async fn test_slow_cache_does_not_delay_validation() {
    let mut config = common::test_config();
    config.stats.write_timeout_ms = 100;

    let inner = Arc::new(InMemoryCache::with_nodes(&config.cache.nodes));
    let stalling = Arc::new(StallingCache {
        inner: inner.clone(),
        stall: Duration::from_secs(2),
    });
    let server = common::start_server_with_handle(config, Arc::new(CacheHandle::ready(stalling)), inner).await;

    let started = Instant::now();
    for _ in 0..3 {
        let res = server.client.validate("(())").await.unwrap();
        assert_eq!(res.http_status, 200);
    }
    assert!(started.elapsed() < Duration::from_secs(1));

    // Writes time out rather than land.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(server.cache.list_len("stats:history"), 0);

    server.stop().await;
}

#[tokio::test]
async fn test_history_is_capped() {
    let server = common::start_server(common::test_config()).await;

    for i in 0..150 {
        let input = if i % 3 == 0 { ")(" } else { "()" };
        server.client.validate(input).await.unwrap();
    }

    let client = &server.client;
    assert!(
        common::eventually(Duration::from_secs(5), move || async move {
            let body = client.stats().await.unwrap().body;
            body["valid_count"] == 100 && body["invalid_count"] == 50
        })
        .await
    );

    assert_eq!(server.cache.list_len("stats:history"), 100);
    let res = server.client.stats().await.unwrap();
    assert_eq!(res.body["recent_history"].as_array().unwrap().len(), 10);

    server.stop().await;
}
