//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use bracket_sdk::BracketClient;
use bracket_service::cache::{CacheHandle, InMemoryCache};
use bracket_service::config::ServiceConfig;
use bracket_service::http::HttpServer;
use bracket_service::lifecycle::Shutdown;

/// A running service on an ephemeral port, backed by an in-memory cluster.
pub struct TestServer {
    pub addr: SocketAddr,
    pub cache: Arc<InMemoryCache>,
    pub client: BracketClient,
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Trigger shutdown and wait for the server to drain.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

/// Test defaults: background monitor off, every node reachable.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.health_check.monitor_enabled = false;
    config.cache.ping_timeout_ms = 200;
    config
}

/// Start the service with an in-memory cache seeded from `config.cache.nodes`.
pub async fn start_server(config: ServiceConfig) -> TestServer {
    let cache = Arc::new(InMemoryCache::with_nodes(&config.cache.nodes));
    let handle = Arc::new(CacheHandle::ready(cache.clone()));
    start_server_with_handle(config, handle, cache).await
}

/// Start the service on an explicit cache handle.
///
/// `cache` is returned to the caller for fault injection; it need not be the
/// cache behind `handle`.
pub async fn start_server_with_handle(
    config: ServiceConfig,
    handle: Arc<CacheHandle>,
    cache: Arc<InMemoryCache>,
) -> TestServer {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::with_cache(config, handle);

    let handle = tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        cache,
        client: BracketClient::new(&format!("http://{}", addr)),
        shutdown,
        handle,
    }
}

/// Poll `check` until it returns true or `timeout` elapses.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
