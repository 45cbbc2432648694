//! Background cluster monitoring.
//!
//! # Responsibilities
//! - Periodically run the cluster health check
//! - Log transitions between connected, disconnected and unavailable
//!
//! The `/status` endpoint never reads from here; it checks on every call.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::health::cluster::{ClusterHealthChecker, ClusterState};

/// Last observation, used only to detect transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observed {
    Cluster(ClusterState),
    Unavailable,
}

pub struct HealthMonitor {
    checker: Arc<ClusterHealthChecker>,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(checker: Arc<ClusterHealthChecker>, config: HealthCheckConfig) -> Self {
        Self { checker, config }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.monitor_enabled {
            tracing::info!("Cluster health monitor disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            quorum = self.checker.required_quorum(),
            "Cluster health monitor starting"
        );

        let interval = Duration::from_secs(self.config.interval_secs);
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        let mut last: Option<Observed> = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let observed = self.check_once().await;
                    if last != Some(observed) {
                        log_transition(last, observed);
                        last = Some(observed);
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Cluster health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn check_once(&self) -> Observed {
        match self.checker.check().await {
            Ok(status) => Observed::Cluster(status.state),
            Err(e) => {
                tracing::error!(error = %e, "Cluster health check failed");
                Observed::Unavailable
            }
        }
    }
}

fn log_transition(from: Option<Observed>, to: Observed) {
    match to {
        Observed::Cluster(ClusterState::Connected) => {
            tracing::info!(from = ?from, "Cache cluster connected");
        }
        Observed::Cluster(ClusterState::Disconnected) => {
            tracing::warn!(from = ?from, "Cache cluster below quorum");
        }
        Observed::Unavailable => {
            tracing::error!(from = ?from, "Cache cluster unavailable");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheHandle, InMemoryCache};

    #[tokio::test]
    async fn test_check_once_reports_state() {
        let nodes = vec!["a:1".to_string(), "b:1".to_string()];
        let cache = Arc::new(InMemoryCache::with_nodes(&nodes));
        let checker = Arc::new(ClusterHealthChecker::new(
            Arc::new(CacheHandle::ready(cache.clone())),
            nodes,
            2,
            Duration::from_millis(100),
        ));
        let monitor = HealthMonitor::new(checker, HealthCheckConfig::default());

        assert_eq!(monitor.check_once().await, Observed::Cluster(ClusterState::Connected));
        cache.set_node_reachable("b:1", false);
        assert_eq!(monitor.check_once().await, Observed::Cluster(ClusterState::Disconnected));
    }

    #[tokio::test]
    async fn test_stops_on_shutdown() {
        let nodes = vec!["a:1".to_string()];
        let cache = Arc::new(InMemoryCache::with_nodes(&nodes));
        let checker = Arc::new(ClusterHealthChecker::new(
            Arc::new(CacheHandle::ready(cache)),
            nodes,
            1,
            Duration::from_millis(100),
        ));
        let config = HealthCheckConfig {
            monitor_enabled: true,
            interval_secs: 1,
        };

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(HealthMonitor::new(checker, config).run(rx));
        time::sleep(Duration::from_millis(50)).await;
        tx.send(()).unwrap();

        time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("monitor did not stop")
            .unwrap();
    }
}
