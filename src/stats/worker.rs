//! Off-request-path stats recording.
//!
//! Handlers submit events to a bounded queue; a single worker task drains it
//! into the [`StatsRecorder`]. Submission never waits: when the queue is full
//! the event is dropped.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time;

use crate::observability::metrics;
use crate::stats::recorder::StatsRecorder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsEvent {
    pub input: String,
    pub valid: bool,
}

/// Cheap, cloneable submission handle.
#[derive(Debug, Clone)]
pub struct StatsSender {
    tx: mpsc::Sender<StatsEvent>,
}

impl StatsSender {
    /// Queue an outcome for recording.
    pub fn submit(&self, input: &str, valid: bool) {
        let event = StatsEvent {
            input: input.to_string(),
            valid,
        };
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Stats queue full, dropping event");
                metrics::record_stats_event("dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Stats worker stopped, dropping event");
                metrics::record_stats_event("dropped");
            }
        }
    }
}

pub struct StatsWorker {
    rx: mpsc::Receiver<StatsEvent>,
    recorder: Arc<StatsRecorder>,
    drain_timeout: Duration,
}

/// Create a queue of `capacity` events feeding `recorder`.
///
/// At shutdown the worker spends at most `drain_timeout` flushing the queue.
pub fn channel(
    recorder: Arc<StatsRecorder>,
    capacity: usize,
    drain_timeout: Duration,
) -> (StatsSender, StatsWorker) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        StatsSender { tx },
        StatsWorker {
            rx,
            recorder,
            drain_timeout,
        },
    )
}

impl StatsWorker {
    /// Drain events until every sender is gone or shutdown is signalled.
    ///
    /// Events already queued at shutdown are still recorded while the drain
    /// budget lasts; the rest are dropped.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!("Stats worker starting");

        loop {
            tokio::select! {
                event = self.rx.recv() => match event {
                    Some(event) => self.recorder.record(&event.input, event.valid).await,
                    None => break,
                },
                _ = shutdown.recv() => {
                    self.drain().await;
                    break;
                }
            }
        }

        tracing::info!("Stats worker stopped");
    }

    async fn drain(&mut self) {
        self.rx.close();

        let recorder = &self.recorder;
        let rx = &mut self.rx;
        let flushed = time::timeout(self.drain_timeout, async {
            while let Some(event) = rx.recv().await {
                recorder.record(&event.input, event.valid).await;
            }
        })
        .await;

        if flushed.is_err() {
            let mut dropped = 0usize;
            while self.rx.try_recv().is_ok() {
                metrics::record_stats_event("dropped");
                dropped += 1;
            }
            tracing::warn!(
                dropped,
                budget_ms = self.drain_timeout.as_millis() as u64,
                "Stats drain budget exhausted"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheHandle, ClusterCache, InMemoryCache};
    use crate::config::StatsConfig;
    use std::time::Instant;

    const DRAIN: Duration = Duration::from_secs(2);

    fn recorder(cache: Arc<InMemoryCache>) -> Arc<StatsRecorder> {
        Arc::new(StatsRecorder::new(
            Arc::new(CacheHandle::ready(cache)),
            &StatsConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_worker_records_submitted_events() {
        let recorder = recorder(Arc::new(InMemoryCache::default()));
        let (sender, worker) = channel(recorder.clone(), 16, DRAIN);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(worker.run(shutdown_rx));

        sender.submit("(())", true);
        sender.submit(")(", false);
        sender.submit("(()", false);

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();

        let stats = recorder.get_stats().await;
        assert_eq!(stats.valid_count, 1);
        assert_eq!(stats.invalid_count, 2);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let recorder = recorder(Arc::new(InMemoryCache::default()));
        let (sender, worker) = channel(recorder.clone(), 2, DRAIN);

        // Worker not running yet: the third submission has nowhere to go.
        sender.submit("()", true);
        sender.submit("()", true);
        sender.submit("()", true);

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        shutdown_tx.send(()).unwrap();
        worker.run(shutdown_rx).await;

        assert_eq!(recorder.get_stats().await.valid_count, 2);
    }

    #[tokio::test]
    async fn test_submit_after_worker_exit_is_harmless() {
        let recorder = recorder(Arc::new(InMemoryCache::default()));
        let (sender, worker) = channel(recorder, 4, DRAIN);
        drop(worker);
        sender.submit("()", true);
    }

    #[tokio::test]
    async fn test_shutdown_drain_is_bounded_by_budget() {
        let cache = Arc::new(InMemoryCache::default());
        let recorder = recorder(cache.clone());
        let (sender, worker) = channel(recorder, 32, Duration::from_millis(300));

        for _ in 0..20 {
            sender.submit("()", true);
        }
        cache.set_stall(Duration::from_secs(60));

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        shutdown_tx.send(()).unwrap();

        let started = Instant::now();
        tokio::time::timeout(Duration::from_secs(5), worker.run(shutdown_rx))
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));

        cache.set_stall(Duration::ZERO);
        assert_eq!(cache.get("stats:valid").await.unwrap(), None);
    }
}
