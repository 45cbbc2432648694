//! Process-local cache.
//!
//! Mirrors the subset of Redis semantics the service relies on. Nodes can be
//! switched off, commands can be made to fail or to stall, which the tests
//! use to exercise quorum and best-effort paths.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::cache::{CacheError, ClusterCache, PingReply};

/// In-memory [`ClusterCache`] backed by concurrent maps.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    /// Node address -> reachable.
    nodes: DashMap<String, bool>,
    values: DashMap<String, String>,
    lists: DashMap<String, VecDeque<String>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    /// Delay applied to every data command, in milliseconds.
    stall_ms: AtomicU64,
}

impl InMemoryCache {
    /// Create a cache whose nodes all answer pings.
    pub fn with_nodes(nodes: &[String]) -> Self {
        let cache = Self::default();
        for node in nodes {
            cache.nodes.insert(node.clone(), true);
        }
        cache
    }

    /// Mark a node reachable or unreachable.
    pub fn set_node_reachable(&self, node: &str, reachable: bool) {
        self.nodes.insert(node.to_string(), reachable);
    }

    /// Make every write command fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every read command fail until reset.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Delay every data command by `stall`. Pings are unaffected.
    pub fn set_stall(&self, stall: Duration) {
        self.stall_ms.store(stall.as_millis() as u64, Ordering::SeqCst);
    }

    /// Current length of a list.
    pub fn list_len(&self, key: &str) -> usize {
        self.lists.get(key).map(|l| l.len()).unwrap_or(0)
    }

    async fn stall(&self) {
        let ms = self.stall_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    async fn check_writes(&self) -> Result<(), CacheError> {
        self.stall().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Command("writes disabled".into()));
        }
        Ok(())
    }

    async fn check_reads(&self) -> Result<(), CacheError> {
        self.stall().await;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Command("reads disabled".into()));
        }
        Ok(())
    }
}

/// Resolve a Redis-style inclusive range against a list of `len` items.
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if len == 0 || start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[async_trait]
impl ClusterCache for InMemoryCache {
    async fn ping(&self, node: &str) -> Result<PingReply, CacheError> {
        match self.nodes.get(node).map(|r| *r.value()) {
            Some(true) => Ok(PingReply::Status("PONG".to_string())),
            Some(false) => Err(CacheError::Unreachable(node.to_string())),
            None => Err(CacheError::UnknownNode(node.to_string())),
        }
    }

    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        self.check_writes().await?;
        let mut entry = self.values.entry(key.to_string()).or_insert_with(|| "0".to_string());
        let current: i64 = entry
            .parse()
            .map_err(|_| CacheError::Command("value is not an integer or out of range".into()))?;
        let next = current
            .checked_add(1)
            .ok_or_else(|| CacheError::Command("increment or decrement would overflow".into()))?;
        *entry = next.to_string();
        Ok(next)
    }

    async fn lpush(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.check_writes().await?;
        self.lists.entry(key.to_string()).or_default().push_front(value);
        Ok(())
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), CacheError> {
        self.check_writes().await?;
        if let Some(mut list) = self.lists.get_mut(key) {
            match resolve_range(list.len(), start, stop) {
                Some((start, stop)) => {
                    list.truncate(stop + 1);
                    list.drain(..start);
                }
                None => list.clear(),
            }
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check_reads().await?;
        Ok(self.values.get(key).map(|v| v.value().clone()))
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, CacheError> {
        self.check_reads().await?;
        let Some(list) = self.lists.get(key) else {
            return Ok(Vec::new());
        };
        Ok(match resolve_range(list.len(), start, stop) {
            Some((start, stop)) => list.range(start..=stop).cloned().collect(),
            None => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("node{}:6379", i)).collect()
    }

    #[test]
    fn test_resolve_range() {
        assert_eq!(resolve_range(5, 0, 9), Some((0, 4)));
        assert_eq!(resolve_range(5, 0, -1), Some((0, 4)));
        assert_eq!(resolve_range(5, -2, -1), Some((3, 4)));
        assert_eq!(resolve_range(5, 3, 1), None);
        assert_eq!(resolve_range(5, 7, 9), None);
        assert_eq!(resolve_range(0, 0, -1), None);
    }

    #[tokio::test]
    async fn test_ping_reflects_reachability() {
        let cache = InMemoryCache::with_nodes(&nodes(2));
        assert!(cache.ping("node1:6379").await.is_ok());

        cache.set_node_reachable("node1:6379", false);
        assert!(matches!(cache.ping("node1:6379").await, Err(CacheError::Unreachable(_))));
        assert!(matches!(cache.ping("node9:6379").await, Err(CacheError::UnknownNode(_))));
    }

    #[tokio::test]
    async fn test_incr_and_get() {
        let cache = InMemoryCache::default();
        assert_eq!(cache.get("counter").await.unwrap(), None);
        assert_eq!(cache.incr("counter").await.unwrap(), 1);
        assert_eq!(cache.incr("counter").await.unwrap(), 2);
        assert_eq!(cache.get("counter").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_incr_overflow_is_an_error() {
        let cache = InMemoryCache::default();
        cache.values.insert("counter".into(), i64::MAX.to_string());

        let err = cache.incr("counter").await.unwrap_err();
        assert!(matches!(err, CacheError::Command(ref msg) if msg.contains("overflow")));
        assert_eq!(cache.get("counter").await.unwrap(), Some(i64::MAX.to_string()));
    }

    #[tokio::test]
    async fn test_list_push_trim_range() {
        let cache = InMemoryCache::default();
        for i in 0..5 {
            cache.lpush("list", i.to_string()).await.unwrap();
        }
        assert_eq!(cache.lrange("list", 0, 1).await.unwrap(), vec!["4", "3"]);

        cache.ltrim("list", 0, 2).await.unwrap();
        assert_eq!(cache.list_len("list"), 3);
        assert_eq!(cache.lrange("list", 0, -1).await.unwrap(), vec!["4", "3", "2"]);

        cache.ltrim("list", 5, 10).await.unwrap();
        assert_eq!(cache.list_len("list"), 0);
    }

    #[tokio::test]
    async fn test_failure_switches() {
        let cache = InMemoryCache::default();
        cache.set_fail_writes(true);
        assert!(cache.incr("k").await.is_err());
        assert!(cache.lpush("l", "v".into()).await.is_err());

        cache.set_fail_writes(false);
        cache.set_fail_reads(true);
        assert!(cache.incr("k").await.is_ok());
        assert!(cache.get("k").await.is_err());
    }

    #[tokio::test]
    async fn test_stall_delays_commands_but_not_pings() {
        let cache = InMemoryCache::with_nodes(&nodes(1));
        cache.set_stall(Duration::from_secs(60));

        let stalled = tokio::time::timeout(Duration::from_millis(50), cache.get("k")).await;
        assert!(stalled.is_err());
        assert!(cache.ping("node1:6379").await.is_ok());

        cache.set_stall(Duration::ZERO);
        assert_eq!(cache.incr("k").await.unwrap(), 1);
    }
}
