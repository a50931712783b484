//! Key-value cache backends.
//!
//! [`CacheBackend`] is the narrow contract the article cache and like counters
//! need: string payloads with a TTL, deletion by exact key or prefix, and an
//! atomic increment. [`MemoryCache`] serves single-node deployments and tests;
//! the Redis implementation lives in `infra::redis`.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache command failed: {0}")]
    Command(String),
}

impl CacheError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn command(message: impl Into<String>) -> Self {
        Self::Command(message.into())
    }
}

#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// `Ok(None)` means the key is absent, which is not an error.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Returns whether a key was removed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Remove every key starting with `prefix`, returning how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError>;

    /// Atomically add one to the integer stored at `key`, treating absence as zero.
    async fn incr(&self, key: &str) -> Result<i64, CacheError>;
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    payload: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// Writes between sweeps of expired entries.
const SWEEP_INTERVAL: usize = 64;

/// Process-local backend on a sharded concurrent map.
///
/// Expired entries are dropped when read, and every [`SWEEP_INTERVAL`] writes
/// a sweep removes the ones nobody reads again.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, MemoryEntry>,
    writes: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every expired entry, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let snapshot = self.entries.get(key).map(|entry| entry.value().clone());
        match snapshot {
            Some(entry) if entry.is_expired(now) => {
                self.entries
                    .remove_if(key, |_, current| current.is_expired(now));
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.payload)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now().checked_add(ttl);
        self.entries
            .insert(key.to_string(), MemoryEntry {
                payload: value,
                expires_at,
            });

        if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_INTERVAL == 0 {
            self.purge_expired();
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let mut removed = 0;
        self.entries.retain(|key, _| {
            let keep = !key.starts_with(prefix);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }

    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| MemoryEntry {
                payload: "0".to_string(),
                expires_at: None,
            });
        if entry.is_expired(now) {
            entry.payload = "0".to_string();
            entry.expires_at = None;
        }

        let current: i64 = entry.payload.parse().map_err(|_| {
            CacheError::command(format!("value at `{key}` is not an integer"))
        })?;
        let next = current
            .checked_add(1)
            .ok_or_else(|| CacheError::command(format!("increment of `{key}` overflows")))?;
        entry.payload = next.to_string();
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn absent_key_is_not_an_error() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("missing").await, Ok(None));
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCache::new();
        cache
            .set("short", "v".into(), Duration::from_millis(20))
            .await
            .expect("set");
        cache
            .set("long", "v".into(), Duration::from_secs(60))
            .await
            .expect("set");
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(cache.get("short").await, Ok(None));
        assert_eq!(cache.get("long").await, Ok(Some("v".to_string())));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn writes_sweep_entries_nobody_reads_again() {
        let cache = MemoryCache::new();
        for i in 0..1000 {
            cache
                .set(
                    &format!("articles:pagination:{i}"),
                    "{}".into(),
                    Duration::from_millis(1),
                )
                .await
                .expect("set");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        for i in 0..SWEEP_INTERVAL {
            cache
                .set(&format!("fresh:{i}"), "{}".into(), Duration::from_secs(60))
                .await
                .expect("set");
        }

        assert_eq!(cache.entries.len(), SWEEP_INTERVAL);
        assert_eq!(cache.len(), SWEEP_INTERVAL);
    }

    #[tokio::test]
    async fn purge_expired_keeps_live_and_persistent_entries() {
        let cache = MemoryCache::new();
        cache
            .set("short", "v".into(), Duration::from_millis(5))
            .await
            .expect("set");
        cache
            .set("long", "v".into(), Duration::from_secs(60))
            .await
            .expect("set");
        cache.incr("article:1:likes").await.expect("incr");
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.entries.len(), 2);
        assert_eq!(
            cache.get("article:1:likes").await,
            Ok(Some("1".to_string()))
        );
    }

    #[tokio::test]
    async fn delete_prefix_only_touches_namespace() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);
        for key in ["articles", "articles:pagination:a", "articles:pagination:b"] {
            cache.set(key, "[]".into(), ttl).await.expect("set");
        }

        let removed = cache
            .delete_prefix("articles:pagination:")
            .await
            .expect("delete prefix");
        assert_eq!(removed, 2);
        assert_eq!(cache.get("articles").await, Ok(Some("[]".to_string())));
    }

    #[tokio::test]
    async fn incr_is_atomic_under_contention() {
        let cache = Arc::new(MemoryCache::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                for _ in 0..25 {
                    cache.incr("article:1:likes").await.expect("incr");
                }
            }));
        }
        for handle in handles {
            handle.await.expect("task");
        }

        assert_eq!(
            cache.get("article:1:likes").await,
            Ok(Some("400".to_string()))
        );
    }

    #[tokio::test]
    async fn incr_rejects_non_integer_values() {
        let cache = MemoryCache::new();
        cache
            .set("article:1:likes", "lots".into(), Duration::from_secs(60))
            .await
            .expect("set");
        assert!(matches!(
            cache.incr("article:1:likes").await,
            Err(CacheError::Command(_))
        ));
    }
}
