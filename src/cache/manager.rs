//! Read-through cache for article listings.

use std::{future::Future, sync::Arc, time::Instant};

use metrics::{counter, histogram};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::application::pagination::PaginationState;

use super::{
    backend::{CacheBackend, CacheError},
    config::CacheConfig,
    keys::{ARTICLES_ALL_KEY, derive_key},
};

const TARGET: &str = "pressroom::cache";

pub(crate) const METRIC_HIT: &str = "pressroom_article_cache_hit_total";
pub(crate) const METRIC_MISS: &str = "pressroom_article_cache_miss_total";
pub(crate) const METRIC_FALLBACK: &str = "pressroom_article_cache_fallback_total";
pub(crate) const METRIC_INVALIDATE: &str = "pressroom_article_cache_invalidate_total";
pub(crate) const METRIC_COMPUTE_MS: &str = "pressroom_article_cache_compute_ms";

/// Read-through cache with stampede protection.
///
/// A single mutex guards every miss, so at most one compute runs at a time in
/// this process regardless of key. Concurrent misses for different keys queue
/// behind each other.
pub struct ArticleCache {
    backend: Arc<dyn CacheBackend>,
    config: CacheConfig,
    miss_lock: Mutex<()>,
}

impl ArticleCache {
    pub fn new(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        Self {
            backend,
            config,
            miss_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Key for one page of a listing, optionally filtered by `keyword`.
    pub fn pagination_key(&self, state: &PaginationState, keyword: Option<&str>) -> String {
        derive_key(
            &self.config.pagination_namespace,
            state.page(),
            state.page_size(),
            &state.order().to_string(),
            keyword.unwrap_or_default(),
        )
    }

    /// Raw payload lookup. `Ok(None)` is a miss.
    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.backend.get(key).await
    }

    /// Return the cached value for `key`, or run `compute` once and cache its result.
    ///
    /// Backend read failures skip the cache entirely and run `compute`
    /// directly. Write failures are logged; the computed value is still returned.
    pub async fn get_or_compute<T, E, F, Fut>(&self, key: &str, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.read::<T>(key).await {
            Ok(Some(value)) => {
                counter!(METRIC_HIT).increment(1);
                return Ok(value);
            }
            Ok(None) => counter!(METRIC_MISS).increment(1),
            Err(err) => return self.fallback(key, err, compute).await,
        }

        let _guard = self.miss_lock.lock().await;

        match self.read::<T>(key).await {
            Ok(Some(value)) => {
                debug!(target: TARGET, key, "entry filled while waiting for miss lock");
                return Ok(value);
            }
            Ok(None) => {}
            Err(err) => return self.fallback(key, err, compute).await,
        }

        let started = Instant::now();
        let value = compute().await?;
        histogram!(METRIC_COMPUTE_MS).record(started.elapsed().as_secs_f64() * 1000.0);

        self.write(key, &value).await;
        Ok(value)
    }

    /// Delete one key. Failures are logged and swallowed.
    pub async fn invalidate(&self, key: &str) {
        match self.backend.delete(key).await {
            Ok(removed) => {
                counter!(METRIC_INVALIDATE).increment(1);
                debug!(target: TARGET, key, removed, "invalidated cache key");
            }
            Err(err) => {
                warn!(target: TARGET, key, error = %err, "cache invalidation failed");
            }
        }
    }

    /// Delete every key under `prefix`. Failures are logged and swallowed.
    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        match self.backend.delete_prefix(prefix).await {
            Ok(removed) => {
                counter!(METRIC_INVALIDATE).increment(1);
                debug!(target: TARGET, prefix, removed, "invalidated cache prefix");
                removed
            }
            Err(err) => {
                warn!(target: TARGET, prefix, error = %err, "cache prefix invalidation failed");
                0
            }
        }
    }

    /// Drop the full listing and every paginated variant.
    pub async fn invalidate_articles(&self) {
        self.invalidate(ARTICLES_ALL_KEY).await;
        self.invalidate_prefix(&self.config.pagination_prefix()).await;
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(payload) = self.backend.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&payload) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(target: TARGET, key, error = %err, "discarding undecodable cache entry");
                Ok(None)
            }
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(target: TARGET, key, error = %err, "failed to encode cache entry");
                return;
            }
        };
        if let Err(err) = self.backend.set(key, payload, self.config.article_ttl).await {
            warn!(target: TARGET, key, error = %err, "cache write failed");
        }
    }

    async fn fallback<T, E, F, Fut>(&self, key: &str, err: CacheError, compute: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        counter!(METRIC_FALLBACK).increment(1);
        warn!(
            target: TARGET,
            key,
            error = %err,
            "cache read failed; serving from store"
        );
        compute().await
    }
}
