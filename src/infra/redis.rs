//! Redis-backed [`CacheBackend`] over a deadpool connection pool.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, PoolError, Runtime};
use redis::{AsyncCommands, RedisError};
use tracing::{debug, info};

use crate::cache::{CacheBackend, CacheError};

use super::error::InfraError;

const SCAN_BATCH: usize = 200;

#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Build the pool and check one connection out so a dead server is caught at startup.
    pub async fn connect(url: &str, pool_size: u32) -> Result<Self, InfraError> {
        let mut config = Config::from_url(url);
        if let Some(pool_config) = config.pool.as_mut() {
            pool_config.max_size = pool_size as usize;
        }
        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|err| InfraError::cache(format!("failed to create redis pool: {err}")))?;

        pool.get()
            .await
            .map_err(|err| InfraError::cache(format!("redis unreachable: {err}")))?;

        info!(target: "pressroom::cache", pool_size, "connected to redis");
        Ok(Self::new(pool))
    }

    async fn connection(&self) -> Result<Connection, CacheError> {
        self.pool.get().await.map_err(pool_error)
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await.map_err(redis_error)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let ttl_secs = ttl.as_secs().max(1);
        let () = conn.set_ex(key, value, ttl_secs).await.map_err(redis_error)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.connection().await?;
        let removed: usize = conn.del(key).await.map_err(redis_error)?;
        Ok(removed > 0)
    }

    /// Walks the keyspace with `SCAN MATCH`, deleting each batch as it arrives.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let mut conn = self.connection().await?;
        let pattern = format!("{}*", escape_glob(prefix));
        let mut cursor: u64 = 0;
        let mut removed = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(redis_error)?;

            if !keys.is_empty() {
                let count: usize = conn.del(&keys).await.map_err(redis_error)?;
                removed += count;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!(target: "pressroom::cache", prefix, removed, "redis prefix delete");
        Ok(removed)
    }

    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        let mut conn = self.connection().await?;
        let value: i64 = conn.incr(key, 1_i64).await.map_err(redis_error)?;
        Ok(value)
    }
}

fn pool_error(err: PoolError) -> CacheError {
    CacheError::unavailable(err.to_string())
}

fn redis_error(err: RedisError) -> CacheError {
    if err.is_io_error() || err.is_connection_dropped() || err.is_timeout() {
        CacheError::unavailable(err.to_string())
    } else {
        CacheError::command(err.to_string())
    }
}

/// Escape glob metacharacters so a key prefix matches literally in `SCAN MATCH`.
fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for ch in prefix.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_metacharacters_are_escaped() {
        assert_eq!(escape_glob("articles:pagination:"), "articles:pagination:");
        assert_eq!(escape_glob("a*b?[c]"), "a\\*b\\?\\[c\\]");
    }
}
