//! Pressroom cache layer.
//!
//! - [`ArticleCache`]: read-through cache for article listings, keyed by
//!   [`derive_key`] under a pagination namespace plus the fixed
//!   [`ARTICLES_ALL_KEY`] for the full listing.
//! - [`CacheBackend`]: storage contract shared with the like counters, served
//!   by [`MemoryCache`] in-process or by Redis (`infra::redis`).
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! redis_url = "redis://127.0.0.1:6379"  # omit for the in-memory backend
//! pool_size = 16
//! article_ttl_seconds = 600
//! pagination_namespace = "articles:pagination"
//! ```

mod backend;
mod config;
mod keys;
mod manager;

pub use backend::{CacheBackend, CacheError, MemoryCache};
pub use config::CacheConfig;
pub use keys::{ARTICLES_ALL_KEY, DEFAULT_PAGINATION_NAMESPACE, derive_key, namespace_prefix};
pub use manager::ArticleCache;
pub(crate) use manager::{
    METRIC_COMPUTE_MS, METRIC_FALLBACK, METRIC_HIT, METRIC_INVALIDATE, METRIC_MISS,
};
