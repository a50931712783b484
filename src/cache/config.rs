//! Article cache configuration.

use std::time::Duration;

use super::keys::{DEFAULT_PAGINATION_NAMESPACE, namespace_prefix};

const DEFAULT_ARTICLE_TTL_SECS: u64 = 600;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Lifetime of every cached listing entry.
    pub article_ttl: Duration,
    /// Namespace prepended to paginated listing keys.
    pub pagination_namespace: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            article_ttl: Duration::from_secs(DEFAULT_ARTICLE_TTL_SECS),
            pagination_namespace: DEFAULT_PAGINATION_NAMESPACE.to_string(),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            article_ttl: settings.article_ttl,
            pagination_namespace: settings.pagination_namespace.clone(),
        }
    }
}

impl CacheConfig {
    pub fn pagination_prefix(&self) -> String {
        namespace_prefix(&self.pagination_namespace)
    }
}
