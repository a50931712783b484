//! Per-article like counters held in the cache backend.

use std::sync::Arc;

use tracing::instrument;

use crate::{application::error::AppError, cache::CacheBackend};

pub const LIKE_KEY_PREFIX: &str = "article:";

pub fn like_key(article_id: i64) -> String {
    format!("{LIKE_KEY_PREFIX}{article_id}:likes")
}

/// Counters live only in the cache backend; its increment is atomic, so no
/// locking happens here.
#[derive(Clone)]
pub struct LikeService {
    counters: Arc<dyn CacheBackend>,
}

impl LikeService {
    pub fn new(counters: Arc<dyn CacheBackend>) -> Self {
        Self { counters }
    }

    /// Increment and return the new count.
    #[instrument(skip(self))]
    pub async fn like(&self, article_id: i64) -> Result<i64, AppError> {
        check_id(article_id)?;
        Ok(self.counters.incr(&like_key(article_id)).await?)
    }

    /// Current count; an article nobody has liked reports zero.
    #[instrument(skip(self))]
    pub async fn likes(&self, article_id: i64) -> Result<i64, AppError> {
        check_id(article_id)?;
        let key = like_key(article_id);
        match self.counters.get(&key).await? {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| AppError::backend(format!("counter `{key}` holds `{raw}`"))),
            None => Ok(0),
        }
    }
}

fn check_id(article_id: i64) -> Result<(), AppError> {
    if article_id <= 0 {
        return Err(AppError::validation(format!(
            "invalid article id {article_id}"
        )));
    }
    Ok(())
}
