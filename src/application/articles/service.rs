use std::{collections::BTreeSet, sync::Arc};

use pressroom_api_types::{ArticlePage, ArticleView};
use tracing::{info, instrument};

use crate::{
    application::{
        error::AppError,
        pagination::{PaginationState, normalize_keyword},
        repos::{
            ArticleQueryFilter, ArticlesRepo, ArticlesWriteRepo, CreateArticleParams, RepoError,
        },
    },
    cache::{ARTICLES_ALL_KEY, ArticleCache},
    domain::{entities::ArticleRecord, types::DeleteMode},
    util::timestamp::display_timestamp,
};

use super::highlight::highlight_first;

#[derive(Debug, Clone)]
pub struct CreateArticleCommand {
    pub title: String,
    pub content: String,
    pub preview: String,
}

/// Article reads through the listing cache, and writes that invalidate it.
#[derive(Clone)]
pub struct ArticleService {
    reader: Arc<dyn ArticlesRepo>,
    writer: Arc<dyn ArticlesWriteRepo>,
    cache: Arc<ArticleCache>,
}

impl ArticleService {
    pub fn new(
        reader: Arc<dyn ArticlesRepo>,
        writer: Arc<dyn ArticlesWriteRepo>,
        cache: Arc<ArticleCache>,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
        }
    }

    /// Every live article, ordered by id.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<ArticleView>, AppError> {
        self.cache
            .get_or_compute(ARTICLES_ALL_KEY, || async {
                let records = self.reader.list_all_articles().await?;
                Ok::<_, AppError>(records.iter().map(article_view).collect())
            })
            .await
    }

    /// One page of articles, filtered by `keyword` when it is not blank.
    #[instrument(skip(self))]
    pub async fn list_paginated(
        &self,
        state: &PaginationState,
        keyword: Option<&str>,
    ) -> Result<ArticlePage, AppError> {
        let keyword = normalize_keyword(keyword);
        let key = self.cache.pagination_key(state, keyword.as_deref());
        self.cache
            .get_or_compute(&key, || self.load_page(*state, keyword.clone()))
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64) -> Result<ArticleView, AppError> {
        let record = self
            .reader
            .find_article(id)
            .await?
            .ok_or_else(|| AppError::not_found("article"))?;
        Ok(article_view(&record))
    }

    #[instrument(skip(self, command), fields(title = %command.title))]
    pub async fn create(&self, command: CreateArticleCommand) -> Result<ArticleView, AppError> {
        let params = CreateArticleParams {
            title: required("title", command.title)?,
            content: required("content", command.content)?,
            preview: required("preview", command.preview)?,
        };

        let record = self.writer.create_article(params).await?;
        self.cache.invalidate_articles().await;

        info!(
            target: "pressroom::articles",
            article_id = record.id,
            "article created"
        );
        Ok(article_view(&record))
    }

    /// Delete all of `ids` or none of them.
    ///
    /// Soft mode only counts live articles; hard mode also removes rows that
    /// were already soft-deleted.
    #[instrument(skip(self))]
    pub async fn batch_delete(&self, ids: &[i64], mode: DeleteMode) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Err(AppError::validation("ids must not be empty"));
        }
        if let Some(bad) = ids.iter().find(|id| **id <= 0) {
            return Err(AppError::validation(format!("invalid article id {bad}")));
        }
        let ids: Vec<i64> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let expected = ids.len() as u64;

        let actual = self.reader.count_articles(&ids, mode).await?;
        if actual != expected {
            return Err(AppError::Conflict {
                mode,
                expected,
                actual,
            });
        }

        let deleted = match self.writer.delete_articles(&ids, mode).await {
            Ok(deleted) => deleted,
            Err(RepoError::CountMismatch { expected, actual }) => {
                return Err(AppError::Conflict {
                    mode,
                    expected,
                    actual,
                });
            }
            Err(err) => return Err(err.into()),
        };
        self.cache.invalidate_articles().await;

        info!(
            target: "pressroom::articles",
            deleted,
            mode = mode.as_str(),
            "articles deleted"
        );
        Ok(deleted)
    }

    async fn load_page(
        &self,
        state: PaginationState,
        keyword: Option<String>,
    ) -> Result<ArticlePage, AppError> {
        let filter = ArticleQueryFilter {
            keyword: keyword.clone(),
        };
        let slice = self.reader.list_articles_page(&filter, &state).await?;

        let articles = slice
            .items
            .iter()
            .map(|record| {
                let mut view = article_view(record);
                if let Some(keyword) = keyword.as_deref() {
                    view.title = highlight_first(&view.title, keyword);
                    view.content = highlight_first(&view.content, keyword);
                }
                view
            })
            .collect();

        let is_search = keyword.is_some().then_some(true);
        Ok(ArticlePage {
            articles,
            pagination: state.info(slice.total),
            keyword,
            is_search,
        })
    }
}

fn required(field: &'static str, value: String) -> Result<String, AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    Ok(value)
}

pub(crate) fn article_view(record: &ArticleRecord) -> ArticleView {
    ArticleView {
        id: record.id,
        title: record.title.clone(),
        content: record.content.clone(),
        preview: record.preview.clone(),
        created_at: display_timestamp(record.created_at),
        updated_at: display_timestamp(record.updated_at),
    }
}
