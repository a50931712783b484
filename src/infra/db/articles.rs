use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::application::pagination::{ArticleOrder, PaginationState, SortField};
use crate::application::repos::{
    ArticleQueryFilter, ArticleSlice, ArticlesRepo, ArticlesWriteRepo, CreateArticleParams,
    RepoError,
};
use crate::domain::{entities::ArticleRecord, types::DeleteMode};

use super::{PostgresRepositories, map_sqlx_error, util::like_pattern};

const ARTICLE_COLUMNS: &str = "a.id, a.title, a.content, a.preview, a.created_at, a.updated_at, a.deleted_at";

#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    title: String,
    content: String,
    preview: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    deleted_at: Option<OffsetDateTime>,
}

impl From<ArticleRow> for ArticleRecord {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            preview: row.preview,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

impl PostgresRepositories {
    fn apply_article_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &ArticleQueryFilter) {
        qb.push(" WHERE a.deleted_at IS NULL");
        if let Some(keyword) = filter.keyword.as_deref() {
            let pattern = like_pattern(keyword);
            qb.push(" AND (a.title ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR a.content ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
    }

    /// `ORDER BY` from the whitelisted order, with `id` as the tie-break.
    fn push_article_order(qb: &mut QueryBuilder<'_, Postgres>, order: ArticleOrder) {
        let direction = order.direction().as_str().to_ascii_uppercase();
        qb.push(" ORDER BY a.");
        qb.push(order.field().as_str());
        qb.push(" ");
        qb.push(&direction);
        if order.field() != SortField::Id {
            qb.push(", a.id ");
            qb.push(&direction);
        }
    }

    fn push_mode_scope(qb: &mut QueryBuilder<'_, Postgres>, mode: DeleteMode) {
        if mode == DeleteMode::Soft {
            qb.push(" AND deleted_at IS NULL");
        }
    }
}

#[async_trait]
impl ArticlesRepo for PostgresRepositories {
    async fn list_all_articles(&self) -> Result<Vec<ArticleRecord>, RepoError> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles a WHERE a.deleted_at IS NULL ORDER BY a.id");
        let rows = sqlx::query_as::<_, ArticleRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ArticleRecord::from).collect())
    }

    async fn list_articles_page(
        &self,
        filter: &ArticleQueryFilter,
        page: &PaginationState,
    ) -> Result<ArticleSlice, RepoError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM articles a");
        Self::apply_article_filter(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        let total = Self::convert_count(total)?;

        let limit = i64::try_from(page.limit())
            .map_err(|_| RepoError::from_persistence("page size exceeds supported range"))?;
        let offset = i64::try_from(page.offset())
            .map_err(|_| RepoError::from_persistence("page offset exceeds supported range"))?;

        let mut qb = QueryBuilder::new(format!("SELECT {ARTICLE_COLUMNS} FROM articles a"));
        Self::apply_article_filter(&mut qb, filter);
        Self::push_article_order(&mut qb, page.order());
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<ArticleRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(ArticleSlice {
            items: rows.into_iter().map(ArticleRecord::from).collect(),
            total,
        })
    }

    async fn find_article(&self, id: i64) -> Result<Option<ArticleRecord>, RepoError> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles a WHERE a.id = $1 AND a.deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(ArticleRecord::from))
    }

    async fn count_articles(&self, ids: &[i64], mode: DeleteMode) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM articles WHERE id = ANY(");
        qb.push_bind(ids.to_vec());
        qb.push(")");
        Self::push_mode_scope(&mut qb, mode);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }
}

#[async_trait]
impl ArticlesWriteRepo for PostgresRepositories {
    async fn create_article(
        &self,
        params: CreateArticleParams,
    ) -> Result<ArticleRecord, RepoError> {
        let row = sqlx::query_as::<_, ArticleRow>(
            r#"
            INSERT INTO articles (title, content, preview)
            VALUES ($1, $2, $3)
            RETURNING id, title, content, preview, created_at, updated_at, deleted_at
            "#,
        )
        .bind(params.title)
        .bind(params.content)
        .bind(params.preview)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ArticleRecord::from(row))
    }

    async fn delete_articles(&self, ids: &[i64], mode: DeleteMode) -> Result<u64, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let mut qb = match mode {
            DeleteMode::Soft => QueryBuilder::new(
                "UPDATE articles SET deleted_at = now(), updated_at = now() WHERE id = ANY(",
            ),
            DeleteMode::Hard => QueryBuilder::new("DELETE FROM articles WHERE id = ANY("),
        };
        qb.push_bind(ids.to_vec());
        qb.push(")");
        Self::push_mode_scope(&mut qb, mode);

        let affected = qb
            .build()
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        let expected = ids.len() as u64;
        if affected != expected {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Err(RepoError::CountMismatch {
                expected,
                actual: affected,
            });
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(affected)
    }
}
