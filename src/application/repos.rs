//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::PaginationState;
use crate::domain::entities::{ArticleRecord, ExchangeRateRecord, UserRecord};
use crate::domain::types::{DeleteMode, UserRole, UserStatus};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("expected to affect {expected} rows but matched {actual}")]
    CountMismatch { expected: u64, actual: u64 },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArticleQueryFilter {
    /// Literal, case-insensitive substring matched against title or content.
    pub keyword: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ArticleSlice {
    pub items: Vec<ArticleRecord>,
    pub total: u64,
}

#[derive(Debug, Clone)]
pub struct CreateArticleParams {
    pub title: String,
    pub content: String,
    pub preview: String,
}

#[async_trait]
pub trait ArticlesRepo: Send + Sync {
    /// Every live article ordered by id ascending.
    async fn list_all_articles(&self) -> Result<Vec<ArticleRecord>, RepoError>;

    async fn list_articles_page(
        &self,
        filter: &ArticleQueryFilter,
        page: &PaginationState,
    ) -> Result<ArticleSlice, RepoError>;

    /// Live article by id; soft-deleted rows are reported as absent.
    async fn find_article(&self, id: i64) -> Result<Option<ArticleRecord>, RepoError>;

    /// How many of `ids` a delete in `mode` would affect.
    async fn count_articles(&self, ids: &[i64], mode: DeleteMode) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait ArticlesWriteRepo: Send + Sync {
    async fn create_article(&self, params: CreateArticleParams)
    -> Result<ArticleRecord, RepoError>;

    /// Deletes every id or none: fails with `CountMismatch` and leaves rows untouched
    /// when fewer than `ids.len()` rows are affected.
    async fn delete_articles(&self, ids: &[i64], mode: DeleteMode) -> Result<u64, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Column changes for a user row. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub nickname: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;

    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError>;

    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<UserRecord>, RepoError>;

    /// Whether `email` belongs to any account other than `user_id`.
    async fn email_in_use_by_other(&self, email: &str, user_id: i64) -> Result<bool, RepoError>;

    async fn update_user(&self, id: i64, changes: &UserChanges)
    -> Result<UserRecord, RepoError>;

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), RepoError>;

    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateExchangeRateParams {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
}

#[async_trait]
pub trait ExchangeRatesRepo: Send + Sync {
    async fn create_rate(
        &self,
        params: CreateExchangeRateParams,
    ) -> Result<ExchangeRateRecord, RepoError>;

    async fn list_rates(&self) -> Result<Vec<ExchangeRateRecord>, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
