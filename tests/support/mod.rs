#![allow(dead_code)]

use std::{
    cmp::Ordering as CmpOrdering,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use pressroom::{
    application::{
        articles::ArticleService,
        auth::{AuthService, CredentialError, PasswordHasher, TokenSigner},
        exchange_rates::ExchangeRateService,
        likes::LikeService,
        pagination::{PageLimits, PaginationState, SortDirection, SortField},
        repos::{
            ArticleQueryFilter, ArticleSlice, ArticlesRepo, ArticlesWriteRepo,
            CreateArticleParams, CreateExchangeRateParams, CreateUserParams, ExchangeRatesRepo,
            HealthRepo, RepoError, UserChanges, UsersRepo,
        },
        users::UserService,
    },
    cache::{ArticleCache, CacheBackend, CacheConfig, CacheError, MemoryCache},
    domain::{
        entities::{ArticleRecord, ExchangeRateRecord, UserRecord},
        types::{DeleteMode, UserStatus},
    },
    infra::{http::HttpState, security::JwtTokenSigner},
};
use time::OffsetDateTime;

pub const JWT_SECRET: &[u8] = b"integration-test-secret-0123456789";

/// Article store with a query counter and optional per-query latency.
#[derive(Default)]
pub struct MemoryArticles {
    rows: Mutex<Vec<ArticleRecord>>,
    page_queries: AtomicUsize,
    list_all_queries: AtomicUsize,
    latency: Option<Duration>,
}

impl MemoryArticles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn page_queries(&self) -> usize {
        self.page_queries.load(Ordering::SeqCst)
    }

    pub fn list_all_queries(&self) -> usize {
        self.list_all_queries.load(Ordering::SeqCst)
    }

    pub fn live_count(&self) -> usize {
        self.rows
            .lock()
            .expect("rows lock")
            .iter()
            .filter(|row| !row.is_deleted())
            .count()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().expect("rows lock").len()
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn eligible(row: &ArticleRecord, ids: &[i64], mode: DeleteMode) -> bool {
        ids.contains(&row.id) && (mode == DeleteMode::Hard || !row.is_deleted())
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl ArticlesRepo for MemoryArticles {
    async fn list_all_articles(&self) -> Result<Vec<ArticleRecord>, RepoError> {
        self.list_all_queries.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let mut rows: Vec<ArticleRecord> = self
            .rows
            .lock()
            .expect("rows lock")
            .iter()
            .filter(|row| !row.is_deleted())
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    async fn list_articles_page(
        &self,
        filter: &ArticleQueryFilter,
        page: &PaginationState,
    ) -> Result<ArticleSlice, RepoError> {
        self.page_queries.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let mut rows: Vec<ArticleRecord> = self
            .rows
            .lock()
            .expect("rows lock")
            .iter()
            .filter(|row| !row.is_deleted())
            .filter(|row| match filter.keyword.as_deref() {
                Some(keyword) => contains_ci(&row.title, keyword) || contains_ci(&row.content, keyword),
                None => true,
            })
            .cloned()
            .collect();

        let order = page.order();
        rows.sort_by(|a, b| {
            let primary = match order.field() {
                SortField::Id => a.id.cmp(&b.id),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::Title => a.title.cmp(&b.title),
            };
            let ordering = if primary == CmpOrdering::Equal {
                a.id.cmp(&b.id)
            } else {
                primary
            };
            match order.direction() {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(ArticleSlice { items, total })
    }

    async fn find_article(&self, id: i64) -> Result<Option<ArticleRecord>, RepoError> {
        Ok(self
            .rows
            .lock()
            .expect("rows lock")
            .iter()
            .find(|row| row.id == id && !row.is_deleted())
            .cloned())
    }

    async fn count_articles(&self, ids: &[i64], mode: DeleteMode) -> Result<u64, RepoError> {
        let rows = self.rows.lock().expect("rows lock");
        Ok(rows
            .iter()
            .filter(|row| Self::eligible(row, ids, mode))
            .count() as u64)
    }
}

#[async_trait]
impl ArticlesWriteRepo for MemoryArticles {
    async fn create_article(
        &self,
        params: CreateArticleParams,
    ) -> Result<ArticleRecord, RepoError> {
        let mut rows = self.rows.lock().expect("rows lock");
        let id = rows.iter().map(|row| row.id).max().unwrap_or(0) + 1;
        // Spread creation times so created_at ordering is deterministic.
        let created_at = OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(id);
        let record = ArticleRecord {
            id,
            title: params.title,
            content: params.content,
            preview: params.preview,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn delete_articles(&self, ids: &[i64], mode: DeleteMode) -> Result<u64, RepoError> {
        let mut rows = self.rows.lock().expect("rows lock");
        let actual = rows
            .iter()
            .filter(|row| Self::eligible(row, ids, mode))
            .count() as u64;
        let expected = ids.len() as u64;
        if actual != expected {
            return Err(RepoError::CountMismatch { expected, actual });
        }

        match mode {
            DeleteMode::Soft => {
                let now = OffsetDateTime::now_utc();
                for row in rows.iter_mut().filter(|row| ids.contains(&row.id)) {
                    row.deleted_at = Some(now);
                }
            }
            DeleteMode::Hard => rows.retain(|row| !ids.contains(&row.id)),
        }
        Ok(actual)
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<Vec<UserRecord>>,
}

impl MemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, id: i64, status: UserStatus) {
        let mut rows = self.rows.lock().expect("users lock");
        if let Some(row) = rows.iter_mut().find(|row| row.id == id) {
            row.status = status;
        }
    }
}

#[async_trait]
impl UsersRepo for MemoryUsers {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut rows = self.rows.lock().expect("users lock");
        if rows.iter().any(|row| row.username == params.username) {
            return Err(RepoError::Duplicate {
                constraint: "users_username_key".into(),
            });
        }
        let now = OffsetDateTime::now_utc();
        let record = UserRecord {
            id: rows.len() as i64 + 1,
            username: params.username,
            password_hash: params.password_hash,
            role: params.role,
            status: UserStatus::Active,
            email: None,
            avatar: None,
            nickname: None,
            bio: None,
            phone: None,
            created_at: now,
            updated_at: now,
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        let rows = self.rows.lock().expect("users lock");
        Ok(rows.iter().find(|row| row.id == id).cloned())
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, RepoError> {
        let rows = self.rows.lock().expect("users lock");
        Ok(rows.iter().find(|row| row.username == username).cloned())
    }

    async fn email_in_use_by_other(&self, email: &str, user_id: i64) -> Result<bool, RepoError> {
        let rows = self.rows.lock().expect("users lock");
        Ok(rows
            .iter()
            .any(|row| row.id != user_id && row.email.as_deref() == Some(email)))
    }

    async fn update_user(
        &self,
        id: i64,
        changes: &UserChanges,
    ) -> Result<UserRecord, RepoError> {
        let mut rows = self.rows.lock().expect("users lock");
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(RepoError::NotFound)?;
        if let Some(email) = &changes.email {
            row.email = Some(email.clone());
        }
        if let Some(avatar) = &changes.avatar {
            row.avatar = Some(avatar.clone());
        }
        if let Some(nickname) = &changes.nickname {
            row.nickname = Some(nickname.clone());
        }
        if let Some(bio) = &changes.bio {
            row.bio = Some(bio.clone());
        }
        if let Some(phone) = &changes.phone {
            row.phone = Some(phone.clone());
        }
        if let Some(role) = changes.role {
            row.role = role;
        }
        if let Some(status) = changes.status {
            row.status = status;
        }
        row.updated_at = OffsetDateTime::now_utc();
        Ok(row.clone())
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), RepoError> {
        let mut rows = self.rows.lock().expect("users lock");
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(RepoError::NotFound)?;
        row.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError> {
        Ok(self.rows.lock().expect("users lock").clone())
    }
}

#[derive(Default)]
pub struct MemoryRates {
    rows: Mutex<Vec<ExchangeRateRecord>>,
}

#[async_trait]
impl ExchangeRatesRepo for MemoryRates {
    async fn create_rate(
        &self,
        params: CreateExchangeRateParams,
    ) -> Result<ExchangeRateRecord, RepoError> {
        let mut rows = self.rows.lock().expect("rates lock");
        let record = ExchangeRateRecord {
            id: rows.len() as i64 + 1,
            from_currency: params.from_currency,
            to_currency: params.to_currency,
            rate: params.rate,
            date: OffsetDateTime::now_utc(),
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn list_rates(&self) -> Result<Vec<ExchangeRateRecord>, RepoError> {
        Ok(self.rows.lock().expect("rates lock").clone())
    }
}

pub struct StaticHealth {
    pub healthy: bool,
}

#[async_trait]
impl HealthRepo for StaticHealth {
    async fn ping(&self) -> Result<(), RepoError> {
        if self.healthy {
            Ok(())
        } else {
            Err(RepoError::Timeout)
        }
    }
}

/// Cache backend whose every command fails, as if the server were down.
pub struct FailingCache;

#[async_trait]
impl CacheBackend for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn delete_prefix(&self, _prefix: &str) -> Result<usize, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn incr(&self, _key: &str) -> Result<i64, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }
}

/// Reversible stand-in for Argon2 so tests stay fast.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, CredentialError> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, CredentialError> {
        hash.strip_prefix("plain$")
            .map(|stored| stored == password)
            .ok_or_else(|| CredentialError::Hash("unknown hash format".into()))
    }
}

pub fn article_service(
    articles: Arc<MemoryArticles>,
    backend: Arc<dyn CacheBackend>,
) -> ArticleService {
    let cache = Arc::new(ArticleCache::new(backend, CacheConfig::default()));
    ArticleService::new(articles.clone(), articles, cache)
}

pub async fn seed_articles(service: &ArticleService, titles: &[(&str, &str)]) {
    for (title, content) in titles {
        service
            .create(pressroom::application::articles::CreateArticleCommand {
                title: title.to_string(),
                content: content.to_string(),
                preview: format!("{title} preview"),
            })
            .await
            .expect("seed article");
    }
}

pub struct TestApp {
    pub state: HttpState,
    pub articles: Arc<MemoryArticles>,
    pub users: Arc<MemoryUsers>,
    pub backend: Arc<MemoryCache>,
}

pub fn test_app() -> TestApp {
    let articles = Arc::new(MemoryArticles::new());
    let users = Arc::new(MemoryUsers::new());
    let backend = Arc::new(MemoryCache::new());
    let hasher: Arc<dyn PasswordHasher> = Arc::new(PlainHasher);
    let signer: Arc<dyn TokenSigner> =
        Arc::new(JwtTokenSigner::new(JWT_SECRET, Duration::from_secs(3600)));

    let state = HttpState {
        articles: Arc::new(article_service(articles.clone(), backend.clone())),
        likes: Arc::new(LikeService::new(backend.clone())),
        auth: Arc::new(AuthService::new(users.clone(), hasher.clone(), signer)),
        users: Arc::new(UserService::new(users.clone(), hasher)),
        exchange_rates: Arc::new(ExchangeRateService::new(Arc::new(MemoryRates::default()))),
        health: Arc::new(StaticHealth { healthy: true }),
        page_limits: PageLimits::default(),
    };

    TestApp {
        state,
        articles,
        users,
        backend,
    }
}
