//! Request and response payloads shared by the Pressroom server and its clients.

use serde::{Deserialize, Deserializer, Serialize};

/// Account role stored alongside every user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "user_role", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(UserRole::Admin),
            "user" => Some(UserRole::User),
            _ => None,
        }
    }
}

/// Whether an account may sign in and act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "user_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Active,
    Disabled,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Disabled => "disabled",
        }
    }
}

/// How a batch delete removes rows: `soft` stamps a deletion time, `hard` removes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    #[default]
    Soft,
    Hard,
}

impl DeleteMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DeleteMode::Soft => "soft",
            DeleteMode::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub preview: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    pub content: String,
    pub preview: String,
}

/// Query string accepted by the paginated listing endpoint.
///
/// Unparseable `page` or `page_size` values decode as absent so the server
/// applies its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleListQuery {
    #[serde(deserialize_with = "lenient_u32")]
    pub page: Option<u32>,
    #[serde(alias = "pageSize", deserialize_with = "lenient_u32")]
    pub page_size: Option<u32>,
    pub order: Option<String>,
    pub keyword: Option<String>,
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(value)) => u32::try_from(value).ok(),
        Some(Raw::Text(value)) => value.trim().parse().ok(),
        Some(Raw::Other(_)) | None => None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// One page of articles. `keyword` and `is_search` are present only for keyword searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticlePage {
    pub articles: Vec<ArticleView>,
    pub pagination: PaginationInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_search: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchDeleteRequest {
    pub ids: Vec<i64>,
    #[serde(default)]
    pub hard: bool,
}

impl BatchDeleteRequest {
    pub fn mode(&self) -> DeleteMode {
        if self.hard {
            DeleteMode::Hard
        } else {
            DeleteMode::Soft
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDeleteResponse {
    pub deleted: u64,
    pub mode: DeleteMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeCountResponse {
    pub article_id: i64,
    pub likes: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub nickname: String,
    pub bio: String,
    pub phone: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Self-service profile edit. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub nickname: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
}

/// Administrative edit of another account, including role and status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminUpdateUserRequest {
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub nickname: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateView {
    #[serde(rename = "_id")]
    pub id: i64,
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
    pub date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExchangeRateRequest {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_accepts_camel_case_alias() {
        let query: ArticleListQuery =
            serde_json::from_str(r#"{"page":2,"pageSize":25}"#).expect("query decodes");
        assert_eq!(query.page, Some(2));
        assert_eq!(query.page_size, Some(25));
    }

    #[test]
    fn unparseable_page_numbers_decode_as_absent() {
        let query: ArticleListQuery =
            serde_json::from_str(r#"{"page":"abc","page_size":-3,"order":"id"}"#)
                .expect("query decodes");
        assert_eq!(query.page, None);
        assert_eq!(query.page_size, None);
        assert_eq!(query.order.as_deref(), Some("id"));

        let query: ArticleListQuery =
            serde_json::from_str(r#"{"page":" 3 "}"#).expect("query decodes");
        assert_eq!(query.page, Some(3));
    }

    #[test]
    fn plain_listing_omits_search_fields() {
        let page = ArticlePage {
            articles: Vec::new(),
            pagination: PaginationInfo {
                page: 1,
                page_size: 10,
                total: 0,
                total_pages: 0,
                has_next: false,
                has_prev: false,
            },
            keyword: None,
            is_search: None,
        };
        let json = serde_json::to_value(&page).expect("page encodes");
        assert!(json.get("keyword").is_none());
        assert!(json.get("is_search").is_none());
    }

    #[test]
    fn exchange_rate_uses_wire_field_names() {
        let view = ExchangeRateView {
            id: 7,
            from_currency: "USD".into(),
            to_currency: "EUR".into(),
            rate: 0.92,
            date: "2024-01-01 00:00:00".into(),
        };
        let json = serde_json::to_value(&view).expect("rate encodes");
        assert_eq!(json["_id"], 7);
        assert_eq!(json["fromCurrency"], "USD");
        assert_eq!(json["toCurrency"], "EUR");
    }

    #[test]
    fn batch_delete_defaults_to_soft_mode() {
        let request: BatchDeleteRequest =
            serde_json::from_str(r#"{"ids":[1,2]}"#).expect("request decodes");
        assert_eq!(request.mode(), DeleteMode::Soft);
    }
}
