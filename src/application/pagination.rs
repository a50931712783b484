//! Offset pagination for article listings.

use std::{fmt, str::FromStr};

use pressroom_api_types::PaginationInfo;
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("unknown sort order `{0}`")]
    UnknownOrder(String),
}

/// Page-size policy applied when resolving caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Id,
    CreatedAt,
    Title,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::CreatedAt => "created_at",
            SortField::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Whitelisted ordering for paginated listings. Renders as `"<field> <direction>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArticleOrder {
    field: SortField,
    direction: SortDirection,
}

impl ArticleOrder {
    pub const fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn field(&self) -> SortField {
        self.field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

impl Default for ArticleOrder {
    fn default() -> Self {
        Self::new(SortField::CreatedAt, SortDirection::Desc)
    }
}

impl fmt::Display for ArticleOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field.as_str(), self.direction.as_str())
    }
}

impl FromStr for ArticleOrder {
    type Err = PaginationError;

    /// Accepts `field`, `field asc|desc`, `field:asc|desc`, or `-field` for descending.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let unknown = || PaginationError::UnknownOrder(raw.to_string());
        let normalized = raw.trim().to_ascii_lowercase();

        let (field, direction) = if let Some(field) = normalized.strip_prefix('-') {
            (field.trim(), Some("desc"))
        } else {
            let mut parts = normalized
                .split(|ch: char| ch.is_whitespace() || ch == ':')
                .filter(|part| !part.is_empty());
            let field = parts.next().ok_or_else(unknown)?;
            let direction = parts.next();
            if parts.next().is_some() {
                return Err(unknown());
            }
            (field, direction)
        };

        let field = match field {
            "id" => SortField::Id,
            "created_at" => SortField::CreatedAt,
            "title" => SortField::Title,
            _ => return Err(unknown()),
        };
        let direction = match direction {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(_) => return Err(unknown()),
        };

        Ok(Self::new(field, direction))
    }
}

/// Resolved pagination request: page is at least 1, page size within limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaginationState {
    page: u32,
    page_size: u32,
    order: ArticleOrder,
}

impl PaginationState {
    pub fn new(page: u32, page_size: u32, order: ArticleOrder) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
            order,
        }
    }

    /// Apply defaults and caps to raw caller input.
    pub fn resolve(
        page: Option<u32>,
        page_size: Option<u32>,
        order: Option<&str>,
        limits: PageLimits,
    ) -> Result<Self, PaginationError> {
        let page = page.filter(|value| *value > 0).unwrap_or(1);
        let page_size = page_size
            .filter(|value| *value > 0)
            .unwrap_or(limits.default_page_size)
            .min(limits.max_page_size);
        let order = match order.map(str::trim).filter(|value| !value.is_empty()) {
            Some(raw) => raw.parse()?,
            None => ArticleOrder::default(),
        };

        Ok(Self::new(page, page_size, order))
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn order(&self) -> ArticleOrder {
        self.order
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }

    pub fn info(&self, total: u64) -> PaginationInfo {
        let total_pages = total.div_ceil(u64::from(self.page_size));
        PaginationInfo {
            page: self.page,
            page_size: self.page_size,
            total,
            total_pages,
            has_next: u64::from(self.page) < total_pages,
            has_prev: self.page > 1,
        }
    }
}

/// Trim a search keyword; blank input means "no search".
pub fn normalize_keyword(keyword: Option<&str>) -> Option<String> {
    keyword
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
