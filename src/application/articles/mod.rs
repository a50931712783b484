//! Article publishing, listing, and search.

mod highlight;
mod service;

pub use highlight::{HIGHLIGHT_MARKER, highlight_first};
pub use service::{ArticleService, CreateArticleCommand};
