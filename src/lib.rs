//! Pressroom: accounts, articles with cached paginated search, like counters,
//! and exchange-rate records over Postgres and Redis.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;
