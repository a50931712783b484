//! Application services layer.

pub mod articles;
pub mod auth;
pub mod error;
pub mod exchange_rates;
pub mod likes;
pub mod pagination;
pub mod repos;
pub mod users;
