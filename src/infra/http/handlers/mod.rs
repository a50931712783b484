//! Route handlers grouped by resource.
//!
//! Handlers stay thin: decode the request, call one service method, and
//! convert `AppError` into `ApiError`.

mod articles;
mod auth;
mod exchange_rates;
mod health;
mod users;

pub use articles::*;
pub use auth::*;
pub use exchange_rates::*;
pub use health::*;
pub use users::*;
