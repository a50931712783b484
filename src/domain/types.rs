//! Shared domain enumerations aligned with persisted database enums.

pub use pressroom_api_types::{DeleteMode, UserRole, UserStatus};
