//! Infrastructure adapters and runtime bootstrap.

pub mod db;
pub mod error;
pub mod http;
pub mod redis;
pub mod security;
pub mod telemetry;
