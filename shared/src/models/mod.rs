//! Data models
//!
//! Shared between the pickup server and its clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are UUID v4; timestamps are Unix milliseconds.

pub mod business;
pub mod order;
pub mod user;

// Re-exports
pub use business::*;
pub use order::*;
pub use user::*;
