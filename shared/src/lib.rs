//! Shared types for the local-pickup marketplace
//!
//! Common types used by the server and its clients: the unified error
//! system, the API response envelope, and the order/business/user models.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
