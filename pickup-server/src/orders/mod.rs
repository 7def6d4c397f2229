//! Pickup order lifecycle
//!
//! - `aggregate`: cart validation and pricing
//! - `pin`: one-time pickup PIN
//! - `ports`: collaborator traits (store, PIN cache, payments, directory)
//! - `engine`: the workflow itself

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod pin;
pub mod ports;

pub use engine::OrderWorkflow;
pub use error::OrderError;

#[cfg(test)]
mod tests;
