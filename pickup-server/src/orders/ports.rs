//! Collaborator seams of the order workflow
//!
//! Production adapters live in `db`, `cache` and `stripe`; tests swap in
//! in-memory doubles.

use async_trait::async_trait;
use shared::models::{Order, OrderStatus};
use std::time::Duration;
use uuid::Uuid;

use super::error::{CacheError, PaymentError, StoreError};

/// Outcome of a compare-and-set status update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Applied,
    /// The stored status no longer matched the expected one
    Conflict,
}

/// Durable, transactional order persistence
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert header and every line item in one transaction.
    async fn create_order_atomic(&self, order: &Order) -> Result<(), StoreError>;

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Move `id` from `expected` to `new` only if it is still `expected`.
    async fn update_status_if_current(
        &self,
        id: Uuid,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> Result<StatusUpdate, StoreError>;

    /// Newest first.
    async fn list_orders_by_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, StoreError>;
}

/// Expiring shadow copy of order PINs
#[async_trait]
pub trait PinCache: Send + Sync {
    async fn set(&self, order_id: Uuid, pin: &str, ttl: Duration) -> Result<(), CacheError>;

    /// `Ok(None)` on miss or expiry.
    async fn get(&self, order_id: Uuid) -> Result<Option<String>, CacheError>;

    async fn delete(&self, order_id: Uuid) -> Result<(), CacheError>;
}

/// Card charge
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Smallest chargeable amount in minor units.
    fn minimum_charge_minor(&self) -> i64;

    /// Charge `amount_minor` and return the provider's payment reference.
    async fn charge(&self, amount_minor: i64) -> Result<String, PaymentError>;
}

/// Lookups the workflow needs about businesses and customers
#[async_trait]
pub trait Directory: Send + Sync {
    async fn business_owner(&self, business_id: Uuid) -> Result<Option<Uuid>, StoreError>;

    async fn business_push_token(&self, business_id: Uuid) -> Result<Option<String>, StoreError>;

    async fn customer_push_token(&self, customer_id: Uuid) -> Result<Option<String>, StoreError>;
}
