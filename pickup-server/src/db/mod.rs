//! PostgreSQL access

pub mod businesses;
pub mod orders;
pub mod users;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::orders::error::StoreError;
use crate::orders::ports::Directory;

pub use orders::PgOrderStore;

/// [`Directory`] backed by the businesses and users tables
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn business_owner(&self, business_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        Ok(businesses::owner_of(&self.pool, business_id).await?)
    }

    async fn business_push_token(&self, business_id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(businesses::push_token(&self.pool, business_id).await?)
    }

    async fn customer_push_token(&self, customer_id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(users::push_token(&self.pool, customer_id).await?)
    }
}
