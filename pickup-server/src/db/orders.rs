//! Order persistence (header + line items)

use async_trait::async_trait;
use shared::models::{Order, OrderItem, OrderStatus};
use shared::util::now_millis;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::orders::error::StoreError;
use crate::orders::ports::{OrderStore, StatusUpdate};

const ORDER_COLUMNS: &str = "id, customer_id, business_id, total_amount, status, pin, payment_ref, created_at, updated_at";

/// PostgreSQL-backed [`OrderStore`]
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create_order_atomic(&self, order: &Order) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, customer_id, business_id, total_amount, status, pin, payment_ref, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(order.id)
        .bind(order.customer_id)
        .bind(order.business_id)
        .bind(order.total_amount)
        .bind(order.status)
        .bind(&order.pin)
        .bind(&order.payment_ref)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, position, product_name, quantity, unit_price)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(item.id)
            .bind(order.id)
            .bind(position as i32)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        // Dropping an uncommitted transaction rolls it back
        tx.commit().await?;
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let order: Option<Order> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(mut order) = order else {
            return Ok(None);
        };

        order.items = sqlx::query_as(
            "SELECT id, order_id, product_name, quantity, unit_price
             FROM order_items WHERE order_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(order))
    }

    async fn update_status_if_current(
        &self,
        id: Uuid,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> Result<StatusUpdate, StoreError> {
        let result = sqlx::query(
            "UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4",
        )
        .bind(new)
        .bind(now_millis())
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(if result.rows_affected() == 1 {
            StatusUpdate::Applied
        } else {
            StatusUpdate::Conflict
        })
    }

    async fn list_orders_by_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items: Vec<OrderItem> = sqlx::query_as(
            "SELECT id, order_id, product_name, quantity, unit_price
             FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, position",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }
        for order in &mut orders {
            order.items = by_order.remove(&order.id).unwrap_or_default();
        }

        Ok(orders)
    }
}
