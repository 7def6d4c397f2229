//! Order Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order lifecycle status
///
/// `pending → paid → ready → completed`, with `cancelled` reachable from
/// `pending`. There are no backward transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "order_status", rename_all = "lowercase"))]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Ready => "ready",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// The pickup PIN can only be redeemed while the order is paid or ready
    pub fn is_redeemable(&self) -> bool {
        matches!(self, Self::Paid | Self::Ready)
    }

    /// Completed and cancelled orders never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order line item (independent table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

impl OrderItem {
    /// quantity × unit price, exact; `None` on overflow
    pub fn subtotal(&self) -> Option<Decimal> {
        Decimal::from(self.quantity).checked_mul(self.unit_price)
    }
}

/// Order aggregate: header plus its line items
///
/// The PIN is write-once and never leaves the server through a read;
/// it is handed to the customer exactly once via [`OrderCreated`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub business_id: Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    #[serde(skip_serializing, default)]
    pub pin: String,
    pub payment_ref: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,

    // -- Relations (populated by application code, skipped by FromRow) --
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// One cart line as submitted by a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

/// Create order payload
///
/// Carries no total: the total is always computed server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub business_id: Uuid,
    pub items: Vec<CartItem>,
}

/// Response of a successful create: the order plus its plaintext PIN
#[derive(Debug, Clone, Serialize)]
pub struct OrderCreated {
    #[serde(flatten)]
    pub order: Order,
    pub pin: String,
}

/// Validate PIN payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinValidation {
    pub pin: String,
    pub business_id: Uuid,
}

/// Mark-ready payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReady {
    pub business_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> Order {
        let id = Uuid::new_v4();
        Order {
            id,
            customer_id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            total_amount: Decimal::new(2498, 2),
            status: OrderStatus::Paid,
            pin: "042137".to_string(),
            payment_ref: Some("pi_test".to_string()),
            created_at: 1,
            updated_at: 1,
            items: vec![OrderItem {
                id: Uuid::new_v4(),
                order_id: id,
                product_name: "widget".to_string(),
                quantity: 2,
                unit_price: Decimal::new(999, 2),
            }],
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&OrderStatus::Paid).unwrap(), "\"paid\"");
        let s: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(s, OrderStatus::Cancelled);
        assert_eq!(OrderStatus::Completed.to_string(), "completed");
    }

    #[test]
    fn redeemable_only_when_paid_or_ready() {
        assert!(OrderStatus::Paid.is_redeemable());
        assert!(OrderStatus::Ready.is_redeemable());
        assert!(!OrderStatus::Pending.is_redeemable());
        assert!(!OrderStatus::Completed.is_redeemable());
        assert!(!OrderStatus::Cancelled.is_redeemable());
    }

    #[test]
    fn item_subtotal_is_exact() {
        let order = sample_order();
        assert_eq!(order.items[0].subtotal(), Some(Decimal::new(1998, 2)));
    }

    #[test]
    fn order_read_never_contains_pin() {
        let json = serde_json::to_value(sample_order()).unwrap();
        assert!(json.get("pin").is_none());
        assert_eq!(json["status"], "paid");
        assert_eq!(json["total_amount"], 24.98);
    }

    #[test]
    fn created_response_carries_pin_once() {
        let order = sample_order();
        let created = OrderCreated {
            pin: order.pin.clone(),
            order,
        };
        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(json["pin"], "042137");
        assert_eq!(json["status"], "paid");
        assert!(json.get("order").is_none());
    }
}
