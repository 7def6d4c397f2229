//! Order aggregate assembly: cart validation, pricing and record construction

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use shared::models::{CartItem, Order, OrderItem, OrderStatus};
use uuid::Uuid;

use super::error::OrderError;

/// Money columns are NUMERIC(12, 2)
const MONEY_SCALE: u32 = 2;
const MAX_ITEMS: usize = 100;
const MAX_PRODUCT_NAME_LEN: usize = 200;

/// Maximum allowed price per item (1,000,000.00)
const MAX_PRICE: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 2);
/// Maximum allowed quantity per item
const MAX_QUANTITY: i32 = 9999;
/// Largest total a NUMERIC(12, 2) column holds (9,999,999,999.99)
const MAX_ORDER_TOTAL: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// A validated cart with server-computed totals, not yet charged or persisted
#[derive(Debug, Clone)]
pub struct PricedCart {
    pub order_id: Uuid,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
}

/// Validate a cart and price it.
///
/// The total is the exact sum of `quantity × unit_price`; any total the
/// client may have computed is never consulted.
pub fn price_cart(cart: &[CartItem]) -> Result<PricedCart, OrderError> {
    if cart.is_empty() {
        return Err(OrderError::EmptyCart);
    }
    if cart.len() > MAX_ITEMS {
        return Err(OrderError::Validation(format!(
            "order cannot contain more than {MAX_ITEMS} items"
        )));
    }

    let order_id = Uuid::new_v4();
    let mut items = Vec::with_capacity(cart.len());
    let mut total = Decimal::ZERO;

    for (idx, line) in cart.iter().enumerate() {
        let name = line.product_name.trim();
        if name.is_empty() {
            return Err(OrderError::Validation(format!(
                "item {idx}: product name is required"
            )));
        }
        if name.chars().count() > MAX_PRODUCT_NAME_LEN {
            return Err(OrderError::Validation(format!(
                "item {idx}: product name is too long"
            )));
        }
        if line.quantity < 1 {
            return Err(OrderError::Validation(format!(
                "item {idx}: quantity must be at least 1"
            )));
        }
        if line.quantity > MAX_QUANTITY {
            return Err(OrderError::Validation(format!(
                "item {idx}: quantity exceeds maximum allowed value of {MAX_QUANTITY}"
            )));
        }
        if line.unit_price <= Decimal::ZERO {
            return Err(OrderError::Validation(format!(
                "item {idx}: unit price must be positive"
            )));
        }
        if line.unit_price > MAX_PRICE {
            return Err(OrderError::Validation(format!(
                "item {idx}: unit price exceeds maximum allowed value of {MAX_PRICE}"
            )));
        }
        if line.unit_price.normalize().scale() > MONEY_SCALE {
            return Err(OrderError::Validation(format!(
                "item {idx}: unit price cannot have more than {MONEY_SCALE} decimal places"
            )));
        }

        let item = OrderItem {
            id: Uuid::new_v4(),
            order_id,
            product_name: name.to_string(),
            quantity: line.quantity,
            unit_price: line.unit_price,
        };
        total = item
            .subtotal()
            .and_then(|subtotal| total.checked_add(subtotal))
            .filter(|sum| *sum <= MAX_ORDER_TOTAL)
            .ok_or_else(|| {
                OrderError::Validation(format!(
                    "order total exceeds maximum allowed value of {MAX_ORDER_TOTAL}"
                ))
            })?;
        items.push(item);
    }

    Ok(PricedCart {
        order_id,
        items,
        total,
    })
}

/// Convert a decimal amount to minor units (cents), rounding half away from zero.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

impl PricedCart {
    pub fn amount_minor(&self) -> Result<i64, OrderError> {
        to_minor_units(self.total)
            .ok_or_else(|| OrderError::Validation("order total is too large".into()))
    }

    /// Build the paid order record.
    pub fn into_paid_order(
        self,
        customer_id: Uuid,
        business_id: Uuid,
        pin: String,
        payment_ref: String,
        now: i64,
    ) -> Order {
        Order {
            id: self.order_id,
            customer_id,
            business_id,
            total_amount: self.total,
            status: OrderStatus::Paid,
            pin,
            payment_ref: Some(payment_ref),
            created_at: now,
            updated_at: now,
            items: self.items,
        }
    }
}
