//! Order workflow: create, redeem, mark ready, cancel, read

use std::sync::Arc;
use std::time::Duration;

use shared::models::{CartItem, Order, OrderCreated, OrderStatus};
use shared::util::now_millis;
use uuid::Uuid;

use super::aggregate;
use super::error::OrderError;
use super::pin;
use super::ports::{Directory, OrderStore, PaymentGateway, PinCache, StatusUpdate};
use crate::notify::{NotificationDispatcher, NotificationJob};

/// Default lifetime of a cached PIN
pub const DEFAULT_PIN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Orchestrates the order lifecycle over its collaborators
#[derive(Clone)]
pub struct OrderWorkflow {
    store: Arc<dyn OrderStore>,
    pins: Arc<dyn PinCache>,
    payments: Arc<dyn PaymentGateway>,
    directory: Arc<dyn Directory>,
    notifier: NotificationDispatcher,
    pin_ttl: Duration,
}

impl OrderWorkflow {
    pub fn new(
        store: Arc<dyn OrderStore>,
        pins: Arc<dyn PinCache>,
        payments: Arc<dyn PaymentGateway>,
        directory: Arc<dyn Directory>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            store,
            pins,
            payments,
            directory,
            notifier,
            pin_ttl: DEFAULT_PIN_TTL,
        }
    }

    pub fn with_pin_ttl(mut self, ttl: Duration) -> Self {
        self.pin_ttl = ttl;
        self
    }

    /// Price, charge, persist and announce a new order.
    ///
    /// Returns the stored order together with the plaintext PIN; this is the
    /// only time the PIN leaves the server.
    pub async fn create(
        &self,
        customer_id: Uuid,
        business_id: Uuid,
        cart: &[CartItem],
    ) -> Result<OrderCreated, OrderError> {
        let priced = aggregate::price_cart(cart)?;
        let amount_minor = priced.amount_minor()?;
        let minimum_minor = self.payments.minimum_charge_minor();
        if amount_minor < minimum_minor {
            return Err(OrderError::AmountTooLow {
                amount_minor,
                minimum_minor,
            });
        }

        // Drawn before charging so an entropy failure never leaves a charge behind
        let pin = pin::generate()?;

        // Detached: once charged, the order is recorded even if the request is dropped
        let workflow = self.clone();
        tokio::spawn(async move {
            workflow
                .charge_and_record(priced, amount_minor, pin, customer_id, business_id)
                .await
        })
        .await
        .map_err(|e| {
            tracing::error!(
                customer_id = %customer_id,
                business_id = %business_id,
                amount_minor,
                error = %e,
                "Order creation task aborted"
            );
            OrderError::Aborted(e.to_string())
        })?
    }

    async fn charge_and_record(
        &self,
        priced: aggregate::PricedCart,
        amount_minor: i64,
        pin: String,
        customer_id: Uuid,
        business_id: Uuid,
    ) -> Result<OrderCreated, OrderError> {
        let payment_ref = self
            .payments
            .charge(amount_minor)
            .await
            .map_err(OrderError::Payment)?;

        let order = priced.into_paid_order(
            customer_id,
            business_id,
            pin.clone(),
            payment_ref.clone(),
            now_millis(),
        );

        if let Err(source) = self.store.create_order_atomic(&order).await {
            tracing::error!(
                order_id = %order.id,
                payment_ref = %payment_ref,
                amount_minor,
                customer_id = %customer_id,
                business_id = %business_id,
                error = %source,
                "Order charged but not persisted, needs reconciliation"
            );
            return Err(OrderError::PersistedAfterPayment {
                order_id: order.id,
                payment_ref,
                source,
            });
        }

        // Surfaced: a create that cannot shadow its PIN fails
        self.pins
            .set(order.id, &pin, self.pin_ttl)
            .await
            .map_err(OrderError::PinCache)?;

        tracing::info!(
            order_id = %order.id,
            business_id = %business_id,
            total = %order.total_amount,
            items = order.items.len(),
            "Order created"
        );

        self.notifier.submit(NotificationJob::NewOrder {
            business_id,
            order_id: order.id,
            total: order.total_amount,
        });

        Ok(OrderCreated { order, pin })
    }

    /// Redeem the pickup PIN on behalf of `claimer_business_id` and complete the order.
    pub async fn validate_pin(
        &self,
        order_id: Uuid,
        supplied_pin: &str,
        claimer_business_id: Uuid,
    ) -> Result<Order, OrderError> {
        let mut order = self.load(order_id).await?;

        if order.business_id != claimer_business_id {
            return Err(OrderError::Forbidden("order does not belong to your business"));
        }
        if !order.status.is_redeemable() {
            return Err(OrderError::invalid_state("completed", order.status));
        }

        let expected = match self.pins.get(order_id).await {
            Ok(Some(cached)) => cached,
            Ok(None) => order.pin.clone(),
            Err(e) => {
                tracing::warn!(order_id = %order_id, error = %e, "PIN cache read failed, using stored PIN");
                order.pin.clone()
            }
        };

        if !pin::matches(&expected, supplied_pin) {
            tracing::info!(order_id = %order_id, "PIN mismatch");
            return Err(OrderError::InvalidPin);
        }

        self.transition(&mut order, OrderStatus::Completed, "completed")
            .await?;

        // Log-and-continue: the durable status already forbids reuse
        if let Err(e) = self.pins.delete(order_id).await {
            tracing::warn!(order_id = %order_id, error = %e, "Failed to evict redeemed PIN");
        }

        tracing::info!(order_id = %order_id, business_id = %claimer_business_id, "Order picked up");
        Ok(order)
    }

    /// Business signals the order can be collected.
    pub async fn mark_ready(
        &self,
        order_id: Uuid,
        claimer_business_id: Uuid,
    ) -> Result<Order, OrderError> {
        let mut order = self.load(order_id).await?;

        if order.business_id != claimer_business_id {
            return Err(OrderError::Forbidden("order does not belong to your business"));
        }
        if order.status != OrderStatus::Paid {
            return Err(OrderError::invalid_state("marked ready", order.status));
        }

        self.transition(&mut order, OrderStatus::Ready, "marked ready")
            .await?;

        self.notifier.submit(NotificationJob::OrderReady {
            customer_id: order.customer_id,
            order_id,
        });
        Ok(order)
    }

    /// Customer cancels their own order.
    ///
    /// Only unpaid orders can be cancelled; paid ones would need a refund.
    pub async fn cancel(&self, order_id: Uuid, customer_id: Uuid) -> Result<Order, OrderError> {
        let mut order = self.load(order_id).await?;

        if order.customer_id != customer_id {
            return Err(OrderError::Forbidden("order does not belong to you"));
        }

        match order.status {
            OrderStatus::Pending => {}
            OrderStatus::Paid | OrderStatus::Ready => {
                return Err(OrderError::RefundRequired(order.status));
            }
            status => return Err(OrderError::invalid_state("cancelled", status)),
        }

        self.transition(&mut order, OrderStatus::Cancelled, "cancelled")
            .await?;

        if let Err(e) = self.pins.delete(order_id).await {
            tracing::warn!(order_id = %order_id, error = %e, "Failed to evict cancelled PIN");
        }

        tracing::info!(order_id = %order_id, "Order cancelled");
        Ok(order)
    }

    /// Visible to the ordering customer and to the owner of the order's business.
    pub async fn get_order(&self, order_id: Uuid, caller_id: Uuid) -> Result<Order, OrderError> {
        let order = self.load(order_id).await?;
        if order.customer_id == caller_id {
            return Ok(order);
        }
        match self.directory.business_owner(order.business_id).await? {
            Some(owner) if owner == caller_id => Ok(order),
            _ => Err(OrderError::NotFound),
        }
    }

    /// The customer's orders, newest first.
    pub async fn list_mine(&self, customer_id: Uuid) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list_orders_by_customer(customer_id).await?)
    }

    async fn load(&self, order_id: Uuid) -> Result<Order, OrderError> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or(OrderError::NotFound)
    }

    /// Compare-and-set from the observed status; a lost race reports the winner's status.
    async fn transition(
        &self,
        order: &mut Order,
        to: OrderStatus,
        action: &'static str,
    ) -> Result<(), OrderError> {
        match self
            .store
            .update_status_if_current(order.id, order.status, to)
            .await?
        {
            StatusUpdate::Applied => {
                order.status = to;
                order.updated_at = now_millis();
                Ok(())
            }
            StatusUpdate::Conflict => {
                let current = self.load(order.id).await?;
                tracing::info!(
                    order_id = %order.id,
                    observed = %order.status,
                    current = %current.status,
                    "Concurrent status change"
                );
                Err(OrderError::invalid_state(action, current.status))
            }
        }
    }
}
