use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{CartItem, Order, OrderStatus};
use uuid::Uuid;

use super::*;
use super::error::{CacheError, PaymentError, StoreError};
use super::ports::{Directory, OrderStore, PaymentGateway, PinCache, StatusUpdate};
use crate::cache::MemoryPinCache;
use crate::notify::{NotificationDispatcher, NotificationSink, NotifyError, PushMessage};

mod test_lifecycle;

// ========================================================================
// In-memory collaborators
// ========================================================================

#[derive(Default)]
pub(super) struct MemoryStore {
    orders: Mutex<HashMap<Uuid, Order>>,
    pub fail_create: AtomicBool,
    pub create_calls: AtomicUsize,
    pub create_delay_ms: AtomicU64,
}

impl MemoryStore {
    pub fn count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn status_of(&self, id: Uuid) -> Option<OrderStatus> {
        self.orders.lock().unwrap().get(&id).map(|o| o.status)
    }

    pub fn insert(&self, order: Order) {
        self.orders.lock().unwrap().insert(order.id, order);
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order_atomic(&self, order: &Order) -> Result<(), StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.create_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        self.insert(order.clone());
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let order = self.orders.lock().unwrap().get(&id).cloned();
        // let concurrent callers interleave between read and write
        tokio::task::yield_now().await;
        Ok(order)
    }

    async fn update_status_if_current(
        &self,
        id: Uuid,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> Result<StatusUpdate, StoreError> {
        let mut orders = self.orders.lock().unwrap();
        match orders.get_mut(&id) {
            Some(order) if order.status == expected => {
                order.status = new;
                Ok(StatusUpdate::Applied)
            }
            _ => Ok(StatusUpdate::Conflict),
        }
    }

    async fn list_orders_by_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

/// Real in-memory cache with switchable failures
#[derive(Default)]
pub(super) struct FlakyPinCache {
    pub inner: MemoryPinCache,
    pub fail_set: AtomicBool,
    pub fail_get: AtomicBool,
    pub fail_delete: AtomicBool,
}

#[async_trait]
impl PinCache for FlakyPinCache {
    async fn set(&self, order_id: Uuid, pin: &str, ttl: Duration) -> Result<(), CacheError> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("set refused".into()));
        }
        self.inner.set(order_id, pin, ttl).await
    }

    async fn get(&self, order_id: Uuid) -> Result<Option<String>, CacheError> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("get refused".into()));
        }
        self.inner.get(order_id).await
    }

    async fn delete(&self, order_id: Uuid) -> Result<(), CacheError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("delete refused".into()));
        }
        self.inner.delete(order_id).await
    }
}

#[derive(Default)]
pub(super) struct FakeGateway {
    pub calls: AtomicUsize,
    pub decline: AtomicBool,
    pub charged: Mutex<Vec<i64>>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn minimum_charge_minor(&self) -> i64 {
        50
    }

    async fn charge(&self, amount_minor: i64) -> Result<String, PaymentError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.decline.load(Ordering::SeqCst) {
            return Err(PaymentError::Declined("card_declined".into()));
        }
        self.charged.lock().unwrap().push(amount_minor);
        Ok(format!("pi_test_{n}"))
    }
}

pub(super) struct FakeDirectory {
    owners: HashMap<Uuid, Uuid>,
    business_tokens: HashMap<Uuid, String>,
    customer_tokens: HashMap<Uuid, String>,
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn business_owner(&self, business_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        Ok(self.owners.get(&business_id).copied())
    }

    async fn business_push_token(&self, business_id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(self.business_tokens.get(&business_id).cloned())
    }

    async fn customer_push_token(&self, customer_id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(self.customer_tokens.get(&customer_id).cloned())
    }
}

#[derive(Default)]
pub(super) struct RecordingSink {
    pub sent: Mutex<Vec<(String, PushMessage)>>,
}

impl RecordingSink {
    pub fn kinds(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(token, msg)| (token.clone(), msg.data["type"].clone()))
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((token.to_string(), message.clone()));
        Ok(())
    }
}

// ========================================================================
// Harness
// ========================================================================

pub(super) struct Harness {
    pub workflow: OrderWorkflow,
    pub store: Arc<MemoryStore>,
    pub pins: Arc<FlakyPinCache>,
    pub gateway: Arc<FakeGateway>,
    pub sink: Arc<RecordingSink>,
    pub customer_id: Uuid,
    pub business_id: Uuid,
    pub owner_id: Uuid,
    pub other_business_id: Uuid,
}

pub(super) fn harness() -> Harness {
    let customer_id = Uuid::new_v4();
    let business_id = Uuid::new_v4();
    let owner_id = Uuid::new_v4();
    let other_business_id = Uuid::new_v4();

    let store = Arc::new(MemoryStore::default());
    let pins = Arc::new(FlakyPinCache::default());
    let gateway = Arc::new(FakeGateway::default());
    let sink = Arc::new(RecordingSink::default());
    let directory = Arc::new(FakeDirectory {
        owners: HashMap::from([(business_id, owner_id), (other_business_id, Uuid::new_v4())]),
        business_tokens: HashMap::from([(business_id, "business-device".to_string())]),
        customer_tokens: HashMap::from([(customer_id, "customer-device".to_string())]),
    });

    let notifier = NotificationDispatcher::spawn(
        sink.clone(),
        directory.clone(),
        16,
        Duration::from_secs(1),
    );
    let workflow = OrderWorkflow::new(
        store.clone(),
        pins.clone(),
        gateway.clone(),
        directory,
        notifier,
    );

    Harness {
        workflow,
        store,
        pins,
        gateway,
        sink,
        customer_id,
        business_id,
        owner_id,
        other_business_id,
    }
}

pub(super) fn item(name: &str, quantity: i32, price: Decimal) -> CartItem {
    CartItem {
        product_name: name.to_string(),
        quantity,
        unit_price: price,
    }
}

/// widget 2 × 9.99 + gadget 1 × 5.00
pub(super) fn example_cart() -> Vec<CartItem> {
    vec![
        item("widget", 2, Decimal::new(999, 2)),
        item("gadget", 1, Decimal::new(500, 2)),
    ]
}

/// Seed an order in an arbitrary status directly into the store.
pub(super) fn seed_order(h: &Harness, status: OrderStatus, pin: &str) -> Order {
    let order = Order {
        id: Uuid::new_v4(),
        customer_id: h.customer_id,
        business_id: h.business_id,
        total_amount: Decimal::new(1000, 2),
        status,
        pin: pin.to_string(),
        payment_ref: None,
        created_at: shared::util::now_millis(),
        updated_at: shared::util::now_millis(),
        items: Vec::new(),
    };
    h.store.insert(order.clone());
    order
}

/// Give the notification worker a chance to drain.
pub(super) async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
