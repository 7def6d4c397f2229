use super::*;

// ========================================================================
// End-to-end: create → read → redeem → redeem again
// ========================================================================

#[tokio::test]
async fn test_full_pickup_flow() {
    let h = harness();

    let created = h
        .workflow
        .create(h.customer_id, h.business_id, &example_cart())
        .await
        .unwrap();
    assert_eq!(created.order.total_amount, Decimal::new(2498, 2));
    assert!(created.pin.len() == 6 && created.pin.bytes().all(|b| b.is_ascii_digit()));

    let id = created.order.id;
    let read = h.workflow.get_order(id, h.customer_id).await.unwrap();
    let json = serde_json::to_value(&read).unwrap();
    assert_eq!(json["status"], "paid");
    assert_eq!(json["total_amount"], 24.98);
    assert!(json.get("pin").is_none());

    let completed = h
        .workflow
        .validate_pin(id, &created.pin, h.business_id)
        .await
        .unwrap();
    assert_eq!(serde_json::to_value(&completed).unwrap()["status"], "completed");

    let err = h
        .workflow
        .validate_pin(id, &created.pin, h.business_id)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "order cannot be completed in status completed"
    );
}

// ========================================================================
// Mark ready
// ========================================================================

#[tokio::test]
async fn test_mark_ready_notifies_customer() {
    let h = harness();
    let created = h
        .workflow
        .create(h.customer_id, h.business_id, &example_cart())
        .await
        .unwrap();

    let order = h
        .workflow
        .mark_ready(created.order.id, h.business_id)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Ready);
    assert_eq!(h.store.status_of(order.id), Some(OrderStatus::Ready));

    settle().await;
    assert_eq!(
        h.sink.kinds(),
        vec![
            ("business-device".to_string(), "new_order".to_string()),
            ("customer-device".to_string(), "order_ready".to_string()),
        ]
    );

    // ready orders are still redeemable
    h.workflow
        .validate_pin(order.id, &created.pin, h.business_id)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_mark_ready_requires_paid_and_owner() {
    let h = harness();
    let paid = seed_order(&h, OrderStatus::Paid, "123456");

    let err = h
        .workflow
        .mark_ready(paid.id, h.other_business_id)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::Forbidden(_)));

    let completed = seed_order(&h, OrderStatus::Completed, "123456");
    let err = h
        .workflow
        .mark_ready(completed.id, h.business_id)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "order cannot be marked ready in status completed"
    );
}

// ========================================================================
// Cancel
// ========================================================================

#[tokio::test]
async fn test_cancel_pending_order() {
    let h = harness();
    let order = seed_order(&h, OrderStatus::Pending, "123456");
    h.pins
        .inner
        .set(order.id, "123456", Duration::from_secs(60))
        .await
        .unwrap();

    let cancelled = h.workflow.cancel(order.id, h.customer_id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(h.store.status_of(order.id), Some(OrderStatus::Cancelled));
    assert_eq!(h.pins.inner.get(order.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_cancel_paid_order_requires_refund() {
    let h = harness();
    for status in [OrderStatus::Paid, OrderStatus::Ready] {
        let order = seed_order(&h, status, "123456");
        let err = h.workflow.cancel(order.id, h.customer_id).await.unwrap_err();
        assert!(matches!(err, OrderError::RefundRequired(s) if s == status));
        assert_eq!(h.store.status_of(order.id), Some(status));
    }
}

#[tokio::test]
async fn test_cancel_terminal_order_is_invalid_state() {
    let h = harness();
    for status in [OrderStatus::Completed, OrderStatus::Cancelled] {
        let order = seed_order(&h, status, "123456");
        let err = h.workflow.cancel(order.id, h.customer_id).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("order cannot be cancelled in status {status}")
        );
    }
}

#[tokio::test]
async fn test_cancel_by_other_customer_is_forbidden() {
    let h = harness();
    let order = seed_order(&h, OrderStatus::Pending, "123456");
    let err = h.workflow.cancel(order.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, OrderError::Forbidden(_)));
    assert_eq!(h.store.status_of(order.id), Some(OrderStatus::Pending));
}

// ========================================================================
// Reads
// ========================================================================

#[tokio::test]
async fn test_get_order_visibility() {
    let h = harness();
    let order = seed_order(&h, OrderStatus::Paid, "123456");

    assert!(h.workflow.get_order(order.id, h.customer_id).await.is_ok());
    assert!(h.workflow.get_order(order.id, h.owner_id).await.is_ok());

    let err = h
        .workflow
        .get_order(order.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::NotFound));
}

#[tokio::test]
async fn test_list_mine_newest_first() {
    let h = harness();
    let first = h
        .workflow
        .create(h.customer_id, h.business_id, &example_cart())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = h
        .workflow
        .create(h.customer_id, h.business_id, &example_cart())
        .await
        .unwrap();
    seed_order(&h, OrderStatus::Paid, "123456");

    // someone else's order
    h.workflow
        .create(Uuid::new_v4(), h.business_id, &example_cart())
        .await
        .unwrap();

    let mine = h.workflow.list_mine(h.customer_id).await.unwrap();
    assert_eq!(mine.len(), 3);
    assert!(mine.iter().all(|o| o.customer_id == h.customer_id));
    assert!(mine.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    let pos_first = mine.iter().position(|o| o.id == first.order.id).unwrap();
    let pos_second = mine.iter().position(|o| o.id == second.order.id).unwrap();
    assert!(pos_second < pos_first);
}
