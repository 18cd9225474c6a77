mod support;

use chrono::Duration;
use gamevault_engine::{
    db_types::{OrderStatus, PaymentMethod, PaymentStatus},
    OrderFlowError,
};
use support::{checkout, new_harness, CUSTOMER_PHONE};

#[tokio::test]
async fn unpaid_orders_are_cancelled_after_the_window() {
    let h = new_harness().await;
    let order = h.api.place_order(checkout()).await.unwrap();

    h.clock.advance(Duration::minutes(16));
    let result = h.api.expire_old_orders().await.unwrap();
    assert_eq!(result.cancelled_count(), 1);
    assert_eq!(result.escalated_count(), 0);

    let order = h.api.fetch_order(order.id.as_str()).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.payment_status, PaymentStatus::Expired);
    assert_eq!(h.gateway.messages_containing("ORDER CANCELLED"), 1);
}

#[tokio::test]
async fn back_to_back_sweeps_do_not_double_notify() {
    let h = new_harness().await;
    h.api.place_order(checkout()).await.unwrap();

    h.clock.advance(Duration::minutes(20));
    let first = h.api.expire_old_orders().await.unwrap();
    let second = h.api.expire_old_orders().await.unwrap();
    assert_eq!(first.cancelled_count(), 1);
    assert_eq!(second.cancelled_count(), 0);
    assert_eq!(h.gateway.sent_to(CUSTOMER_PHONE).len(), 1);
}

#[tokio::test]
async fn reads_repair_lapsed_orders() {
    let h = new_harness().await;
    let order = h.api.place_order(checkout()).await.unwrap();

    h.clock.advance(Duration::minutes(16));
    let seen = h.api.fetch_order(order.order_number.as_str()).await.unwrap();
    assert_eq!(seen.status, OrderStatus::Cancelled);
    assert_eq!(seen.payment_status, PaymentStatus::Expired);

    // The repair is monotonic: a later read or sweep finds nothing left to do.
    let again = h.api.fetch_order(order.order_number.as_str()).await.unwrap();
    assert_eq!(again.status, OrderStatus::Cancelled);
    let sweep = h.api.expire_old_orders().await.unwrap();
    assert_eq!(sweep.cancelled_count(), 0);
    assert_eq!(h.gateway.messages_containing("ORDER CANCELLED"), 1);
}

#[tokio::test]
async fn concurrent_reads_cancel_once() {
    let h = new_harness().await;
    let order = h.api.place_order(checkout()).await.unwrap();

    h.clock.advance(Duration::minutes(16));
    let key = order.order_number.as_str();
    let (a, b) = tokio::join!(h.api.fetch_order(key), h.api.fetch_order(key));
    let a = a.unwrap();
    let b = b.unwrap();
    assert_eq!(a.status, OrderStatus::Cancelled);
    assert_eq!(b.status, OrderStatus::Cancelled);
    assert_eq!(a.payment_status, PaymentStatus::Expired);
    assert_eq!(b.payment_status, PaymentStatus::Expired);
    // Whichever read won the conditional write sent the one cancellation message.
    assert_eq!(h.gateway.messages_containing("ORDER CANCELLED"), 1);
}

#[tokio::test]
async fn confirming_a_lapsed_order_fails_and_cancels_it() {
    let h = new_harness().await;
    let order = h.api.place_order(checkout()).await.unwrap();
    h.api.select_payment_method(&order.id, PaymentMethod::Qris).await.unwrap();

    h.clock.advance(Duration::minutes(16));
    let result = h.api.confirm_payment(&order.id).await;
    assert!(matches!(result, Err(OrderFlowError::OrderExpired(_))));

    let order = h.api.fetch_order(order.id.as_str()).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.payment_status, PaymentStatus::Expired);
    assert!(order.paid_at.is_none());
    assert_eq!(h.gateway.messages_containing("ORDER CANCELLED"), 1);
}

#[tokio::test]
async fn selecting_a_method_on_a_lapsed_order_fails() {
    let h = new_harness().await;
    let order = h.api.place_order(checkout()).await.unwrap();

    h.clock.advance(Duration::minutes(16));
    let result = h.api.select_payment_method(&order.id, PaymentMethod::VirtualAccount).await;
    assert!(matches!(result, Err(OrderFlowError::OrderExpired(_))));
}

#[tokio::test]
async fn stuck_processing_orders_escalate_once_and_stay_processing() {
    let h = new_harness().await;
    let order = h.api.place_order(checkout()).await.unwrap();
    h.api.select_payment_method(&order.id, PaymentMethod::VirtualAccount).await.unwrap();
    h.api.confirm_payment(&order.id).await.unwrap();

    h.clock.advance(Duration::minutes(31));
    let result = h.api.expire_old_orders().await.unwrap();
    assert_eq!(result.cancelled_count(), 0);
    assert_eq!(result.escalated_count(), 1);
    assert_eq!(h.gateway.messages_containing("REFUND ON THE WAY"), 1);

    // Not auto-cancelled; the admin can still deliver.
    let order = h.api.fetch_order(order.id.as_str()).await.unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    assert!(order.refund_escalated_at.is_some());

    // Later sweeps leave the escalated order alone.
    h.clock.advance(Duration::minutes(10));
    let again = h.api.expire_old_orders().await.unwrap();
    assert_eq!(again.escalated_count(), 0);
    assert_eq!(h.gateway.messages_containing("REFUND ON THE WAY"), 1);

    let delivered = h.api.deliver_order(&order.id, "late@x.com".to_string(), "pw".to_string()).await.unwrap();
    assert_eq!(delivered.status, OrderStatus::Completed);
}

#[tokio::test]
async fn delivered_orders_never_escalate() {
    let h = new_harness().await;
    let order = h.api.place_order(checkout()).await.unwrap();
    h.api.select_payment_method(&order.id, PaymentMethod::Qris).await.unwrap();
    h.api.confirm_payment(&order.id).await.unwrap();
    h.api.deliver_order(&order.id, "acc@x.com".to_string(), "pw".to_string()).await.unwrap();

    h.clock.advance(Duration::hours(2));
    let result = h.api.expire_old_orders().await.unwrap();
    assert_eq!(result.total_count(), 0);
    assert_eq!(h.gateway.messages_containing("REFUND ON THE WAY"), 0);
}

#[tokio::test]
async fn sweep_failures_do_not_roll_back_cancellations() {
    let h = new_harness().await;
    let order = h.api.place_order(checkout()).await.unwrap();
    h.gateway.set_failing(true);

    h.clock.advance(Duration::minutes(16));
    let result = h.api.expire_old_orders().await.unwrap();
    assert_eq!(result.cancelled_count(), 1);

    // The send failed, but the state change stuck.
    let order = h.api.fetch_order(order.id.as_str()).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.payment_status, PaymentStatus::Expired);
}
