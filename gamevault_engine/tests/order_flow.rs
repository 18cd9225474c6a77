mod support;

use chrono::Duration;
use gamevault_engine::{
    db_types::{OrderStatus, PaymentMethod, PaymentStatus},
    OrderFlowError,
};
use gvs_common::Rupiah;
use support::{checkout, new_harness, ADMIN_PHONE, CUSTOMER_PHONE};

#[tokio::test]
async fn manual_payment_flow_delivers_credentials() {
    let h = new_harness().await;
    let order = h.api.place_order(checkout()).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Waiting);
    assert_eq!(order.total, Rupiah::from(150_000));
    assert!(order.payment_method.is_none());
    assert!(order.account_email.is_none());
    assert!(order.account_password.is_none());

    let order = h.api.select_payment_method(&order.id, PaymentMethod::VirtualAccount).await.unwrap();
    assert_eq!(order.payment_method, Some(PaymentMethod::VirtualAccount));
    assert_eq!(order.status, OrderStatus::Pending);

    h.clock.advance(Duration::minutes(2));
    let order = h.api.confirm_payment(&order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert!(order.paid_at.is_some());
    // One alert to the admin, one acknowledgement to the customer.
    assert_eq!(h.gateway.sent_to(ADMIN_PHONE).len(), 1);
    assert_eq!(h.gateway.sent_to(CUSTOMER_PHONE).len(), 1);

    let order = h.api.deliver_order(&order.id, "user@x.com".to_string(), "pw123".to_string()).await.unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.payment_status, PaymentStatus::Success);
    assert!(order.delivered_at.is_some());
    assert_eq!(order.account_email.as_deref(), Some("user@x.com"));
    assert_eq!(order.account_password.as_deref(), Some("pw123"));

    let to_customer = h.gateway.sent_to(CUSTOMER_PHONE);
    let delivery = to_customer.last().unwrap();
    assert!(delivery.message.contains("user@x.com"));
    assert!(delivery.message.contains("pw123"));
}

#[tokio::test]
async fn orders_can_be_fetched_by_number_or_id() {
    let h = new_harness().await;
    let order = h.api.place_order(checkout()).await.unwrap();

    let by_id = h.api.fetch_order(order.id.as_str()).await.unwrap();
    let by_number = h.api.fetch_order(order.order_number.as_str()).await.unwrap();
    assert_eq!(by_id.id, order.id);
    assert_eq!(by_number.id, order.id);

    let missing = h.api.fetch_order("GV-20260314-NOPE").await;
    assert!(matches!(missing, Err(OrderFlowError::OrderNotFound(_))));
}

#[tokio::test]
async fn confirmation_requires_a_payment_method() {
    let h = new_harness().await;
    let order = h.api.place_order(checkout()).await.unwrap();
    let result = h.api.confirm_payment(&order.id).await;
    assert!(matches!(result, Err(OrderFlowError::NoPaymentMethod(_))));
    assert!(h.gateway.sent().is_empty());
}

#[tokio::test]
async fn repeated_confirmation_is_a_noop() {
    let h = new_harness().await;
    let order = h.api.place_order(checkout()).await.unwrap();
    h.api.select_payment_method(&order.id, PaymentMethod::Qris).await.unwrap();

    let first = h.api.confirm_payment(&order.id).await.unwrap();
    h.clock.advance(Duration::minutes(1));
    let second = h.api.confirm_payment(&order.id).await.unwrap();

    assert_eq!(second.status, OrderStatus::Processing);
    assert_eq!(second.paid_at, first.paid_at);
    // The retry sent nothing: still one admin alert and one customer acknowledgement.
    assert_eq!(h.gateway.sent_to(ADMIN_PHONE).len(), 1);
    assert_eq!(h.gateway.sent_to(CUSTOMER_PHONE).len(), 1);
}

#[tokio::test]
async fn delivery_requires_a_processing_order() {
    let h = new_harness().await;
    let order = h.api.place_order(checkout()).await.unwrap();
    let result = h.api.deliver_order(&order.id, "acc@x.com".to_string(), "pw".to_string()).await;
    assert!(matches!(result, Err(OrderFlowError::InvalidTransition { .. })));

    let untouched = h.api.fetch_order(order.id.as_str()).await.unwrap();
    assert_eq!(untouched.status, OrderStatus::Pending);
    assert!(untouched.account_email.is_none());
}

#[tokio::test]
async fn repeated_delivery_is_a_noop() {
    let h = new_harness().await;
    let order = h.api.place_order(checkout()).await.unwrap();
    h.api.select_payment_method(&order.id, PaymentMethod::Ewallet).await.unwrap();
    h.api.confirm_payment(&order.id).await.unwrap();

    let first = h.api.deliver_order(&order.id, "acc@x.com".to_string(), "pw".to_string()).await.unwrap();
    let second = h.api.deliver_order(&order.id, "acc@x.com".to_string(), "pw".to_string()).await.unwrap();
    assert_eq!(second.delivered_at, first.delivered_at);

    // Exactly one delivery message went out.
    assert_eq!(h.gateway.messages_containing("acc@x.com"), 1);
}

#[tokio::test]
async fn selecting_a_method_twice_keeps_the_latest_choice() {
    let h = new_harness().await;
    let order = h.api.place_order(checkout()).await.unwrap();
    h.api.select_payment_method(&order.id, PaymentMethod::Qris).await.unwrap();
    let order = h.api.select_payment_method(&order.id, PaymentMethod::Ewallet).await.unwrap();
    assert_eq!(order.payment_method, Some(PaymentMethod::Ewallet));
}

#[tokio::test]
async fn notification_failure_does_not_block_transitions() {
    let h = new_harness().await;
    h.gateway.set_failing(true);

    let order = h.api.place_order(checkout()).await.unwrap();
    h.api.select_payment_method(&order.id, PaymentMethod::VirtualAccount).await.unwrap();
    let order = h.api.confirm_payment(&order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Processing);

    let order = h.api.deliver_order(&order.id, "acc@x.com".to_string(), "pw".to_string()).await.unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.payment_status, PaymentStatus::Success);
}
