use thiserror::Error;

use crate::{
    db_types::{Order, OrderNumber, StatusPair},
    traits::OrderStoreError,
};

/// The error taxonomy callers of the engine see. Domain-rule violations get their own variants so
/// the storefront can show a meaningful message; infrastructure failures surface as a single
/// generic kind.
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("No order matches '{0}'")]
    OrderNotFound(String),
    #[error("Order {order} cannot accept '{event}' while it is {current}")]
    InvalidTransition {
        order: OrderNumber,
        event: &'static str,
        current: StatusPair,
    },
    #[error("The payment window for order {0} has lapsed")]
    OrderExpired(OrderNumber),
    #[error("A payment method must be selected before payment can be confirmed for order {0}")]
    NoPaymentMethod(OrderNumber),
    #[error("{0}")]
    StoreError(#[from] OrderStoreError),
}

impl OrderFlowError {
    pub fn invalid(order: &Order, event: &'static str) -> Self {
        OrderFlowError::InvalidTransition { order: order.order_number.clone(), event, current: order.phase() }
    }
}
