use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderChange, OrderId, OrderNumber, StatusPair};

/// The durable store of orders. This is the single source of truth for the lifecycle engine;
/// everything the engine knows about an order it learned from here.
///
/// The crucial method is [`OrderStore::update_order`]: a conditional write that only commits if
/// the record still carries the `(status, payment_status)` pair the caller observed. The lazy
/// read-time expiry check, the sweeper, and admin actions all race on the same rows, and the
/// conditional write is what guarantees that exactly one of them applies a given transition.
#[allow(async_fn_in_trait)]
pub trait OrderStore: Clone {
    /// The URL of the backing database.
    fn url(&self) -> &str;

    /// Stores a brand-new order. The order number must be unused.
    async fn create_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;

    /// Fetches the order with the given system id, or `None` if it does not exist.
    async fn fetch_order_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Fetches an order by system id or human-readable order number, whichever matches.
    /// Customers paste either into the status page.
    async fn fetch_order_by_id_or_number(&self, key: &str) -> Result<Option<Order>, OrderStoreError>;

    /// Applies `change` to the order in a single conditional UPDATE, guarded by `expected`:
    /// the write commits only if the record still carries that `(status, payment_status)` pair.
    ///
    /// Returns the updated order, or `None` if the precondition failed because another writer
    /// got there first. Callers must treat `None` by re-reading and deciding whether the state
    /// they wanted has already been reached.
    async fn update_order(
        &self,
        id: &OrderId,
        expected: StatusPair,
        change: OrderChange,
    ) -> Result<Option<Order>, OrderStoreError>;

    /// All orders that are PENDING with payment status WAITING or PENDING whose payment window
    /// lapsed before `now`. These are the sweep's cancellation candidates.
    async fn expired_pending_orders(&self, now: DateTime<Utc>) -> Result<Vec<Order>, OrderStoreError>;

    /// All PROCESSING orders with no account assigned, paid before `cutoff`, that have not had
    /// their refund escalation sent yet.
    async fn stuck_processing_orders(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, OrderStoreError>;

    /// Records that the refund escalation for this order has been sent, guarded on the marker
    /// still being unset (and the order still being undelivered PROCESSING). Returns the updated
    /// order if this call won the write, `None` if another sweep got there first.
    async fn mark_refund_escalated(
        &self,
        id: &OrderId,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, OrderStoreError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderStoreError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since one already exists with order number {0}")]
    OrderAlreadyExists(OrderNumber),
    #[error("The update for order {0} would not change anything")]
    EmptyUpdate(OrderId),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}
