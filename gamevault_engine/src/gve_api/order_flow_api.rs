use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    config::EngineConfig,
    db_types::{NewOrder, Order, OrderChange, OrderId, OrderStatus, PaymentMethod, PaymentStatus, StatusPair},
    gve_api::{
        errors::OrderFlowError,
        order_objects::{CheckoutRequest, SweepResult},
    },
    helpers::{clock::Clock, new_order_id, new_order_number},
    notify::Notifier,
    traits::OrderStore,
};

/// `OrderFlowApi` is the primary API for driving orders through their lifecycle, from checkout to
/// delivery or cancellation.
///
/// The reachable transitions, the guard each one carries, and the notification it fires:
///
/// | From \ Event  | select method | confirm payment | deliver account | payment window lapses  |
/// |---------------|---------------|-----------------|-----------------|------------------------|
/// | PENDING       | record method | → PROCESSING ¹  | Err             | → CANCELLED ²          |
/// | PROCESSING    | Err           | no-op           | → COMPLETED ³   | refund escalation ⁴    |
/// | COMPLETED     | Err           | Err             | no-op           | —                      |
/// | CANCELLED     | Err           | Err             | Err             | —                      |
///
/// 1. Requires a selected payment method and an unlapsed window. Sets `paid_at`, moves payment
///    status to PENDING (claimed, unverified), and notifies the admin plus the customer.
/// 2. Applied both lazily (any read repairs a lapsed order before returning it) and eagerly (the
///    sweep). Sets payment status EXPIRED and notifies the customer.
/// 3. Stores the credentials, sets `delivered_at` and payment status SUCCESS, and sends the
///    customer their account.
/// 4. Orders paid but undelivered past the processing timeout are not cancelled; the customer is
///    told a refund is on the way, exactly once, and the order stays PROCESSING for the admin.
///
/// Every transition is a single conditional write guarded by the `(status, payment_status)` pair
/// the caller observed. A transition that loses its race re-reads the order: if the end state it
/// wanted has already been reached the call is a benign no-op, otherwise the guard failure is a
/// domain error. Notifications fire only on the write that actually committed, which is what
/// keeps them at exactly-once under concurrent sweeps and reads.
pub struct OrderFlowApi<B> {
    db: B,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B: Clone> Clone for OrderFlowApi<B> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            notifier: self.notifier.clone(),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        }
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, notifier: Notifier, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        Self { db, notifier, clock, config }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderStore
{
    /// Creates a new order from the checkout form.
    ///
    /// The order starts in PENDING/WAITING with a payment deadline of now plus the configured
    /// payment window. The commerce fields are snapshotted; the total is fixed here as
    /// `unit_price * quantity` and never recomputed.
    pub async fn place_order(&self, checkout: CheckoutRequest) -> Result<Order, OrderFlowError> {
        let now = self.clock.now();
        let total = checkout.unit_price * checkout.quantity;
        let order = NewOrder {
            id: new_order_id(),
            order_number: new_order_number(&self.config.order_prefix, now),
            customer_name: checkout.customer_name,
            customer_email: checkout.customer_email,
            customer_phone: checkout.customer_phone,
            product_id: checkout.product_id,
            product_name: checkout.product_name,
            unit_price: checkout.unit_price,
            quantity: checkout.quantity,
            total,
            payment_expiry: now + self.config.payment_window,
            created_at: now,
        };
        let order = self.db.create_order(order).await?;
        debug!(
            "🔄️📦️ Order {} created for {} ({} x {} = {}). Payment due by {}",
            order.order_number,
            order.customer_name,
            order.quantity,
            order.unit_price,
            order.total,
            order.payment_expiry
        );
        Ok(order)
    }

    /// Fetches an order by system id or order number, repairing a lapsed payment window before
    /// returning it. A caller of this method never sees a stale "still pending" order.
    pub async fn fetch_order(&self, key: &str) -> Result<Order, OrderFlowError> {
        let order = self
            .db
            .fetch_order_by_id_or_number(key)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(key.to_string()))?;
        self.enforce_expiry(order).await
    }

    /// Records which payment channel the customer picked. The choice can be changed freely while
    /// the order is still unpaid and unlapsed.
    pub async fn select_payment_method(
        &self,
        id: &OrderId,
        method: PaymentMethod,
    ) -> Result<Order, OrderFlowError> {
        let order = self.fetch_order_for_update(id).await?;
        match order.phase() {
            StatusPair { status: OrderStatus::Pending, payment_status: PaymentStatus::Waiting } => {},
            StatusPair { status: OrderStatus::Cancelled, .. } => {
                return Err(OrderFlowError::OrderExpired(order.order_number))
            },
            _ => return Err(OrderFlowError::invalid(&order, "select payment method")),
        }
        let change = OrderChange::default().with_payment_method(method);
        match self.db.update_order(&order.id, order.phase(), change).await? {
            Some(updated) => {
                debug!("🔄️💳️ Order {} will be paid via {method}", updated.order_number);
                Ok(updated)
            },
            None => self.resolve_lost_race(&order.id, "select payment method", None).await,
        }
    }

    /// The customer's "I have paid" action. Moves the order to PROCESSING with payment status
    /// PENDING (claimed, but an admin still has to verify it) and stamps `paid_at`.
    ///
    /// The admin is alerted that there is a payment to verify, and the customer gets an
    /// acknowledgement with the processing estimate. A repeated confirmation of an order already
    /// in PROCESSING is a no-op and sends nothing.
    pub async fn confirm_payment(&self, id: &OrderId) -> Result<Order, OrderFlowError> {
        let order = self.fetch_order_for_update(id).await?;
        let target = StatusPair::new(OrderStatus::Processing, PaymentStatus::Pending);
        if order.phase() == target {
            debug!("🔄️✅️ Order {} is already awaiting verification. Confirmation retry ignored.", order.order_number);
            return Ok(order);
        }
        match order.status {
            OrderStatus::Pending => {},
            OrderStatus::Cancelled => return Err(OrderFlowError::OrderExpired(order.order_number)),
            _ => return Err(OrderFlowError::invalid(&order, "confirm payment")),
        }
        if order.payment_method.is_none() {
            return Err(OrderFlowError::NoPaymentMethod(order.order_number));
        }
        let now = self.clock.now();
        let change = OrderChange::default().with_status(target.status, target.payment_status).with_paid_at(now);
        match self.db.update_order(&order.id, order.phase(), change).await? {
            Some(updated) => {
                info!(
                    "🔄️✅️ Order {} payment claimed by customer. Awaiting admin verification.",
                    updated.order_number
                );
                self.notifier.payment_claimed(&updated).await;
                self.notifier.payment_received(&updated).await;
                Ok(updated)
            },
            None => self.resolve_lost_race(&order.id, "confirm payment", Some(target)).await,
        }
    }

    /// The admin's verification-and-delivery action. Stores the account credentials, moves the
    /// order to COMPLETED/SUCCESS, stamps `delivered_at`, and sends the customer their account.
    ///
    /// Credentials are only ever written by this transition, so an order that is not COMPLETED
    /// never carries any.
    pub async fn deliver_order(
        &self,
        id: &OrderId,
        account_email: String,
        account_password: String,
    ) -> Result<Order, OrderFlowError> {
        let order = self
            .db
            .fetch_order_by_id(id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(id.to_string()))?;
        let target = StatusPair::new(OrderStatus::Completed, PaymentStatus::Success);
        if order.phase() == target && order.credentials_assigned() {
            debug!("🔄️🎮️ Order {} has already been delivered. Retry ignored.", order.order_number);
            return Ok(order);
        }
        if order.status != OrderStatus::Processing {
            return Err(OrderFlowError::invalid(&order, "deliver account"));
        }
        let now = self.clock.now();
        let change = OrderChange::default()
            .with_status(target.status, target.payment_status)
            .with_delivery(now, account_email, account_password);
        match self.db.update_order(&order.id, order.phase(), change).await? {
            Some(completed) => {
                info!("🔄️🎮️ Order {} delivered to {}", completed.order_number, completed.customer_name);
                self.notifier.account_delivered(&completed).await;
                Ok(completed)
            },
            None => self.resolve_lost_race(&order.id, "deliver account", Some(target)).await,
        }
    }

    /// One expiry sweep: cancel every order whose payment window lapsed, and escalate every paid
    /// order that has sat undelivered past the processing timeout.
    ///
    /// A failure on one order never aborts the rest of the batch, and a notification failure
    /// never rolls back a committed transition. Safe to run concurrently with reads, admin
    /// actions, and other sweeps; the conditional writes make sure each cancellation and each
    /// escalation happens, and notifies, exactly once.
    pub async fn expire_old_orders(&self) -> Result<SweepResult, OrderFlowError> {
        let now = self.clock.now();
        let mut result = SweepResult::default();

        let candidates = self.db.expired_pending_orders(now).await?;
        eprintln!("DBG expire now={now} candidates={}", candidates.len());
        trace!("🕰️ {} orders found past their payment window", candidates.len());
        for order in candidates {
            let change = OrderChange::default().with_status(OrderStatus::Cancelled, PaymentStatus::Expired);
            match self.db.update_order(&order.id, order.phase(), change).await {
                Ok(Some(cancelled)) => {
                    self.notifier.order_cancelled(&cancelled).await;
                    result.cancelled.push(cancelled);
                },
                Ok(None) => {
                    debug!("🕰️ Order {} was already transitioned by another writer. Skipping.", order.order_number)
                },
                Err(e) => error!(
                    "🕰️ Could not cancel order {}: {e}. Continuing with the rest of the batch.",
                    order.order_number
                ),
            }
        }

        let cutoff = now - self.config.processing_timeout;
        let stuck = self.db.stuck_processing_orders(cutoff).await?;
        trace!("🕰️ {} paid orders have sat undelivered past the processing timeout", stuck.len());
        for order in stuck {
            match self.db.mark_refund_escalated(&order.id, now).await {
                Ok(Some(escalated)) => {
                    self.notifier.refund_escalation(&escalated).await;
                    result.escalated.push(escalated);
                },
                Ok(None) => {
                    debug!("🕰️ Refund escalation for order {} was already sent. Skipping.", order.order_number)
                },
                Err(e) => error!(
                    "🕰️ Could not record the refund escalation for order {}: {e}. Continuing with the rest of \
                     the batch.",
                    order.order_number
                ),
            }
        }
        Ok(result)
    }

    /// Fetch-by-id with the same lapsed-window repair as [`Self::fetch_order`]. All
    /// customer-initiated transitions go through this so their "not expired" guard and the sweep
    /// agree on what expired means.
    async fn fetch_order_for_update(&self, id: &OrderId) -> Result<Order, OrderFlowError> {
        let order = self
            .db
            .fetch_order_by_id(id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(id.to_string()))?;
        self.enforce_expiry(order).await
    }

    /// Re-checks the payment deadline on an order that was just read and, if it lapsed, applies
    /// the cancellation right here. Only the writer that wins the conditional update sends the
    /// cancellation message; a loser re-reads and hands back whatever the winner wrote.
    async fn enforce_expiry(&self, order: Order) -> Result<Order, OrderFlowError> {
        let now = self.clock.now();
        if !order.has_lapsed(now) {
            return Ok(order);
        }
        let change = OrderChange::default().with_status(OrderStatus::Cancelled, PaymentStatus::Expired);
        match self.db.update_order(&order.id, order.phase(), change).await? {
            Some(cancelled) => {
                info!(
                    "🔄️❌️ Order {} lapsed at {} and has been cancelled",
                    cancelled.order_number, cancelled.payment_expiry
                );
                self.notifier.order_cancelled(&cancelled).await;
                Ok(cancelled)
            },
            None => {
                let current = self
                    .db
                    .fetch_order_by_id(&order.id)
                    .await?
                    .ok_or_else(|| OrderFlowError::OrderNotFound(order.id.to_string()))?;
                Ok(current)
            },
        }
    }

    /// Called when a conditional write lost its race. Re-reads the order; if it already carries
    /// the end state the caller wanted, the call is a benign no-op, otherwise the guard genuinely
    /// failed and the caller gets a domain error.
    async fn resolve_lost_race(
        &self,
        id: &OrderId,
        event: &'static str,
        desired: Option<StatusPair>,
    ) -> Result<Order, OrderFlowError> {
        let current = self
            .db
            .fetch_order_by_id(id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(id.to_string()))?;
        if desired.is_some_and(|d| current.phase() == d) {
            debug!(
                "🔄️ Order {} already reached {} when '{event}' lost its race. Treating as a no-op.",
                current.order_number,
                current.phase()
            );
            return Ok(current);
        }
        if current.status == OrderStatus::Cancelled {
            return Err(OrderFlowError::OrderExpired(current.order_number));
        }
        Err(OrderFlowError::invalid(&current, event))
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
