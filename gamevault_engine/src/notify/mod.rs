//! Notification dispatch.
//!
//! The engine treats outbound messages as a best-effort side effect of a committed state change:
//! the order write is the source of truth, a send is attempted afterwards under a bounded
//! timeout, and a failed or slow send is logged and forgotten. Nothing in here can fail a
//! lifecycle operation.
mod fonnte;
mod gateway;
pub mod templates;

use std::sync::Arc;

use log::*;

pub use fonnte::{FonnteConfig, FonnteGateway, FonnteInitError, FONNTE_API_URL};
pub use gateway::{LoggingGateway, NotificationGateway};

use crate::{config::EngineConfig, db_types::Order};

/// Formats and dispatches the lifecycle notifications. One instance is shared by the engine and
/// the sweeper so both sides send identical messages.
#[derive(Clone)]
pub struct Notifier {
    gateway: Arc<dyn NotificationGateway>,
    admin_phone: String,
    send_timeout: std::time::Duration,
    processing_timeout: chrono::Duration,
}

impl Notifier {
    pub fn new(gateway: Arc<dyn NotificationGateway>, config: &EngineConfig) -> Self {
        Self {
            gateway,
            admin_phone: config.admin_phone.clone(),
            send_timeout: config.notify_timeout,
            processing_timeout: config.processing_timeout,
        }
    }

    /// Tell the admin there is a claimed payment to verify.
    pub async fn payment_claimed(&self, order: &Order) {
        self.dispatch(&self.admin_phone, templates::payment_claimed(order), "payment-claimed").await;
    }

    /// Acknowledge the customer's payment claim, with the delivery estimate.
    pub async fn payment_received(&self, order: &Order) {
        let message = templates::payment_received(order, self.processing_timeout.num_minutes());
        self.dispatch(&order.customer_phone, message, "payment-received").await;
    }

    /// Send the customer their account credentials.
    pub async fn account_delivered(&self, order: &Order) {
        self.dispatch(&order.customer_phone, templates::account_delivered(order), "delivery").await;
    }

    /// Tell the customer their unpaid order lapsed and was cancelled.
    pub async fn order_cancelled(&self, order: &Order) {
        self.dispatch(&order.customer_phone, templates::order_cancelled(order), "cancellation").await;
    }

    /// Tell the customer their paid-but-undelivered order is being refunded.
    pub async fn refund_escalation(&self, order: &Order) {
        self.dispatch(&order.customer_phone, templates::refund_escalation(order), "refund-escalation").await;
    }

    async fn dispatch(&self, phone: &str, message: String, label: &str) {
        match tokio::time::timeout(self.send_timeout, self.gateway.send(phone, &message)).await {
            Ok(true) => debug!("📨️ {label} notification for {phone} delivered"),
            Ok(false) => warn!("📨️ {label} notification for {phone} was not delivered"),
            Err(_) => warn!(
                "📨️ {label} notification for {phone} timed out after {}s",
                self.send_timeout.as_secs()
            ),
        }
    }
}
