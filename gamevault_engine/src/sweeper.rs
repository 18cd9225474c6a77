use std::sync::Arc;

use log::*;
use tokio::task::JoinHandle;

use crate::{
    config::EngineConfig, db_types::Order, helpers::clock::Clock, notify::Notifier, OrderFlowApi,
    SqliteDatabase,
};

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Each tick runs one sweep: lapsed PENDING orders are cancelled and their customers notified,
/// and paid orders stuck past the processing timeout get their one refund escalation. A failed
/// sweep is logged and the next tick runs as normal.
pub fn start_expiry_worker(
    db: SqliteDatabase,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(config.sweep_interval);
        let api = OrderFlowApi::new(db, notifier, clock, config);
        info!("🕰️ Order expiry worker started");
        loop {
            timer.tick().await;
            debug!("🕰️ Running order expiry sweep");
            match api.expire_old_orders().await {
                Ok(result) => {
                    info!(
                        "🕰️ Sweep complete. {} orders cancelled, {} refund escalations sent",
                        result.cancelled_count(),
                        result.escalated_count()
                    );
                    debug!("🕰️ Cancelled orders: {}", order_list(&result.cancelled));
                    debug!("🕰️ Escalated orders: {}", order_list(&result.escalated));
                },
                Err(e) => {
                    error!("🕰️ Error running order expiry sweep: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] {} customer: {}", o.id, o.order_number, o.customer_name))
        .collect::<Vec<String>>()
        .join(", ")
}
