use async_trait::async_trait;
use log::*;

/// The outbound text-message capability the engine consumes.
///
/// Implementations never fail the caller: a delivery problem is reported as `false` and whatever
/// detail is available goes to the log. The lifecycle engine treats the result as advisory; order
/// state has always been committed before a send is attempted.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send(&self, phone: &str, message: &str) -> bool;
}

/// Fallback gateway for environments without an API token. Logs the message it would have sent
/// and reports the send as failed, which is how the storefront behaves in development.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingGateway;

#[async_trait]
impl NotificationGateway for LoggingGateway {
    async fn send(&self, phone: &str, message: &str) -> bool {
        info!("📨️ No notification channel is configured. Message for {phone}:\n{message}");
        false
    }
}
