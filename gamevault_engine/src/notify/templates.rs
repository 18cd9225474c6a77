//! Message bodies for the WhatsApp notifications.
//!
//! Every message leads with the order number, since that is the handle customers quote back at
//! support.
use crate::db_types::Order;

const STORE_NAME: &str = "GameVault";

/// Admin alert: a customer has claimed payment and the order needs manual verification.
pub fn payment_claimed(order: &Order) -> String {
    format!(
        "🔔 *PAYMENT CLAIMED*\n\nOrder *{}* has been marked as paid and is waiting for verification.\n\n👤 \
         Customer: {}\n💰 Total: {}\n\nPlease verify the payment and deliver the account from the admin panel.",
        order.order_number, order.customer_name, order.total
    )
}

/// Customer acknowledgement sent right after they confirm payment.
pub fn payment_received(order: &Order, processing_minutes: i64) -> String {
    format!(
        "✅ *PAYMENT RECEIVED*\n\nHi! Your payment for order *{}* has been received.\n\nAn admin is now \
         preparing your account.\n\n⏰ Estimated wait: at most {processing_minutes} minutes. If your order has \
         not arrived by then, your money will be refunded.\n\nThank you for shopping at {STORE_NAME}! 🎮",
        order.order_number
    )
}

/// The delivery message. Carries the credentials, so it is only ever built from a COMPLETED order.
pub fn account_delivered(order: &Order) -> String {
    let email = order.account_email.as_deref().unwrap_or_default();
    let password = order.account_password.as_deref().unwrap_or_default();
    format!(
        "🎮 *ORDER COMPLETE*\n\nOrder *{}*\n\nHere is your account:\n📧 Email: {email}\n🔑 Password: \
         {password}\n\nPlease change the password right after your first login.\nThank you for shopping at \
         {STORE_NAME}! 🎮",
        order.order_number
    )
}

/// Sent when an unpaid order's payment window lapses and the order is cancelled.
pub fn order_cancelled(order: &Order) -> String {
    format!(
        "❌ *ORDER CANCELLED*\n\nOrder *{}* was cancelled because the payment window lapsed.\n\nIf you already \
         paid, please contact support and we will sort out a refund.\n\n{STORE_NAME} 🎮",
        order.order_number
    )
}

/// Sent when a paid order has sat undelivered past the processing timeout.
pub fn refund_escalation(order: &Order) -> String {
    format!(
        "💰 *REFUND ON THE WAY*\n\nOrder *{}* was not delivered within the promised processing time.\n\nYour \
         money will be returned; please allow up to 24 hours for the refund to arrive. We are sorry for the \
         inconvenience.\n\n{STORE_NAME} 🎮",
        order.order_number
    )
}
