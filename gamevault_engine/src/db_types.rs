use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use gvs_common::Rupiah;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------    OrderStatus     ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// The order has been created and is waiting for the customer to pay.
    Pending,
    /// The customer has reported payment and the admin is verifying and preparing delivery.
    Processing,
    /// The account credentials have been delivered. Terminal.
    Completed,
    /// The order was cancelled because the payment window lapsed. Terminal.
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Processing => write!(f, "PROCESSING"),
            OrderStatus::Completed => write!(f, "COMPLETED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------   PaymentStatus    ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    /// No payment has been reported yet.
    Waiting,
    /// The customer has claimed payment; an admin still has to verify it.
    Pending,
    /// Payment verified and the order delivered.
    Success,
    /// The payment window lapsed before a verified payment arrived.
    Expired,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Waiting => write!(f, "WAITING"),
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::Success => write!(f, "SUCCESS"),
            PaymentStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WAITING" => Ok(Self::Waiting),
            "PENDING" => Ok(Self::Pending),
            "SUCCESS" => Ok(Self::Success),
            "EXPIRED" => Ok(Self::Expired),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------   PaymentMethod    ----------------------------------------------------------
/// The manual payment channels the storefront offers. Settlement is always verified by a human,
/// so the engine only records which instructions the customer was shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Indonesian QR payment standard. The customer scans a static QR image.
    #[sqlx(rename = "qris")]
    #[serde(rename = "qris")]
    Qris,
    /// Bank transfer to a virtual account number.
    #[sqlx(rename = "va")]
    #[serde(rename = "va")]
    VirtualAccount,
    /// Transfer to an e-wallet number.
    #[sqlx(rename = "ewallet")]
    #[serde(rename = "ewallet")]
    Ewallet,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Qris => write!(f, "qris"),
            PaymentMethod::VirtualAccount => write!(f, "va"),
            PaymentMethod::Ewallet => write!(f, "ewallet"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "qris" => Ok(Self::Qris),
            "va" => Ok(Self::VirtualAccount),
            "ewallet" => Ok(Self::Ewallet),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------      OrderId       ----------------------------------------------------------
/// The system-generated order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    OrderNumber     ----------------------------------------------------------
/// The human-readable order number. Stable, and the identifier used in customer messages.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderNumber(pub String);

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     StatusPair     ----------------------------------------------------------
/// The `(status, payment_status)` pair a conditional write is guarded against. Every transition
/// names the pair it expects to find; the write commits only if the record still carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPair {
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
}

impl StatusPair {
    pub fn new(status: OrderStatus, payment_status: PaymentStatus) -> Self {
        Self { status, payment_status }
    }
}

impl Display for StatusPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.status, self.payment_status)
    }
}

//--------------------------------------       Order        ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    /// Customer contact details, snapshotted at checkout. Later profile edits never touch these.
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub product_id: String,
    /// Product name as displayed at checkout time.
    pub product_name: String,
    pub unit_price: Rupiah,
    pub quantity: i64,
    /// `unit_price * quantity`, fixed at creation.
    pub total: Rupiah,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    /// Deadline after which an unpaid order is cancelled.
    pub payment_expiry: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    /// Set when the stuck-order refund escalation has been sent, so it is sent at most once.
    pub refund_escalated_at: Option<DateTime<Utc>>,
    pub account_email: Option<String>,
    pub account_password: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn phase(&self) -> StatusPair {
        StatusPair::new(self.status, self.payment_status)
    }

    /// True if the payment window has passed while the order is still waiting on a verified
    /// payment. Exactly the predicate the expiry sweep uses, so the lazy read-time check and the
    /// sweep converge on the same orders.
    pub fn has_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.status == OrderStatus::Pending
            && matches!(self.payment_status, PaymentStatus::Waiting | PaymentStatus::Pending)
            && self.payment_expiry < now
    }

    pub fn credentials_assigned(&self) -> bool {
        self.account_email.is_some()
    }
}

//--------------------------------------      NewOrder      ----------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub product_id: String,
    pub product_name: String,
    pub unit_price: Rupiah,
    pub quantity: i64,
    /// The total charged to the customer. Always `unit_price * quantity`.
    pub total: Rupiah,
    pub payment_expiry: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     OrderChange    ----------------------------------------------------------
/// The fields a single transition writes. Only the populated fields end up in the UPDATE statement.
#[derive(Debug, Clone, Default)]
pub struct OrderChange {
    pub new_status: Option<OrderStatus>,
    pub new_payment_status: Option<PaymentStatus>,
    pub new_payment_method: Option<PaymentMethod>,
    pub paid_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub account_email: Option<String>,
    pub account_password: Option<String>,
}

impl OrderChange {
    pub fn with_status(mut self, status: OrderStatus, payment_status: PaymentStatus) -> Self {
        self.new_status = Some(status);
        self.new_payment_status = Some(payment_status);
        self
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.new_payment_method = Some(method);
        self
    }

    pub fn with_paid_at(mut self, at: DateTime<Utc>) -> Self {
        self.paid_at = Some(at);
        self
    }

    pub fn with_delivery(mut self, at: DateTime<Utc>, account_email: String, account_password: String) -> Self {
        self.delivered_at = Some(at);
        self.account_email = Some(account_email);
        self.account_password = Some(account_password);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.new_status.is_none()
            && self.new_payment_status.is_none()
            && self.new_payment_method.is_none()
            && self.paid_at.is_none()
            && self.delivered_at.is_none()
            && self.account_email.is_none()
            && self.account_password.is_none()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_round_trips() {
        for s in ["PENDING", "PROCESSING", "COMPLETED", "CANCELLED"] {
            assert_eq!(s.parse::<OrderStatus>().unwrap().to_string(), s);
        }
        for s in ["WAITING", "PENDING", "SUCCESS", "EXPIRED"] {
            assert_eq!(s.parse::<PaymentStatus>().unwrap().to_string(), s);
        }
        for s in ["qris", "va", "ewallet"] {
            assert_eq!(s.parse::<PaymentMethod>().unwrap().to_string(), s);
        }
        assert!("paid".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }
}
