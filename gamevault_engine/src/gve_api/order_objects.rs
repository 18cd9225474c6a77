use gvs_common::Rupiah;
use serde::{Deserialize, Serialize};

use crate::db_types::Order;

//--------------------------------------  CheckoutRequest   ----------------------------------------------------------
/// Everything the checkout form captures. The engine snapshots these values onto the order;
/// they never change afterwards, whatever happens to the customer profile or the product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub product_id: String,
    pub product_name: String,
    pub unit_price: Rupiah,
    pub quantity: i64,
}

//--------------------------------------    SweepResult     ----------------------------------------------------------
/// What a single expiry sweep did: the orders it cancelled, and the stuck orders it escalated.
#[derive(Debug, Clone, Default)]
pub struct SweepResult {
    pub cancelled: Vec<Order>,
    pub escalated: Vec<Order>,
}

impl SweepResult {
    pub fn cancelled_count(&self) -> usize {
        self.cancelled.len()
    }

    pub fn escalated_count(&self) -> usize {
        self.escalated.len()
    }

    pub fn total_count(&self) -> usize {
        self.cancelled.len() + self.escalated.len()
    }
}
