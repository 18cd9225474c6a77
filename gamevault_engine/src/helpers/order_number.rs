use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};

use crate::db_types::{OrderId, OrderNumber};

const ORDER_ID_LEN: usize = 12;
const ORDER_NUMBER_SUFFIX_LEN: usize = 6;

/// Generates the internal order id: random lowercase alphanumerics.
pub fn new_order_id() -> OrderId {
    let id: String = rand::thread_rng().sample_iter(&Alphanumeric).take(ORDER_ID_LEN).map(char::from).collect();
    OrderId(id.to_lowercase())
}

/// Generates the human-readable order number: `{prefix}-{yyyymmdd}-{random suffix}`.
/// The date helps support conversations; the random suffix keeps numbers unguessable.
pub fn new_order_number(prefix: &str, now: DateTime<Utc>) -> OrderNumber {
    let suffix: String =
        rand::thread_rng().sample_iter(&Alphanumeric).take(ORDER_NUMBER_SUFFIX_LEN).map(char::from).collect();
    OrderNumber(format!("{prefix}-{}-{}", now.format("%Y%m%d"), suffix.to_uppercase()))
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn order_number_format() {
        let now = chrono::Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let number = new_order_number("GV", now);
        let parts: Vec<&str> = number.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "GV");
        assert_eq!(parts[1], "20260314");
        assert_eq!(parts[2].len(), ORDER_NUMBER_SUFFIX_LEN);
        assert!(parts[2].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn order_ids_are_distinct() {
        let a = new_order_id();
        let b = new_order_id();
        assert_eq!(a.as_str().len(), ORDER_ID_LEN);
        assert_ne!(a, b);
    }
}
