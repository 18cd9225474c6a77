use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use gamevault_engine::{
    config::EngineConfig,
    notify::Notifier,
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        MemoryGateway, TestClock,
    },
    CheckoutRequest, OrderFlowApi, SqliteDatabase,
};
use gvs_common::Rupiah;

pub const ADMIN_PHONE: &str = "628555000111";
pub const CUSTOMER_PHONE: &str = "6281234567890";

pub struct TestHarness {
    pub api: OrderFlowApi<SqliteDatabase>,
    pub gateway: MemoryGateway,
    pub clock: TestClock,
}

/// A fresh engine over a fresh database, with a 15-minute payment window, a 30-minute processing
/// timeout, a recording notification gateway, and a clock that only moves when told to.
pub async fn new_harness() -> TestHarness {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let clock = TestClock::at(Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap());
    let config = EngineConfig {
        payment_window: Duration::minutes(15),
        processing_timeout: Duration::minutes(30),
        admin_phone: ADMIN_PHONE.to_string(),
        ..EngineConfig::default()
    };
    let gateway = MemoryGateway::new();
    let notifier = Notifier::new(Arc::new(gateway.clone()), &config);
    let api = OrderFlowApi::new(db, notifier, Arc::new(clock.clone()), config);
    TestHarness { api, gateway, clock }
}

pub fn checkout() -> CheckoutRequest {
    CheckoutRequest {
        customer_name: "Rina Wijaya".to_string(),
        customer_email: "rina@example.com".to_string(),
        customer_phone: CUSTOMER_PHONE.to_string(),
        product_id: "prod-ml-epic".to_string(),
        product_name: "Mobile Legends Epic Account".to_string(),
        unit_price: Rupiah::from(150_000),
        quantity: 1,
    }
}
