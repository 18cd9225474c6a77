use std::sync::Arc;

use dotenvy::dotenv;
use gamevault_engine::{
    config::EngineConfig,
    helpers::clock::SystemClock,
    notify::{FonnteConfig, FonnteGateway, LoggingGateway, NotificationGateway, Notifier},
    sweeper::start_expiry_worker,
    SqliteDatabase,
};
use log::*;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let config = EngineConfig::from_env_or_default();

    let db = match SqliteDatabase::new_with_url(&config.database_url, 5).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Could not open the order database: {e}");
            return;
        },
    };

    let gateway: Arc<dyn NotificationGateway> = match FonnteConfig::from_env() {
        Some(fonnte) => match FonnteGateway::new(fonnte) {
            Ok(gateway) => Arc::new(gateway),
            Err(e) => {
                eprintln!("{e}");
                return;
            },
        },
        None => {
            warn!("📨️ GVS_FONNTE_TOKEN is not set. Notifications will only be logged.");
            Arc::new(LoggingGateway)
        },
    };
    let notifier = Notifier::new(gateway, &config);

    info!("🚀️ Starting the GameVault expiry sweeper (every {}s)", config.sweep_interval.as_secs());
    let worker = start_expiry_worker(db, notifier, Arc::new(SystemClock), config);
    match worker.await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}
