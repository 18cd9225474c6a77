use std::str::FromStr;

use log::*;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

pub mod orders;

pub fn db_url() -> String {
    std::env::var("GVS_DATABASE_URL").unwrap_or_else(|_| {
        warn!("🗃️ GVS_DATABASE_URL is not set. Using the default, sqlite://data/gamevault.db");
        "sqlite://data/gamevault.db".to_string()
    })
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await
}
