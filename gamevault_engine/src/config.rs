use std::env;

use chrono::Duration;
use log::*;

const DEFAULT_PAYMENT_WINDOW: Duration = Duration::minutes(15);
const DEFAULT_PROCESSING_TIMEOUT: Duration = Duration::minutes(30);
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ORDER_PREFIX: &str = "GV";

/// All tunables the engine needs. The durations in particular are parameters rather than
/// constants so tests can run with windows measured in seconds.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub database_url: String,
    /// How long a customer has to pay before a PENDING order is cancelled.
    pub payment_window: Duration,
    /// How long a paid order may sit undelivered before the refund escalation fires.
    pub processing_timeout: Duration,
    /// How often the expiry sweeper runs.
    pub sweep_interval: std::time::Duration,
    /// Prefix for generated order numbers.
    pub order_prefix: String,
    /// Phone number that receives the admin alerts.
    pub admin_phone: String,
    /// Upper bound on a single notification send. State commits never wait longer than this.
    pub notify_timeout: std::time::Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: String::default(),
            payment_window: DEFAULT_PAYMENT_WINDOW,
            processing_timeout: DEFAULT_PROCESSING_TIMEOUT,
            sweep_interval: std::time::Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            order_prefix: DEFAULT_ORDER_PREFIX.to_string(),
            admin_phone: String::default(),
            notify_timeout: std::time::Duration::from_secs(DEFAULT_NOTIFY_TIMEOUT_SECS),
        }
    }
}

impl EngineConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env::var("GVS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ GVS_DATABASE_URL is not set. I hope you know what you're doing!");
            String::default()
        });
        let payment_window = minutes_from_env("GVS_PAYMENT_WINDOW_MINUTES", DEFAULT_PAYMENT_WINDOW);
        let processing_timeout = minutes_from_env("GVS_PROCESSING_TIMEOUT_MINUTES", DEFAULT_PROCESSING_TIMEOUT);
        let sweep_interval = seconds_from_env("GVS_SWEEP_INTERVAL_SECONDS", DEFAULT_SWEEP_INTERVAL_SECS);
        let notify_timeout = seconds_from_env("GVS_NOTIFY_TIMEOUT_SECONDS", DEFAULT_NOTIFY_TIMEOUT_SECS);
        let order_prefix = env::var("GVS_ORDER_PREFIX")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ORDER_PREFIX.to_string());
        let admin_phone = env::var("GVS_ADMIN_PHONE").ok().unwrap_or_else(|| {
            warn!("🪛️ GVS_ADMIN_PHONE is not set. Admin alerts will go nowhere.");
            String::default()
        });
        Self {
            database_url,
            payment_window,
            processing_timeout,
            sweep_interval,
            order_prefix,
            admin_phone,
            notify_timeout,
        }
    }
}

fn minutes_from_env(var: &str, default: Duration) -> Duration {
    match env::var(var) {
        Ok(s) => match s.parse::<i64>() {
            Ok(m) if m > 0 => Duration::minutes(m),
            _ => {
                warn!(
                    "🪛️ '{s}' is not a valid value for {var}. Using the default, {} minutes, instead.",
                    default.num_minutes()
                );
                default
            },
        },
        Err(_) => default,
    }
}

fn seconds_from_env(var: &str, default_secs: u64) -> std::time::Duration {
    match env::var(var) {
        Ok(s) => match s.parse::<u64>() {
            Ok(secs) if secs > 0 => std::time::Duration::from_secs(secs),
            _ => {
                warn!("🪛️ '{s}' is not a valid value for {var}. Using the default, {default_secs}s, instead.");
                std::time::Duration::from_secs(default_secs)
            },
        },
        Err(_) => std::time::Duration::from_secs(default_secs),
    }
}
