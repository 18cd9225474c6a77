use std::sync::Arc;

use async_trait::async_trait;
use gvs_common::Secret;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde_json::{json, Value};
use thiserror::Error;

use super::NotificationGateway;

pub const FONNTE_API_URL: &str = "https://api.fonnte.com/send";
const DEFAULT_COUNTRY_CODE: &str = "62";

#[derive(Debug, Clone, Error)]
#[error("Could not initialise the Fonnte gateway: {0}")]
pub struct FonnteInitError(String);

#[derive(Clone, Debug, Default)]
pub struct FonnteConfig {
    pub api_url: String,
    pub token: Secret<String>,
    /// Country code Fonnte should assume for numbers given without one.
    pub country_code: String,
}

impl FonnteConfig {
    pub fn new(token: String) -> Self {
        Self {
            api_url: FONNTE_API_URL.to_string(),
            token: Secret::new(token),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
        }
    }

    /// Builds the config from `GVS_FONNTE_TOKEN`, with `GVS_FONNTE_URL` and
    /// `GVS_FONNTE_COUNTRY_CODE` as optional overrides. Returns `None` when no token is set.
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("GVS_FONNTE_TOKEN").ok().filter(|t| !t.trim().is_empty())?;
        let mut config = Self::new(token);
        if let Ok(url) = std::env::var("GVS_FONNTE_URL") {
            config.api_url = url;
        }
        if let Ok(cc) = std::env::var("GVS_FONNTE_COUNTRY_CODE") {
            config.country_code = cc;
        }
        Some(config)
    }
}

/// WhatsApp delivery via the Fonnte HTTP API.
///
/// A send is a single POST; Fonnte reports acceptance with `"status": true` in the response body.
/// Anything else, including transport errors, is logged and reported as an undelivered send.
#[derive(Clone)]
pub struct FonnteGateway {
    config: FonnteConfig,
    client: Arc<Client>,
}

impl FonnteGateway {
    pub fn new(config: FonnteConfig) -> Result<Self, FonnteInitError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.token.reveal().as_str())
            .map_err(|e| FonnteInitError(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client =
            Client::builder().default_headers(headers).build().map_err(|e| FonnteInitError(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }
}

#[async_trait]
impl NotificationGateway for FonnteGateway {
    async fn send(&self, phone: &str, message: &str) -> bool {
        let body = json!({
            "target": phone,
            "message": message,
            "countryCode": self.config.country_code,
        });
        let response = match self.client.post(&self.config.api_url).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("📨️ Could not reach the Fonnte API: {e}");
                return false;
            },
        };
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            warn!("📨️ Fonnte API returned {status}: {detail}");
            return false;
        }
        match response.json::<Value>().await {
            Ok(data) => {
                trace!("📨️ Fonnte send result: {data}");
                data["status"].as_bool().unwrap_or(false)
            },
            Err(e) => {
                warn!("📨️ Could not decode the Fonnte API response: {e}");
                false
            },
        }
    }
}
