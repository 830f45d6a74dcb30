//! CoinGecko Spot-Price Client
//!
//! Straight passthrough: the upstream JSON body is relayed to the dashboard
//! unmodified. No caching, no retries, no shape validation beyond "is JSON".

use crate::error::{ApiError, Result};
use serde_json::Value;
use tracing::{debug, warn};

pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: String,
}

impl CoinGeckoClient {
    /// # Arguments
    /// * `base_url` - CoinGecko API base, e.g. "https://api.coingecko.com/api/v3"
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Fetch the spot price for an asset in a currency, raw
    pub async fn simple_price(&self, id: &str, currency: &str) -> Result<Value> {
        debug!("Fetching spot price for {} in {}", id, currency);

        let response = self
            .http
            .get(format!("{}/simple/price", self.base_url))
            .query(&[("ids", id), ("vs_currencies", currency)])
            .send()
            .await
            .map_err(|e| {
                warn!("CoinGecko request failed: {}", e);
                price_unavailable()
            })?;

        if !response.status().is_success() {
            warn!("CoinGecko returned {}", response.status());
            return Err(price_unavailable());
        }

        response.json::<Value>().await.map_err(|e| {
            warn!("Failed to decode CoinGecko response: {}", e);
            price_unavailable()
        })
    }
}

fn price_unavailable() -> ApiError {
    ApiError::UpstreamUnavailable("Failed to fetch live price".to_string())
}
