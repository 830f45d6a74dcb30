//! TAAPI Bulk Indicator Client
//!
//! Fetches RSI, MACD and SMA for a trading pair in a single batched call to
//! the TAAPI `/bulk` endpoint and extracts each indicator's primary value.
//!
//! Upstream HTTP failures are classified into the crate error taxonomy here
//! (429 → rate limited, 401 → bad credential, 400 → invalid request with the
//! upstream detail when present, everything else → unavailable).

use crate::{
    error::{ApiError, Result},
    symbol::Symbol,
    types::IndicatorValues,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Interval requested for every indicator
const INTERVAL: &str = "1h";

/// Exchange identifier sent with every bulk request
const EXCHANGE: &str = "binance";

/// Source of indicator data for the analysis service
///
/// The service only ever talks to this trait, so tests can swap the real
/// client for a counting fake.
#[async_trait]
pub trait IndicatorSource: Send + Sync {
    /// Fetch the three indicators for a symbol in one upstream call
    async fn fetch_indicators(&self, symbol: Symbol) -> Result<IndicatorValues>;
}

/// HTTP client for the TAAPI bulk endpoint
pub struct TaapiClient {
    http: reqwest::Client,
    base_url: String,
    secret: String,
}

impl TaapiClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `http` - shared reqwest client (carries the request timeout)
    /// * `base_url` - TAAPI base URL, e.g. "https://api.taapi.io"
    /// * `secret` - TAAPI API key
    pub fn new(http: reqwest::Client, base_url: String, secret: String) -> Self {
        Self {
            http,
            base_url,
            secret,
        }
    }

    fn bulk_request(&self, symbol: Symbol) -> BulkRequest {
        BulkRequest {
            secret: self.secret.clone(),
            construct: Construct {
                exchange: EXCHANGE,
                symbol: symbol.upstream_form().to_string(),
                interval: INTERVAL,
                indicators: vec![
                    IndicatorRequest {
                        id: "rsi",
                        indicator: "rsi",
                    },
                    IndicatorRequest {
                        id: "macd",
                        indicator: "macd",
                    },
                    IndicatorRequest {
                        id: "sma",
                        indicator: "sma",
                    },
                ],
            },
        }
    }
}

#[async_trait]
impl IndicatorSource for TaapiClient {
    async fn fetch_indicators(&self, symbol: Symbol) -> Result<IndicatorValues> {
        debug!("Requesting TAAPI bulk indicators for {}", symbol);

        let response = self
            .http
            .post(format!("{}/bulk", self.base_url))
            .json(&self.bulk_request(symbol))
            .send()
            .await
            .map_err(|e| {
                warn!("TAAPI request failed for {}: {}", symbol, e);
                unavailable()
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.json::<UpstreamError>().await.ok();
            warn!(
                "TAAPI returned {} for {}: {:?}",
                status,
                symbol,
                detail.as_ref().and_then(|d| d.error.as_deref())
            );
            return Err(classify_failure(status, detail));
        }

        let body: BulkResponse = response.json().await.map_err(|e| {
            warn!("Failed to decode TAAPI response for {}: {}", symbol, e);
            unavailable()
        })?;

        Ok(extract_indicators(&body))
    }
}

/// Map an upstream error status to the crate taxonomy
fn classify_failure(status: StatusCode, detail: Option<UpstreamError>) -> ApiError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::BAD_REQUEST => {
            let detail = detail
                .and_then(|d| d.error)
                .unwrap_or_else(|| "Check symbol or parameters".to_string());
            ApiError::InvalidRequest(format!("Invalid request: {}", detail))
        }
        _ => unavailable(),
    }
}

fn unavailable() -> ApiError {
    ApiError::UpstreamUnavailable("Failed to fetch analysis. Please try again.".to_string())
}

/// Pull each indicator's primary value out of the batch response
///
/// An indicator missing from the response (or missing its value field)
/// defaults to 0 rather than failing the whole request; partial upstream
/// data still produces a payload.
fn extract_indicators(body: &BulkResponse) -> IndicatorValues {
    IndicatorValues {
        rsi: indicator_value(body, "rsi", "value"),
        macd: indicator_value(body, "macd", "valueMACD"),
        sma: indicator_value(body, "sma", "value"),
    }
}

fn indicator_value(body: &BulkResponse, id: &str, field: &str) -> f64 {
    body.data
        .iter()
        .find(|entry| entry.id == id)
        .and_then(|entry| entry.result.get(field))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct BulkRequest {
    secret: String,
    construct: Construct,
}

#[derive(Debug, Serialize)]
struct Construct {
    exchange: &'static str,
    symbol: String,
    interval: &'static str,
    indicators: Vec<IndicatorRequest>,
}

#[derive(Debug, Serialize)]
struct IndicatorRequest {
    id: &'static str,
    indicator: &'static str,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    data: Vec<IndicatorEntry>,
}

#[derive(Debug, Deserialize)]
struct IndicatorEntry {
    id: String,
    /// Shape differs per indicator, so keep it loose
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    error: Option<String>,
}
