//! REST API
//!
//! HTTP surface for the dashboard: the analysis proxy, the price
//! passthrough, and a liveness probe.

use crate::{
    analysis::AnalysisService,
    coingecko::CoinGeckoClient,
    config::Config,
    error::{ApiError, Result},
    types::AnalysisResult,
};
use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub analysis: Arc<AnalysisService>,
    pub prices: Arc<CoinGeckoClient>,
}

/// Create the API router
pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api/analysis", get(get_analysis))
        .route("/api/price", get(get_price))
        .route("/api/health", get(health_check))
        .layer(cors)
        .with_state(state)
}

/// CORS layer from the configured origin allow-list
pub fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

// ============================================================================
// HANDLERS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    pub symbol: Option<String>,
}

/// GET /api/analysis?symbol=BTCUSDT
async fn get_analysis(
    State(state): State<AppState>,
    Query(params): Query<AnalysisQuery>,
) -> Result<Json<AnalysisResult>> {
    info!("Analysis requested for {:?}", params.symbol);

    state
        .analysis
        .get_analysis(params.symbol.as_deref())
        .await
        .map(Json)
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    #[serde(default = "default_asset_id")]
    pub id: String,

    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_asset_id() -> String {
    "bitcoin".to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

/// GET /api/price?id=bitcoin&currency=usd
///
/// Raw upstream passthrough, no caching
async fn get_price(
    State(state): State<AppState>,
    Query(params): Query<PriceQuery>,
) -> Result<Json<Value>> {
    info!("Price requested for {} in {}", params.id, params.currency);

    state
        .prices
        .simple_price(&params.id, &params.currency)
        .await
        .map(Json)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
}

/// GET /api/health
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { success: true })
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ConfigurationError | ApiError::UpstreamUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(serde_json::json!({ "error": self.to_string() }));

        (status, body).into_response()
    }
}
