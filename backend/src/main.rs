use std::sync::Arc;
use std::time::Duration;

use crate::{
    analysis::AnalysisService,
    api::{AppState, cors_layer, create_router},
    cache::AnalysisCache,
    coingecko::CoinGeckoClient,
    config::Config,
    taapi::{IndicatorSource, TaapiClient},
};

mod analysis;
mod api;
mod cache;
mod coingecko;
mod config;
mod error;
mod symbol;
mod taapi;
mod types;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (print debug messages)
    tracing_subscriber::fmt::init();

    tracing::info!("🚀 Starting Trade Oracle Backend...");

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    // Shared HTTP client; carries the upstream request timeout
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.upstream_timeout_seconds))
        .build()?;

    // Composition root: the cache and both upstream clients are built here
    // once and injected, never reached through globals
    let source: Option<Arc<dyn IndicatorSource>> = match &config.taapi_key {
        Some(key) => Some(Arc::new(TaapiClient::new(
            http.clone(),
            config.taapi_url.clone(),
            key.clone(),
        ))),
        None => {
            tracing::warn!("TAAPI_KEY not set; /api/analysis will report a configuration error");
            None
        }
    };

    let cache = AnalysisCache::new().with_ttl(Duration::from_secs(config.cache_ttl_seconds));

    let state = AppState {
        analysis: Arc::new(AnalysisService::new(source, cache)),
        prices: Arc::new(CoinGeckoClient::new(http, config.coingecko_url.clone())),
    };

    let app = create_router(state, cors_layer(&config));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.server_port)).await?;
    tracing::info!("🌐 Server running on port {}", config.server_port);

    axum::serve(listener, app).await?;

    Ok(())
}
