//! Analysis Proxy
//!
//! The one component with actual decision logic: validates the requested
//! symbol, serves from the TTL cache when possible, otherwise makes exactly
//! one upstream indicator fetch, derives a recommendation from RSI, and
//! keeps the cache honest on failure.
//!
//! # Flow
//! ```text
//! symbol param → validate → credential? → cache hit? → return cached
//!                                             ↓ miss
//!                                       fetch TAAPI once
//!                                        ↓ ok        ↓ err
//!                                  derive + cache   delete cache entry
//!                                      return        propagate error
//! ```
//!
//! A failed refresh always deletes the key before the error propagates, so a
//! later request re-fetches instead of finding stale data. No retries are
//! made here; rate-limit backoff is the caller's problem.

use crate::{
    cache::AnalysisCache,
    error::{ApiError, Result},
    symbol::Symbol,
    taapi::IndicatorSource,
    types::AnalysisResult,
};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AnalysisService {
    /// None when no TAAPI credential was configured at startup; every
    /// analysis request then fails fast with a configuration error.
    source: Option<Arc<dyn IndicatorSource>>,
    cache: AnalysisCache,
}

impl AnalysisService {
    /// Wire the service to an indicator source and an explicitly owned cache
    pub fn new(source: Option<Arc<dyn IndicatorSource>>, cache: AnalysisCache) -> Self {
        Self { source, cache }
    }

    /// Get cache reference for direct access
    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Serve an analysis for a raw `symbol` query parameter
    pub async fn get_analysis(&self, symbol: Option<&str>) -> Result<AnalysisResult> {
        let raw = match symbol {
            Some(s) if !s.is_empty() => s,
            _ => return Err(ApiError::InvalidRequest("Symbol is required".to_string())),
        };

        let symbol = Symbol::parse(raw)?;

        // Credential check precedes any network activity
        let source = self.source.as_ref().ok_or(ApiError::ConfigurationError)?;

        if let Some(cached) = self.cache.get(symbol) {
            return Ok(cached);
        }

        debug!("Cache miss for {}, fetching from TAAPI", symbol);

        match source.fetch_indicators(symbol).await {
            Ok(indicators) => {
                let result = AnalysisResult::from_indicators(indicators);
                self.cache.set(symbol, result.clone());
                Ok(result)
            }
            Err(err) => {
                // Never leave a stale success payload addressable behind a
                // failed refresh
                self.cache.delete(symbol);
                warn!("Analysis fetch failed for {}: {}", symbol, err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IndicatorValues, Recommendation};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    enum UpstreamMode {
        Ok(IndicatorValues),
        RateLimited,
        Unavailable,
    }

    struct FakeSource {
        calls: AtomicUsize,
        mode: Mutex<UpstreamMode>,
    }

    impl FakeSource {
        fn ok(rsi: f64) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                mode: Mutex::new(UpstreamMode::Ok(IndicatorValues {
                    rsi,
                    macd: 2.5,
                    sma: 61000.0,
                })),
            })
        }

        fn set_mode(&self, mode: UpstreamMode) {
            *self.mode.lock().unwrap() = mode;
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IndicatorSource for FakeSource {
        async fn fetch_indicators(&self, _symbol: Symbol) -> Result<IndicatorValues> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &*self.mode.lock().unwrap() {
                UpstreamMode::Ok(values) => Ok(*values),
                UpstreamMode::RateLimited => Err(ApiError::RateLimited),
                UpstreamMode::Unavailable => Err(ApiError::UpstreamUnavailable(
                    "Failed to fetch analysis. Please try again.".to_string(),
                )),
            }
        }
    }

    fn service(source: Arc<FakeSource>) -> AnalysisService {
        AnalysisService::new(Some(source), AnalysisCache::new())
    }

    #[tokio::test]
    async fn warmed_cache_skips_upstream() {
        let source = FakeSource::ok(55.0);
        let service = service(source.clone());

        let first = service.get_analysis(Some("BTCUSDT")).await.unwrap();
        let second = service.get_analysis(Some("BTCUSDT")).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn distinct_symbols_use_distinct_slots() {
        let source = FakeSource::ok(55.0);
        let service = service(source.clone());

        service.get_analysis(Some("BTCUSDT")).await.unwrap();
        service.get_analysis(Some("ETHUSDT")).await.unwrap();
        service.get_analysis(Some("BTCUSDT")).await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn unsupported_symbol_makes_no_upstream_call() {
        let source = FakeSource::ok(55.0);
        let service = service(source.clone());

        let err = service.get_analysis(Some("DOGEUSD")).await.unwrap_err();

        assert!(matches!(err, ApiError::InvalidRequest(_)));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn missing_symbol_is_invalid_request() {
        let source = FakeSource::ok(55.0);
        let service = service(source.clone());

        let err = service.get_analysis(None).await.unwrap_err();
        assert_eq!(err.to_string(), "Symbol is required");

        let err = service.get_analysis(Some("")).await.unwrap_err();
        assert_eq!(err.to_string(), "Symbol is required");

        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn missing_credential_is_configuration_error() {
        let service = AnalysisService::new(None, AnalysisCache::new());

        let err = service.get_analysis(Some("BTCUSDT")).await.unwrap_err();
        assert!(matches!(err, ApiError::ConfigurationError));

        // Caller errors still win over the missing credential
        let err = service.get_analysis(Some("DOGEUSD")).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn recommendation_follows_rsi() {
        let cases = [
            (75.0, Recommendation::Sell),
            (25.0, Recommendation::Buy),
            (50.0, Recommendation::Neutral),
        ];

        for (rsi, expected) in cases {
            let service = service(FakeSource::ok(rsi));
            let result = service.get_analysis(Some("SOLUSDT")).await.unwrap();
            assert_eq!(result.summary.recommendation, expected);
            assert_eq!(result.indicators.rsi, rsi);
        }
    }

    #[tokio::test]
    async fn rate_limit_propagates_and_evicts() {
        let source = FakeSource::ok(55.0);
        let cache = AnalysisCache::new().with_ttl(Duration::from_millis(30));
        let service = AnalysisService::new(Some(source.clone()), cache);

        service.get_analysis(Some("BTCUSDT")).await.unwrap();
        assert!(service.cache().has(Symbol::BtcUsdt));

        tokio::time::sleep(Duration::from_millis(50)).await;
        source.set_mode(UpstreamMode::RateLimited);

        let err = service.get_analysis(Some("BTCUSDT")).await.unwrap_err();
        assert!(matches!(err, ApiError::RateLimited));
        assert!(!service.cache().has(Symbol::BtcUsdt));
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn failure_forces_clean_refetch() {
        let source = FakeSource::ok(55.0);
        let service = service(source.clone());
        source.set_mode(UpstreamMode::Unavailable);

        let err = service.get_analysis(Some("ETHUSDT")).await.unwrap_err();
        assert!(matches!(err, ApiError::UpstreamUnavailable(_)));

        // Recovery: next call goes upstream again instead of hitting cache
        source.set_mode(UpstreamMode::Ok(IndicatorValues {
            rsi: 40.0,
            macd: 0.0,
            sma: 3000.0,
        }));
        let result = service.get_analysis(Some("ETHUSDT")).await.unwrap();

        assert_eq!(source.calls(), 2);
        assert_eq!(result.indicators.rsi, 40.0);
    }

    #[tokio::test]
    async fn expired_entry_triggers_fresh_fetch() {
        let source = FakeSource::ok(55.0);
        let cache = AnalysisCache::new().with_ttl(Duration::from_millis(30));
        let service = AnalysisService::new(Some(source.clone()), cache);

        service.get_analysis(Some("BTCUSDT")).await.unwrap();
        service.get_analysis(Some("BTCUSDT")).await.unwrap();
        assert_eq!(source.calls(), 1);

        tokio::time::sleep(Duration::from_millis(50)).await;

        service.get_analysis(Some("BTCUSDT")).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn results_within_ttl_are_byte_identical() {
        let source = FakeSource::ok(62.0);
        let service = service(source.clone());

        let first = service.get_analysis(Some("BTCUSDT")).await.unwrap();
        let second = service.get_analysis(Some("BTCUSDT")).await.unwrap();

        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }
}
