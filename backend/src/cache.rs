//! In-Memory Analysis Cache
//!
//! TAAPI rate-limits aggressively on the free tier, so every successful
//! analysis is held for a TTL and served from memory on repeat requests.
//!
//! # Architecture
//! ```text
//! Request → Check Cache → Hit? → Return
//!              ↓
//!            Miss? → Fetch TAAPI → Store Cache → Return
//! ```
//!
//! # Cache Strategy
//! - TTL: 600 seconds
//! - Key: display-form symbol (one global slot per pair)
//! - Expiry enforced lazily at read time; stale entries are evicted on read
//! - Entries are replaced whole on refresh, never merged

use crate::{symbol::Symbol, types::AnalysisResult};
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default cache TTL
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

struct CacheEntry {
    result: AnalysisResult,
    inserted_at: Instant,
}

/// Process-wide analysis cache
///
/// Constructed once at startup and handed to the analysis service; there is
/// no hidden global. DashMap keeps per-key get/set/delete atomic under the
/// multithreaded runtime. Two misses for the same key may still race to
/// populate — last writer wins, both hold equally fresh data.
pub struct AnalysisCache {
    entries: DashMap<Symbol, CacheEntry>,
    ttl: Duration,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Set custom TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Whether a live entry exists for the symbol
    pub fn has(&self, symbol: Symbol) -> bool {
        self.entries
            .get(&symbol)
            .is_some_and(|entry| entry.inserted_at.elapsed() < self.ttl)
    }

    /// Retrieve a live entry, evicting it if it has expired
    pub fn get(&self, symbol: Symbol) -> Option<AnalysisResult> {
        let entry = self.entries.get(&symbol)?;

        if entry.inserted_at.elapsed() >= self.ttl {
            drop(entry); // release the read guard before removing
            self.entries.remove(&symbol);
            debug!("Cache EXPIRED for {}", symbol);
            return None;
        }

        debug!("Cache HIT for {}", symbol);
        Some(entry.result.clone())
    }

    /// Store a result, overwriting any existing entry and resetting its TTL
    pub fn set(&self, symbol: Symbol, result: AnalysisResult) {
        self.entries.insert(
            symbol,
            CacheEntry {
                result,
                inserted_at: Instant::now(),
            },
        );
        debug!("Cached analysis for {} (TTL: {:?})", symbol, self.ttl);
    }

    /// Remove an entry so the next request re-fetches
    pub fn delete(&self, symbol: Symbol) {
        if self.entries.remove(&symbol).is_some() {
            debug!("Deleted cache entry for {}", symbol);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IndicatorValues;
    use std::thread;

    fn sample_result(rsi: f64) -> AnalysisResult {
        AnalysisResult::from_indicators(IndicatorValues {
            rsi,
            macd: 1.0,
            sma: 50000.0,
        })
    }

    #[test]
    fn set_and_get() {
        let cache = AnalysisCache::new();
        let result = sample_result(55.0);

        cache.set(Symbol::BtcUsdt, result.clone());

        assert!(cache.has(Symbol::BtcUsdt));
        assert_eq!(cache.get(Symbol::BtcUsdt), Some(result));
        assert!(!cache.has(Symbol::EthUsdt));
        assert_eq!(cache.get(Symbol::EthUsdt), None);
    }

    #[test]
    fn delete_removes_entry() {
        let cache = AnalysisCache::new();
        cache.set(Symbol::SolUsdt, sample_result(40.0));

        cache.delete(Symbol::SolUsdt);

        assert!(!cache.has(Symbol::SolUsdt));
        assert!(cache.is_empty());
    }

    #[test]
    fn expired_entry_behaves_as_absent() {
        let cache = AnalysisCache::new().with_ttl(Duration::from_millis(40));
        cache.set(Symbol::BtcUsdt, sample_result(55.0));

        // Still live just inside the TTL
        assert!(cache.has(Symbol::BtcUsdt));

        thread::sleep(Duration::from_millis(60));

        assert!(!cache.has(Symbol::BtcUsdt));
        assert_eq!(cache.get(Symbol::BtcUsdt), None);
        // get() evicted the stale entry
        assert!(cache.is_empty());
    }

    #[test]
    fn set_resets_ttl() {
        let cache = AnalysisCache::new().with_ttl(Duration::from_millis(80));
        cache.set(Symbol::EthUsdt, sample_result(25.0));

        thread::sleep(Duration::from_millis(50));

        // Refresh replaces the entry and restarts its clock
        let refreshed = sample_result(35.0);
        cache.set(Symbol::EthUsdt, refreshed.clone());

        thread::sleep(Duration::from_millis(50));

        assert_eq!(cache.get(Symbol::EthUsdt), Some(refreshed));
    }

    #[test]
    fn overwrite_replaces_value() {
        let cache = AnalysisCache::new();
        cache.set(Symbol::BtcUsdt, sample_result(10.0));
        cache.set(Symbol::BtcUsdt, sample_result(90.0));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(Symbol::BtcUsdt), Some(sample_result(90.0)));
    }
}
