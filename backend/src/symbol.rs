use crate::error::{ApiError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported trading pairs
///
/// The service only serves a fixed allow-list of three pairs. Each pair has
/// two textual forms that must never be mixed up:
/// - display form: `"BTCUSDT"` — the query-string encoding and the cache key
/// - upstream form: `"BTC/USDT"` — what TAAPI expects
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Symbol {
    BtcUsdt,
    EthUsdt,
    SolUsdt,
}

impl Symbol {
    pub const ALL: [Symbol; 3] = [Symbol::BtcUsdt, Symbol::EthUsdt, Symbol::SolUsdt];

    /// Display form, e.g. "BTCUSDT"
    pub fn display_form(&self) -> &'static str {
        match self {
            Symbol::BtcUsdt => "BTCUSDT",
            Symbol::EthUsdt => "ETHUSDT",
            Symbol::SolUsdt => "SOLUSDT",
        }
    }

    /// Upstream form, e.g. "BTC/USDT"
    pub fn upstream_form(&self) -> &'static str {
        match self {
            Symbol::BtcUsdt => "BTC/USDT",
            Symbol::EthUsdt => "ETH/USDT",
            Symbol::SolUsdt => "SOL/USDT",
        }
    }

    /// Parse a display-form symbol from a query parameter
    ///
    /// Applies the display-to-upstream transform, then checks the result
    /// against the allow-list. Anything outside the three supported pairs is
    /// rejected here, before any upstream call is made.
    pub fn parse(input: &str) -> Result<Symbol> {
        let normalized = normalize_symbol(input);

        Symbol::ALL
            .into_iter()
            .find(|s| s.upstream_form() == normalized)
            .ok_or_else(|| ApiError::InvalidRequest(format!("Unsupported symbol: {}", input)))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_form())
    }
}

/// Display-to-upstream transform: "BTCUSDT" → "BTC/USDT"
///
/// Pure string rewrite; inputs already carrying a separator come out with a
/// double slash and fail the allow-list check.
fn normalize_symbol(symbol: &str) -> String {
    symbol.replace("USDT", "/USDT")
}
