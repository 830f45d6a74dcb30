use serde::{Deserialize, Serialize};

/// Normalized analysis payload served to the dashboard
///
/// Built once from a TAAPI bulk response (or returned verbatim from cache);
/// never partially updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Recommendation summary
    pub summary: AnalysisSummary,

    /// Raw indicator values
    pub indicators: IndicatorValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    #[serde(rename = "RECOMMENDATION")]
    pub recommendation: Recommendation,
}

/// Primary values of the three requested indicators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValues {
    #[serde(rename = "RSI")]
    pub rsi: f64,

    #[serde(rename = "MACD")]
    pub macd: f64,

    #[serde(rename = "SMA")]
    pub sma: f64,
}

/// Trading recommendation derived from RSI
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Sell,
    Neutral,
}

impl Recommendation {
    /// Single-indicator decision rule
    ///
    /// RSI above 70 is treated as overbought, below 30 as oversold. The
    /// boundaries themselves are NEUTRAL.
    pub fn from_rsi(rsi: f64) -> Self {
        if rsi > 70.0 {
            Recommendation::Sell
        } else if rsi < 30.0 {
            Recommendation::Buy
        } else {
            Recommendation::Neutral
        }
    }
}

impl AnalysisResult {
    pub fn from_indicators(indicators: IndicatorValues) -> Self {
        AnalysisResult {
            summary: AnalysisSummary {
                recommendation: Recommendation::from_rsi(indicators.rsi),
            },
            indicators,
        }
    }
}
