use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

/// Raw daily series as returned by the vendor. Value arrays are aligned with
/// `timestamps` by index and may hold `None` for sessions without data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    /// Name echoed by the vendor, falling back to the requested ticker.
    pub name: String,
    pub timestamps: Vec<i64>,
    pub open: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
    pub close: Vec<Option<f64>>,
    pub volume: Vec<Option<i64>>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    /// The vendor answered with an error descriptor (unknown or delisted symbol).
    #[error("vendor error: {0}")]
    Vendor(String),
}

#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    /// Fetches daily bars from `start` (inclusive) up to today, or the full
    /// available history when `start` is `None`.
    async fn fetch_history(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
    ) -> Result<ChartSeries, PriceProviderError>;
}
