use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One trading day of OHLCV data for a stock.
///
/// Values are stored exactly as the vendor sent them; a session the vendor
/// reports without prices keeps its `None`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct HistoricalDataPoint {
    pub stock_id: i64,
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}
