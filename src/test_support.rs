//! In-memory collaborators for unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::external::price_provider::{ChartSeries, PriceHistoryProvider, PriceProviderError};
use crate::models::{HistoricalDataPoint, Stock};
use crate::store::HistoryStore;

#[derive(Default)]
struct MemoryState {
    stocks: Vec<Stock>,
    history: BTreeMap<(i64, NaiveDate), HistoricalDataPoint>,
}

/// Store honoring the same uniqueness rules as the Postgres schema.
#[derive(Default)]
pub struct MemoryHistoryStore {
    state: Mutex<MemoryState>,
    pub fail_reads: Mutex<bool>,
    pub fail_history_writes: Mutex<bool>,
    pub drop_stock_rows: Mutex<bool>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stock_count(&self) -> usize {
        self.state.lock().stocks.len()
    }

    pub fn history_count(&self) -> usize {
        self.state.lock().history.len()
    }

    pub fn history_for(&self, symbol: &str) -> Vec<HistoricalDataPoint> {
        let state = self.state.lock();
        let Some(stock) = state.stocks.iter().find(|s| s.symbol == symbol) else {
            return Vec::new();
        };
        state
            .history
            .values()
            .filter(|p| p.stock_id == stock.id)
            .cloned()
            .collect()
    }

    /// Seeds a stock with rows for the given dates.
    pub fn seed(&self, symbol: &str, dates: &[NaiveDate]) {
        let mut state = self.state.lock();
        let id = state.stocks.len() as i64 + 1;
        state.stocks.push(Stock {
            id,
            symbol: symbol.to_string(),
        });
        for date in dates {
            state.history.insert(
                (id, *date),
                HistoricalDataPoint {
                    stock_id: id,
                    date: *date,
                    open: Some(1.0),
                    high: Some(1.0),
                    low: Some(1.0),
                    close: Some(1.0),
                    volume: Some(1),
                },
            );
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn find_stock(&self, symbol: &str) -> Result<Option<Stock>, sqlx::Error> {
        if *self.fail_reads.lock() {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self
            .state
            .lock()
            .stocks
            .iter()
            .find(|s| s.symbol == symbol)
            .cloned())
    }

    async fn latest_date(&self, stock_id: i64) -> Result<Option<NaiveDate>, sqlx::Error> {
        if *self.fail_reads.lock() {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self
            .state
            .lock()
            .history
            .keys()
            .filter(|(id, _)| *id == stock_id)
            .map(|(_, date)| *date)
            .max())
    }

    async fn upsert_stock(&self, symbol: &str) -> Result<Option<Stock>, sqlx::Error> {
        if *self.drop_stock_rows.lock() {
            return Ok(None);
        }
        let mut state = self.state.lock();
        if let Some(stock) = state.stocks.iter().find(|s| s.symbol == symbol) {
            return Ok(Some(stock.clone()));
        }
        let stock = Stock {
            id: state.stocks.len() as i64 + 1,
            symbol: symbol.to_string(),
        };
        state.stocks.push(stock.clone());
        Ok(Some(stock))
    }

    async fn upsert_history(&self, points: &[HistoricalDataPoint]) -> Result<u64, sqlx::Error> {
        if *self.fail_history_writes.lock() {
            return Err(sqlx::Error::PoolClosed);
        }
        let mut state = self.state.lock();
        for p in points {
            if !state.stocks.iter().any(|s| s.id == p.stock_id) {
                return Err(sqlx::Error::RowNotFound);
            }
            state.history.insert((p.stock_id, p.date), p.clone());
        }
        Ok(points.len() as u64)
    }
}

/// Provider answering from canned series, tracking concurrency and calls.
#[derive(Default)]
pub struct ScriptedProvider {
    series: HashMap<String, ChartSeries>,
    vendor_errors: HashMap<String, String>,
    pub latency: Duration,
    pub calls: Mutex<Vec<(String, Option<NaiveDate>)>>,
    pub events: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_series(mut self, symbol: &str, series: ChartSeries) -> Self {
        self.series.insert(symbol.to_string(), series);
        self
    }

    pub fn with_vendor_error(mut self, symbol: &str, description: &str) -> Self {
        self.vendor_errors
            .insert(symbol.to_string(), description.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, Option<NaiveDate>)> {
        self.calls.lock().clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl PriceHistoryProvider for ScriptedProvider {
    async fn fetch_history(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
    ) -> Result<ChartSeries, PriceProviderError> {
        self.calls.lock().push((symbol.to_string(), start));
        self.events.lock().push(format!("start {symbol}"));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.latency).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.events.lock().push(format!("end {symbol}"));

        if let Some(description) = self.vendor_errors.get(symbol) {
            return Err(PriceProviderError::Vendor(description.clone()));
        }

        let mut series = self.series.get(symbol).cloned().unwrap_or_default();
        // Honor the requested window like the vendor does.
        if let Some(start) = start {
            let first = start.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
            let keep: Vec<usize> = (0..series.len())
                .filter(|i| series.timestamps[*i] >= first)
                .collect();
            series = ChartSeries {
                name: series.name.clone(),
                timestamps: keep.iter().map(|i| series.timestamps[*i]).collect(),
                open: keep.iter().map(|i| series.open[*i]).collect(),
                high: keep.iter().map(|i| series.high[*i]).collect(),
                low: keep.iter().map(|i| series.low[*i]).collect(),
                close: keep.iter().map(|i| series.close[*i]).collect(),
                volume: keep.iter().map(|i| series.volume[*i]).collect(),
            };
        }
        if series.name.is_empty() {
            series.name = symbol.to_string();
        }
        Ok(series)
    }
}

/// Daily series at UTC midnight for consecutive days starting at `first`.
pub fn daily_series(first: NaiveDate, days: usize) -> ChartSeries {
    let base = first.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
    let timestamps: Vec<i64> = (0..days as i64).map(|i| base + i * 86_400).collect();
    let prices: Vec<Option<f64>> = (0..days).map(|i| Some(10.0 + i as f64)).collect();
    ChartSeries {
        name: String::new(),
        timestamps,
        open: prices.clone(),
        high: prices.clone(),
        low: prices.clone(),
        close: prices,
        volume: (0..days).map(|i| Some(1_000 + i as i64)).collect(),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
