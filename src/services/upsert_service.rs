use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use tracing::{info, warn};

use crate::errors::SymbolError;
use crate::external::price_provider::ChartSeries;
use crate::models::HistoricalDataPoint;
use crate::store::HistoryStore;

/// One record per timestamp, dated by the UTC calendar day. Values are
/// carried over as-is, nulls included. A date seen twice keeps the later
/// entry, and the result is ordered by date.
pub fn to_data_points(stock_id: i64, series: &ChartSeries) -> Vec<HistoricalDataPoint> {
    let mut by_date: BTreeMap<NaiveDate, HistoricalDataPoint> = BTreeMap::new();

    for (i, ts) in series.timestamps.iter().enumerate() {
        let Some(date) = DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()) else {
            warn!("Skipping out-of-range timestamp {} for stock {}", ts, stock_id);
            continue;
        };

        by_date.insert(
            date,
            HistoricalDataPoint {
                stock_id,
                date,
                open: series.open.get(i).copied().flatten(),
                high: series.high.get(i).copied().flatten(),
                low: series.low.get(i).copied().flatten(),
                close: series.close.get(i).copied().flatten(),
                volume: series.volume.get(i).copied().flatten(),
            },
        );
    }

    by_date.into_values().collect()
}

/// Upserts the stock, then its series. Returns the number of records written.
pub async fn write_history(
    store: &dyn HistoryStore,
    symbol: &str,
    series: &ChartSeries,
) -> Result<usize, SymbolError> {
    let stock = store
        .upsert_stock(symbol)
        .await
        .map_err(|e| SymbolError::StockUpsert {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        })?
        .ok_or_else(|| SymbolError::StockUpsert {
            symbol: symbol.to_string(),
            reason: "no row returned".to_string(),
        })?;

    let points = to_data_points(stock.id, series);

    if !points.is_empty() {
        store
            .upsert_history(&points)
            .await
            .map_err(|source| SymbolError::HistoricalUpsert {
                symbol: symbol.to_string(),
                source,
            })?;
    }

    info!("✓ {}: {} records written", symbol, points.len());
    Ok(points.len())
}
