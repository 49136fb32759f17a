use chrono::NaiveDate;

use crate::errors::SymbolError;
use crate::store::HistoryStore;

/// Latest stored trading date for `symbol`, or `None` for a new symbol or a
/// stock without rows. Symbols are matched exactly.
pub async fn resolve_watermark(
    store: &dyn HistoryStore,
    symbol: &str,
) -> Result<Option<NaiveDate>, SymbolError> {
    let resolver_failed = |source| SymbolError::Resolver {
        symbol: symbol.to_string(),
        source,
    };

    let Some(stock) = store.find_stock(symbol).await.map_err(resolver_failed)? else {
        return Ok(None);
    };

    store.latest_date(stock.id).await.map_err(resolver_failed)
}

/// First date to request after a watermark.
pub fn next_start_date(watermark: Option<NaiveDate>) -> Option<NaiveDate> {
    watermark.and_then(|date| date.succ_opt())
}
