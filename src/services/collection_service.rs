use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::config::CollectorSettings;
use crate::errors::{AppError, SymbolError};
use crate::external::price_provider::{ChartSeries, PriceHistoryProvider, PriceProviderError};
use crate::models::RunReport;
use crate::services::{upsert_service, watermark_service};
use crate::store::HistoryStore;
use crate::symbols;

/// Drives symbols through watermark lookup, fetch and upsert.
///
/// Symbols are split into consecutive groups of `group_size`. A group's
/// symbols run concurrently and the next group starts only once every
/// pipeline of the current one has settled, so no more than `group_size`
/// pipelines are ever in flight. A failing symbol is logged and reported but
/// never stops the run.
pub struct HistoryCollector {
    store: Arc<dyn HistoryStore>,
    provider: Arc<dyn PriceHistoryProvider>,
    settings: CollectorSettings,
}

impl HistoryCollector {
    pub fn new(
        store: Arc<dyn HistoryStore>,
        provider: Arc<dyn PriceHistoryProvider>,
        settings: CollectorSettings,
    ) -> Self {
        Self {
            store,
            provider,
            settings,
        }
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    pub async fn run(&self, symbols: &[&str]) -> Result<RunReport, AppError> {
        if self.settings.group_size == 0 {
            return Err(AppError::Validation("group size must be at least 1".into()));
        }

        let started = Instant::now();
        let groups = partition(symbols, self.settings.group_size);
        let group_count = groups.len();

        info!(
            "📈 Starting history collection: {} symbols in {} groups (group size {}, group delay {:?})",
            symbols.len(),
            group_count,
            self.settings.group_size,
            self.settings.group_delay
        );

        let mut report = RunReport::new(symbols.len(), group_count);

        for (index, group) in groups.into_iter().enumerate() {
            info!(
                "Processing group {}/{}: {:?}",
                index + 1,
                group_count,
                group
            );

            let results = join_all(group.iter().map(|symbol| self.collect_symbol(symbol))).await;

            for (symbol, result) in group.iter().zip(results) {
                match result {
                    Ok(written) => report.record_success(symbol, written),
                    Err(e) => {
                        error!("✗ Skipping {} this run ({}): {}", symbol, e.kind(), e);
                        report.record_failure(&e);
                    }
                }
            }

            if index + 1 < group_count && !self.settings.group_delay.is_zero() {
                tokio::time::sleep(self.settings.group_delay).await;
            }
        }

        report.elapsed = started.elapsed();
        info!("✅ {}", report.summary());

        Ok(report)
    }

    /// Full pipeline for one symbol.
    pub async fn collect_symbol(&self, symbol: &str) -> Result<usize, SymbolError> {
        let watermark = watermark_service::resolve_watermark(self.store.as_ref(), symbol).await?;
        let start = watermark_service::next_start_date(watermark);

        match watermark {
            Some(last) => info!("{}: last stored date {}, fetching from {:?}", symbol, last, start),
            None => info!("{}: no stored history, fetching full range", symbol),
        }

        let series = self.fetch_with_aliases(symbol, start).await?;
        upsert_service::write_history(self.store.as_ref(), symbol, &series).await
    }

    /// Falls back to known alternative tickers when the vendor rejects the
    /// symbol. Data is always stored under `symbol`.
    async fn fetch_with_aliases(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
    ) -> Result<ChartSeries, SymbolError> {
        let err = match self.provider.fetch_history(symbol, start).await {
            Ok(series) => return Ok(series),
            Err(err) => err,
        };

        if matches!(err, PriceProviderError::Vendor(_)) {
            for alias in symbols::aliases_for(symbol).iter().filter(|a| **a != symbol) {
                info!("Trying alias {} for {}", alias, symbol);
                match self.provider.fetch_history(alias, start).await {
                    Ok(series) => {
                        info!("Using data from alias {} for {}", alias, symbol);
                        return Ok(series);
                    }
                    Err(e) => warn!("Alias {} for {} failed: {}", alias, symbol, e),
                }
            }
        }

        Err(SymbolError::RemoteData {
            symbol: symbol.to_string(),
            source: err,
        })
    }
}

/// Consecutive groups of at most `size` symbols, in input order.
pub fn partition<'a, 'b>(symbols: &'a [&'b str], size: usize) -> Vec<&'a [&'b str]> {
    symbols.chunks(size.max(1)).collect()
}
