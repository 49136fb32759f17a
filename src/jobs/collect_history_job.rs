use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::RunReport;
use crate::services::collection_service::HistoryCollector;

/// Everything a collection run needs, shared by the scheduler and the
/// HTTP trigger.
///
/// Clones share one run guard, so at most one run is in progress per
/// process and the group size bounds the requests made to the vendor.
#[derive(Clone)]
pub struct JobContext {
    pub collector: Arc<HistoryCollector>,
    pub symbols: &'static [&'static str],
    run_guard: Arc<Mutex<()>>,
}

impl JobContext {
    pub fn new(collector: Arc<HistoryCollector>, symbols: &'static [&'static str]) -> Self {
        Self {
            collector,
            symbols,
            run_guard: Arc::new(Mutex::new(())),
        }
    }
}

#[derive(Debug)]
pub struct JobResult {
    pub items_processed: i32,
    pub items_failed: i32,
}

impl From<&RunReport> for JobResult {
    fn from(report: &RunReport) -> Self {
        Self {
            items_processed: report.succeeded.len() as i32,
            items_failed: report.failed.len() as i32,
        }
    }
}

/// Runs one collection over the configured symbols.
///
/// Refuses to start while another run holds the guard.
pub async fn collect_history(ctx: &JobContext) -> Result<RunReport, AppError> {
    let Ok(_running) = ctx.run_guard.try_lock() else {
        warn!("Collection already in progress, not starting another run");
        return Err(AppError::RunInProgress);
    };

    info!(
        "💰 Collecting price history for {} symbols (group size {})",
        ctx.symbols.len(),
        ctx.collector.settings().group_size
    );
    ctx.collector.run(ctx.symbols).await
}

/// Scheduler entry point.
pub async fn run_collect_history(ctx: JobContext) -> Result<JobResult, AppError> {
    let report = collect_history(&ctx).await?;
    Ok(JobResult::from(&report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectorSettings;
    use crate::test_support::{daily_series, date, MemoryHistoryStore, ScriptedProvider};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    #[tokio::test]
    async fn test_job_counts_symbols() {
        let provider = ScriptedProvider::new()
            .with_series("PETR4", daily_series(date(2024, 1, 1), 2))
            .with_vendor_error("VALE3", "No data found");
        let collector = HistoryCollector::new(
            Arc::new(MemoryHistoryStore::new()),
            Arc::new(provider),
            CollectorSettings::default(),
        );
        let ctx = JobContext::new(Arc::new(collector), &["PETR4", "VALE3"]);

        let result = run_collect_history(ctx).await.unwrap();
        assert_eq!(result.items_processed, 1);
        assert_eq!(result.items_failed, 1);
    }

    #[tokio::test]
    async fn test_overlapping_runs_keep_concurrency_bound() {
        let provider =
            Arc::new(ScriptedProvider::new().with_latency(Duration::from_millis(30)));
        let collector = HistoryCollector::new(
            Arc::new(MemoryHistoryStore::new()),
            provider.clone(),
            CollectorSettings::default(),
        );
        let ctx = JobContext::new(
            Arc::new(collector),
            &["PETR4", "VALE3", "ITUB4", "BBDC4", "EZTC3", "ABEV3"],
        );
        let scheduled = ctx.clone();

        let (first, second) = tokio::join!(collect_history(&scheduled), collect_history(&ctx));

        assert!(provider.max_in_flight.load(Ordering::SeqCst) <= 3);
        assert_eq!(first.unwrap().succeeded.len(), 6);
        assert!(matches!(second, Err(AppError::RunInProgress)));
        assert_eq!(provider.calls().len(), 6);

        // The guard is released once the first run settles.
        assert!(collect_history(&ctx).await.is_ok());
    }
}
