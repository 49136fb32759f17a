use std::sync::Arc;

use price_history_collector::app;
use price_history_collector::config::AppConfig;
use price_history_collector::db;
use price_history_collector::external::yahoo::YahooChartProvider;
use price_history_collector::jobs::collect_history_job::JobContext;
use price_history_collector::logging::{self, LoggingConfig};
use price_history_collector::services::collection_service::HistoryCollector;
use price_history_collector::services::job_scheduler_service::JobSchedulerService;
use price_history_collector::state::AppState;
use price_history_collector::store::PgHistoryStore;
use price_history_collector::symbols;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env()?;

    let active = symbols::active_symbols(config.test_mode);
    if config.test_mode {
        tracing::info!("⚠️  COLLECT TEST MODE - only collecting {:?}", active);
    }
    for symbol in symbols::suspicious_symbols(active) {
        tracing::warn!("Symbol {:?} has surrounding whitespace and should be corrected", symbol);
    }

    let pool = db::connect(&config).await?;

    let provider = YahooChartProvider::new(config.fetcher.clone())?;
    let collector = HistoryCollector::new(
        Arc::new(PgHistoryStore::new(pool)),
        Arc::new(provider),
        config.collector.clone(),
    );
    let jobs = JobContext::new(Arc::new(collector), active);

    let mut scheduler = None;
    if config.scheduler_enabled {
        let mut service = JobSchedulerService::new(jobs.clone()).await?;
        service.start(&config.collect_schedule).await?;
        scheduler = Some(service);
    } else {
        tracing::info!("Job scheduler disabled, runs only via POST /api/jobs/collect-history");
    }

    let app = app::create_app(AppState { jobs });

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("🚀 Price history collector running at http://{}/", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(mut service) = scheduler {
        service.stop().await?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
