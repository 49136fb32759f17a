use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::db;
use crate::models::{HistoricalDataPoint, Stock};

/// Persistence operations used by the collection pipeline.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn find_stock(&self, symbol: &str) -> Result<Option<Stock>, sqlx::Error>;

    async fn latest_date(&self, stock_id: i64) -> Result<Option<NaiveDate>, sqlx::Error>;

    /// Returns `None` when the store accepted the write but returned no row.
    async fn upsert_stock(&self, symbol: &str) -> Result<Option<Stock>, sqlx::Error>;

    async fn upsert_history(&self, points: &[HistoricalDataPoint]) -> Result<u64, sqlx::Error>;
}

#[derive(Clone)]
pub struct PgHistoryStore {
    pool: PgPool,
}

impl PgHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn find_stock(&self, symbol: &str) -> Result<Option<Stock>, sqlx::Error> {
        db::stock_queries::fetch_by_symbol(&self.pool, symbol).await
    }

    async fn latest_date(&self, stock_id: i64) -> Result<Option<NaiveDate>, sqlx::Error> {
        db::historical_queries::fetch_latest_date(&self.pool, stock_id).await
    }

    async fn upsert_stock(&self, symbol: &str) -> Result<Option<Stock>, sqlx::Error> {
        db::stock_queries::upsert(&self.pool, symbol).await
    }

    async fn upsert_history(&self, points: &[HistoricalDataPoint]) -> Result<u64, sqlx::Error> {
        db::historical_queries::upsert_many(&self.pool, points).await
    }
}
