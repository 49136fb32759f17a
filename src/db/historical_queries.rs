use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::error;

use crate::models::HistoricalDataPoint;

// 7 binds per row keeps each statement well under the 65535 parameter limit.
const UPSERT_CHUNK_ROWS: usize = 5_000;

/// Most recent stored trading date for a stock.
pub async fn fetch_latest_date(
    pool: &PgPool,
    stock_id: i64,
) -> Result<Option<NaiveDate>, sqlx::Error> {
    sqlx::query_scalar::<_, NaiveDate>(
        r#"
        SELECT date
        FROM historical_data
        WHERE stock_id = $1
        ORDER BY date DESC
        LIMIT 1
        "#,
    )
    .bind(stock_id)
    .fetch_optional(pool)
    .await
}

/// Upserts all points in one transaction, keyed by `(stock_id, date)`.
///
/// Callers must not pass the same `(stock_id, date)` twice.
pub async fn upsert_many(
    pool: &PgPool,
    points: &[HistoricalDataPoint],
) -> Result<u64, sqlx::Error> {
    if points.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await.map_err(|e| {
        error!("Failed to begin historical upsert transaction: {}", e);
        e
    })?;

    let mut written = 0;

    for chunk in points.chunks(UPSERT_CHUNK_ROWS) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO historical_data (stock_id, date, open, high, low, close, volume) ",
        );

        builder.push_values(chunk, |mut row, p| {
            row.push_bind(p.stock_id)
                .push_bind(p.date)
                .push_bind(p.open)
                .push_bind(p.high)
                .push_bind(p.low)
                .push_bind(p.close)
                .push_bind(p.volume);
        });

        builder.push(
            r#"
            ON CONFLICT (stock_id, date) DO UPDATE SET
                open = EXCLUDED.open,
                high = EXCLUDED.high,
                low = EXCLUDED.low,
                close = EXCLUDED.close,
                volume = EXCLUDED.volume,
                updated_at = NOW()
            "#,
        );

        let result = builder.build().execute(&mut *tx).await.map_err(|e| {
            error!(
                "Failed to upsert {} historical rows starting at {}: {}",
                chunk.len(),
                chunk[0].date,
                e
            );
            e
        })?;

        written += result.rows_affected();
    }

    tx.commit().await.map_err(|e| {
        error!("Failed to commit historical upsert: {}", e);
        e
    })?;

    Ok(written)
}
