use sqlx::PgPool;

use crate::models::Stock;

pub async fn fetch_by_symbol(pool: &PgPool, symbol: &str) -> Result<Option<Stock>, sqlx::Error> {
    sqlx::query_as::<_, Stock>("SELECT id, symbol FROM stocks WHERE symbol = $1")
        .bind(symbol)
        .fetch_optional(pool)
        .await
}

/// Inserts the stock if it is new. The no-op update makes `RETURNING` yield
/// the existing row on conflict.
pub async fn upsert(pool: &PgPool, symbol: &str) -> Result<Option<Stock>, sqlx::Error> {
    sqlx::query_as::<_, Stock>(
        r#"
        INSERT INTO stocks (symbol)
        VALUES ($1)
        ON CONFLICT (symbol) DO UPDATE SET symbol = EXCLUDED.symbol
        RETURNING id, symbol
        "#,
    )
    .bind(symbol)
    .fetch_optional(pool)
    .await
}
