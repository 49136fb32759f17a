use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::external::price_provider::PriceProviderError;
use crate::models::TriggerResponse;

/// Run-level and application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Scheduler error: {0}")]
    Scheduler(String),
    #[error("A collection run is already in progress")]
    RunInProgress,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Store details stay in the logs.
        let message = match &self {
            AppError::Db(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TriggerResponse::failure(message)),
        )
            .into_response()
    }
}

/// Failure of a single symbol's pipeline. Never aborts a run.
#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("resolver failed for {symbol}: {source}")]
    Resolver { symbol: String, source: sqlx::Error },

    #[error("remote data error for {symbol}: {source}")]
    RemoteData {
        symbol: String,
        source: PriceProviderError,
    },

    #[error("stock upsert failed for {symbol}: {reason}")]
    StockUpsert { symbol: String, reason: String },

    #[error("historical upsert failed for {symbol}: {source}")]
    HistoricalUpsert { symbol: String, source: sqlx::Error },
}

impl SymbolError {
    pub fn symbol(&self) -> &str {
        match self {
            SymbolError::Resolver { symbol, .. }
            | SymbolError::RemoteData { symbol, .. }
            | SymbolError::StockUpsert { symbol, .. }
            | SymbolError::HistoricalUpsert { symbol, .. } => symbol,
        }
    }

    /// Short label for logs and run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            SymbolError::Resolver { .. } => "resolver",
            SymbolError::RemoteData { .. } => "remote_data",
            SymbolError::StockUpsert { .. } => "stock_upsert",
            SymbolError::HistoricalUpsert { .. } => "historical_upsert",
        }
    }
}
