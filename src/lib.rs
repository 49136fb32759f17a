//! Incremental daily price history collector.
//!
//! Fetches daily OHLCV bars for a fixed list of B3 tickers from the Yahoo
//! chart endpoint and upserts them into Postgres, resuming each symbol from
//! its last stored date.

pub mod app;
pub mod config;
pub mod db;
pub mod errors;
pub mod external;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod symbols;

#[cfg(test)]
mod test_support;
