mod collection;
mod historical_data;
mod stock;

pub use collection::{RunReport, SymbolFailure, SymbolOutcome, TriggerResponse};
pub use historical_data::HistoricalDataPoint;
pub use stock::Stock;
