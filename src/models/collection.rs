use std::time::Duration;

use serde::Serialize;

use crate::errors::SymbolError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub records_written: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub kind: &'static str,
    pub error: String,
}

/// Result of one collection run. Symbol failures live here instead of
/// failing the run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub total_symbols: usize,
    pub groups: usize,
    pub succeeded: Vec<SymbolOutcome>,
    pub failed: Vec<SymbolFailure>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn new(total_symbols: usize, groups: usize) -> Self {
        Self {
            total_symbols,
            groups,
            ..Default::default()
        }
    }

    pub fn record_success(&mut self, symbol: &str, records_written: usize) {
        self.succeeded.push(SymbolOutcome {
            symbol: symbol.to_string(),
            records_written,
        });
    }

    pub fn record_failure(&mut self, error: &SymbolError) {
        self.failed.push(SymbolFailure {
            symbol: error.symbol().to_string(),
            kind: error.kind(),
            error: error.to_string(),
        });
    }

    pub fn records_written(&self) -> usize {
        self.succeeded.iter().map(|o| o.records_written).sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "Collection finished in {:.1}s: {} of {} symbols updated, {} failed, {} records written",
            self.elapsed.as_secs_f64(),
            self.succeeded.len(),
            self.total_symbols,
            self.failed.len(),
            self.records_written()
        )
    }
}

/// Body returned by the trigger endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TriggerResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}
