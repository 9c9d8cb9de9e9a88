//! Unified error handling for a tracker run.

use thiserror::Error;

use crate::config::ConfigError;
use crate::order_api::OrderApiError;
use crate::parser::ParseError;
use crate::writer::WriteError;
use crate::workbook::WorkbookError;

/// Errors that abort a run.
///
/// Per-order and per-row failures are logged and counted in the run summary
/// instead; only setup failures surface here.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The workbook could not be read or written.
    #[error("Workbook error: {0}")]
    Workbook(#[from] WorkbookError),

    /// Authentication or another API call needed before processing failed.
    #[error("Order API error: {0}")]
    OrderApi(#[from] OrderApiError),

    /// A saved response could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The sheet layout cannot be processed.
    #[error("Sheet error: {0}")]
    Write(#[from] WriteError),
}
