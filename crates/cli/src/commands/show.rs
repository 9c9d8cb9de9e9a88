//! Single-order display command.
//!
//! Prints the normalized order (header fields and line items) as JSON on
//! stdout. Useful to check which SKU and ship set values a workbook must use.

use std::path::Path;

use order_tracker::order_api::{OrderApiClient, OrderApiError};
use order_tracker::parser::{self, ParseError};
use order_tracker::{ApiConfig, ConfigError, TrackerConfig};
use order_tracker_core::{Order, OrderNumber, OrderNumberError, OrderNumberKind};
use thiserror::Error;

/// Errors that can occur while showing an order.
#[derive(Debug, Error)]
pub enum ShowError {
    /// Invalid order number.
    #[error("Invalid order number: {0}")]
    InvalidOrderNumber(#[from] OrderNumberError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Order API error.
    #[error("Order API error: {0}")]
    OrderApi(#[from] OrderApiError),

    /// The saved response cannot be read.
    #[error("Cannot read {path}: {source}")]
    Read {
        /// File path.
        path: String,
        /// I/O error.
        source: std::io::Error,
    },

    /// The saved response cannot be parsed.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// The API does not know the order.
    #[error("Order {0} not found")]
    NotFound(OrderNumber),

    /// Output serialization failed.
    #[error("Cannot render order: {0}")]
    Render(#[from] serde_json::Error),
}

/// Fetch one order from the API and print it.
///
/// Without `kind`, the order kind comes from the tracker file if it exists,
/// otherwise sales order is assumed.
///
/// # Errors
///
/// Returns `ShowError` if the number is invalid, authentication or the
/// request fails, or the order does not exist.
pub async fn from_api(
    order: &str,
    config_path: &Path,
    kind: Option<OrderNumberKind>,
) -> Result<(), ShowError> {
    let number = OrderNumber::parse(order)?;

    let kind = match kind {
        Some(kind) => kind,
        None if config_path.exists() => TrackerConfig::load(config_path)?.order_id_type,
        None => OrderNumberKind::default(),
    };

    let client = OrderApiClient::new(&ApiConfig::from_env()?)?;
    client.authenticate().await?;

    tracing::info!(order = %number, %kind, "Fetching order");
    let document = client
        .fetch_order(&number, kind)
        .await?
        .ok_or(ShowError::NotFound(number))?;

    print_order(&parser::normalize(&document))
}

/// Parse a saved API response and print it.
///
/// # Errors
///
/// Returns `ShowError` if the file cannot be read or is not JSON.
pub fn from_file(path: &Path) -> Result<(), ShowError> {
    let body = std::fs::read_to_string(path).map_err(|source| ShowError::Read {
        path: path.display().to_string(),
        source,
    })?;

    print_order(&parser::parse_order(&body)?)
}

#[allow(clippy::print_stdout)]
fn print_order(order: &Order) -> Result<(), ShowError> {
    if order.line_items().is_empty() {
        tracing::warn!("Order has no line items");
    }

    println!("{}", serde_json::to_string_pretty(order)?);
    Ok(())
}
