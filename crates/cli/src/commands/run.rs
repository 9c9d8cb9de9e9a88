//! Workbook update command.
//!
//! # Usage
//!
//! ```bash
//! order-tracker run --config tracker.yaml
//! order-tracker run --workbook orders.xlsx --dry-run
//! ```
//!
//! # Environment Variables
//!
//! - `ORDER_API_CLIENT_KEY` - OAuth client ID
//! - `ORDER_API_CLIENT_SECRET` - OAuth client secret
//! - `ORDER_API_TOKEN_URL` - Token endpoint (optional)
//! - `ORDER_API_URL` - Order status endpoint (optional)
//! - `ORDER_API_TIMEOUT_SECS` - Request timeout (optional, default 30)

use std::path::{Path, PathBuf};

use order_tracker::{ApiConfig, RunOptions, RunSummary, TrackerConfig, TrackerError};

/// Update the workbook named in the tracker file (or `workbook`).
///
/// # Errors
///
/// Returns `TrackerError` on configuration, authentication or workbook
/// failures. Per-row problems are only logged.
pub async fn execute(
    config_path: &Path,
    workbook: Option<PathBuf>,
    dry_run: bool,
) -> Result<RunSummary, TrackerError> {
    let config = TrackerConfig::load(config_path)?;
    let api = ApiConfig::from_env()?;

    tracing::info!(
        config = %config_path.display(),
        kind = %config.order_id_type,
        fields = config.fields.len(),
        history = config.keep_history,
        "Starting run"
    );

    let options = RunOptions {
        workbook,
        dry_run,
        ..RunOptions::default()
    };

    order_tracker::run(&config, &api, &options).await
}
