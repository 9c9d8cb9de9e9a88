//! Configuration check command.

use std::path::Path;

use order_tracker::{ApiConfig, ConfigError, TrackerConfig};

/// Validate the tracker file and the API environment without touching the
/// workbook or the network.
///
/// # Errors
///
/// Returns the first `ConfigError` found.
pub fn execute(config_path: &Path) -> Result<(), ConfigError> {
    let config = TrackerConfig::load(config_path)?;
    tracing::info!(
        config = %config_path.display(),
        workbook = %config.workbook.display(),
        single_sheet = config.single_sheet,
        fields = config.fields.len(),
        "Tracker file is valid"
    );

    for tracked in &config.fields {
        tracing::info!(field = %tracked.field, column = %tracked.column, "Tracked field");
    }

    if let Some(history) = config.history() {
        tracing::info!(field = %history.field, column = %history.column, "Keeping history");
    }

    let api = ApiConfig::from_env()?;
    tracing::info!(
        token_url = %api.token_url,
        order_url = %api.order_url,
        timeout_secs = api.timeout.as_secs(),
        "API environment is valid"
    );

    Ok(())
}
