//! Tracker configuration.
//!
//! Two sources:
//! - [`ApiConfig`] - order API credentials and endpoints, from environment
//!   variables (a `.env` file is loaded if present)
//! - [`TrackerConfig`] - workbook layout and tracked fields, from a YAML file
//!
//! # Environment Variables
//!
//! ## Required
//! - `ORDER_API_CLIENT_KEY` - OAuth client ID for the order API
//! - `ORDER_API_CLIENT_SECRET` - OAuth client secret for the order API
//!
//! ## Optional
//! - `ORDER_API_TOKEN_URL` - OAuth token endpoint
//! - `ORDER_API_URL` - Order status endpoint
//! - `ORDER_API_TIMEOUT_SECS` - Per-request timeout (default: 30)

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use order_tracker_core::{FieldName, OrderNumberKind};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const DEFAULT_TOKEN_URL: &str = "https://id.cisco.com/oauth2/default/v1/token";
const DEFAULT_ORDER_URL: &str = "https://apix.cisco.com/commerce/ORDER/v2/sync/checkOrderStatus";
const DEFAULT_TIMEOUT_SECS: &str = "30";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Order API
// =============================================================================

/// Order API configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct ApiConfig {
    /// OAuth client ID
    pub client_key: String,
    /// OAuth client secret
    pub client_secret: SecretString,
    /// OAuth token endpoint
    pub token_url: Url,
    /// Order status endpoint
    pub order_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("client_key", &self.client_key)
            .field("client_secret", &"[REDACTED]")
            .field("token_url", &self.token_url.as_str())
            .field("order_url", &self.order_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApiConfig {
    /// Load order API configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if credentials are missing or an endpoint or
    /// timeout does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let timeout_secs = get_env_or_default("ORDER_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ORDER_API_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ORDER_API_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            client_key: get_required_env("ORDER_API_CLIENT_KEY")?,
            client_secret: get_required_secret("ORDER_API_CLIENT_SECRET")?,
            token_url: get_url("ORDER_API_TOKEN_URL", DEFAULT_TOKEN_URL)?,
            order_url: get_url("ORDER_API_URL", DEFAULT_ORDER_URL)?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Tracker file
// =============================================================================

/// One tracked field and the workbook column it is written to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackedField {
    /// Field name in the order response.
    pub field: FieldName,
    /// Output column header.
    pub column: String,
}

/// Where orders live in the workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetMode<'a> {
    /// All orders on the first sheet, keyed by an order number column.
    SingleSheet {
        /// Header of the order number column.
        order_column: &'a str,
    },
    /// One sheet per order, named after the order number.
    SheetPerOrder,
}

/// Workbook layout and tracked fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    /// Which reference the workbook's order numbers are.
    #[serde(default)]
    pub order_id_type: OrderNumberKind,
    /// Path to the `.xlsx` workbook.
    pub workbook: PathBuf,
    /// Header of the SKU column.
    #[serde(default = "default_sku_column")]
    pub sku_column: String,
    /// Header of the ship set number column.
    #[serde(default = "default_ship_set_column")]
    pub ship_set_column: String,
    /// All orders on the first sheet (`true`) or one sheet per order.
    #[serde(default = "default_single_sheet")]
    pub single_sheet: bool,
    /// Header of the order number column (single-sheet mode only).
    #[serde(default)]
    pub order_column: Option<String>,
    /// Tracked fields, in column order.
    pub fields: Vec<TrackedField>,
    /// Keep dated snapshots of `history_field` instead of overwriting it.
    #[serde(default)]
    pub keep_history: bool,
    /// Field whose history is kept.
    #[serde(default)]
    pub history_field: Option<FieldName>,
    /// strftime format applied to `deliveryDate` values.
    #[serde(default)]
    pub date_format: Option<String>,
}

fn default_sku_column() -> String {
    "SKU".to_string()
}

fn default_ship_set_column() -> String {
    "Ship Set Number".to_string()
}

const fn default_single_sheet() -> bool {
    true
}

impl TrackerConfig {
    /// Load and validate a tracker file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, does not parse, or
    /// fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate tracker configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the YAML does not parse or fails validation.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values that would corrupt the workbook.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_column("sku_column", &self.sku_column)?;
        require_column("ship_set_column", &self.ship_set_column)?;

        let mut key_columns = vec![self.sku_column.trim(), self.ship_set_column.trim()];
        if self.single_sheet {
            let order_column = self.order_column.as_deref().ok_or_else(|| {
                ConfigError::Invalid("order_column is required when single_sheet is true".into())
            })?;
            require_column("order_column", order_column)?;
            key_columns.push(order_column.trim());
        }

        if self.fields.is_empty() {
            return Err(ConfigError::Invalid("fields must not be empty".into()));
        }

        for (i, tracked) in self.fields.iter().enumerate() {
            require_column("fields.column", &tracked.column)?;

            let earlier = self.fields.iter().take(i);
            if earlier.clone().any(|f| f.field == tracked.field) {
                return Err(ConfigError::Invalid(format!(
                    "field '{}' is tracked more than once",
                    tracked.field
                )));
            }
            if earlier.clone().any(|f| f.column.trim() == tracked.column.trim()) {
                return Err(ConfigError::Invalid(format!(
                    "column '{}' is used by more than one field",
                    tracked.column
                )));
            }
            if key_columns.contains(&tracked.column.trim()) {
                return Err(ConfigError::Invalid(format!(
                    "column '{}' is a key column and cannot be written",
                    tracked.column
                )));
            }
            if !tracked.field.is_known() {
                tracing::warn!(
                    field = %tracked.field,
                    "Unrecognized field name, it will always resolve to No Data"
                );
            }
        }

        if self.keep_history {
            let history_field = self.history_field.as_ref().ok_or_else(|| {
                ConfigError::Invalid("history_field is required when keep_history is true".into())
            })?;
            let position = self
                .fields
                .iter()
                .position(|f| &f.field == history_field)
                .ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "history_field '{history_field}' is not in fields"
                    ))
                })?;
            // Snapshot insertion shifts every column to the right of the anchor.
            if position + 1 != self.fields.len() {
                return Err(ConfigError::Invalid(format!(
                    "history_field '{history_field}' must be the last entry in fields"
                )));
            }
        }

        if let Some(format) = &self.date_format
            && StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
        {
            return Err(ConfigError::Invalid(format!(
                "date_format '{format}' is not a valid strftime format"
            )));
        }

        Ok(())
    }

    /// Single-sheet or sheet-per-order layout.
    #[must_use]
    pub fn mode(&self) -> SheetMode<'_> {
        match (self.single_sheet, self.order_column.as_deref()) {
            (true, Some(order_column)) => SheetMode::SingleSheet {
                order_column: order_column.trim(),
            },
            _ => SheetMode::SheetPerOrder,
        }
    }

    /// The tracked field whose history is kept, if history mode is on.
    #[must_use]
    pub fn history(&self) -> Option<&TrackedField> {
        if !self.keep_history {
            return None;
        }
        let history_field = self.history_field.as_ref()?;
        self.fields.iter().find(|f| &f.field == history_field)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an HTTPS endpoint from the environment.
fn get_url(key: &str, default: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(&get_env_or_default(key, default))
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "https" | "http") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

fn require_column(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{name} must not be blank")));
    }
    Ok(())
}
