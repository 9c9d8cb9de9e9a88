//! Integration tests for the order tracker.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p order-tracker-integration-tests
//! ```
//!
//! No network access or credentials are needed: the order API is served by
//! `wiremock` and workbooks live in temporary directories.
//!
//! # Test Categories
//!
//! - `order_api` - Token handling, retries and not-found detection over HTTP
//! - `pipeline` - Row grouping, resolution and writes with a canned source
//! - `workbook_files` - Full runs against real `.xlsx` files

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use order_tracker::order_api::OrderApiError;
use order_tracker::run::OrderSource;
use order_tracker::workbook::{CellValue, Sheet, Workbook};
use order_tracker::{ApiConfig, TrackerConfig};
use order_tracker_core::{OrderNumber, OrderNumberKind};
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token endpoint path on the mock server.
pub const TOKEN_PATH: &str = "/oauth2/token";
/// Order status endpoint path on the mock server.
pub const ORDER_PATH: &str = "/orders/status";

/// One line item of a canned order document.
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    /// Product SKU.
    pub sku: &'a str,
    /// Ship set number (sent as a number, as the API does).
    pub ship_set: u32,
    /// Promised delivery date.
    pub delivery_date: &'a str,
}

impl<'a> Line<'a> {
    /// Create a line.
    #[must_use]
    pub const fn new(sku: &'a str, ship_set: u32, delivery_date: &'a str) -> Self {
        Self {
            sku,
            ship_set,
            delivery_date,
        }
    }
}

/// An order status document with the given status and line items.
#[must_use]
pub fn order_document(status: &str, lines: &[Line<'_>]) -> Value {
    let lines: Vec<Value> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            json!({
                "Item": {
                    "ID": { "value": line.sku },
                    "Description": [{ "value": format!("{} description", line.sku) }],
                    "Lot": [{ "Quantity": { "value": 1 } }],
                },
                "SalesOrderReference": { "LineNumberID": { "value": format!("{}.1", i + 1) } },
                "ExtendedAmount": { "value": 100.0 },
                "PromisedDeliveryDateTime": line.delivery_date,
                "LineIDSet": [{ "ID": [{ "value": line.ship_set }] }],
            })
        })
        .collect();
    let total = 100 * lines.len();

    json!({
        "ShowPurchaseOrder": { "value": { "DataArea": {
            "Show": { "ResponseCriteria": [{ "ResponseExpression": { "value": "Success" } }] },
            "PurchaseOrder": [{
                "PurchaseOrderHeader": {
                    "Status": [{ "Description": { "value": status } }],
                    "BillToParty": { "Name": [{ "value": "Acme Corp" }] },
                    "TotalAmount": { "value": total, "currencyCode": "USD" },
                },
                "PurchaseOrderLine": lines,
            }]
        }}}
    })
}

/// The document the API returns for an unknown or inaccessible order.
#[must_use]
pub fn not_found_document() -> Value {
    json!({
        "ShowPurchaseOrder": { "value": { "DataArea": { "Show": {
            "ResponseCriteria": [{ "ResponseExpression": {
                "value": "OSA001: Order not found or access is not authorized"
            }}]
        }}}}
    })
}

/// API configuration pointing at a mock server.
///
/// # Panics
///
/// Panics if the server URI is not a valid URL.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn api_config(server: &MockServer) -> ApiConfig {
    let base = url::Url::parse(&server.uri()).unwrap();
    ApiConfig {
        client_key: "test-client".to_string(),
        client_secret: SecretString::from("test-secret"),
        token_url: base.join(TOKEN_PATH).unwrap(),
        order_url: base.join(ORDER_PATH).unwrap(),
        timeout: Duration::from_secs(5),
    }
}

/// Mount a token endpoint that issues `token`.
pub async fn mount_token(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "token_type": "Bearer",
            "expires_in": 3600,
        })))
        .mount(server)
        .await;
}

/// Mount an order endpoint answering `document` for requests that mention
/// `order` and carry `token`.
pub async fn mount_order(server: &MockServer, token: &str, order: &str, document: Value) {
    Mock::given(method("POST"))
        .and(path(ORDER_PATH))
        .and(header("Authorization", format!("Bearer {token}").as_str()))
        .and(body_string_contains(order))
        .respond_with(ResponseTemplate::new(200).set_body_json(document))
        .mount(server)
        .await;
}

/// Parse and validate a tracker file.
///
/// # Panics
///
/// Panics if the YAML is not a valid tracker configuration.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn tracker_config(yaml: &str) -> TrackerConfig {
    TrackerConfig::from_yaml(yaml).unwrap()
}

/// A sheet with the given header and rows.
#[must_use]
pub fn sheet(name: &str, header: &[&str], rows: Vec<Vec<CellValue>>) -> Sheet {
    let mut sheet = Sheet::new(name, header.iter().map(ToString::to_string).collect());
    sheet.rows = rows;
    sheet
}

/// Save a workbook made of `sheets` to `path`.
///
/// # Panics
///
/// Panics if the workbook cannot be written.
#[allow(clippy::unwrap_used)]
pub fn write_workbook(path: &Path, sheets: Vec<Sheet>) {
    order_tracker::workbook::save(&Workbook { sheets }, path).unwrap();
}

/// Text of a cell, for assertions.
#[must_use]
pub fn text(sheet: &Sheet, row: usize, column: &str) -> Option<String> {
    let col = sheet.column_index(column)?;
    match sheet.cell(row, col) {
        CellValue::Empty => None,
        cell => Some(cell.to_string()),
    }
}

/// Serves canned documents and records every order requested.
#[derive(Debug, Default)]
pub struct CannedSource {
    documents: HashMap<String, Value>,
    failing: Vec<String>,
    requests: RefCell<Vec<String>>,
}

impl CannedSource {
    /// Create an empty source: every order is unknown.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `document` for `order`.
    #[must_use]
    pub fn with_order(mut self, order: &str, document: Value) -> Self {
        self.documents.insert(order.to_string(), document);
        self
    }

    /// Fail every request for `order`.
    #[must_use]
    pub fn with_failure(mut self, order: &str) -> Self {
        self.failing.push(order.to_string());
        self
    }

    /// Orders requested so far, in request order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl OrderSource for CannedSource {
    async fn fetch(
        &self,
        number: &OrderNumber,
        _kind: OrderNumberKind,
    ) -> Result<Option<Value>, OrderApiError> {
        self.requests.borrow_mut().push(number.to_string());

        if self.failing.iter().any(|o| o == number.as_str()) {
            return Err(OrderApiError::Status {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                body: "maintenance".to_string(),
            });
        }

        Ok(self.documents.get(number.as_str()).cloned())
    }
}
