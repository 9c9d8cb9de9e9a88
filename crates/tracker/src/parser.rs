//! Order status response normalization.
//!
//! The API returns a deeply nested document. Each recognized field lives at a
//! fixed path below the purchase order header (order-wide fields) or below
//! one `PurchaseOrderLine` entry (line-item fields). Anything missing along a
//! path reads as the `No Data` sentinel; unknown keys are ignored.

use std::collections::HashMap;

use order_tracker_core::{FieldValue, LineItem, LineItemField, Order, OrderField};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Pointer to the purchase order header.
const HEADER_POINTER: &str = "/ShowPurchaseOrder/value/DataArea/PurchaseOrder/0/PurchaseOrderHeader";

/// Pointer to the line item array.
const LINES_POINTER: &str = "/ShowPurchaseOrder/value/DataArea/PurchaseOrder/0/PurchaseOrderLine";

/// Response parsing errors.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The response is not JSON at all.
    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

/// Path of an order-wide field, relative to the header.
const fn order_field_path(field: OrderField) -> &'static str {
    match field {
        OrderField::Status => "/Status/0/Description/value",
        OrderField::BillToParty => "/BillToParty/Name/0/value",
        OrderField::Party => "/Party/0/Name/0/value",
        OrderField::SalesOrderNumber => "/SalesOrderReference/0/ID/value",
        OrderField::ShipToParty => "/ShipToParty/Name/0/value",
        OrderField::TotalAmount => "/TotalAmount/value",
        OrderField::CurrencyCode => "/TotalAmount/currencyCode",
    }
}

/// Path of a line-item field, relative to one line entry.
const fn line_item_field_path(field: LineItemField) -> &'static str {
    match field {
        LineItemField::Sku => "/Item/ID/value",
        LineItemField::Description => "/Item/Description/0/value",
        LineItemField::Quantity => "/Item/Lot/0/Quantity/value",
        LineItemField::Line => "/SalesOrderReference/LineNumberID/value",
        LineItemField::Amount => "/ExtendedAmount/value",
        LineItemField::DeliveryDate => "/PromisedDeliveryDateTime",
        LineItemField::ShipSetNumber => "/LineIDSet/0/ID/0/value",
    }
}

/// Parse a raw response body into an [`Order`].
///
/// # Errors
///
/// Returns `ParseError::MalformedResponse` if the body is not JSON.
pub fn parse_order(body: &str) -> Result<Order, ParseError> {
    let document: Value = serde_json::from_str(body)?;
    Ok(normalize(&document))
}

/// Normalize an already-decoded response document.
#[must_use]
pub fn normalize(document: &Value) -> Order {
    let header = document.pointer(HEADER_POINTER);

    let header_fields: HashMap<OrderField, FieldValue> = OrderField::ALL
        .into_iter()
        .map(|field| (field, lookup(header, order_field_path(field))))
        .collect();

    let line_items: Vec<LineItem> = match document.pointer(LINES_POINTER) {
        Some(Value::Array(lines)) => lines.iter().map(normalize_line_item).collect(),
        Some(line @ Value::Object(_)) => vec![normalize_line_item(line)],
        _ => Vec::new(),
    };

    let order = Order::new(header_fields, line_items);

    for key in order.duplicate_keys() {
        warn!(%key, "Several line items share a key, using the first");
    }

    order
}

fn normalize_line_item(line: &Value) -> LineItem {
    LineItem::new(
        LineItemField::ALL
            .into_iter()
            .map(|field| (field, lookup(Some(line), line_item_field_path(field))))
            .collect(),
    )
}

fn lookup(root: Option<&Value>, path: &str) -> FieldValue {
    root.and_then(|root| root.pointer(path))
        .map_or(FieldValue::NoData, to_field_value)
}

/// Convert a JSON leaf into a field value.
fn to_field_value(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::NoData,
        Value::String(s) => FieldValue::Text(s.clone()),
        Value::Number(n) => n
            .as_f64()
            .map_or_else(|| FieldValue::Text(n.to_string()), FieldValue::Number),
        Value::Bool(b) => FieldValue::Text(b.to_string()),
        Value::Array(_) | Value::Object(_) => FieldValue::Text(value.to_string()),
    }
}
