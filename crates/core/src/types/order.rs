//! Normalized orders and line items.

use std::collections::{HashMap, HashSet};

use core::fmt;

use serde::Serialize;

use super::field::{LineItemField, OrderField};
use super::value::FieldValue;

static NO_DATA: FieldValue = FieldValue::NoData;

/// Identifies a line item within one order.
///
/// The same SKU may appear in several ship sets, so the pair is the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LineItemKey {
    sku: String,
    ship_set: String,
}

impl LineItemKey {
    /// Create a key, trimming surrounding whitespace from both parts.
    #[must_use]
    pub fn new(sku: impl AsRef<str>, ship_set: impl AsRef<str>) -> Self {
        Self {
            sku: sku.as_ref().trim().to_owned(),
            ship_set: ship_set.as_ref().trim().to_owned(),
        }
    }

    /// Build a key from two field values.
    ///
    /// Returns `None` if either part is a sentinel or blank.
    #[must_use]
    pub fn from_values(sku: &FieldValue, ship_set: &FieldValue) -> Option<Self> {
        Some(Self {
            sku: sku.as_key()?,
            ship_set: ship_set.as_key()?,
        })
    }

    /// Product SKU.
    #[must_use]
    pub fn sku(&self) -> &str {
        &self.sku
    }

    /// Ship set number.
    #[must_use]
    pub fn ship_set(&self) -> &str {
        &self.ship_set
    }
}

impl fmt::Display for LineItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SKU {} / ship set {}", self.sku, self.ship_set)
    }
}

/// One line item of an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineItem {
    fields: HashMap<LineItemField, FieldValue>,
}

impl LineItem {
    /// Create a line item from extracted fields. Missing fields read as `No Data`.
    #[must_use]
    pub fn new(fields: HashMap<LineItemField, FieldValue>) -> Self {
        Self { fields }
    }

    /// Value of a field, or the `No Data` sentinel.
    #[must_use]
    pub fn field(&self, field: LineItemField) -> &FieldValue {
        self.fields.get(&field).unwrap_or(&NO_DATA)
    }

    /// The `(SKU, ship set)` key, if both parts are present.
    #[must_use]
    pub fn key(&self) -> Option<LineItemKey> {
        LineItemKey::from_values(
            self.field(LineItemField::Sku),
            self.field(LineItemField::ShipSetNumber),
        )
    }

    /// Whether this line item is identified by `key`.
    #[must_use]
    pub fn matches(&self, key: &LineItemKey) -> bool {
        self.field(LineItemField::Sku).as_key().as_deref() == Some(key.sku())
            && self.field(LineItemField::ShipSetNumber).as_key().as_deref() == Some(key.ship_set())
    }
}

/// A normalized order: order-wide attributes plus line items in response order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Order {
    header: HashMap<OrderField, FieldValue>,
    line_items: Vec<LineItem>,
}

impl Order {
    /// Create an order from extracted header fields and line items.
    #[must_use]
    pub fn new(header: HashMap<OrderField, FieldValue>, line_items: Vec<LineItem>) -> Self {
        Self { header, line_items }
    }

    /// Value of an order-wide field, or the `No Data` sentinel.
    #[must_use]
    pub fn field(&self, field: OrderField) -> &FieldValue {
        self.header.get(&field).unwrap_or(&NO_DATA)
    }

    /// Line items in response order.
    #[must_use]
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// First line item identified by `key`, in response order.
    #[must_use]
    pub fn find_line_item(&self, key: &LineItemKey) -> Option<&LineItem> {
        self.line_items.iter().find(|item| item.matches(key))
    }

    /// Keys that appear on more than one line item.
    ///
    /// Should always be empty; a non-empty result means the API broke the
    /// one-line-item-per-key rule and lookups fall back to the first match.
    #[must_use]
    pub fn duplicate_keys(&self) -> Vec<LineItemKey> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for key in self.line_items.iter().filter_map(LineItem::key) {
            if !seen.insert(key.clone()) && !duplicates.contains(&key) {
                duplicates.push(key);
            }
        }
        duplicates
    }
}
