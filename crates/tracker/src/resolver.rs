//! Tracked field resolution.
//!
//! Order-wide names read from the order header; every other name reads from
//! the line item identified by the row's `(SKU, ship set)` key.

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use order_tracker_core::{FieldName, FieldValue, LineItemField, LineItemKey, Order};
use thiserror::Error;

use crate::config::TrackerConfig;

/// Field resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No line item of the order carries the row's key.
    #[error("Line item not found: {0}")]
    LineItemNotFound(LineItemKey),
}

/// Resolves tracked field names against parsed orders.
#[derive(Debug, Clone, Default)]
pub struct FieldResolver {
    date_format: Option<String>,
}

impl FieldResolver {
    /// Create a resolver using the configuration's date format.
    #[must_use]
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            date_format: config.date_format.clone(),
        }
    }

    /// Create a resolver that reformats delivery dates with `date_format`.
    #[must_use]
    pub fn with_date_format(date_format: impl Into<String>) -> Self {
        Self {
            date_format: Some(date_format.into()),
        }
    }

    /// Resolve one tracked field for one row.
    ///
    /// Order-wide fields never fail. Line-item fields (and unrecognized
    /// names) require a line item matching `key`.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::LineItemNotFound` if no line item matches.
    pub fn resolve(
        &self,
        field: &FieldName,
        order: &Order,
        key: &LineItemKey,
    ) -> Result<FieldValue, ResolveError> {
        if let FieldName::Order(field) = field {
            return Ok(order.field(*field).clone());
        }

        let item = order
            .find_line_item(key)
            .ok_or_else(|| ResolveError::LineItemNotFound(key.clone()))?;

        Ok(match field {
            FieldName::LineItem(LineItemField::DeliveryDate) => {
                self.format_date(item.field(LineItemField::DeliveryDate))
            }
            FieldName::LineItem(field) => item.field(*field).clone(),
            FieldName::Order(_) | FieldName::Other(_) => FieldValue::NoData,
        })
    }

    /// Reformat a delivery date, if a format is configured.
    #[must_use]
    pub fn format_date(&self, value: &FieldValue) -> FieldValue {
        let Some(format) = self.date_format.as_deref() else {
            return value.clone();
        };

        if value.is_sentinel() {
            return value.clone();
        }

        let Some(parsed) = value.as_text().and_then(parse_date) else {
            return FieldValue::InvalidDate;
        };

        let mut out = String::new();
        if write!(out, "{}", parsed.format(format)).is_err() {
            return FieldValue::InvalidDate;
        }
        FieldValue::Text(out)
    }
}

/// Parse an API date: RFC 3339, a naive timestamp, or a bare date.
/// Naive values are taken as UTC.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use order_tracker_core::{LineItem, OrderField};

    use super::*;

    fn item(sku: &str, ship_set: &str, date: &str) -> LineItem {
        LineItem::new(HashMap::from([
            (LineItemField::Sku, FieldValue::text(sku)),
            (LineItemField::ShipSetNumber, FieldValue::text(ship_set)),
            (LineItemField::DeliveryDate, FieldValue::text(date)),
        ]))
    }

    fn order() -> Order {
        Order::new(
            HashMap::from([(OrderField::Status, FieldValue::text("Booked"))]),
            vec![
                item("A", "1", "2024-03-01"),
                item("B", "2", "2024-04-01"),
                item("A", "2", "2024-05-01"),
            ],
        )
    }

    #[test]
    fn test_order_wide_field_ignores_key() {
        let resolver = FieldResolver::default();
        let value = resolver
            .resolve(&FieldName::parse("status"), &order(), &LineItemKey::new("Z", "9"))
            .unwrap();
        assert_eq!(value, FieldValue::text("Booked"));
    }

    #[test]
    fn test_missing_order_wide_field_is_no_data() {
        let resolver = FieldResolver::default();
        let value = resolver
            .resolve(&FieldName::parse("shipToParty"), &order(), &LineItemKey::new("A", "1"))
            .unwrap();
        assert_eq!(value, FieldValue::NoData);
    }

    #[test]
    fn test_line_item_field_by_sku_and_ship_set() {
        let resolver = FieldResolver::default();
        let field = FieldName::parse("deliveryDate");

        let a1 = resolver.resolve(&field, &order(), &LineItemKey::new("A", "1")).unwrap();
        let a2 = resolver.resolve(&field, &order(), &LineItemKey::new("A", "2")).unwrap();

        assert_eq!(a1, FieldValue::text("2024-03-01"));
        assert_eq!(a2, FieldValue::text("2024-05-01"));
    }

    #[test]
    fn test_line_item_not_found() {
        let resolver = FieldResolver::default();
        let err = resolver
            .resolve(&FieldName::parse("deliveryDate"), &order(), &LineItemKey::new("B", "1"))
            .unwrap_err();
        assert_eq!(err, ResolveError::LineItemNotFound(LineItemKey::new("B", "1")));
    }

    #[test]
    fn test_unknown_field_reads_no_data() {
        let resolver = FieldResolver::default();
        let value = resolver
            .resolve(&FieldName::parse("carrier"), &order(), &LineItemKey::new("A", "1"))
            .unwrap();
        assert_eq!(value, FieldValue::NoData);
    }

    #[test]
    fn test_first_match_wins_on_duplicate_keys() {
        let order = Order::new(
            HashMap::new(),
            vec![item("A", "1", "2024-03-01"), item("A", "1", "2024-09-09")],
        );
        let value = FieldResolver::default()
            .resolve(&FieldName::parse("deliveryDate"), &order, &LineItemKey::new("A", "1"))
            .unwrap();
        assert_eq!(value, FieldValue::text("2024-03-01"));
    }

    #[test]
    fn test_date_formats() {
        let resolver = FieldResolver::with_date_format("%m/%d/%Y");

        assert_eq!(
            resolver.format_date(&FieldValue::text("2024-03-01T23:30:00-05:00")),
            FieldValue::text("03/02/2024")
        );
        assert_eq!(
            resolver.format_date(&FieldValue::text("2024-03-01T10:00:00.000Z")),
            FieldValue::text("03/01/2024")
        );
        assert_eq!(
            resolver.format_date(&FieldValue::text("2024-03-01T10:00:00.000")),
            FieldValue::text("03/01/2024")
        );
        assert_eq!(
            resolver.format_date(&FieldValue::text("2024-03-01")),
            FieldValue::text("03/01/2024")
        );
    }

    #[test]
    fn test_unparsable_date_is_invalid() {
        let resolver = FieldResolver::with_date_format("%m/%d/%Y");
        assert_eq!(
            resolver.format_date(&FieldValue::text("next week")),
            FieldValue::InvalidDate
        );
        assert_eq!(resolver.format_date(&FieldValue::Number(45000.0)), FieldValue::InvalidDate);
    }

    #[test]
    fn test_sentinels_pass_through_formatting() {
        let resolver = FieldResolver::with_date_format("%m/%d/%Y");
        assert_eq!(resolver.format_date(&FieldValue::NoData), FieldValue::NoData);
        assert_eq!(
            resolver.format_date(&FieldValue::OrderNotFound),
            FieldValue::OrderNotFound
        );
    }

    #[test]
    fn test_no_format_keeps_raw_value() {
        let resolver = FieldResolver::default();
        assert_eq!(
            resolver.format_date(&FieldValue::text("2024-03-01T10:00:00Z")),
            FieldValue::text("2024-03-01T10:00:00Z")
        );
    }
}
