//! Tracked field names.
//!
//! A tracked field is either order-wide (one value per order) or a line-item
//! field (one value per SKU/ship set). Names are the ones users put in the
//! tracker configuration, so parsing accepts a few legacy lowercase aliases.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Order-wide attributes recognized in an order status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OrderField {
    /// Order status description.
    Status,
    /// Bill-to party name.
    BillToParty,
    /// Party name (usually the end customer).
    Party,
    /// Sales order number (SO#).
    SalesOrderNumber,
    /// Ship-to party name.
    ShipToParty,
    /// Total order amount.
    TotalAmount,
    /// Currency code of the total amount.
    CurrencyCode,
}

impl OrderField {
    /// All order-wide fields, in response order.
    pub const ALL: [Self; 7] = [
        Self::Status,
        Self::BillToParty,
        Self::Party,
        Self::SalesOrderNumber,
        Self::ShipToParty,
        Self::TotalAmount,
        Self::CurrencyCode,
    ];

    /// Canonical configuration name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::BillToParty => "billToParty",
            Self::Party => "party",
            Self::SalesOrderNumber => "salesOrderNumber",
            Self::ShipToParty => "shipToParty",
            Self::TotalAmount => "totalAmount",
            Self::CurrencyCode => "currencyCode",
        }
    }

    /// Look up an order-wide field by configuration name or legacy alias.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "status" => Some(Self::Status),
            "billToParty" | "billtoparty" => Some(Self::BillToParty),
            "party" => Some(Self::Party),
            "salesOrderNumber" | "salesordernum" => Some(Self::SalesOrderNumber),
            "shipToParty" | "shiptoparty" => Some(Self::ShipToParty),
            "totalAmount" => Some(Self::TotalAmount),
            "currencyCode" | "currencycode" => Some(Self::CurrencyCode),
            _ => None,
        }
    }
}

/// Per-line-item attributes recognized in an order status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LineItemField {
    /// Product SKU.
    Sku,
    /// Product description.
    Description,
    /// Quantity ordered.
    Quantity,
    /// Sales order line number.
    Line,
    /// Extended line amount.
    Amount,
    /// Promised delivery date/time.
    DeliveryDate,
    /// Ship set number.
    ShipSetNumber,
}

impl LineItemField {
    /// All line-item fields, in response order.
    pub const ALL: [Self; 7] = [
        Self::Sku,
        Self::Description,
        Self::Quantity,
        Self::Line,
        Self::Amount,
        Self::DeliveryDate,
        Self::ShipSetNumber,
    ];

    /// Canonical configuration name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sku => "sku",
            Self::Description => "description",
            Self::Quantity => "quantity",
            Self::Line => "line",
            Self::Amount => "amount",
            Self::DeliveryDate => "deliveryDate",
            Self::ShipSetNumber => "shipSetNumber",
        }
    }

    /// Look up a line-item field by configuration name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl Serialize for OrderField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl Serialize for LineItemField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A tracked field name, classified by granularity.
///
/// Names that match neither table are kept as [`FieldName::Other`] and are
/// treated as line-item fields that the API never returns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldName {
    /// Order-wide attribute.
    Order(OrderField),
    /// Line-item attribute.
    LineItem(LineItemField),
    /// Unrecognized name, resolved at line-item granularity.
    Other(String),
}

impl FieldName {
    /// Classify a configured field name. Order-wide names take precedence.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        OrderField::from_name(name)
            .map(Self::Order)
            .or_else(|| LineItemField::from_name(name).map(Self::LineItem))
            .unwrap_or_else(|| Self::Other(name.to_owned()))
    }

    /// Returns the configuration name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Order(field) => field.name(),
            Self::LineItem(field) => field.name(),
            Self::Other(name) => name,
        }
    }

    /// Whether this field is recognized by the response parser.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Whether this field resolves at order granularity.
    #[must_use]
    pub const fn is_order_wide(&self) -> bool {
        matches!(self, Self::Order(_))
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldName {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for FieldName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::parse(&name))
    }
}
