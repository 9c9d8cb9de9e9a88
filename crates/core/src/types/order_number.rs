//! Order number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`OrderNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    /// The input string is empty (after trimming).
    #[error("order number cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("order number must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace or control characters.
    #[error("order number cannot contain whitespace")]
    Whitespace,
}

/// Which reference an order number refers to.
///
/// The order API accepts any of the three and answers with the same
/// document shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderNumberKind {
    /// Sales order number (SO#).
    #[default]
    SalesOrder,
    /// Web order number.
    WebOrder,
    /// Purchase order number (PO#).
    PurchaseOrder,
}

impl fmt::Display for OrderNumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SalesOrder => write!(f, "sales_order"),
            Self::WebOrder => write!(f, "web_order"),
            Self::PurchaseOrder => write!(f, "purchase_order"),
        }
    }
}

impl std::str::FromStr for OrderNumberKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "sales_order" | "sales" | "so" => Ok(Self::SalesOrder),
            "web_order" | "web" => Ok(Self::WebOrder),
            "purchase_order" | "purchase" | "po" => Ok(Self::PurchaseOrder),
            _ => Err(format!("invalid order number kind: {s}")),
        }
    }
}

/// An order number as it appears in the workbook and in API requests.
///
/// ## Examples
///
/// ```
/// use order_tracker_core::OrderNumber;
///
/// assert!(OrderNumber::parse("SO100").is_ok());
/// assert!(OrderNumber::parse("  98765432 ").is_ok());
///
/// assert!(OrderNumber::parse("").is_err());
/// assert!(OrderNumber::parse("SO 100").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Maximum length of an order number.
    pub const MAX_LENGTH: usize = 64;

    /// Parse an `OrderNumber` from a string, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`Self::MAX_LENGTH`], or contains inner whitespace.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(OrderNumberError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(OrderNumberError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(OrderNumberError::Whitespace);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric value if the order number is all digits.
    ///
    /// Sales and web order numbers are sent to the API as JSON numbers.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        if self.0.bytes().all(|b| b.is_ascii_digit()) {
            self.0.parse().ok()
        } else {
            None
        }
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
