//! Resolved field values and sentinels.

use core::fmt;

use serde::{Serialize, Serializer};

/// A value resolved for a tracked field.
///
/// Anything that could not be resolved is represented by a sentinel variant
/// instead of being omitted, so every tracked cell always receives a value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// Text value.
    Text(String),
    /// Numeric value.
    Number(f64),
    /// The field is absent from the response or could not be resolved.
    #[default]
    NoData,
    /// The API does not know the order (or denies access to it).
    OrderNotFound,
    /// A date field was present but could not be parsed.
    InvalidDate,
}

impl FieldValue {
    /// Sentinel text for [`FieldValue::NoData`].
    pub const NO_DATA: &'static str = "No Data";
    /// Sentinel text for [`FieldValue::OrderNotFound`].
    pub const ORDER_NOT_FOUND: &'static str = "Order Not Found";
    /// Sentinel text for [`FieldValue::InvalidDate`].
    pub const INVALID_DATE: &'static str = "Invalid Date";

    /// Create a text value.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Whether this value is a placeholder rather than real data.
    #[must_use]
    pub const fn is_sentinel(&self) -> bool {
        matches!(self, Self::NoData | Self::OrderNotFound | Self::InvalidDate)
    }

    /// Returns the text if this is a non-empty [`FieldValue::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// Key form of the value, used to match SKUs and ship sets.
    ///
    /// Returns `None` for sentinels and blank text. Whole numbers lose their
    /// fractional part so that a ship set stored as `1.0` matches `"1"`.
    #[must_use]
    pub fn as_key(&self) -> Option<String> {
        match self {
            Self::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_owned())
            }
            Self::Number(n) => Some(format_number(*n)),
            Self::NoData | Self::OrderNotFound | Self::InvalidDate => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::NoData => f.write_str(Self::NO_DATA),
            Self::OrderNotFound => f.write_str(Self::ORDER_NOT_FOUND),
            Self::InvalidDate => f.write_str(Self::INVALID_DATE),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_f64(*n),
            other => serializer.collect_str(other),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// Format a number without a trailing `.0` when it is whole.
fn format_number(n: f64) -> String {
    // 2^53: beyond this, f64 cannot represent every integer exactly
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    if n.fract() == 0.0 && n.abs() < MAX_EXACT {
        #[allow(clippy::cast_possible_truncation)] // Bounded by MAX_EXACT above
        let whole = n as i64;
        whole.to_string()
    } else {
        n.to_string()
    }
}
