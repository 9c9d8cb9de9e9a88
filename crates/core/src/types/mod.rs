//! Core types for the order tracker.
//!
//! This module provides type-safe wrappers for the order domain.

pub mod field;
pub mod order;
pub mod order_number;
pub mod value;

pub use field::{FieldName, LineItemField, OrderField};
pub use order::{LineItem, LineItemKey, Order};
pub use order_number::{OrderNumber, OrderNumberError, OrderNumberKind};
pub use value::FieldValue;
