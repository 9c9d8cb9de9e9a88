//! Order Tracker Core - Shared types library.
//!
//! This crate provides the domain types used across the order tracker:
//! - `order-tracker` - Order API client, parser, resolver and workbook writer
//! - `order-tracker-cli` - Command-line entry point
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! spreadsheet access. Orders arrive here already normalized; everything
//! loosely typed stays at the API boundary.
//!
//! # Modules
//!
//! - [`types`] - Order numbers, field names, field values, orders and line items

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
