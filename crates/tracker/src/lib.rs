//! Order Tracker - keeps a spreadsheet in sync with the order status API.
//!
//! Reads an `.xlsx` tracker, looks up every order it references, and writes
//! the configured fields (status, delivery date, amounts, ...) back into the
//! rows that identify each line item by SKU and ship set.
//!
//! # Architecture
//!
//! - [`order_api`] fetches raw order documents (OAuth2, one retry on `401`)
//! - [`parser`] normalizes a document into an [`order_tracker_core::Order`]
//! - [`resolver`] maps a tracked field name and row key to a value
//! - [`writer`] fixes each sheet's column layout and writes cells
//! - [`workbook`] reads and atomically saves `.xlsx` files
//! - [`run`] ties them together and produces a [`run::RunSummary`]
//!
//! Configuration comes from the environment (API credentials) and a YAML
//! tracker file (columns and fields), see [`config`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod order_api;
pub mod parser;
pub mod resolver;
pub mod run;
pub mod workbook;
pub mod writer;

pub use config::{ApiConfig, ConfigError, TrackerConfig};
pub use error::TrackerError;
pub use run::{RunOptions, RunSummary, Tracker, run};
