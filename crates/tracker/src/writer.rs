//! Sheet column layout and cell writes.
//!
//! [`SheetWriter::prepare`] fixes the column layout of a sheet once per run:
//! it appends missing output columns, inserts (or reuses) the dated history
//! column and records where every tracked field goes. Row writes after that
//! never change the layout.

use chrono::NaiveDate;
use order_tracker_core::{FieldName, FieldValue, LineItemKey};
use thiserror::Error;
use tracing::debug;

use crate::config::{SheetMode, TrackerConfig};
use crate::workbook::{CellValue, Sheet};

/// Sheet write errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    /// No row of the sheet carries a returned line item.
    #[error("No row in sheet {sheet} for order {order}, {key}")]
    RowNotFound {
        /// Sheet name.
        sheet: String,
        /// Order number.
        order: String,
        /// Line item key.
        key: LineItemKey,
    },

    /// A mandatory key column is missing from the sheet.
    #[error("Sheet {sheet} has no column named {column}")]
    MissingColumn {
        /// Sheet name.
        sheet: String,
        /// Column name.
        column: String,
    },
}

/// Where one tracked field is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetColumn {
    /// Tracked field.
    pub field: FieldName,
    /// Column index.
    pub col: usize,
    /// Whether this is the dated history column.
    pub history: bool,
}

/// Identity of a spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    /// Order number, from the order column or the sheet name.
    pub order: String,
    /// Line item key.
    pub item: LineItemKey,
}

/// Header of the dated history column for `column` on `run_date`.
#[must_use]
pub fn history_header(column: &str, run_date: NaiveDate) -> String {
    format!("{}: {}", column.trim(), run_date.format("%m.%d.%Y"))
}

/// Fixed column layout of one sheet for one run.
#[derive(Debug, Clone)]
pub struct SheetWriter {
    sheet_name: String,
    order_col: Option<usize>,
    sku_col: usize,
    ship_set_col: usize,
    targets: Vec<TargetColumn>,
    history_added: bool,
}

impl SheetWriter {
    /// Prepare `sheet` for this run and record its layout.
    ///
    /// With history enabled, the dated column for `run_date` is reused if it
    /// exists, otherwise inserted at the leftmost earlier snapshot (or plain
    /// column) of the history field, otherwise appended. Other output columns
    /// are appended when missing.
    ///
    /// # Errors
    ///
    /// Returns `WriteError::MissingColumn` if the SKU, ship set or (in
    /// single-sheet mode) order column is missing. The sheet is left
    /// unchanged in that case.
    pub fn prepare(
        sheet: &mut Sheet,
        config: &TrackerConfig,
        run_date: NaiveDate,
    ) -> Result<Self, WriteError> {
        let order_column = match config.mode() {
            SheetMode::SingleSheet { order_column } => Some(order_column),
            SheetMode::SheetPerOrder => None,
        };

        let mut required = vec![config.sku_column.as_str(), config.ship_set_column.as_str()];
        required.extend(order_column);
        for column in required {
            if sheet.column_index(column).is_none() {
                return Err(WriteError::MissingColumn {
                    sheet: sheet.name.clone(),
                    column: column.to_string(),
                });
            }
        }

        let history = config.history();
        let is_history = |field: &FieldName| history.is_some_and(|h| &h.field == field);

        for tracked in config.fields.iter().filter(|t| !is_history(&t.field)) {
            if sheet.column_index(&tracked.column).is_none() {
                debug!(sheet = %sheet.name, column = %tracked.column, "Adding column");
                sheet.append_column(tracked.column.trim());
            }
        }

        // Inserting shifts columns, so every index is looked up afterwards.
        let prepared =
            history.map(|tracked| prepare_history_column(sheet, &tracked.column, run_date));
        let history_col = prepared.map(|(col, _)| col);
        let history_added = prepared.is_some_and(|(_, added)| added);

        let find = |name: &str| {
            sheet
                .column_index(name)
                .ok_or_else(|| WriteError::MissingColumn {
                    sheet: sheet.name.clone(),
                    column: name.to_string(),
                })
        };

        let mut targets = Vec::with_capacity(config.fields.len());
        for tracked in &config.fields {
            let (col, dated) = match history_col {
                Some(col) if is_history(&tracked.field) => (col, true),
                _ => (find(&tracked.column)?, false),
            };
            targets.push(TargetColumn {
                field: tracked.field.clone(),
                col,
                history: dated,
            });
        }

        Ok(Self {
            sheet_name: sheet.name.clone(),
            order_col: order_column.map(find).transpose()?,
            sku_col: find(&config.sku_column)?,
            ship_set_col: find(&config.ship_set_column)?,
            targets,
            history_added,
        })
    }

    /// Output columns, in configuration order.
    #[must_use]
    pub fn targets(&self) -> &[TargetColumn] {
        &self.targets
    }

    /// Write one resolved value.
    pub fn write(&self, sheet: &mut Sheet, row: usize, target: &TargetColumn, value: &FieldValue) {
        sheet.set_cell(row, target.col, CellValue::from(value));
    }

    /// Write the same value to every output column of a row.
    pub fn write_all(&self, sheet: &mut Sheet, row: usize, value: &FieldValue) {
        for target in &self.targets {
            self.write(sheet, row, target, value);
        }
    }

    /// Write a value to the history column of a row, if there is one.
    pub fn write_history(&self, sheet: &mut Sheet, row: usize, value: &FieldValue) {
        for target in self.targets.iter().filter(|t| t.history) {
            self.write(sheet, row, target, value);
        }
    }

    /// Mark a row whose order could not be fetched.
    ///
    /// Only a history column added by this run is filled with the sentinel.
    /// A reused same-day column keeps whatever an earlier run wrote.
    pub fn write_fetch_failure(&self, sheet: &mut Sheet, row: usize) {
        if self.history_added {
            self.write_history(sheet, row, &FieldValue::NoData);
        }
    }

    /// Whether the dated history column was inserted or appended by this
    /// run, as opposed to reused.
    #[must_use]
    pub const fn history_added(&self) -> bool {
        self.history_added
    }

    /// Identity of a row, or `None` if its order number, SKU or ship set is
    /// blank.
    #[must_use]
    pub fn row_key(&self, sheet: &Sheet, row: usize) -> Option<RowKey> {
        let order = match self.order_col {
            Some(col) => sheet.cell(row, col).as_key()?,
            None => {
                let name = sheet.name.trim();
                (!name.is_empty()).then(|| name.to_string())?
            }
        };

        let sku = sheet.cell(row, self.sku_col).as_key()?;
        let ship_set = sheet.cell(row, self.ship_set_col).as_key()?;

        Some(RowKey {
            order,
            item: LineItemKey::new(sku, ship_set),
        })
    }

    /// First row identified by `order` and `key`.
    ///
    /// # Errors
    ///
    /// Returns `WriteError::RowNotFound` if no row matches.
    pub fn find_row(
        &self,
        sheet: &Sheet,
        order: &str,
        key: &LineItemKey,
    ) -> Result<usize, WriteError> {
        (0..sheet.row_count())
            .find(|&row| {
                self.row_key(sheet, row)
                    .is_some_and(|k| k.order == order && &k.item == key)
            })
            .ok_or_else(|| WriteError::RowNotFound {
                sheet: self.sheet_name.clone(),
                order: order.to_string(),
                key: key.clone(),
            })
    }
}

/// Find or create today's history column. Returns its index and whether it
/// was created.
fn prepare_history_column(sheet: &mut Sheet, column: &str, run_date: NaiveDate) -> (usize, bool) {
    let column = column.trim();
    let header = history_header(column, run_date);

    if let Some(col) = sheet.column_index(&header) {
        debug!(sheet = %sheet.name, %header, "Reusing history column");
        return (col, false);
    }

    let snapshot_prefix = format!("{column}: ");
    let anchor = sheet.header.iter().position(|h| {
        let h = h.trim();
        h == column || h.starts_with(&snapshot_prefix)
    });

    if let Some(col) = anchor {
        debug!(sheet = %sheet.name, %header, col, "Inserting history column");
        sheet.insert_column(col, header);
        (col, true)
    } else {
        debug!(sheet = %sheet.name, %header, "Appending history column");
        (sheet.append_column(header), true)
    }
}
