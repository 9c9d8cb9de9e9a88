//! In-memory workbook model.
//!
//! A workbook is a list of sheets; each sheet is a header row plus data rows.
//! Rows may be shorter than the header (trailing cells are empty). Only cell
//! values are modeled.

mod io;

pub use io::{WorkbookError, load, save};

use core::fmt;

use order_tracker_core::FieldValue;

/// Value of one cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Blank cell.
    #[default]
    Empty,
    /// Text cell.
    Text(String),
    /// Numeric cell.
    Number(f64),
    /// Boolean cell.
    Bool(bool),
}

impl CellValue {
    /// Key form of the cell, used to match order numbers, SKUs and ship sets.
    ///
    /// Returns `None` for blank cells.
    #[must_use]
    pub fn as_key(&self) -> Option<String> {
        FieldValue::from(self).as_key()
    }

    /// Whether the cell is blank (empty or whitespace-only text).
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.as_key().is_none()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", FieldValue::Number(*n)),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&CellValue> for FieldValue {
    fn from(cell: &CellValue) -> Self {
        match cell {
            CellValue::Empty => Self::Text(String::new()),
            CellValue::Text(s) => Self::Text(s.clone()),
            CellValue::Number(n) => Self::Number(*n),
            CellValue::Bool(b) => Self::Text(b.to_string()),
        }
    }
}

impl From<&FieldValue> for CellValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Number(n) => Self::Number(*n),
            FieldValue::Text(s) => Self::Text(s.clone()),
            sentinel => Self::Text(sentinel.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// One worksheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    /// Sheet name.
    pub name: String,
    /// Zero-based sheet row holding the header. Data rows follow it.
    pub header_row: usize,
    /// Header row (column names).
    pub header: Vec<String>,
    /// Data rows, below the header.
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    /// Create a sheet with a header and no rows.
    #[must_use]
    pub fn new(name: impl Into<String>, header: Vec<String>) -> Self {
        Self {
            name: name.into(),
            header_row: 0,
            header,
            rows: Vec::new(),
        }
    }

    /// Index of the column named `name` (surrounding whitespace ignored).
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.header.iter().position(|h| h.trim() == name)
    }

    /// Number of data rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Value of a cell; missing cells read as empty.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Set a cell, growing the row as needed.
    ///
    /// Does nothing if `row` is past the last data row.
    pub fn set_cell(&mut self, row: usize, col: usize, value: CellValue) {
        if let Some(cells) = self.rows.get_mut(row) {
            if cells.len() <= col {
                cells.resize(col + 1, CellValue::Empty);
            }
            if let Some(cell) = cells.get_mut(col) {
                *cell = value;
            }
        }
    }

    /// Insert a column at `at`, shifting that column and everything to its
    /// right one position right on the header and every row.
    pub fn insert_column(&mut self, at: usize, name: impl Into<String>) {
        let at = at.min(self.header.len());
        self.header.insert(at, name.into());
        for cells in &mut self.rows {
            if cells.len() > at {
                cells.insert(at, CellValue::Empty);
            }
        }
    }

    /// Append a column at the right. Returns its index.
    pub fn append_column(&mut self, name: impl Into<String>) -> usize {
        self.header.push(name.into());
        self.header.len() - 1
    }
}

/// A workbook: sheets in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    /// Sheets in file order.
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Sheet named `name`.
    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}
