//! Reading and writing `.xlsx` files.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, Xlsx, open_workbook};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, instrument};

use super::{CellValue, Sheet, Workbook};

/// Largest row index an `.xlsx` sheet can hold.
const MAX_ROWS: usize = 1_048_576;
/// Largest column count an `.xlsx` sheet can hold.
const MAX_COLS: usize = 16_384;

/// Workbook file errors.
#[derive(Debug, Error)]
pub enum WorkbookError {
    /// The file could not be opened or is not a valid `.xlsx` workbook.
    #[error("Cannot read workbook {}: {source}", .path.display())]
    Read {
        /// Workbook path.
        path: PathBuf,
        /// Reader error.
        source: calamine::XlsxError,
    },

    /// The workbook could not be serialized.
    #[error("Cannot write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    /// The file could not be written or replaced.
    #[error("Cannot save workbook {}: {source}", .path.display())]
    Io {
        /// Workbook path.
        path: PathBuf,
        /// I/O error.
        source: std::io::Error,
    },

    /// A sheet exceeds the `.xlsx` row or column limits.
    #[error("Sheet {0} is too large for an xlsx file")]
    TooLarge(String),

    /// The workbook has no sheets.
    #[error("Workbook {} has no sheets", .0.display())]
    NoSheets(PathBuf),
}

/// Load every sheet of an `.xlsx` workbook.
///
/// The first row of each sheet's used range is its header. Leading empty
/// columns are kept and the header's row is recorded, so [`save`] writes
/// every cell back to the position it was read from.
///
/// # Errors
///
/// Returns `WorkbookError::Read` if the file cannot be opened or parsed, and
/// `WorkbookError::NoSheets` if it contains no sheets.
#[instrument(fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<Workbook, WorkbookError> {
    let read_error = |source| WorkbookError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut xlsx: Xlsx<_> = open_workbook(path).map_err(read_error)?;
    let names = xlsx.sheet_names();

    if names.is_empty() {
        return Err(WorkbookError::NoSheets(path.to_path_buf()));
    }

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = xlsx.worksheet_range(&name).map_err(read_error)?;
        let (row_offset, col_offset) = range
            .start()
            .map_or((0, 0), |(row, col)| (row as usize, col as usize));

        let mut rows = range.rows().map(|cells| {
            std::iter::repeat_n(CellValue::Empty, col_offset)
                .chain(cells.iter().map(to_cell_value))
                .collect::<Vec<_>>()
        });

        let header = rows
            .next()
            .map(|cells| cells.iter().map(ToString::to_string).collect())
            .unwrap_or_default();

        let mut sheet = Sheet::new(name, header);
        sheet.header_row = row_offset;
        sheet.rows = rows.collect();
        debug!(sheet = %sheet.name, rows = sheet.row_count(), "Loaded sheet");
        sheets.push(sheet);
    }

    Ok(Workbook { sheets })
}

/// Save a workbook, replacing `path` atomically.
///
/// The workbook is written to a temporary file in the same directory and
/// renamed over `path`, so a failure leaves the original untouched.
///
/// # Errors
///
/// Returns `WorkbookError::TooLarge` if a sheet exceeds `.xlsx` limits,
/// `WorkbookError::Write` if serialization fails, and `WorkbookError::Io`
/// if the file cannot be written or replaced.
#[instrument(skip(workbook), fields(path = %path.display()))]
pub fn save(workbook: &Workbook, path: &Path) -> Result<(), WorkbookError> {
    let buffer = to_xlsx_bytes(workbook)?;

    let io_error = |source| WorkbookError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(&buffer).map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path).map_err(|e| io_error(e.error))?;

    debug!(bytes = buffer.len(), "Saved workbook");
    Ok(())
}

fn to_xlsx_bytes(workbook: &Workbook) -> Result<Vec<u8>, WorkbookError> {
    let mut out = rust_xlsxwriter::Workbook::new();

    for sheet in &workbook.sheets {
        if sheet.header_row + sheet.row_count() + 1 > MAX_ROWS
            || sheet.header.len() > MAX_COLS
            || sheet.rows.iter().any(|r| r.len() > MAX_COLS)
        {
            return Err(WorkbookError::TooLarge(sheet.name.clone()));
        }

        let worksheet = out.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (col, name) in sheet.header.iter().enumerate() {
            if !name.is_empty() {
                worksheet.write_string(to_row(sheet.header_row), to_col(col), name)?;
            }
        }

        for (row, cells) in sheet.rows.iter().enumerate() {
            let row = to_row(sheet.header_row + row + 1);
            for (col, cell) in cells.iter().enumerate() {
                let col = to_col(col);
                match cell {
                    CellValue::Empty => {}
                    CellValue::Text(s) => {
                        worksheet.write_string(row, col, s)?;
                    }
                    CellValue::Number(n) => {
                        worksheet.write_number(row, col, *n)?;
                    }
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(row, col, *b)?;
                    }
                }
            }
        }
    }

    Ok(out.save_to_buffer()?)
}

// Bounds are checked against MAX_ROWS/MAX_COLS before writing.
#[allow(clippy::cast_possible_truncation)]
const fn to_row(row: usize) -> u32 {
    row as u32
}

#[allow(clippy::cast_possible_truncation)]
const fn to_col(col: usize) -> u16 {
    col as u16
}

fn to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        #[allow(clippy::cast_precision_loss)]
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => dt.as_datetime().map_or_else(
            || CellValue::Number(dt.as_f64()),
            |dt| {
                if dt.time() == chrono::NaiveTime::MIN {
                    CellValue::Text(dt.format("%Y-%m-%d").to_string())
                } else {
                    CellValue::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string())
                }
            },
        ),
        Data::Error(e) => CellValue::Text(format!("#{e:?}")),
    }
}
