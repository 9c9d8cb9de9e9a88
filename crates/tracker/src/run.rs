//! Workbook update pipeline.
//!
//! One pass over the workbook: prepare each sheet's columns, group rows by
//! order number, fetch every order once, resolve and write the tracked
//! fields, then report line items that no row asks for.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::PathBuf;

use chrono::NaiveDate;
use order_tracker_core::{FieldValue, LineItem, LineItemKey, Order, OrderNumber, OrderNumberKind};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::{ApiConfig, SheetMode, TrackerConfig};
use crate::error::TrackerError;
use crate::order_api::{OrderApiClient, OrderApiError};
use crate::parser;
use crate::resolver::FieldResolver;
use crate::workbook::{self, Sheet, Workbook};
use crate::writer::SheetWriter;

/// Where order documents come from.
pub trait OrderSource {
    /// Fetch the raw status document of one order, `None` if the order is
    /// unknown or not accessible.
    fn fetch(
        &self,
        number: &OrderNumber,
        kind: OrderNumberKind,
    ) -> impl Future<Output = Result<Option<Value>, OrderApiError>>;
}

impl OrderSource for OrderApiClient {
    fn fetch(
        &self,
        number: &OrderNumber,
        kind: OrderNumberKind,
    ) -> impl Future<Output = Result<Option<Value>, OrderApiError>> {
        self.fetch_order(number, kind)
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Sheets processed.
    pub sheets: usize,
    /// Orders fetched successfully.
    pub orders_fetched: usize,
    /// Orders whose request failed.
    pub orders_failed: usize,
    /// Orders the API does not know.
    pub orders_not_found: usize,
    /// Rows whose tracked fields were all resolved.
    pub rows_updated: usize,
    /// Rows with at least one unresolved field.
    pub rows_failed: usize,
    /// Rows skipped for a blank order number, SKU or ship set.
    pub rows_skipped: usize,
    /// Returned line items without a matching row.
    pub unmatched_line_items: usize,
}

impl RunSummary {
    /// Log the summary.
    pub fn log(&self) {
        info!(
            sheets = self.sheets,
            orders_fetched = self.orders_fetched,
            orders_failed = self.orders_failed,
            orders_not_found = self.orders_not_found,
            rows_updated = self.rows_updated,
            rows_failed = self.rows_failed,
            rows_skipped = self.rows_skipped,
            unmatched_line_items = self.unmatched_line_items,
            "Run complete"
        );
    }
}

/// Options for [`run`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Workbook path overriding the configured one.
    pub workbook: Option<PathBuf>,
    /// Do everything except saving the workbook.
    pub dry_run: bool,
    /// Date used for history column headers.
    pub run_date: NaiveDate,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workbook: None,
            dry_run: false,
            run_date: chrono::Local::now().date_naive(),
        }
    }
}

/// Rows of one sheet that share an order number, in sheet order.
struct OrderRows {
    number: OrderNumber,
    rows: Vec<(usize, LineItemKey)>,
}

/// Updates workbooks from an [`OrderSource`].
pub struct Tracker<'a, S> {
    config: &'a TrackerConfig,
    source: &'a S,
    resolver: FieldResolver,
    run_date: NaiveDate,
}

impl<'a, S: OrderSource> Tracker<'a, S> {
    /// Create a tracker.
    #[must_use]
    pub fn new(config: &'a TrackerConfig, source: &'a S, run_date: NaiveDate) -> Self {
        Self {
            config,
            source,
            resolver: FieldResolver::new(config),
            run_date,
        }
    }

    /// Update every relevant sheet of `workbook` in place.
    ///
    /// Single-sheet mode processes the first sheet. Sheet-per-order mode
    /// processes every sheet whose name is an order number and skips sheets
    /// without the key columns.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Write` if the single sheet lacks a mandatory
    /// column. Per-order and per-row failures are logged and counted instead.
    pub async fn update_workbook(&self, workbook: &mut Workbook) -> Result<RunSummary, TrackerError> {
        let mut summary = RunSummary::default();

        match self.config.mode() {
            SheetMode::SingleSheet { .. } => {
                let Some(sheet) = workbook.sheets.first_mut() else {
                    warn!("Workbook has no sheets");
                    return Ok(summary);
                };
                let writer = SheetWriter::prepare(sheet, self.config, self.run_date)?;
                self.update_sheet(sheet, &writer, &mut summary).await;
            }
            SheetMode::SheetPerOrder => {
                for sheet in &mut workbook.sheets {
                    if OrderNumber::parse(&sheet.name).is_err() {
                        debug!(sheet = %sheet.name, "Sheet name is not an order number, skipping");
                        continue;
                    }
                    match SheetWriter::prepare(sheet, self.config, self.run_date) {
                        Ok(writer) => self.update_sheet(sheet, &writer, &mut summary).await,
                        Err(e) => warn!(error = %e, "Skipping sheet"),
                    }
                }
            }
        }

        Ok(summary)
    }

    #[instrument(skip_all, fields(sheet = %sheet.name))]
    async fn update_sheet(&self, sheet: &mut Sheet, writer: &SheetWriter, summary: &mut RunSummary) {
        summary.sheets += 1;

        for group in Self::group_rows(sheet, writer, summary) {
            match self.source.fetch(&group.number, self.config.order_id_type).await {
                Ok(Some(document)) => {
                    summary.orders_fetched += 1;
                    let order = parser::normalize(&document);
                    self.write_order(sheet, writer, &group, &order, summary);
                }
                Ok(None) => {
                    warn!(order = %group.number, "Order not found");
                    summary.orders_not_found += 1;
                    summary.rows_failed += group.rows.len();
                    for (row, _) in &group.rows {
                        writer.write_all(sheet, *row, &FieldValue::OrderNotFound);
                    }
                }
                Err(e) => {
                    if e.is_request_failure() {
                        warn!(order = %group.number, error = %e, "Order request failed");
                    } else {
                        warn!(order = %group.number, error = %e, "Malformed order response");
                    }
                    summary.orders_failed += 1;
                    summary.rows_failed += group.rows.len();
                    for (row, _) in &group.rows {
                        writer.write_fetch_failure(sheet, *row);
                    }
                }
            }
        }
    }

    /// Group rows by order number, in order of first appearance. Rows with a
    /// blank or invalid key get the sentinel and are not grouped.
    fn group_rows(
        sheet: &mut Sheet,
        writer: &SheetWriter,
        summary: &mut RunSummary,
    ) -> Vec<OrderRows> {
        let mut groups: Vec<OrderRows> = Vec::new();
        let mut index: HashMap<OrderNumber, usize> = HashMap::new();

        for row in 0..sheet.row_count() {
            if sheet
                .rows
                .get(row)
                .is_some_and(|cells| cells.iter().all(workbook::CellValue::is_blank))
            {
                continue;
            }

            let parsed = writer
                .row_key(sheet, row)
                .and_then(|key| Some((OrderNumber::parse(&key.order).ok()?, key.item)));

            let Some((number, item)) = parsed else {
                debug!(row = row + 2, "Row has no order number, SKU or ship set, skipping");
                writer.write_all(sheet, row, &FieldValue::NoData);
                summary.rows_skipped += 1;
                continue;
            };

            let slot = *index.entry(number.clone()).or_insert_with(|| {
                groups.push(OrderRows {
                    number,
                    rows: Vec::new(),
                });
                groups.len() - 1
            });
            if let Some(group) = groups.get_mut(slot) {
                group.rows.push((row, item));
            }
        }

        groups
    }

    fn write_order(
        &self,
        sheet: &mut Sheet,
        writer: &SheetWriter,
        group: &OrderRows,
        order: &Order,
        summary: &mut RunSummary,
    ) {
        for (row, key) in &group.rows {
            let mut failed = false;
            for target in writer.targets() {
                let value = self
                    .resolver
                    .resolve(&target.field, order, key)
                    .unwrap_or_else(|e| {
                        if !failed {
                            warn!(order = %group.number, error = %e, "Cannot resolve row");
                        }
                        failed = true;
                        FieldValue::NoData
                    });
                writer.write(sheet, *row, target, &value);
            }

            if failed {
                summary.rows_failed += 1;
            } else {
                debug!(order = %group.number, %key, "Row updated");
                summary.rows_updated += 1;
            }
        }

        let mut seen = HashSet::new();
        for key in order.line_items().iter().filter_map(LineItem::key) {
            if !seen.insert(key.clone()) {
                continue;
            }
            if let Err(e) = writer.find_row(sheet, group.number.as_str(), &key) {
                warn!(error = %e, "Line item has no row");
                summary.unmatched_line_items += 1;
            }
        }
    }
}

/// Load the workbook, update it from the order API and save it.
///
/// # Errors
///
/// Returns `TrackerError` if the workbook cannot be read or saved, if
/// authentication fails, or if the single sheet lacks a mandatory column.
pub async fn run(
    config: &TrackerConfig,
    api: &ApiConfig,
    options: &RunOptions,
) -> Result<RunSummary, TrackerError> {
    let path = options
        .workbook
        .as_deref()
        .unwrap_or(config.workbook.as_path());

    info!(path = %path.display(), "Loading workbook");
    let mut book = workbook::load(path)?;

    let client = OrderApiClient::new(api)?;
    client.authenticate().await?;
    info!("Authenticated with order API");

    let summary = Tracker::new(config, &client, options.run_date)
        .update_workbook(&mut book)
        .await?;

    if options.dry_run {
        info!("Dry run, workbook not saved");
    } else {
        workbook::save(&book, path)?;
        info!(path = %path.display(), "Workbook saved");
    }

    summary.log();
    Ok(summary)
}
