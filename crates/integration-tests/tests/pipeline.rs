//! Integration tests for the workbook update pipeline.
//!
//! Orders come from a canned source; workbooks stay in memory.

#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use order_tracker::Tracker;
use order_tracker::workbook::{CellValue, Workbook};
use order_tracker_integration_tests::{
    CannedSource, Line, order_document, sheet, text, tracker_config,
};

const SINGLE_SHEET: &str = r"
order_id_type: sales_order
workbook: tracker.xlsx
order_column: Sales Order
fields:
  - field: status
    column: Status
  - field: deliveryDate
    column: Delivery Date
";

const HISTORY: &str = r"
order_id_type: sales_order
workbook: tracker.xlsx
order_column: Sales Order
fields:
  - field: status
    column: Status
  - field: deliveryDate
    column: Delivery Date
keep_history: true
history_field: deliveryDate
";

const SHEET_PER_ORDER: &str = r"
order_id_type: sales_order
workbook: tracker.xlsx
single_sheet: false
fields:
  - field: deliveryDate
    column: Delivery Date
";

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn single_sheet(rows: Vec<Vec<CellValue>>) -> Workbook {
    Workbook {
        sheets: vec![sheet("Orders", &["Sales Order", "SKU", "Ship Set Number"], rows)],
    }
}

fn row(order: &str, sku: &str, ship_set: f64) -> Vec<CellValue> {
    vec![order.into(), sku.into(), ship_set.into()]
}

// =============================================================================
// Resolution
// =============================================================================

#[tokio::test]
async fn test_line_item_value_written_to_named_column() {
    let config = tracker_config(SINGLE_SHEET);
    let source = CannedSource::new().with_order(
        "SO100",
        order_document("Booked", &[Line::new("ABC123", 1, "2024-03-01")]),
    );
    let mut book = single_sheet(vec![row("SO100", "ABC123", 1.0)]);

    let summary = Tracker::new(&config, &source, day(1))
        .update_workbook(&mut book)
        .await
        .unwrap();

    let sheet = &book.sheets[0];
    assert_eq!(text(sheet, 0, "Delivery Date").as_deref(), Some("2024-03-01"));
    assert_eq!(text(sheet, 0, "Status").as_deref(), Some("Booked"));
    assert_eq!(summary.rows_updated, 1);
    assert_eq!(summary.unmatched_line_items, 0);
}

#[tokio::test]
async fn test_empty_line_items_write_sentinel() {
    let config = tracker_config(SINGLE_SHEET);
    let source = CannedSource::new().with_order("SO100", order_document("Booked", &[]));
    let mut book = single_sheet(vec![row("SO100", "ABC123", 1.0)]);

    let summary = Tracker::new(&config, &source, day(1))
        .update_workbook(&mut book)
        .await
        .unwrap();

    let sheet = &book.sheets[0];
    assert_eq!(text(sheet, 0, "Delivery Date").as_deref(), Some("No Data"));
    // Order-wide fields still resolve
    assert_eq!(text(sheet, 0, "Status").as_deref(), Some("Booked"));
    assert_eq!(summary.rows_failed, 1);
}

#[tokio::test]
async fn test_same_sku_in_two_ship_sets() {
    let config = tracker_config(SINGLE_SHEET);
    let source = CannedSource::new().with_order(
        "SO100",
        order_document(
            "Booked",
            &[
                Line::new("ABC123", 1, "2024-03-01"),
                Line::new("ABC123", 2, "2024-06-01"),
            ],
        ),
    );
    let mut book = single_sheet(vec![row("SO100", "ABC123", 2.0), row("SO100", "ABC123", 1.0)]);

    Tracker::new(&config, &source, day(1))
        .update_workbook(&mut book)
        .await
        .unwrap();

    let sheet = &book.sheets[0];
    assert_eq!(text(sheet, 0, "Delivery Date").as_deref(), Some("2024-06-01"));
    assert_eq!(text(sheet, 1, "Delivery Date").as_deref(), Some("2024-03-01"));
}

#[tokio::test]
async fn test_date_format_applied() {
    let config = tracker_config(&format!("{SINGLE_SHEET}date_format: \"%m/%d/%Y\"\n"));
    let source = CannedSource::new().with_order(
        "SO100",
        order_document(
            "Booked",
            &[
                Line::new("A", 1, "2024-03-01T12:00:00Z"),
                Line::new("B", 1, "soon"),
            ],
        ),
    );
    let mut book = single_sheet(vec![row("SO100", "A", 1.0), row("SO100", "B", 1.0)]);

    Tracker::new(&config, &source, day(1))
        .update_workbook(&mut book)
        .await
        .unwrap();

    let sheet = &book.sheets[0];
    assert_eq!(text(sheet, 0, "Delivery Date").as_deref(), Some("03/01/2024"));
    assert_eq!(text(sheet, 1, "Delivery Date").as_deref(), Some("Invalid Date"));
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_each_order_fetched_once_in_sheet_order() {
    let config = tracker_config(SINGLE_SHEET);
    let source = CannedSource::new()
        .with_order("SO200", order_document("Shipped", &[Line::new("X", 1, "2024-04-01")]))
        .with_order("SO100", order_document("Booked", &[Line::new("A", 1, "2024-03-01")]));
    let mut book = single_sheet(vec![
        row("SO200", "X", 1.0),
        row("SO100", "A", 1.0),
        row("SO200", "X", 1.0),
    ]);

    let summary = Tracker::new(&config, &source, day(1))
        .update_workbook(&mut book)
        .await
        .unwrap();

    assert_eq!(source.requests(), ["SO200", "SO100"]);
    assert_eq!(summary.orders_fetched, 2);
    assert_eq!(summary.rows_updated, 3);
}

#[tokio::test]
async fn test_unknown_order_written_as_not_found() {
    let config = tracker_config(SINGLE_SHEET);
    let source = CannedSource::new();
    let mut book = single_sheet(vec![row("SO404", "A", 1.0)]);

    let summary = Tracker::new(&config, &source, day(1))
        .update_workbook(&mut book)
        .await
        .unwrap();

    let sheet = &book.sheets[0];
    assert_eq!(text(sheet, 0, "Status").as_deref(), Some("Order Not Found"));
    assert_eq!(text(sheet, 0, "Delivery Date").as_deref(), Some("Order Not Found"));
    assert_eq!(summary.orders_not_found, 1);
}

#[tokio::test]
async fn test_failed_order_does_not_stop_run() {
    let config = tracker_config(HISTORY);
    let source = CannedSource::new()
        .with_failure("SO100")
        .with_order("SO200", order_document("Booked", &[Line::new("B", 1, "2024-05-01")]));
    let mut book = single_sheet(vec![row("SO100", "A", 1.0), row("SO200", "B", 1.0)]);

    let summary = Tracker::new(&config, &source, day(1))
        .update_workbook(&mut book)
        .await
        .unwrap();

    let sheet = &book.sheets[0];
    let dated = "Delivery Date: 03.01.2024";
    assert_eq!(text(sheet, 0, dated).as_deref(), Some("No Data"));
    assert_eq!(text(sheet, 0, "Status"), None);
    assert_eq!(text(sheet, 1, dated).as_deref(), Some("2024-05-01"));
    assert_eq!(summary.orders_failed, 1);
    assert_eq!(summary.orders_fetched, 1);
}

#[tokio::test]
async fn test_rows_with_blank_keys_skipped() {
    let config = tracker_config(SINGLE_SHEET);
    let source = CannedSource::new();
    let mut book = single_sheet(vec![
        vec![CellValue::Empty, "A".into(), 1.0.into()],
        vec!["SO100".into(), "A".into(), CellValue::Empty],
        Vec::new(),
    ]);

    let summary = Tracker::new(&config, &source, day(1))
        .update_workbook(&mut book)
        .await
        .unwrap();

    assert!(source.requests().is_empty());
    assert_eq!(summary.rows_skipped, 2);
    let sheet = &book.sheets[0];
    assert_eq!(text(sheet, 0, "Delivery Date").as_deref(), Some("No Data"));
    assert_eq!(text(sheet, 2, "Delivery Date"), None);
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn test_history_snapshot_inserted_before_previous_value() {
    let config = tracker_config(HISTORY);
    let source = CannedSource::new().with_order(
        "SO100",
        order_document("Booked", &[Line::new("A", 1, "2024-03-05")]),
    );
    let mut book = Workbook {
        sheets: vec![sheet(
            "Orders",
            &[
                "Sales Order",
                "SKU",
                "Ship Set Number",
                "Status",
                "Notes",
                "Delivery Date: 03.01.2024",
            ],
            vec![
                vec![
                    "SO100".into(),
                    "A".into(),
                    1.0.into(),
                    "Booked".into(),
                    "call".into(),
                    "2024-03-01".into(),
                ],
                vec!["".into(), "".into(), "".into(), "".into(), "".into(), "n/a".into()],
            ],
        )],
    };

    Tracker::new(&config, &source, day(5))
        .update_workbook(&mut book)
        .await
        .unwrap();

    let sheet = &book.sheets[0];
    assert_eq!(sheet.header[5], "Delivery Date: 03.05.2024");
    assert_eq!(sheet.header[6], "Delivery Date: 03.01.2024");
    assert_eq!(text(sheet, 0, "Delivery Date: 03.05.2024").as_deref(), Some("2024-03-05"));
    assert_eq!(text(sheet, 0, "Delivery Date: 03.01.2024").as_deref(), Some("2024-03-01"));
    // Every row shifts, including rows the run does not touch
    assert_eq!(text(sheet, 1, "Delivery Date: 03.01.2024").as_deref(), Some("n/a"));
    assert_eq!(text(sheet, 0, "Notes").as_deref(), Some("call"));
}

#[tokio::test]
async fn test_history_over_several_runs() {
    let config = tracker_config(HISTORY);
    let mut book = single_sheet(vec![row("SO100", "A", 1.0)]);

    for (d, date) in [(1, "2024-04-01"), (2, "2024-04-02"), (3, "2024-04-03")] {
        let source = CannedSource::new()
            .with_order("SO100", order_document("Booked", &[Line::new("A", 1, date)]));
        Tracker::new(&config, &source, day(d))
            .update_workbook(&mut book)
            .await
            .unwrap();
    }

    let sheet = &book.sheets[0];
    assert_eq!(
        sheet.header,
        [
            "Sales Order",
            "SKU",
            "Ship Set Number",
            "Status",
            "Delivery Date: 03.03.2024",
            "Delivery Date: 03.02.2024",
            "Delivery Date: 03.01.2024",
        ]
    );
    assert_eq!(text(sheet, 0, "Delivery Date: 03.01.2024").as_deref(), Some("2024-04-01"));
    assert_eq!(text(sheet, 0, "Delivery Date: 03.03.2024").as_deref(), Some("2024-04-03"));
}

#[tokio::test]
async fn test_same_day_rerun_overwrites_snapshot() {
    let config = tracker_config(HISTORY);
    let mut book = single_sheet(vec![row("SO100", "A", 1.0)]);

    for date in ["2024-04-01", "2024-04-09"] {
        let source = CannedSource::new()
            .with_order("SO100", order_document("Booked", &[Line::new("A", 1, date)]));
        Tracker::new(&config, &source, day(1))
            .update_workbook(&mut book)
            .await
            .unwrap();
    }

    let sheet = &book.sheets[0];
    assert_eq!(sheet.header.len(), 5);
    assert_eq!(text(sheet, 0, "Delivery Date: 03.01.2024").as_deref(), Some("2024-04-09"));
}

#[tokio::test]
async fn test_same_day_failure_keeps_earlier_snapshot() {
    let config = tracker_config(HISTORY);
    let mut book = single_sheet(vec![row("SO100", "A", 1.0)]);

    let source = CannedSource::new().with_order(
        "SO100",
        order_document("Booked", &[Line::new("A", 1, "2024-04-01")]),
    );
    Tracker::new(&config, &source, day(1))
        .update_workbook(&mut book)
        .await
        .unwrap();

    let failing = CannedSource::new().with_failure("SO100");
    let summary = Tracker::new(&config, &failing, day(1))
        .update_workbook(&mut book)
        .await
        .unwrap();

    let sheet = &book.sheets[0];
    assert_eq!(summary.orders_failed, 1);
    assert_eq!(text(sheet, 0, "Delivery Date: 03.01.2024").as_deref(), Some("2024-04-01"));
    assert_eq!(text(sheet, 0, "Status").as_deref(), Some("Booked"));
}

// =============================================================================
// Sheet per order
// =============================================================================

#[tokio::test]
async fn test_sheet_per_order_reports_missing_row() {
    let config = tracker_config(SHEET_PER_ORDER);
    let source = CannedSource::new().with_order(
        "SO200",
        order_document(
            "Booked",
            &[
                Line::new("ABC", 1, "2024-03-01"),
                Line::new("XYZ", 2, "2024-03-09"),
            ],
        ),
    );
    let mut book = Workbook {
        sheets: vec![
            sheet(
                "SO200",
                &["SKU", "Ship Set Number"],
                vec![vec!["ABC".into(), 1.0.into()]],
            ),
            sheet("Read Me", &["Notes"], vec![vec!["not an order".into()]]),
        ],
    };

    let summary = Tracker::new(&config, &source, day(1))
        .update_workbook(&mut book)
        .await
        .unwrap();

    assert_eq!(source.requests(), ["SO200"]);
    assert_eq!(summary.sheets, 1);
    assert_eq!(summary.unmatched_line_items, 1);
    assert_eq!(text(&book.sheets[0], 0, "Delivery Date").as_deref(), Some("2024-03-01"));
    assert_eq!(book.sheets[1].header, ["Notes"]);
}

#[tokio::test]
async fn test_sheet_per_order_skips_sheet_without_key_columns() {
    let config = tracker_config(SHEET_PER_ORDER);
    let source = CannedSource::new();
    let mut book = Workbook {
        sheets: vec![sheet("SO300", &["Part"], vec![vec!["ABC".into()]])],
    };

    let summary = Tracker::new(&config, &source, day(1))
        .update_workbook(&mut book)
        .await
        .unwrap();

    assert_eq!(summary.sheets, 0);
    assert!(source.requests().is_empty());
    assert_eq!(book.sheets[0].header, ["Part"]);
}
