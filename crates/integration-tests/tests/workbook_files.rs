//! End-to-end runs against `.xlsx` files and a mock order API.

#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use order_tracker::workbook::{self, CellValue};
use order_tracker::{RunOptions, TrackerError};
use order_tracker_integration_tests::{
    Line, TOKEN_PATH, api_config, mount_order, mount_token, order_document, sheet, text,
    tracker_config, write_workbook,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONFIG: &str = r"
order_id_type: sales_order
workbook: tracker.xlsx
order_column: Sales Order
fields:
  - field: shipToParty
    column: Ship To
  - field: deliveryDate
    column: Delivery Date
keep_history: true
history_field: deliveryDate
";

fn options(workbook: &std::path::Path, dry_run: bool) -> RunOptions {
    RunOptions {
        workbook: Some(workbook.to_path_buf()),
        dry_run,
        run_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
    }
}

fn seed_workbook(path: &std::path::Path) {
    write_workbook(
        path,
        vec![sheet(
            "Tracker",
            &["Sales Order", "SKU", "Ship Set Number"],
            vec![
                vec![98_765_432.0.into(), "C9300-48P".into(), 1.0.into()],
                vec![98_765_432.0.into(), "C9300-NM-8X".into(), 2.0.into()],
            ],
        )],
    );
}

#[tokio::test]
async fn test_run_updates_and_saves_workbook() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;
    mount_order(
        &server,
        "t",
        "98765432",
        order_document(
            "Booked",
            &[
                Line::new("C9300-48P", 1, "2024-03-20"),
                Line::new("C9300-NM-8X", 2, "2024-04-02"),
            ],
        ),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.xlsx");
    seed_workbook(&path);

    let config = tracker_config(CONFIG);
    let summary = order_tracker::run(&config, &api_config(&server), &options(&path, false))
        .await
        .unwrap();

    assert_eq!(summary.rows_updated, 2);

    let saved = workbook::load(&path).unwrap();
    let sheet = &saved.sheets[0];
    assert_eq!(sheet.name, "Tracker");
    assert_eq!(
        sheet.header,
        ["Sales Order", "SKU", "Ship Set Number", "Ship To", "Delivery Date: 03.05.2024"]
    );
    assert_eq!(text(sheet, 0, "Delivery Date: 03.05.2024").as_deref(), Some("2024-03-20"));
    assert_eq!(text(sheet, 1, "Delivery Date: 03.05.2024").as_deref(), Some("2024-04-02"));
    // shipToParty is absent from the response
    assert_eq!(text(sheet, 0, "Ship To").as_deref(), Some("No Data"));
    assert_eq!(sheet.cell(0, 0), &CellValue::Number(98_765_432.0));
}

#[tokio::test]
async fn test_dry_run_leaves_file_unchanged() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;
    mount_order(&server, "t", "98765432", order_document("Booked", &[])).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.xlsx");
    seed_workbook(&path);
    let before = std::fs::read(&path).unwrap();

    let config = tracker_config(CONFIG);
    order_tracker::run(&config, &api_config(&server), &options(&path, true))
        .await
        .unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[tokio::test]
async fn test_authentication_failure_aborts_before_writing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.xlsx");
    seed_workbook(&path);
    let before = std::fs::read(&path).unwrap();

    let config = tracker_config(CONFIG);
    let err = order_tracker::run(&config, &api_config(&server), &options(&path, false))
        .await
        .unwrap_err();

    assert!(matches!(err, TrackerError::OrderApi(_)), "unexpected error: {err}");
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[tokio::test]
async fn test_missing_workbook_is_fatal() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.xlsx");

    let config = tracker_config(CONFIG);
    let err = order_tracker::run(&config, &api_config(&server), &options(&path, false))
        .await
        .unwrap_err();

    assert!(matches!(err, TrackerError::Workbook(_)));
}

#[tokio::test]
async fn test_missing_order_column_aborts_before_writing() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.xlsx");
    write_workbook(
        &path,
        vec![sheet(
            "Tracker",
            &["SO", "SKU", "Ship Set Number"],
            vec![vec![1.0.into(), "A".into(), 1.0.into()]],
        )],
    );
    let before = std::fs::read(&path).unwrap();

    let config = tracker_config(CONFIG);
    let err = order_tracker::run(&config, &api_config(&server), &options(&path, false))
        .await
        .unwrap_err();

    assert!(matches!(err, TrackerError::Write(_)));
    assert_eq!(std::fs::read(&path).unwrap(), before);
}
