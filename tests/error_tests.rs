//! Error handling tests

use recast::error::{RecreateError, WorkbookError};
use std::error::Error;

#[test]
fn test_workbook_error_display() {
    let err = WorkbookError::DuplicateSheet("Data".to_string());
    assert_eq!(err.to_string(), "sheet 'Data' already exists");

    let err = WorkbookError::MergeOverlap {
        range: "B2:C3".to_string(),
        existing: "A1:B2".to_string(),
    };
    assert_eq!(err.to_string(), "merge range B2:C3 overlaps existing merge A1:B2");
}

#[test]
fn test_formula_error_names_location() {
    let err = RecreateError::Formula {
        sheet: "Sales".to_string(),
        cell: "B4".to_string(),
        source: WorkbookError::InvalidValue("empty formula".to_string()),
    };
    let msg = err.to_string();
    assert!(msg.contains("Sales"));
    assert!(msg.contains("B4"));
    assert!(err.source().is_some());
}

#[test]
fn test_create_sheet_error_keeps_source() {
    let err = RecreateError::CreateSheet {
        sheet: "Sheet1".to_string(),
        source: WorkbookError::DuplicateSheet("Sheet1".to_string()),
    };
    assert_eq!(
        err.source().map(|s| s.to_string()),
        Some("sheet 'Sheet1' already exists".to_string())
    );
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err: RecreateError = io.into();
    assert!(matches!(err, RecreateError::Io(_)));
    assert!(err.to_string().starts_with("IO error"));
}

#[test]
fn test_unsupported_format_display() {
    let err = RecreateError::UnsupportedFormat("toml".to_string());
    assert_eq!(err.to_string(), "Unsupported metadata format: toml");
}
