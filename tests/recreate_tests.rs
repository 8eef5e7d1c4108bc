//! Reconstruction engine tests
//!
//! Engine behavior against the shipped XlsxWorkbook, plus a recording
//! collaborator that injects failures into chosen calls.

use pretty_assertions::assert_eq;
use recast::error::{RecreateError, WorkbookError};
use recast::metadata::{
    load_metadata, CellMetadata, CellValue, DataValidation, DefinedName, DocumentProperties,
    FontStyle, Hyperlink, ImageMetadata, MergedCell, MetadataDocument, SheetMetadata,
    SheetProtection, StyleDetails,
};
use recast::recreate::{recreate, recreate_from_file, Options, Phase, Recreator};
use recast::workbook::{
    CellContent, CellWrite, StyleDescriptor, StyleHandle, WorkbookWriter, XlsxWorkbook,
    PLACEHOLDER_SHEET,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn sales_sheet() -> SheetMetadata {
    SheetMetadata::new("Sales")
        .with_cell(CellMetadata::new("A1").with_value("Product"))
        .with_cell(CellMetadata::new("B1").with_value("Revenue"))
        .with_cell(CellMetadata::new("A2").with_value("Widget A"))
        .with_cell(CellMetadata::new("B2").with_value(1000.50))
        .with_cell(CellMetadata::new("B3"))
        .with_cell(CellMetadata::new("B4").with_formula("SUM(B2:B3)"))
}

fn doc(sheets: Vec<SheetMetadata>) -> MetadataDocument {
    MetadataDocument {
        sheets,
        ..MetadataDocument::default()
    }
}

fn bold() -> StyleDetails {
    StyleDetails {
        font: Some(FontStyle {
            bold: true,
            ..FontStyle::default()
        }),
        ..StyleDetails::default()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SCENARIOS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_sales_table_scenario() {
    let metadata = doc(vec![sales_sheet()]);
    let recreation = recreate(&metadata, Options::default()).unwrap();
    let sheet = recreation.workbook.sheet("Sales").unwrap();

    let populated: Vec<String> = sheet.cells.keys().map(|c| c.to_string()).collect();
    assert_eq!(populated, vec!["A1", "B1", "A2", "B2", "B4"]);
    assert!(sheet.cell("B3").is_none(), "Empty cell should not exist");
    assert_eq!(
        sheet.content("B4"),
        Some(&CellContent::Formula("SUM(B2:B3)".to_string()))
    );
    assert_eq!(
        sheet.content("B2"),
        Some(&CellContent::Value(CellWrite::Number(1000.50)))
    );
    assert!(recreation.diagnostics.is_empty());
}

#[test]
fn test_generic_text_becomes_numeric() {
    let cell = CellMetadata {
        value: Some(CellValue::Other("42.5".to_string())),
        ..CellMetadata::new("A1")
    };
    let recreation = recreate(&doc(vec![SheetMetadata::new("Data").with_cell(cell)]), Options::default()).unwrap();
    assert_eq!(
        recreation.workbook.sheet("Data").unwrap().content("A1"),
        Some(&CellContent::Value(CellWrite::Number(42.5)))
    );
}

#[test]
fn test_active_sheet_ignores_declared_index() {
    let mut first = SheetMetadata::new("First");
    first.index = 5;
    let mut second = SheetMetadata::new("Second");
    second.index = 0;

    let recreation = recreate(&doc(vec![first, second]), Options::default()).unwrap();
    assert_eq!(recreation.workbook.active_sheet(), Some(0));
}

#[test]
fn test_one_sheet_per_metadata_sheet() {
    let metadata = doc(vec![
        SheetMetadata::new(PLACEHOLDER_SHEET),
        SheetMetadata::new("Summary"),
        SheetMetadata::default(),
    ]);
    let recreation = recreate(&metadata, Options::default()).unwrap();
    assert_eq!(
        recreation.workbook.sheet_names(),
        vec!["Sheet1".to_string(), "Summary".to_string(), "Sheet3".to_string()]
    );
}

#[test]
fn test_formula_value_not_written_separately() {
    let cell = CellMetadata::new("C1").with_value(99i64).with_formula("A1*2");
    let recreation = recreate(&doc(vec![SheetMetadata::new("Data").with_cell(cell)]), Options::default()).unwrap();
    assert_eq!(
        recreation.workbook.sheet("Data").unwrap().content("C1"),
        Some(&CellContent::Formula("A1*2".to_string()))
    );
}

#[test]
fn test_reconstruction_is_idempotent() {
    let mut metadata = doc(vec![sales_sheet(), SheetMetadata::new("Notes")]);
    metadata.styles = BTreeMap::from([(1, bold()), (2, StyleDetails::default())]);
    metadata.sheets[0].cells[0].style_id = 1;

    let first = recreate(&metadata, Options::default()).unwrap();
    let second = recreate(&metadata, Options::default()).unwrap();
    assert_eq!(first.workbook, second.workbook);
    assert_eq!(first.diagnostics, second.diagnostics);
}

// ═══════════════════════════════════════════════════════════════════════════
// STYLES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cell_style_is_remapped_handle() {
    let mut metadata = doc(vec![
        SheetMetadata::new("Data").with_cell(CellMetadata::new("A1").with_value("x").with_style(7)),
    ]);
    metadata.styles = BTreeMap::from([(7, bold())]);

    let recreation = recreate(&metadata, Options::default()).unwrap();
    let cell = recreation.workbook.sheet("Data").unwrap().cell("A1").unwrap();
    assert_eq!(cell.style, Some(StyleHandle(1)));
}

#[test]
fn test_identical_styles_share_one_handle() {
    let mut metadata = doc(vec![SheetMetadata::new("Data")
        .with_cell(CellMetadata::new("A1").with_value("x").with_style(3))
        .with_cell(CellMetadata::new("A2").with_value("y").with_style(8))]);
    metadata.styles = BTreeMap::from([(3, bold()), (8, bold())]);

    let recreation = recreate(&metadata, Options::default()).unwrap();
    let sheet = recreation.workbook.sheet("Data").unwrap();
    assert_eq!(recreation.workbook.styles().len(), 1);
    assert_eq!(sheet.cell("A1").unwrap().style, sheet.cell("A2").unwrap().style);
}

#[test]
fn test_failing_style_leaves_cells_unstyled() {
    let broken = StyleDetails {
        font: Some(FontStyle {
            color: "teal".to_string(),
            ..FontStyle::default()
        }),
        ..StyleDetails::default()
    };
    let mut metadata = doc(vec![
        SheetMetadata::new("Data").with_cell(CellMetadata::new("A1").with_value("kept").with_style(4)),
    ]);
    metadata.styles = BTreeMap::from([(4, broken)]);

    let recreation = recreate(&metadata, Options::default()).unwrap();
    let cell = recreation.workbook.sheet("Data").unwrap().cell("A1").unwrap();
    assert_eq!(cell.style, None);
    assert_eq!(
        cell.content,
        Some(CellContent::Value(CellWrite::Text("kept".to_string())))
    );
    assert_eq!(recreation.diagnostics.in_phase(Phase::Styles).count(), 1);
}

#[test]
fn test_non_ascii_color_is_a_style_diagnostic() {
    let accented = StyleDetails {
        font: Some(FontStyle {
            color: "aé12345".to_string(),
            ..FontStyle::default()
        }),
        ..StyleDetails::default()
    };
    let mut metadata = doc(vec![
        SheetMetadata::new("Data").with_cell(CellMetadata::new("A1").with_value(1i64).with_style(5)),
    ]);
    metadata.styles = BTreeMap::from([(5, accented), (6, bold())]);

    let recreation = recreate(&metadata, Options::default()).unwrap();
    let styles: Vec<_> = recreation.diagnostics.in_phase(Phase::Styles).collect();
    assert_eq!(styles.len(), 1);
    assert_eq!(styles[0].target.as_deref(), Some("style 5"));
    assert_eq!(recreation.workbook.styles().len(), 1);
    assert_eq!(recreation.workbook.sheet("Data").unwrap().cell("A1").unwrap().style, None);
}

#[test]
fn test_styles_skipped_when_disabled() {
    let mut metadata = doc(vec![
        SheetMetadata::new("Data").with_cell(CellMetadata::new("A1").with_value("x").with_style(1)),
    ]);
    metadata.styles = BTreeMap::from([(1, bold())]);
    let options = Options {
        preserve_styles: false,
        ..Options::default()
    };

    let recreation = recreate(&metadata, options).unwrap();
    assert!(recreation.workbook.styles().is_empty());
    assert_eq!(recreation.workbook.sheet("Data").unwrap().cell("A1").unwrap().style, None);
}

#[test]
fn test_kept_empty_cell_still_gets_style() {
    let mut metadata = doc(vec![SheetMetadata::new("Data").with_cell(CellMetadata::new("C3").with_style(1))]);
    metadata.styles = BTreeMap::from([(1, bold())]);

    let skipped = recreate(&metadata, Options::default()).unwrap();
    assert!(skipped.workbook.sheet("Data").unwrap().cell("C3").is_none());

    let options = Options {
        skip_empty_cells: false,
        ..Options::default()
    };
    let kept = recreate(&metadata, options).unwrap();
    let cell = kept.workbook.sheet("Data").unwrap().cell("C3").unwrap();
    assert_eq!(cell.content, None);
    assert!(cell.style.is_some());
}

#[test]
fn test_skipped_empty_cell_gets_no_hyperlink() {
    let metadata = doc(vec![SheetMetadata::new("Data")
        .with_cell(CellMetadata::new("C3").with_hyperlink("https://example.com/report"))]);

    let skipped = recreate(&metadata, Options::default()).unwrap();
    assert!(skipped.workbook.sheet("Data").unwrap().cell("C3").is_none());
    assert!(skipped.diagnostics.is_empty());

    let options = Options {
        skip_empty_cells: false,
        ..Options::default()
    };
    let kept = recreate(&metadata, options).unwrap();
    let cell = kept.workbook.sheet("Data").unwrap().cell("C3").unwrap();
    assert_eq!(cell.content, None);
    assert_eq!(
        cell.hyperlink.as_ref().map(|h| h.link.as_str()),
        Some("https://example.com/report")
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// OPTIONS AND DEFINED NAMES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_formulas_disabled_writes_cached_values() {
    let mut metadata = doc(vec![SheetMetadata::new("Data")
        .with_cell(CellMetadata::new("B4").with_value(1000.5).with_formula("SUM(B2:B3)"))]);
    metadata.defined_names = vec![DefinedName {
        name: "Total".to_string(),
        refers_to: "Data!$B$4".to_string(),
        scope: None,
    }];
    let options = Options {
        preserve_formulas: false,
        ..Options::default()
    };

    let recreation = recreate(&metadata, options).unwrap();
    assert_eq!(
        recreation.workbook.sheet("Data").unwrap().content("B4"),
        Some(&CellContent::Value(CellWrite::Number(1000.5)))
    );
    assert!(recreation.workbook.defined_names().is_empty());
}

#[test]
fn test_invalid_defined_name_is_fatal() {
    let mut metadata = doc(vec![SheetMetadata::new("Data")]);
    metadata.defined_names = vec![DefinedName {
        name: "B2".to_string(),
        refers_to: "Data!$B$2".to_string(),
        scope: None,
    }];

    match recreate(&metadata, Options::default()) {
        Err(RecreateError::DefinedName { name, .. }) => assert_eq!(name, "B2"),
        other => panic!("Expected defined name error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_invalid_created_property_is_fatal() {
    let mut metadata = doc(vec![SheetMetadata::new("Data")]);
    metadata.properties.created = Some("last tuesday".to_string());

    let result = recreate(&metadata, Options::default());
    assert!(matches!(result, Err(RecreateError::Properties(_))));
}

#[test]
fn test_recreate_sales_fixture() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("sales.xlsx");

    let diagnostics = recreate_from_file(
        &PathBuf::from("test-data/sales.json"),
        &output,
        Options::default(),
    )
    .unwrap();

    assert!(output.exists(), "Workbook should be written");
    let styles: Vec<_> = diagnostics.in_phase(Phase::Styles).collect();
    assert_eq!(styles.len(), 1);
    assert_eq!(styles[0].target.as_deref(), Some("style 9"));
}

#[test]
fn test_template_fixture_diagnostics() {
    let metadata = load_metadata(Path::new("test-data/template.yaml")).unwrap();
    let recreation = recreate(&metadata, Options::default()).unwrap();

    assert_eq!(
        recreation.workbook.sheet_names(),
        vec!["Archive".to_string(), "Budget".to_string(), "Sheet3".to_string()]
    );
    assert_eq!(recreation.workbook.active_sheet(), Some(1));
    assert!(recreation.workbook.sheet("Archive").unwrap().hidden);
    assert_eq!(recreation.diagnostics.in_phase(Phase::Merges).count(), 1);
    assert_eq!(recreation.workbook.sheet("Budget").unwrap().images.len(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// RECORDING COLLABORATOR
// ═══════════════════════════════════════════════════════════════════════════

/// Logs every call as a short description and fails the ones listed in `fail`
struct RecordingWriter {
    calls: Vec<String>,
    sheets: Vec<String>,
    placeholder: bool,
    styles: u32,
    fail: Vec<String>,
}

impl RecordingWriter {
    fn new() -> Self {
        Self {
            calls: Vec::new(),
            sheets: vec![PLACEHOLDER_SHEET.to_string()],
            placeholder: true,
            styles: 0,
            fail: Vec::new(),
        }
    }

    fn failing(mut self, call: &str) -> Self {
        self.fail.push(call.to_string());
        self
    }

    fn record(&mut self, call: String) -> Result<(), WorkbookError> {
        let injected = self.fail.contains(&call);
        self.calls.push(call);
        if injected {
            Err(WorkbookError::InvalidValue("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl WorkbookWriter for RecordingWriter {
    fn set_properties(&mut self, _: &DocumentProperties) -> Result<(), WorkbookError> {
        self.record("set_properties".to_string())
    }

    fn placeholder_sheet(&self) -> Option<String> {
        self.placeholder.then(|| PLACEHOLDER_SHEET.to_string())
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.clone()
    }

    fn create_sheet(&mut self, name: &str) -> Result<usize, WorkbookError> {
        self.record(format!("create_sheet {name}"))?;
        self.sheets.push(name.to_string());
        Ok(self.sheets.len() - 1)
    }

    fn delete_sheet(&mut self, name: &str) -> Result<(), WorkbookError> {
        self.record(format!("delete_sheet {name}"))?;
        self.sheets.retain(|s| s != name);
        self.placeholder = false;
        Ok(())
    }

    fn rename_sheet(&mut self, old: &str, new: &str) -> Result<(), WorkbookError> {
        self.record(format!("rename_sheet {old} {new}"))
    }

    fn set_sheet_visible(&mut self, sheet: &str, visible: bool) -> Result<(), WorkbookError> {
        self.record(format!("set_sheet_visible {sheet} {visible}"))
    }

    fn set_active_sheet(&mut self, index: usize) -> Result<(), WorkbookError> {
        self.record(format!("set_active_sheet {index}"))
    }

    fn set_column_width(&mut self, sheet: &str, column: &str, _: f64) -> Result<(), WorkbookError> {
        self.record(format!("set_column_width {sheet}!{column}"))
    }

    fn set_row_height(&mut self, sheet: &str, row: u32, _: f64) -> Result<(), WorkbookError> {
        self.record(format!("set_row_height {sheet}!{row}"))
    }

    fn register_style(&mut self, _: &StyleDescriptor) -> Result<StyleHandle, WorkbookError> {
        self.record("register_style".to_string())?;
        self.styles += 1;
        Ok(StyleHandle(self.styles))
    }

    fn write_formula(&mut self, sheet: &str, cell: &str, _: &str) -> Result<(), WorkbookError> {
        self.record(format!("write_formula {sheet}!{cell}"))
    }

    fn write_value(&mut self, sheet: &str, cell: &str, _: CellWrite) -> Result<(), WorkbookError> {
        self.record(format!("write_value {sheet}!{cell}"))
    }

    fn set_cell_style(
        &mut self,
        sheet: &str,
        cell: &str,
        style: StyleHandle,
    ) -> Result<(), WorkbookError> {
        self.record(format!("set_cell_style {sheet}!{cell} {style}"))
    }

    fn set_hyperlink(&mut self, sheet: &str, cell: &str, _: &Hyperlink) -> Result<(), WorkbookError> {
        self.record(format!("set_hyperlink {sheet}!{cell}"))
    }

    fn merge_range(&mut self, sheet: &str, start: &str, end: &str) -> Result<(), WorkbookError> {
        self.record(format!("merge_range {sheet}!{start}:{end}"))
    }

    fn add_data_validation(
        &mut self,
        sheet: &str,
        rule: &DataValidation,
    ) -> Result<(), WorkbookError> {
        self.record(format!("add_data_validation {sheet}!{}", rule.range))
    }

    fn protect_sheet(&mut self, sheet: &str, _: &SheetProtection) -> Result<(), WorkbookError> {
        self.record(format!("protect_sheet {sheet}"))
    }

    fn insert_image(&mut self, sheet: &str, image: &ImageMetadata) -> Result<(), WorkbookError> {
        self.record(format!("insert_image {sheet}!{}", image.cell))
    }

    fn define_name(&mut self, name: &DefinedName) -> Result<(), WorkbookError> {
        self.record(format!("define_name {}", name.name))
    }

    fn save(&self, _: &Path) -> Result<(), WorkbookError> {
        Ok(())
    }
}

fn full_sheet() -> SheetMetadata {
    let mut sheet = SheetMetadata::new("Data")
        .with_cell(
            CellMetadata::new("A1")
                .with_value("Home")
                .with_style(1)
                .with_hyperlink("https://example.com"),
        )
        .with_cell(CellMetadata::new("A2").with_formula("LEN(A1)"));
    sheet.visible = true;
    sheet.col_widths.insert("A".to_string(), 20.0);
    sheet.row_heights.insert(1, 18.0);
    sheet.merged_cells = vec![MergedCell::new("C1", "D1")];
    sheet.data_validations = vec![DataValidation {
        kind: "whole".to_string(),
        operator: "greaterThan".to_string(),
        formula1: "0".to_string(),
        range: "B1:B9".to_string(),
        ..DataValidation::default()
    }];
    sheet.images = vec![ImageMetadata {
        cell: "F2".to_string(),
        ..ImageMetadata::default()
    }];
    sheet.protection = Some(SheetProtection {
        protected: true,
        ..SheetProtection::default()
    });
    sheet
}

fn full_doc() -> MetadataDocument {
    let mut metadata = doc(vec![full_sheet()]);
    metadata.styles = BTreeMap::from([(1, bold())]);
    metadata.defined_names = vec![DefinedName {
        name: "Home".to_string(),
        refers_to: "Data!$A$1".to_string(),
        scope: None,
    }];
    metadata
}

#[test]
fn test_phase_order() {
    let metadata = full_doc();
    let recreation = Recreator::with_writer(&metadata, Options::default(), RecordingWriter::new())
        .run()
        .unwrap();

    assert_eq!(
        recreation.workbook.calls,
        vec![
            "set_properties",
            "register_style",
            "delete_sheet Sheet1",
            "create_sheet Data",
            "set_column_width Data!A",
            "set_row_height Data!1",
            "write_value Data!A1",
            "set_cell_style Data!A1 #1",
            "set_hyperlink Data!A1",
            "write_formula Data!A2",
            "merge_range Data!C1:D1",
            "add_data_validation Data!B1:B9",
            "insert_image Data!F2",
            "protect_sheet Data",
            "define_name Home",
            "set_active_sheet 0",
        ]
    );
}

#[test]
fn test_best_effort_failures_become_diagnostics() {
    let metadata = full_doc();
    let writer = RecordingWriter::new()
        .failing("delete_sheet Sheet1")
        .failing("set_column_width Data!A")
        .failing("write_value Data!A1")
        .failing("set_hyperlink Data!A1")
        .failing("merge_range Data!C1:D1")
        .failing("add_data_validation Data!B1:B9")
        .failing("insert_image Data!F2")
        .failing("protect_sheet Data");

    let recreation = Recreator::with_writer(&metadata, Options::default(), writer)
        .run()
        .unwrap();

    let phases: Vec<Phase> = recreation.diagnostics.iter().map(|d| d.phase).collect();
    assert_eq!(
        phases,
        vec![
            Phase::Placeholder,
            Phase::Geometry,
            Phase::Cells,
            Phase::Cells,
            Phase::Merges,
            Phase::Validations,
            Phase::Images,
            Phase::Protection,
        ]
    );
    assert!(recreation
        .workbook
        .calls
        .contains(&"define_name Home".to_string()));
}

#[test]
fn test_formula_failure_names_sheet_and_cell() {
    let metadata = full_doc();
    let writer = RecordingWriter::new().failing("write_formula Data!A2");

    match Recreator::with_writer(&metadata, Options::default(), writer).run() {
        Err(RecreateError::Formula { sheet, cell, .. }) => {
            assert_eq!(sheet, "Data");
            assert_eq!(cell, "A2");
        }
        other => panic!("Expected formula error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_properties_failure_stops_before_styles() {
    let metadata = full_doc();
    let writer = RecordingWriter::new().failing("set_properties");

    let result = Recreator::with_writer(&metadata, Options::default(), writer).run();
    assert!(matches!(result, Err(RecreateError::Properties(_))));
}

#[test]
fn test_sheet_creation_failure_is_fatal() {
    let metadata = full_doc();
    let writer = RecordingWriter::new().failing("create_sheet Data");

    match Recreator::with_writer(&metadata, Options::default(), writer).run() {
        Err(RecreateError::CreateSheet { sheet, .. }) => assert_eq!(sheet, "Data"),
        other => panic!("Expected sheet error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_disabled_features_are_not_called() {
    let metadata = full_doc();
    let options = Options {
        preserve_data_validation: false,
        preserve_images: false,
        preserve_styles: false,
        ..Options::default()
    };
    let recreation = Recreator::with_writer(&metadata, options, RecordingWriter::new())
        .run()
        .unwrap();

    let calls = &recreation.workbook.calls;
    assert!(!calls.iter().any(|c| c.starts_with("add_data_validation")));
    assert!(!calls.iter().any(|c| c.starts_with("insert_image")));
    assert!(!calls.iter().any(|c| c.starts_with("register_style") || c.starts_with("set_cell_style")));
}

#[test]
fn test_xlsx_workbook_defaults() {
    let recreation = Recreator::new(&doc(vec![]), Options::default())
        .run()
        .unwrap();
    let workbook: &XlsxWorkbook = &recreation.workbook;
    assert_eq!(workbook.sheet_names(), vec![PLACEHOLDER_SHEET.to_string()]);
    assert_eq!(workbook.active_sheet(), None);
}
