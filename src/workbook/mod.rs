//! Output workbook collaborator
//!
//! The reconstruction engine drives a [`WorkbookWriter`]; it never touches the
//! container format directly. [`XlsxWorkbook`] is the shipped implementation:
//! it keeps workbook state in memory, rejects each call the way the xlsx
//! writer would, and serializes through `rust_xlsxwriter` on save.

mod render;
mod xlsx;

pub use xlsx::{CellContent, CellState, SheetState, XlsxWorkbook, PLACEHOLDER_SHEET};

use crate::error::WorkbookError;
use crate::metadata::{
    AlignmentStyle, BorderStyle, DataValidation, DefinedName, DocumentProperties, FillStyle,
    FontStyle, Hyperlink, ImageMetadata, ProtectionStyle, SheetProtection,
};
use chrono::NaiveDateTime;
use std::fmt;
use std::path::Path;

/// Identifier the collaborator assigns to a registered style
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StyleHandle(pub u32);

impl fmt::Display for StyleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A typed value write
#[derive(Debug, Clone, PartialEq)]
pub enum CellWrite {
    Number(f64),
    Integer(i64),
    Boolean(bool),
    Text(String),
    DateTime(NaiveDateTime),
}

impl CellWrite {
    /// Display form, used as hyperlink text
    pub fn display(&self) -> String {
        match self {
            CellWrite::Number(v) => v.to_string(),
            CellWrite::Integer(v) => v.to_string(),
            CellWrite::Boolean(v) => if *v { "TRUE" } else { "FALSE" }.to_string(),
            CellWrite::Text(s) => s.clone(),
            CellWrite::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Number format of a style descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum NumberFormat {
    /// Built-in format index (1..=255)
    BuiltIn(i32),
    /// Format code such as `"#,##0.00"`
    Custom(String),
}

/// Engine-native style: only the parts that were specified are present
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleDescriptor {
    pub font: Option<FontStyle>,
    pub fill: Option<FillStyle>,
    pub borders: Vec<BorderStyle>,
    pub alignment: Option<AlignmentStyle>,
    pub number_format: Option<NumberFormat>,
    pub protection: Option<ProtectionStyle>,
}

impl StyleDescriptor {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Capability surface the engine needs from an output workbook
///
/// Sheets are addressed by name and cells by A1 address, so implementations
/// own all coordinate parsing.
pub trait WorkbookWriter {
    fn set_properties(&mut self, properties: &DocumentProperties) -> Result<(), WorkbookError>;

    /// Name of the sheet a fresh workbook starts with, while it still exists
    fn placeholder_sheet(&self) -> Option<String>;

    fn sheet_names(&self) -> Vec<String>;

    /// Create a sheet at the end of the sheet list, returning its index
    fn create_sheet(&mut self, name: &str) -> Result<usize, WorkbookError>;

    fn delete_sheet(&mut self, name: &str) -> Result<(), WorkbookError>;

    /// Rename a sheet, carrying sheet-scoped defined names along
    ///
    /// The engine never renames; callers use it to post-process a
    /// [`Recreation`](crate::recreate::Recreation) before saving.
    fn rename_sheet(&mut self, old: &str, new: &str) -> Result<(), WorkbookError>;

    fn set_sheet_visible(&mut self, sheet: &str, visible: bool) -> Result<(), WorkbookError>;

    fn set_active_sheet(&mut self, index: usize) -> Result<(), WorkbookError>;

    /// `column` is a label (`"C"`) or span (`"B:D"`)
    fn set_column_width(&mut self, sheet: &str, column: &str, width: f64)
        -> Result<(), WorkbookError>;

    /// `row` is 1-based
    fn set_row_height(&mut self, sheet: &str, row: u32, height: f64) -> Result<(), WorkbookError>;

    fn register_style(&mut self, style: &StyleDescriptor) -> Result<StyleHandle, WorkbookError>;

    fn write_formula(&mut self, sheet: &str, cell: &str, formula: &str)
        -> Result<(), WorkbookError>;

    fn write_value(&mut self, sheet: &str, cell: &str, value: CellWrite)
        -> Result<(), WorkbookError>;

    fn set_cell_style(&mut self, sheet: &str, cell: &str, style: StyleHandle)
        -> Result<(), WorkbookError>;

    fn set_hyperlink(&mut self, sheet: &str, cell: &str, link: &Hyperlink)
        -> Result<(), WorkbookError>;

    fn merge_range(&mut self, sheet: &str, start: &str, end: &str) -> Result<(), WorkbookError>;

    fn add_data_validation(&mut self, sheet: &str, rule: &DataValidation)
        -> Result<(), WorkbookError>;

    fn protect_sheet(&mut self, sheet: &str, protection: &SheetProtection)
        -> Result<(), WorkbookError>;

    fn insert_image(&mut self, sheet: &str, image: &ImageMetadata) -> Result<(), WorkbookError>;

    fn define_name(&mut self, name: &DefinedName) -> Result<(), WorkbookError>;

    fn save(&self, path: &Path) -> Result<(), WorkbookError>;
}
