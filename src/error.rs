use crate::address::AddressError;
use thiserror::Error;

pub type RecreateResult<T> = Result<T, RecreateError>;

/// Errors raised by the output workbook collaborator
#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("invalid cell reference: {0}")]
    Address(#[from] AddressError),

    #[error("invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: String },

    #[error("sheet '{0}' already exists")]
    DuplicateSheet(String),

    #[error("sheet '{0}' does not exist")]
    UnknownSheet(String),

    #[error("sheet index {index} out of range ({count} sheets)")]
    SheetIndex { index: usize, count: usize },

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("invalid style: {0}")]
    InvalidStyle(String),

    #[error("unknown style handle {0}")]
    UnknownStyle(u32),

    #[error("merge range {range} overlaps existing merge {existing}")]
    MergeOverlap { range: String, existing: String },

    #[error("invalid merge range {range}: {reason}")]
    InvalidMerge { range: String, reason: String },

    #[error("invalid data validation: {0}")]
    InvalidValidation(String),

    #[error("invalid hyperlink: {0}")]
    InvalidHyperlink(String),

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("invalid document property: {0}")]
    InvalidProperty(String),

    #[error("invalid defined name '{name}': {reason}")]
    InvalidDefinedName { name: String, reason: String },

    #[error("xlsx writer error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Fatal errors of a reconstruction run, plus the loading/saving errors of
/// the surrounding drivers
#[derive(Error, Debug)]
pub enum RecreateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported metadata format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to recreate document properties: {0}")]
    Properties(#[source] WorkbookError),

    #[error("Failed to create sheet '{sheet}': {source}")]
    CreateSheet {
        sheet: String,
        #[source]
        source: WorkbookError,
    },

    #[error("Failed to write formula in sheet '{sheet}' cell {cell}: {source}")]
    Formula {
        sheet: String,
        cell: String,
        #[source]
        source: WorkbookError,
    },

    #[error("Failed to recreate defined name '{name}': {source}")]
    DefinedName {
        name: String,
        #[source]
        source: WorkbookError,
    },

    #[error("Failed to save workbook: {0}")]
    Save(#[source] WorkbookError),

    #[error("Failed to read back workbook: {0}")]
    Verify(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
