//! Recast - rebuild spreadsheets from metadata
//!
//! This library turns a language-agnostic metadata description of a workbook
//! into a live workbook and writes it as `.xlsx`.
//!
//! # Features
//!
//! - Typed cell values, formulas and hyperlinks
//! - Style deduplication with best-effort registration
//! - Merges, data validation, images and sheet protection
//! - Document properties and defined names
//! - Structural pre-flight validation and read-back verification
//!
//! # Example
//!
//! ```no_run
//! use recast::metadata::load_metadata;
//! use recast::recreate::{recreate, Options};
//! use recast::validate::validate_metadata;
//! use std::path::Path;
//!
//! let metadata = load_metadata(Path::new("report.json"))?;
//! for issue in validate_metadata(Some(&metadata)) {
//!     eprintln!("warning: {issue}");
//! }
//!
//! let recreation = recreate(&metadata, Options::default())?;
//! println!("Diagnostics: {}", recreation.diagnostics.len());
//! recreation.save(Path::new("report.xlsx"))?;
//! # Ok::<(), recast::error::RecreateError>(())
//! ```

pub mod address;
pub mod cli;
pub mod error;
pub mod metadata;
pub mod recreate;
pub mod validate;
pub mod verify;
pub mod workbook;

// Re-export commonly used types
pub use error::{RecreateError, RecreateResult, WorkbookError};
pub use metadata::{CellMetadata, CellValue, MetadataDocument, SheetMetadata};
pub use recreate::{recreate, Diagnostic, Options, Recreation, Recreator};
pub use validate::validate_metadata;
pub use workbook::{WorkbookWriter, XlsxWorkbook};
