//! Metadata document model
//!
//! The language-agnostic description of a workbook that the engine rebuilds.
//! Field names follow the camelCase layout of metadata files; every optional
//! field decodes to its default when absent.

mod loader;
mod value;

pub use loader::load_metadata;
pub use value::CellValue;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

//==============================================================================
// Document
//==============================================================================

/// Root of a metadata description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataDocument {
    /// Name of the workbook the metadata was extracted from (informational)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub properties: DocumentProperties,
    pub sheets: Vec<SheetMetadata>,
    /// Source-assigned style identifier → style details
    pub styles: BTreeMap<i64, StyleDetails>,
    pub defined_names: Vec<DefinedName>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentProperties {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub keywords: Option<String>,
    pub description: Option<String>,
    pub last_modified_by: Option<String>,
    pub category: Option<String>,
    pub version: Option<String>,
    /// ISO-8601 / RFC-3339 timestamp
    pub created: Option<String>,
    /// ISO-8601 / RFC-3339 timestamp
    pub modified: Option<String>,
    pub content_status: Option<String>,
    pub identifier: Option<String>,
    pub language: Option<String>,
    pub revision: Option<String>,
}

/// A workbook-level or sheet-local named range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DefinedName {
    pub name: String,
    pub refers_to: String,
    /// Sheet name for a sheet-local name; empty or absent for a global one
    pub scope: Option<String>,
}

impl DefinedName {
    /// The sheet this name is local to, if any
    pub fn local_sheet(&self) -> Option<&str> {
        self.scope.as_deref().filter(|s| !s.is_empty())
    }
}

//==============================================================================
// Sheets
//==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SheetMetadata {
    /// Zero-based position hint from the source workbook
    pub index: usize,
    pub name: String,
    pub visible: bool,
    /// Column label (`"C"`) or span (`"B:D"`) → width
    pub col_widths: BTreeMap<String, f64>,
    /// 1-based row number → height
    pub row_heights: BTreeMap<u32, f64>,
    pub cells: Vec<CellMetadata>,
    pub merged_cells: Vec<MergedCell>,
    pub data_validations: Vec<DataValidation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protection: Option<SheetProtection>,
    pub images: Vec<ImageMetadata>,
}

impl Default for SheetMetadata {
    fn default() -> Self {
        Self {
            index: 0,
            name: String::new(),
            visible: true,
            col_widths: BTreeMap::new(),
            row_heights: BTreeMap::new(),
            cells: Vec::new(),
            merged_cells: Vec::new(),
            data_validations: Vec::new(),
            protection: None,
            images: Vec::new(),
        }
    }
}

impl SheetMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_cell(mut self, cell: CellMetadata) -> Self {
        self.cells.push(cell);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CellMetadata {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<CellValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Source style identifier; 0 means unstyled
    #[serde(rename = "styleId")]
    pub style_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<Hyperlink>,
}

impl CellMetadata {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<CellValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    pub fn with_style(mut self, style_id: i64) -> Self {
        self.style_id = style_id;
        self
    }

    pub fn with_hyperlink(mut self, link: impl Into<String>) -> Self {
        self.hyperlink = Some(Hyperlink {
            link: link.into(),
            tooltip: None,
        });
        self
    }

    /// Formula text, if one is present and non-empty
    pub fn formula_text(&self) -> Option<&str> {
        self.formula.as_deref().filter(|f| !f.is_empty())
    }

    /// A cell with neither a value nor a formula
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.formula_text().is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hyperlink {
    /// External URL (`https://…`, `mailto:…`) or in-workbook location (`Sheet2!A1`)
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

impl Hyperlink {
    const EXTERNAL_SCHEMES: [&'static str; 5] = ["http://", "https://", "ftp://", "mailto:", "file://"];

    pub fn is_external(&self) -> bool {
        let lower = self.link.to_ascii_lowercase();
        Self::EXTERNAL_SCHEMES.iter().any(|s| lower.starts_with(s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MergedCell {
    pub start_cell: String,
    pub end_cell: String,
}

impl MergedCell {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start_cell: start.into(),
            end_cell: end.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataValidation {
    /// whole, decimal, list, date, time, textLength, custom, none
    #[serde(rename = "type")]
    pub kind: String,
    /// between, notBetween, equal, notEqual, greaterThan, lessThan,
    /// greaterThanOrEqual, lessThanOrEqual
    pub operator: String,
    pub formula1: String,
    pub formula2: String,
    pub show_error: bool,
    pub error_title: Option<String>,
    pub error_message: Option<String>,
    pub allow_blank: bool,
    pub show_input: bool,
    pub prompt_title: Option<String>,
    pub prompt: Option<String>,
    /// Space-separated target ranges (`"A2:A9 C2:C9"`)
    pub range: String,
}

impl Default for DataValidation {
    fn default() -> Self {
        Self {
            kind: String::new(),
            operator: String::new(),
            formula1: String::new(),
            formula2: String::new(),
            show_error: true,
            error_title: None,
            error_message: None,
            allow_blank: true,
            show_input: true,
            prompt_title: None,
            prompt: None,
            range: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SheetProtection {
    pub protected: bool,
    pub password: Option<String>,
    pub edit_objects: bool,
    pub edit_scenarios: bool,
    pub select_locked_cells: bool,
    pub select_unlocked_cells: bool,
}

impl Default for SheetProtection {
    fn default() -> Self {
        Self {
            protected: false,
            password: None,
            edit_objects: false,
            edit_scenarios: false,
            select_locked_cells: true,
            select_unlocked_cells: true,
        }
    }
}

//==============================================================================
// Images
//==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageMetadata {
    /// Anchor cell of the top-left corner
    pub cell: String,
    /// File extension of the source picture (`.png`, `.jpeg`)
    pub extension: String,
    #[serde(with = "base64_bytes")]
    pub file: Vec<u8>,
    /// 0 floats the picture over the cells, 1 places it in the cell
    pub insert_type: i32,
    pub format: ImageFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageFormat {
    pub alt_text: String,
    /// Scale the picture to its anchor cell
    pub auto_fit: bool,
    pub auto_fit_ignore_aspect: bool,
    pub offset_x: i32,
    pub offset_y: i32,
    pub scale_x: f64,
    pub scale_y: f64,
    pub hyperlink: String,
    /// `External`, `Location`, or empty to infer from the link
    pub hyperlink_type: String,
    /// `oneCell`, `absolute`, or empty for move-and-size
    pub positioning: String,
}

impl Default for ImageFormat {
    fn default() -> Self {
        Self {
            alt_text: String::new(),
            auto_fit: false,
            auto_fit_ignore_aspect: false,
            offset_x: 0,
            offset_y: 0,
            scale_x: 1.0,
            scale_y: 1.0,
            hyperlink: String::new(),
            hyperlink_type: String::new(),
            positioning: String::new(),
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.trim())
            .map_err(serde::de::Error::custom)
    }
}

//==============================================================================
// Styles
//==============================================================================

/// Formatting attached to a source style identifier; each part is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<FontStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<FillStyle>,
    pub border: Vec<BorderStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignmentStyle>,
    /// Built-in number format index; 0 means General
    pub number_format: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_number_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protection: Option<ProtectionStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
    /// single, double, singleAccounting, doubleAccounting
    pub underline: String,
    pub strike: bool,
    pub family: String,
    pub size: f64,
    /// `#RRGGBB`
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FillStyle {
    /// `pattern` or `gradient`
    #[serde(rename = "type")]
    pub kind: String,
    /// Pattern index 0..=18 (1 = solid)
    pub pattern: i32,
    pub color: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BorderStyle {
    /// left, right, top, bottom, diagonalUp, diagonalDown
    #[serde(rename = "type")]
    pub kind: String,
    pub color: String,
    /// Line style index 0..=13 (1 = thin)
    pub style: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlignmentStyle {
    pub horizontal: String,
    pub vertical: String,
    pub wrap_text: bool,
    /// 0..=90 counter-clockwise, 91..=180 clockwise, 255 stacked
    pub text_rotation: i32,
    pub indent: i32,
    pub shrink_to_fit: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProtectionStyle {
    pub hidden: bool,
    pub locked: bool,
}
