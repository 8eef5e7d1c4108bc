use crate::error::{RecreateError, RecreateResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which optional features a reconstruction run applies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    pub preserve_formulas: bool,
    pub preserve_styles: bool,
    pub preserve_data_validation: bool,
    pub preserve_images: bool,
    pub skip_empty_cells: bool,
    /// Prefix for names synthesized for unnamed sheets
    pub default_sheet_name: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            preserve_formulas: true,
            preserve_styles: true,
            preserve_data_validation: true,
            preserve_images: true,
            skip_empty_cells: true,
            default_sheet_name: "Sheet".to_string(),
        }
    }
}

impl Options {
    /// Load options from a JSON or YAML file; absent fields keep their defaults
    pub fn load(path: &Path) -> RecreateResult<Self> {
        let text = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(serde_json::from_str(&text)?),
            "yaml" | "yml" => Ok(serde_yaml::from_str(&text)?),
            _ => Err(RecreateError::UnsupportedFormat(format!(
                "{} (expected .json, .yaml or .yml)",
                path.display()
            ))),
        }
    }

    /// Name given to the unnamed sheet at declaration `position`
    pub fn synthesized_sheet_name(&self, position: usize) -> String {
        format!("{}{}", self.default_sheet_name, position + 1)
    }
}
