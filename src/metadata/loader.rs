//! Decoding metadata documents from JSON and YAML

use super::MetadataDocument;
use crate::error::{RecreateError, RecreateResult};
use std::fs;
use std::path::Path;

impl MetadataDocument {
    /// Decode a metadata document from JSON bytes
    pub fn from_json(bytes: &[u8]) -> RecreateResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decode a metadata document from YAML text
    pub fn from_yaml(text: &str) -> RecreateResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Encode as pretty-printed JSON
    pub fn to_json(&self) -> RecreateResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Load a metadata document, choosing the decoder from the file extension
pub fn load_metadata(path: &Path) -> RecreateResult<MetadataDocument> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "json" => MetadataDocument::from_json(&fs::read(path)?),
        "yaml" | "yml" => MetadataDocument::from_yaml(&fs::read_to_string(path)?),
        _ => Err(RecreateError::UnsupportedFormat(format!(
            "{} (expected .json, .yaml or .yml)",
            path.display()
        ))),
    }
}
