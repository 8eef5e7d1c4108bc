//! Structural pre-flight checks for metadata documents

use crate::address::parse_cell;
use crate::metadata::MetadataDocument;

/// Report structural problems in a metadata document
///
/// Checks that sheets exist and are named, and that every cell address and
/// merge corner parses. Overlapping merges, duplicate style ids and formula
/// syntax are not inspected. An empty result means no problems were found.
pub fn validate_metadata(metadata: Option<&MetadataDocument>) -> Vec<String> {
    let Some(doc) = metadata else {
        return vec!["metadata is nil".to_string()];
    };

    let mut issues = Vec::new();
    if doc.sheets.is_empty() {
        issues.push("no sheets found in metadata".to_string());
    }

    for (i, sheet) in doc.sheets.iter().enumerate() {
        if sheet.name.is_empty() {
            issues.push(format!("sheet {i} has no name"));
        }

        for cell in &sheet.cells {
            if parse_cell(&cell.address).is_err() {
                issues.push(format!("invalid cell address: {}", cell.address));
            }
        }

        for merge in &sheet.merged_cells {
            if parse_cell(&merge.start_cell).is_err() {
                issues.push(format!("invalid merge start cell: {}", merge.start_cell));
            }
            if parse_cell(&merge.end_cell).is_err() {
                issues.push(format!("invalid merge end cell: {}", merge.end_cell));
            }
        }
    }

    issues
}
