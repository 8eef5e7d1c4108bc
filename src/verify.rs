//! Read-back verification of saved workbooks
//!
//! Opens an `.xlsx` file with calamine and compares it with the metadata it
//! was rebuilt from: the sheet list, then every non-empty cell's formula or
//! value as the engine would have written it.

use crate::address::parse_cell;
use crate::error::{RecreateError, RecreateResult};
use crate::metadata::MetadataDocument;
use crate::recreate::{dispatch, CellAction, Options};
use crate::workbook::{CellWrite, PLACEHOLDER_SHEET};
use calamine::{open_workbook, Data, DataType, Range, Reader, Xlsx};
use std::fmt;
use std::path::Path;

const FLOAT_TOLERANCE: f64 = 1e-9;

/// A difference between the metadata and the saved file
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    pub sheet: String,
    /// Empty for workbook-level differences
    pub cell: String,
    pub expected: String,
    pub found: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cell.is_empty() {
            write!(f, "sheets: expected [{}], found [{}]", self.expected, self.found)
        } else {
            write!(
                f,
                "{}!{}: expected {}, found {}",
                self.sheet, self.cell, self.expected, self.found
            )
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerifyReport {
    pub sheets_checked: usize,
    pub cells_checked: usize,
    pub mismatches: Vec<Mismatch>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Sheet names the engine creates for `metadata`, in order
pub fn expected_sheet_names(metadata: &MetadataDocument, options: &Options) -> Vec<String> {
    if metadata.sheets.is_empty() {
        return vec![PLACEHOLDER_SHEET.to_string()];
    }
    metadata
        .sheets
        .iter()
        .enumerate()
        .map(|(position, sheet)| {
            if sheet.name.is_empty() {
                options.synthesized_sheet_name(position)
            } else {
                sheet.name.clone()
            }
        })
        .collect()
}

pub fn verify_workbook(
    path: &Path,
    metadata: &MetadataDocument,
    options: &Options,
) -> RecreateResult<VerifyReport> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| RecreateError::Verify(format!("failed to open {}: {}", path.display(), e)))?;

    let expected_names = expected_sheet_names(metadata, options);
    let found_names = workbook.sheet_names().to_vec();

    let mut report = VerifyReport::default();
    if found_names != expected_names {
        report.mismatches.push(Mismatch {
            sheet: String::new(),
            cell: String::new(),
            expected: expected_names.join(", "),
            found: found_names.join(", "),
        });
    }

    for (meta, name) in metadata.sheets.iter().zip(&expected_names) {
        if !found_names.contains(name) {
            continue;
        }
        let values = workbook
            .worksheet_range(name)
            .map_err(|e| RecreateError::Verify(format!("failed to read sheet '{name}': {e}")))?;
        let formulas = workbook
            .worksheet_formula(name)
            .map_err(|e| RecreateError::Verify(format!("failed to read formulas of '{name}': {e}")))?;
        report.sheets_checked += 1;

        for cell in &meta.cells {
            let Ok(at) = parse_cell(&cell.address) else {
                continue;
            };
            let position = (at.row, u32::from(at.col));

            let difference = match dispatch(cell, options) {
                CellAction::Nothing => continue,
                CellAction::Formula(formula) => compare_formula(formula, &formulas, position),
                CellAction::Value(value) => compare_value(&value, values.get_value(position)),
            };
            report.cells_checked += 1;

            if let Some((expected, found)) = difference {
                report.mismatches.push(Mismatch {
                    sheet: name.clone(),
                    cell: cell.address.clone(),
                    expected,
                    found,
                });
            }
        }
    }

    Ok(report)
}

fn compare_formula(
    expected: &str,
    formulas: &Range<String>,
    position: (u32, u32),
) -> Option<(String, String)> {
    let expected = expected.trim().trim_start_matches('=');
    let found = formulas
        .get_value(position)
        .map(|f| f.trim().trim_start_matches('='))
        .unwrap_or("");
    if expected == found {
        None
    } else {
        Some((format!("={expected}"), format!("={found}")))
    }
}

fn compare_value(expected: &CellWrite, found: Option<&Data>) -> Option<(String, String)> {
    let found = found.unwrap_or(&Data::Empty);

    let matches = match expected {
        CellWrite::Number(n) => found.as_f64().is_some_and(|f| (f - n).abs() <= FLOAT_TOLERANCE),
        CellWrite::Integer(i) => found
            .as_f64()
            .is_some_and(|f| (f - *i as f64).abs() <= FLOAT_TOLERANCE),
        CellWrite::Boolean(b) => matches!(found, Data::Bool(v) if v == b),
        // The written text becomes an empty cell when it is empty.
        CellWrite::Text(s) if s.is_empty() => matches!(found, Data::Empty | Data::String(_)),
        CellWrite::Text(s) => matches!(found, Data::String(v) if v == s),
        // Date cells only need to be present; the serial differs per reader.
        CellWrite::DateTime(_) => {
            matches!(found, Data::DateTime(_) | Data::DateTimeIso(_) | Data::Float(_))
        }
    };

    if matches {
        None
    } else {
        Some((expected.display(), describe(found)))
    }
}

fn describe(data: &Data) -> String {
    match data {
        Data::Empty => "<empty>".to_string(),
        Data::String(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::SheetMetadata;

    #[test]
    fn test_expected_names_synthesize_unnamed() {
        let doc = MetadataDocument {
            sheets: vec![SheetMetadata::new("Data"), SheetMetadata::default()],
            ..MetadataDocument::default()
        };
        assert_eq!(
            expected_sheet_names(&doc, &Options::default()),
            vec!["Data".to_string(), "Sheet2".to_string()]
        );
        assert_eq!(
            expected_sheet_names(&MetadataDocument::default(), &Options::default()),
            vec![PLACEHOLDER_SHEET.to_string()]
        );
    }

    #[test]
    fn test_compare_value() {
        assert!(compare_value(&CellWrite::Number(42.5), Some(&Data::Float(42.5))).is_none());
        assert!(compare_value(&CellWrite::Integer(3), Some(&Data::Int(3))).is_none());
        assert!(compare_value(&CellWrite::Boolean(true), Some(&Data::Bool(true))).is_none());
        assert_eq!(
            compare_value(&CellWrite::Text("a".to_string()), Some(&Data::String("b".to_string()))),
            Some(("a".to_string(), "\"b\"".to_string()))
        );
        assert!(compare_value(&CellWrite::Number(1.0), None).is_some());
    }

    #[test]
    fn test_missing_file_is_verify_error() {
        let result = verify_workbook(
            Path::new("does-not-exist.xlsx"),
            &MetadataDocument::default(),
            &Options::default(),
        );
        assert!(matches!(result, Err(RecreateError::Verify(_))));
    }
}
