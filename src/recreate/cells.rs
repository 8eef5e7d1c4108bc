//! Cell value dispatch
//!
//! Decides how a single cell is encoded: as a formula, as a typed value, or
//! not at all. Dispatch performs no writes.

use super::Options;
use crate::metadata::{CellMetadata, CellValue};
use crate::workbook::CellWrite;

/// The write chosen for a cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellAction<'a> {
    Formula(&'a str),
    Value(CellWrite),
    Nothing,
}

pub fn dispatch<'a>(cell: &'a CellMetadata, options: &Options) -> CellAction<'a> {
    if options.preserve_formulas {
        if let Some(formula) = cell.formula_text() {
            return CellAction::Formula(formula);
        }
    }

    match &cell.value {
        Some(value) => CellAction::Value(encode(value)),
        None => CellAction::Nothing,
    }
}

fn encode(value: &CellValue) -> CellWrite {
    match value {
        CellValue::Float(v) => CellWrite::Number(*v),
        CellValue::Integer(v) => CellWrite::Integer(*v),
        CellValue::Boolean(v) => CellWrite::Boolean(*v),
        CellValue::Timestamp(v) => CellWrite::DateTime(*v),
        CellValue::Text(s) | CellValue::Other(s) => coerce_text(s),
    }
}

/// Numeric-looking text becomes a number; anything else stays a string
fn coerce_text(text: &str) -> CellWrite {
    match text.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && !text.trim().is_empty() => CellWrite::Number(n),
        _ => CellWrite::Text(text.to_string()),
    }
}
