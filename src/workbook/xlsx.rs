//! In-memory xlsx workbook
//!
//! Every call is checked against the limits of the xlsx container when it is
//! made, so failures surface at the call that caused them. The accepted state
//! is rendered in one pass on [`WorkbookWriter::save`].

use super::render;
use super::{CellWrite, StyleDescriptor, StyleHandle, WorkbookWriter};
use crate::address::{parse_cell, parse_column_span, CellRange, CellRef, AddressError, MAX_ROWS};
use crate::error::WorkbookError;
use crate::metadata::{
    DataValidation, DefinedName, DocumentProperties, Hyperlink, ImageMetadata, SheetProtection,
};
use chrono::Datelike;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;

/// Name of the sheet a new workbook starts with
pub const PLACEHOLDER_SHEET: &str = "Sheet1";

const MAX_COLUMN_WIDTH: f64 = 255.0;
const MAX_ROW_HEIGHT: f64 = 409.0;
const MAX_STRING_CHARS: usize = 32_767;
const MAX_URL_CHARS: usize = 2_079;
const MAX_TOOLTIP_CHARS: usize = 255;

/// Matches `Sheet!` or `'Sheet'!` references to `sheet` in a formula
fn sheet_reference_pattern(sheet: &str) -> Result<Regex, WorkbookError> {
    let bare = regex::escape(sheet);
    let quoted = regex::escape(&sheet.replace('\'', "''"));
    Regex::new(&format!(r"(?i)(?P<lead>^|[^A-Za-z0-9_.'])(?:'{quoted}'|{bare})!"))
        .map_err(|e| WorkbookError::InvalidSheetName {
            name: sheet.to_string(),
            reason: e.to_string(),
        })
}

/// What a cell holds
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Formula(String),
    Value(CellWrite),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellState {
    pub content: Option<CellContent>,
    pub style: Option<StyleHandle>,
    pub hyperlink: Option<Hyperlink>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetState {
    pub name: String,
    pub hidden: bool,
    /// Zero-based column → width
    pub column_widths: BTreeMap<u16, f64>,
    /// Zero-based row → height
    pub row_heights: BTreeMap<u32, f64>,
    pub cells: BTreeMap<CellRef, CellState>,
    pub merges: Vec<CellRange>,
    pub validations: Vec<(Vec<CellRange>, DataValidation)>,
    pub images: Vec<ImageMetadata>,
    pub protection: Option<SheetProtection>,
    placeholder: bool,
}

impl SheetState {
    fn new(name: &str, placeholder: bool) -> Self {
        Self {
            name: name.to_string(),
            hidden: false,
            column_widths: BTreeMap::new(),
            row_heights: BTreeMap::new(),
            cells: BTreeMap::new(),
            merges: Vec::new(),
            validations: Vec::new(),
            images: Vec::new(),
            protection: None,
            placeholder,
        }
    }

    /// Look up a cell by A1 address
    pub fn cell(&self, address: &str) -> Option<&CellState> {
        parse_cell(address).ok().and_then(|at| self.cells.get(&at))
    }

    /// Content of a cell, if any was written
    pub fn content(&self, address: &str) -> Option<&CellContent> {
        self.cell(address).and_then(|c| c.content.as_ref())
    }

    fn cell_mut(&mut self, address: &str) -> Result<&mut CellState, WorkbookError> {
        let at = parse_cell(address)?;
        Ok(self.cells.entry(at).or_default())
    }
}

/// Buffered xlsx workbook, serialized with `rust_xlsxwriter`
#[derive(Debug, Clone, PartialEq)]
pub struct XlsxWorkbook {
    properties: Option<DocumentProperties>,
    sheets: Vec<SheetState>,
    styles: Vec<StyleDescriptor>,
    defined_names: Vec<DefinedName>,
    active_sheet: Option<usize>,
}

impl Default for XlsxWorkbook {
    fn default() -> Self {
        Self::new()
    }
}

impl XlsxWorkbook {
    /// A workbook holding only the placeholder sheet
    pub fn new() -> Self {
        Self {
            properties: None,
            sheets: vec![SheetState::new(PLACEHOLDER_SHEET, true)],
            styles: Vec::new(),
            defined_names: Vec::new(),
            active_sheet: None,
        }
    }

    pub fn properties(&self) -> Option<&DocumentProperties> {
        self.properties.as_ref()
    }

    pub fn sheets(&self) -> &[SheetState] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetState> {
        self.position(name).map(|i| &self.sheets[i])
    }

    pub fn styles(&self) -> &[StyleDescriptor] {
        &self.styles
    }

    pub fn style(&self, handle: StyleHandle) -> Option<&StyleDescriptor> {
        (handle.0 as usize)
            .checked_sub(1)
            .and_then(|i| self.styles.get(i))
    }

    pub fn defined_names(&self) -> &[DefinedName] {
        &self.defined_names
    }

    pub fn active_sheet(&self) -> Option<usize> {
        self.active_sheet
    }

    /// Sheet names compare case-insensitively, as in Excel
    fn position(&self, name: &str) -> Option<usize> {
        self.sheets
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut SheetState, WorkbookError> {
        let index = self
            .position(name)
            .ok_or_else(|| WorkbookError::UnknownSheet(name.to_string()))?;
        Ok(&mut self.sheets[index])
    }

    fn check_sheet_name(&self, name: &str, ignore: Option<usize>) -> Result<(), WorkbookError> {
        rust_xlsxwriter::Worksheet::new()
            .set_name(name)
            .map_err(|e| WorkbookError::InvalidSheetName {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        match self.position(name) {
            Some(existing) if Some(existing) != ignore => {
                Err(WorkbookError::DuplicateSheet(name.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn check_defined_name(&self, name: &DefinedName) -> Result<(), WorkbookError> {
        let invalid = |reason: &str| WorkbookError::InvalidDefinedName {
            name: name.name.clone(),
            reason: reason.to_string(),
        };

        let mut chars = name.name.chars();
        match chars.next() {
            None => return Err(invalid("name is empty")),
            Some(c) if !(c.is_alphabetic() || c == '_' || c == '\\') => {
                return Err(invalid("must start with a letter, underscore or backslash"))
            }
            _ => {}
        }
        if !chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '\\')) {
            return Err(invalid("contains characters not allowed in a name"));
        }
        if parse_cell(&name.name).is_ok() {
            return Err(invalid("looks like a cell reference"));
        }
        if name.refers_to.trim().trim_start_matches('=').is_empty() {
            return Err(invalid("refers to nothing"));
        }
        if let Some(sheet) = name.local_sheet() {
            if self.position(sheet).is_none() {
                return Err(invalid(&format!("scope sheet '{sheet}' does not exist")));
            }
        }

        let same_scope = |other: &DefinedName| match (other.local_sheet(), name.local_sheet()) {
            (None, None) => true,
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        };
        if self
            .defined_names
            .iter()
            .any(|d| d.name.eq_ignore_ascii_case(&name.name) && same_scope(d))
        {
            return Err(invalid("already defined in this scope"));
        }
        Ok(())
    }
}

fn check_value(value: &CellWrite) -> Result<(), WorkbookError> {
    match value {
        CellWrite::Number(n) if !n.is_finite() => {
            Err(WorkbookError::InvalidValue(format!("{n} is not a finite number")))
        }
        CellWrite::Text(s) if s.chars().count() > MAX_STRING_CHARS => Err(
            WorkbookError::InvalidValue(format!("text exceeds {MAX_STRING_CHARS} characters")),
        ),
        CellWrite::DateTime(dt) if !(1900..=9999).contains(&dt.year()) => Err(
            WorkbookError::InvalidValue(format!("{dt} is outside the 1900..9999 date range")),
        ),
        _ => Ok(()),
    }
}

impl WorkbookWriter for XlsxWorkbook {
    fn set_properties(&mut self, properties: &DocumentProperties) -> Result<(), WorkbookError> {
        render::build_properties(properties)?;
        self.properties = Some(properties.clone());
        Ok(())
    }

    fn placeholder_sheet(&self) -> Option<String> {
        self.sheets
            .iter()
            .find(|s| s.placeholder)
            .map(|s| s.name.clone())
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn create_sheet(&mut self, name: &str) -> Result<usize, WorkbookError> {
        self.check_sheet_name(name, None)?;
        self.sheets.push(SheetState::new(name, false));
        Ok(self.sheets.len() - 1)
    }

    fn delete_sheet(&mut self, name: &str) -> Result<(), WorkbookError> {
        let index = self
            .position(name)
            .ok_or_else(|| WorkbookError::UnknownSheet(name.to_string()))?;
        let removed = self.sheets.remove(index);

        self.defined_names.retain(|d| {
            d.local_sheet()
                .map_or(true, |s| !s.eq_ignore_ascii_case(&removed.name))
        });
        self.active_sheet = match self.active_sheet {
            Some(a) if a == index => None,
            Some(a) if a > index => Some(a - 1),
            other => other,
        };
        Ok(())
    }

    fn rename_sheet(&mut self, old: &str, new: &str) -> Result<(), WorkbookError> {
        let index = self
            .position(old)
            .ok_or_else(|| WorkbookError::UnknownSheet(old.to_string()))?;
        self.check_sheet_name(new, Some(index))?;

        let reference = sheet_reference_pattern(&self.sheets[index].name)?;
        let quoted = render::quote_sheet_name(new);
        let previous = std::mem::replace(&mut self.sheets[index].name, new.to_string());
        self.sheets[index].placeholder = false;
        for name in &mut self.defined_names {
            if name
                .local_sheet()
                .is_some_and(|s| s.eq_ignore_ascii_case(&previous))
            {
                name.scope = Some(new.to_string());
            }
            name.refers_to = reference
                .replace_all(&name.refers_to, |caps: &regex::Captures| {
                    format!("{}{quoted}!", &caps["lead"])
                })
                .into_owned();
        }
        Ok(())
    }

    fn set_sheet_visible(&mut self, sheet: &str, visible: bool) -> Result<(), WorkbookError> {
        self.sheet_mut(sheet)?.hidden = !visible;
        Ok(())
    }

    fn set_active_sheet(&mut self, index: usize) -> Result<(), WorkbookError> {
        if index >= self.sheets.len() {
            return Err(WorkbookError::SheetIndex {
                index,
                count: self.sheets.len(),
            });
        }
        self.active_sheet = Some(index);
        Ok(())
    }

    fn set_column_width(
        &mut self,
        sheet: &str,
        column: &str,
        width: f64,
    ) -> Result<(), WorkbookError> {
        let (first, last) = parse_column_span(column)?;
        if !width.is_finite() || !(0.0..=MAX_COLUMN_WIDTH).contains(&width) {
            return Err(WorkbookError::InvalidValue(format!(
                "column width {width} outside 0..={MAX_COLUMN_WIDTH}"
            )));
        }
        let state = self.sheet_mut(sheet)?;
        for col in first..=last {
            state.column_widths.insert(col, width);
        }
        Ok(())
    }

    fn set_row_height(&mut self, sheet: &str, row: u32, height: f64) -> Result<(), WorkbookError> {
        if row == 0 || row > MAX_ROWS {
            return Err(AddressError::RowOutOfRange(row.to_string()).into());
        }
        if !height.is_finite() || !(0.0..=MAX_ROW_HEIGHT).contains(&height) {
            return Err(WorkbookError::InvalidValue(format!(
                "row height {height} outside 0..={MAX_ROW_HEIGHT}"
            )));
        }
        self.sheet_mut(sheet)?.row_heights.insert(row - 1, height);
        Ok(())
    }

    fn register_style(&mut self, style: &StyleDescriptor) -> Result<StyleHandle, WorkbookError> {
        render::build_format(style)?;
        self.styles.push(style.clone());
        Ok(StyleHandle(self.styles.len() as u32))
    }

    fn write_formula(&mut self, sheet: &str, cell: &str, formula: &str) -> Result<(), WorkbookError> {
        if formula.trim().trim_start_matches('=').is_empty() {
            return Err(WorkbookError::InvalidValue("formula is empty".to_string()));
        }
        if formula.chars().count() > MAX_STRING_CHARS {
            return Err(WorkbookError::InvalidValue(format!(
                "formula exceeds {MAX_STRING_CHARS} characters"
            )));
        }
        self.sheet_mut(sheet)?.cell_mut(cell)?.content =
            Some(CellContent::Formula(formula.to_string()));
        Ok(())
    }

    fn write_value(&mut self, sheet: &str, cell: &str, value: CellWrite) -> Result<(), WorkbookError> {
        check_value(&value)?;
        self.sheet_mut(sheet)?.cell_mut(cell)?.content = Some(CellContent::Value(value));
        Ok(())
    }

    fn set_cell_style(
        &mut self,
        sheet: &str,
        cell: &str,
        style: StyleHandle,
    ) -> Result<(), WorkbookError> {
        if self.style(style).is_none() {
            return Err(WorkbookError::UnknownStyle(style.0));
        }
        self.sheet_mut(sheet)?.cell_mut(cell)?.style = Some(style);
        Ok(())
    }

    fn set_hyperlink(
        &mut self,
        sheet: &str,
        cell: &str,
        link: &Hyperlink,
    ) -> Result<(), WorkbookError> {
        let length = link.link.chars().count();
        if link.link.trim().is_empty() {
            return Err(WorkbookError::InvalidHyperlink("link is empty".to_string()));
        }
        if length > MAX_URL_CHARS {
            return Err(WorkbookError::InvalidHyperlink(format!(
                "link exceeds {MAX_URL_CHARS} characters"
            )));
        }
        if link
            .tooltip
            .as_ref()
            .is_some_and(|t| t.chars().count() > MAX_TOOLTIP_CHARS)
        {
            return Err(WorkbookError::InvalidHyperlink(format!(
                "tooltip exceeds {MAX_TOOLTIP_CHARS} characters"
            )));
        }
        self.sheet_mut(sheet)?.cell_mut(cell)?.hyperlink = Some(link.clone());
        Ok(())
    }

    fn merge_range(&mut self, sheet: &str, start: &str, end: &str) -> Result<(), WorkbookError> {
        let range = CellRange::new(parse_cell(start)?, parse_cell(end)?);
        if range.is_single_cell() {
            return Err(WorkbookError::InvalidMerge {
                range: range.to_string(),
                reason: "a merge needs more than one cell".to_string(),
            });
        }
        let state = self.sheet_mut(sheet)?;
        if let Some(existing) = state.merges.iter().find(|m| m.overlaps(&range)) {
            return Err(WorkbookError::MergeOverlap {
                range: range.to_string(),
                existing: existing.to_string(),
            });
        }
        state.merges.push(range);
        Ok(())
    }

    fn add_data_validation(
        &mut self,
        sheet: &str,
        rule: &DataValidation,
    ) -> Result<(), WorkbookError> {
        let ranges = render::validation_ranges(rule)?;
        render::build_validation(rule)?;
        self.sheet_mut(sheet)?.validations.push((ranges, rule.clone()));
        Ok(())
    }

    fn protect_sheet(
        &mut self,
        sheet: &str,
        protection: &SheetProtection,
    ) -> Result<(), WorkbookError> {
        self.sheet_mut(sheet)?.protection = Some(protection.clone());
        Ok(())
    }

    fn insert_image(&mut self, sheet: &str, image: &ImageMetadata) -> Result<(), WorkbookError> {
        render::build_image(image)?;
        self.sheet_mut(sheet)?.images.push(image.clone());
        Ok(())
    }

    fn define_name(&mut self, name: &DefinedName) -> Result<(), WorkbookError> {
        self.check_defined_name(name)?;
        self.defined_names.push(name.clone());
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<(), WorkbookError> {
        render::save(self, path)
    }
}
