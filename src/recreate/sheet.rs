//! Reconstruction of a single sheet
//!
//! Steps run in a fixed order: creation, visibility, geometry, cells, merges,
//! validations, images, protection. Only sheet creation and formula writes
//! abort the run; everything else is recorded as a diagnostic.

use super::cells::{dispatch, CellAction};
use super::styles::StyleRegistry;
use super::{Diagnostic, Diagnostics, Options, Phase};
use crate::error::{RecreateError, RecreateResult, WorkbookError};
use crate::metadata::{CellMetadata, SheetMetadata};
use crate::workbook::WorkbookWriter;
use tracing::debug;

pub struct SheetRecreator<'r, W: WorkbookWriter> {
    writer: &'r mut W,
    options: &'r Options,
    styles: &'r StyleRegistry,
    diagnostics: &'r mut Diagnostics,
}

impl<'r, W: WorkbookWriter> SheetRecreator<'r, W> {
    pub fn new(
        writer: &'r mut W,
        options: &'r Options,
        styles: &'r StyleRegistry,
        diagnostics: &'r mut Diagnostics,
    ) -> Self {
        Self {
            writer,
            options,
            styles,
            diagnostics,
        }
    }

    /// Rebuild the sheet declared at `position`, returning the name it was created under
    pub fn recreate_sheet(&mut self, position: usize, meta: &SheetMetadata) -> RecreateResult<String> {
        let name = if meta.name.is_empty() {
            self.options.synthesized_sheet_name(position)
        } else {
            meta.name.clone()
        };

        self.writer
            .create_sheet(&name)
            .map_err(|source| RecreateError::CreateSheet {
                sheet: name.clone(),
                source,
            })?;
        debug!(sheet = %name, position, cells = meta.cells.len(), "recreating sheet");

        if !meta.visible {
            let result = self.writer.set_sheet_visible(&name, false);
            self.note(result, Phase::Sheet, &name, None);
        }

        self.apply_geometry(&name, meta);

        for cell in &meta.cells {
            self.apply_cell(&name, cell)?;
        }

        for merge in &meta.merged_cells {
            let result = self
                .writer
                .merge_range(&name, &merge.start_cell, &merge.end_cell);
            let target = format!("{}:{}", merge.start_cell, merge.end_cell);
            self.note(result, Phase::Merges, &name, Some(target));
        }

        if self.options.preserve_data_validation {
            for rule in &meta.data_validations {
                let result = self.writer.add_data_validation(&name, rule);
                self.note(result, Phase::Validations, &name, Some(rule.range.clone()));
            }
        }

        if self.options.preserve_images {
            for image in &meta.images {
                let result = self.writer.insert_image(&name, image);
                self.note(result, Phase::Images, &name, Some(image.cell.clone()));
            }
        }

        if let Some(protection) = meta.protection.as_ref().filter(|p| p.protected) {
            let result = self.writer.protect_sheet(&name, protection);
            self.note(result, Phase::Protection, &name, None);
        }

        Ok(name)
    }

    fn apply_geometry(&mut self, sheet: &str, meta: &SheetMetadata) {
        for (column, &width) in &meta.col_widths {
            let result = self.writer.set_column_width(sheet, column, width);
            self.note(result, Phase::Geometry, sheet, Some(format!("column {column}")));
        }
        for (&row, &height) in &meta.row_heights {
            let result = self.writer.set_row_height(sheet, row, height);
            self.note(result, Phase::Geometry, sheet, Some(format!("row {row}")));
        }
    }

    fn apply_cell(&mut self, sheet: &str, cell: &CellMetadata) -> RecreateResult<()> {
        if self.options.skip_empty_cells && cell.is_empty() {
            return Ok(());
        }
        let address = cell.address.as_str();

        match dispatch(cell, self.options) {
            CellAction::Formula(formula) => {
                self.writer
                    .write_formula(sheet, address, formula)
                    .map_err(|source| RecreateError::Formula {
                        sheet: sheet.to_string(),
                        cell: address.to_string(),
                        source,
                    })?;
            }
            CellAction::Value(value) => {
                let result = self.writer.write_value(sheet, address, value);
                self.note(result, Phase::Cells, sheet, Some(address.to_string()));
            }
            CellAction::Nothing => {}
        }

        if self.options.preserve_styles && cell.style_id != 0 {
            // Unmapped identifiers belong to styles that failed to register.
            if let Some(handle) = self.styles.lookup(cell.style_id) {
                let result = self.writer.set_cell_style(sheet, address, handle);
                self.note(result, Phase::Cells, sheet, Some(address.to_string()));
            }
        }

        if let Some(link) = &cell.hyperlink {
            let result = self.writer.set_hyperlink(sheet, address, link);
            self.note(result, Phase::Cells, sheet, Some(address.to_string()));
        }

        Ok(())
    }

    fn note(
        &mut self,
        result: Result<(), WorkbookError>,
        phase: Phase,
        sheet: &str,
        target: Option<String>,
    ) {
        if let Err(e) = result {
            let mut diagnostic = Diagnostic::new(phase, e.to_string()).sheet(sheet);
            if let Some(target) = target {
                diagnostic = diagnostic.target(target);
            }
            self.diagnostics.push(diagnostic);
        }
    }
}
