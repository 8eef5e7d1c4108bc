//! Metadata-to-workbook reconstruction
//!
//! A [`Recreator`] owns one run: it borrows the metadata, drives a
//! [`WorkbookWriter`] through the phases below, and hands the finished
//! workbook back inside a [`Recreation`].
//!
//! 1. document properties
//! 2. styles
//! 3. placeholder sheet removal
//! 4. sheets, in declaration order
//! 5. defined names
//! 6. active sheet selection
//!
//! Failures in properties, sheet creation, formula writes and defined names
//! abort the run. Every other failure becomes a [`Diagnostic`].

mod cells;
mod options;
mod sheet;
mod styles;

pub use cells::{dispatch, CellAction};
pub use options::Options;
pub use sheet::SheetRecreator;
pub use styles::StyleRegistry;

use crate::error::{RecreateError, RecreateResult};
use crate::metadata::{load_metadata, MetadataDocument};
use crate::workbook::{WorkbookWriter, XlsxWorkbook};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

//==============================================================================
// Diagnostics
//==============================================================================

/// The step a diagnostic was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Properties,
    Styles,
    Placeholder,
    Sheet,
    Geometry,
    Cells,
    Merges,
    Validations,
    Images,
    Protection,
    DefinedNames,
    ActiveSheet,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Properties => "properties",
            Phase::Styles => "styles",
            Phase::Placeholder => "placeholder",
            Phase::Sheet => "sheet",
            Phase::Geometry => "geometry",
            Phase::Cells => "cells",
            Phase::Merges => "merges",
            Phase::Validations => "validations",
            Phase::Images => "images",
            Phase::Protection => "protection",
            Phase::DefinedNames => "defined names",
            Phase::ActiveSheet => "active sheet",
        };
        f.write_str(name)
    }
}

/// A failure that did not stop the run
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub phase: Phase,
    pub sheet: Option<String>,
    /// Cell, range, style or name the failure concerns
    pub target: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            phase,
            sheet: None,
            target: None,
            message: message.into(),
        }
    }

    pub fn sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.phase)?;
        if let Some(sheet) = &self.sheet {
            write!(f, " {sheet}")?;
        }
        if let Some(target) = &self.target {
            write!(f, " {target}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Diagnostics of one run, in the order they were raised
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!(
            phase = %diagnostic.phase,
            sheet = diagnostic.sheet.as_deref().unwrap_or(""),
            target = diagnostic.target.as_deref().unwrap_or(""),
            "{}",
            diagnostic.message
        );
        self.0.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Diagnostics raised in `phase`
    pub fn in_phase(&self, phase: Phase) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(move |d| d.phase == phase)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

//==============================================================================
// Assembler
//==============================================================================

/// Output of a successful run
#[derive(Debug)]
pub struct Recreation<W: WorkbookWriter = XlsxWorkbook> {
    pub workbook: W,
    pub diagnostics: Diagnostics,
}

impl<W: WorkbookWriter> Recreation<W> {
    pub fn save(&self, path: &Path) -> RecreateResult<()> {
        self.workbook.save(path).map_err(RecreateError::Save)
    }
}

/// One reconstruction run over a borrowed metadata document
pub struct Recreator<'a, W: WorkbookWriter = XlsxWorkbook> {
    metadata: &'a MetadataDocument,
    options: Options,
    writer: W,
    styles: StyleRegistry,
    diagnostics: Diagnostics,
}

impl<'a> Recreator<'a, XlsxWorkbook> {
    /// Run against a fresh [`XlsxWorkbook`]
    pub fn new(metadata: &'a MetadataDocument, options: Options) -> Self {
        Self::with_writer(metadata, options, XlsxWorkbook::new())
    }
}

impl<'a, W: WorkbookWriter> Recreator<'a, W> {
    pub fn with_writer(metadata: &'a MetadataDocument, options: Options, writer: W) -> Self {
        Self {
            metadata,
            options,
            writer,
            styles: StyleRegistry::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn run(mut self) -> RecreateResult<Recreation<W>> {
        let doc = self.metadata;
        debug!(sheets = doc.sheets.len(), styles = doc.styles.len(), "starting recreation");

        self.writer
            .set_properties(&doc.properties)
            .map_err(RecreateError::Properties)?;

        if self.options.preserve_styles && !doc.styles.is_empty() {
            self.styles
                .register_all(&doc.styles, &mut self.writer, &mut self.diagnostics);
        }

        if !doc.sheets.is_empty() {
            self.remove_placeholder();
        }

        let mut names = Vec::with_capacity(doc.sheets.len());
        for (position, meta) in doc.sheets.iter().enumerate() {
            let mut sheet = SheetRecreator::new(
                &mut self.writer,
                &self.options,
                &self.styles,
                &mut self.diagnostics,
            );
            names.push(sheet.recreate_sheet(position, meta)?);
        }

        if self.options.preserve_formulas {
            for name in &doc.defined_names {
                self.writer
                    .define_name(name)
                    .map_err(|source| RecreateError::DefinedName {
                        name: name.name.clone(),
                        source,
                    })?;
            }
        }

        self.activate_first_visible(&names);

        info!(
            sheets = names.len(),
            diagnostics = self.diagnostics.len(),
            "recreation finished"
        );
        Ok(Recreation {
            workbook: self.writer,
            diagnostics: self.diagnostics,
        })
    }

    fn remove_placeholder(&mut self) {
        let Some(placeholder) = self.writer.placeholder_sheet() else {
            return;
        };
        if let Err(e) = self.writer.delete_sheet(&placeholder) {
            self.diagnostics.push(
                Diagnostic::new(Phase::Placeholder, e.to_string()).sheet(placeholder),
            );
        }
    }

    /// Activate the first visible sheet by declaration position
    fn activate_first_visible(&mut self, names: &[String]) {
        let Some(position) = self.metadata.sheets.iter().position(|s| s.visible) else {
            debug!("no visible sheet to activate");
            // A workbook cannot hide every sheet; the first one is shown on save.
            if let Some(first) = names.first() {
                self.diagnostics.push(
                    Diagnostic::new(Phase::Sheet, "every sheet is hidden; the first sheet will be shown")
                        .sheet(first.clone()),
                );
            }
            return;
        };

        let meta = &self.metadata.sheets[position];
        if meta.index != position {
            debug!(
                sheet = %names[position],
                index = meta.index,
                position,
                "sheet index hint differs from declaration position"
            );
        }

        let index = self
            .writer
            .sheet_names()
            .iter()
            .position(|n| n == &names[position])
            .unwrap_or(position);
        if let Err(e) = self.writer.set_active_sheet(index) {
            self.diagnostics.push(
                Diagnostic::new(Phase::ActiveSheet, e.to_string()).sheet(names[position].clone()),
            );
        }
    }
}

//==============================================================================
// Drivers
//==============================================================================

/// Rebuild `metadata` into a fresh xlsx workbook
pub fn recreate(metadata: &MetadataDocument, options: Options) -> RecreateResult<Recreation> {
    Recreator::new(metadata, options).run()
}

/// Rebuild `metadata` and save it to `output`
pub fn recreate_file(
    metadata: &MetadataDocument,
    output: &Path,
    options: Options,
) -> RecreateResult<Diagnostics> {
    let recreation = recreate(metadata, options)?;
    recreation.save(output)?;
    info!(output = %output.display(), "workbook saved");
    Ok(recreation.diagnostics)
}

/// Load a metadata file (JSON or YAML), rebuild it and save it to `output`
pub fn recreate_from_file(
    metadata_path: &Path,
    output: &Path,
    options: Options,
) -> RecreateResult<Diagnostics> {
    let metadata = load_metadata(metadata_path)?;
    recreate_file(&metadata, output, options)
}
