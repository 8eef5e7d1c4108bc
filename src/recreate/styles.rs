//! Style registration and remapping
//!
//! Source style identifiers are translated into handles issued by the output
//! workbook. Descriptors with identical content share one handle.

use super::{Diagnostic, Diagnostics, Phase};
use crate::metadata::StyleDetails;
use crate::workbook::{NumberFormat, StyleDescriptor, StyleHandle, WorkbookWriter};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Run-scoped map from source style identifier to workbook handle
#[derive(Debug, Default)]
pub struct StyleRegistry {
    remap: HashMap<i64, StyleHandle>,
    registered: Vec<(StyleDescriptor, StyleHandle)>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every style, in identifier order
    pub fn register_all<W: WorkbookWriter>(
        &mut self,
        styles: &BTreeMap<i64, StyleDetails>,
        writer: &mut W,
        diagnostics: &mut Diagnostics,
    ) {
        for (&id, details) in styles {
            if let Err(message) = self.register(id, details, writer) {
                diagnostics.push(
                    Diagnostic::new(Phase::Styles, message).target(format!("style {id}")),
                );
            }
        }
        debug!(
            styles = styles.len(),
            handles = self.registered.len(),
            "styles registered"
        );
    }

    /// Register one style; on failure the identifier stays unmapped
    pub fn register<W: WorkbookWriter>(
        &mut self,
        id: i64,
        details: &StyleDetails,
        writer: &mut W,
    ) -> Result<StyleHandle, String> {
        let descriptor = describe(details);

        if let Some((_, handle)) = self.registered.iter().find(|(d, _)| *d == descriptor) {
            self.remap.insert(id, *handle);
            return Ok(*handle);
        }

        let handle = writer
            .register_style(&descriptor)
            .map_err(|e| e.to_string())?;
        self.registered.push((descriptor, handle));
        self.remap.insert(id, handle);
        Ok(handle)
    }

    pub fn lookup(&self, id: i64) -> Option<StyleHandle> {
        self.remap.get(&id).copied()
    }

    /// Number of distinct handles issued
    pub fn handle_count(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remap.is_empty()
    }
}

/// Keep only the sub-records the details actually specify
fn describe(details: &StyleDetails) -> StyleDescriptor {
    let number_format = match details.custom_number_format.as_deref() {
        Some(code) if !code.is_empty() => Some(NumberFormat::Custom(code.to_string())),
        _ if details.number_format != 0 => Some(NumberFormat::BuiltIn(details.number_format)),
        _ => None,
    };

    StyleDescriptor {
        font: details.font.clone(),
        fill: details.fill.clone().filter(|f| !f.color.is_empty()),
        borders: details.border.clone(),
        alignment: details.alignment.clone(),
        number_format,
        protection: details.protection.clone(),
    }
}
