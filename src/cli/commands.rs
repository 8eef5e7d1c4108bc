use crate::error::{RecreateError, RecreateResult};
use crate::metadata::load_metadata;
use crate::recreate::{Options, Recreator};
use crate::validate::validate_metadata;
use crate::verify::{verify_workbook, VerifyReport};
use colored::Colorize;
use std::path::PathBuf;

/// Option overrides given on the command line
#[derive(Debug, Clone, Default)]
pub struct OptionFlags {
    pub config: Option<PathBuf>,
    pub no_formulas: bool,
    pub no_styles: bool,
    pub no_validations: bool,
    pub no_images: bool,
    pub keep_empty_cells: bool,
    pub default_sheet_name: Option<String>,
}

impl OptionFlags {
    /// Start from the config file (or defaults) and apply the flags on top
    pub fn resolve(&self) -> RecreateResult<Options> {
        let mut options = match &self.config {
            Some(path) => Options::load(path)?,
            None => Options::default(),
        };
        if self.no_formulas {
            options.preserve_formulas = false;
        }
        if self.no_styles {
            options.preserve_styles = false;
        }
        if self.no_validations {
            options.preserve_data_validation = false;
        }
        if self.no_images {
            options.preserve_images = false;
        }
        if self.keep_empty_cells {
            options.skip_empty_cells = false;
        }
        if let Some(name) = &self.default_sheet_name {
            options.default_sheet_name = name.clone();
        }
        Ok(options)
    }
}

/// Execute the recreate command
pub fn recreate(
    input: PathBuf,
    output: PathBuf,
    flags: OptionFlags,
    verify: bool,
    verbose: bool,
) -> RecreateResult<()> {
    println!("{}", "🧱 Recast - Rebuilding workbook".bold().green());
    println!("   Metadata: {}", input.display());
    println!("   Output:   {}\n", output.display());

    let options = flags.resolve()?;

    if verbose {
        println!("{}", "📖 Loading metadata...".cyan());
    }
    let metadata = load_metadata(&input)?;

    if verbose {
        println!(
            "   Found {} sheets, {} styles, {} defined names\n",
            metadata.sheets.len(),
            metadata.styles.len(),
            metadata.defined_names.len()
        );
        println!("{}", "🔧 Rebuilding workbook...".cyan());
    }

    let recreation = Recreator::new(&metadata, options.clone()).run()?;
    recreation.save(&output)?;

    if recreation.diagnostics.is_empty() {
        println!("{}", "✅ Workbook rebuilt".bold().green());
    } else {
        println!(
            "{}",
            format!(
                "⚠️  Workbook rebuilt with {} warnings:",
                recreation.diagnostics.len()
            )
            .bold()
            .yellow()
        );
        for diagnostic in recreation.diagnostics.iter() {
            println!("   {}", diagnostic.to_string().yellow());
        }
    }
    println!("   Excel file: {}\n", output.display());

    if verify {
        if verbose {
            println!("{}", "🔍 Reading workbook back...".cyan());
        }
        let report = verify_workbook(&output, &metadata, &options)?;
        print_report(&report)?;
    }

    Ok(())
}

/// Execute the validate command over one or more metadata files
pub fn validate(files: Vec<PathBuf>) -> RecreateResult<()> {
    println!("{}", "✅ Validating metadata".bold().green());

    let mut failed = 0;
    for file in &files {
        println!("\n   File: {}", file.display());

        let metadata = match load_metadata(file) {
            Ok(m) => m,
            Err(e) => {
                println!("   {}", format!("❌ {e}").red());
                failed += 1;
                continue;
            }
        };

        let issues = validate_metadata(Some(&metadata));
        if issues.is_empty() {
            println!(
                "   {}",
                format!("✅ {} sheets, no issues", metadata.sheets.len()).green()
            );
        } else {
            failed += 1;
            for issue in &issues {
                println!("   {}", format!("❌ {issue}").red());
            }
        }
    }
    println!();

    if failed > 0 {
        return Err(RecreateError::Validation(format!(
            "{failed} of {} metadata files have problems",
            files.len()
        )));
    }

    println!("{}", "✅ All metadata files are valid".bold().green());
    Ok(())
}

/// Execute the verify command
pub fn verify(input: PathBuf, workbook: PathBuf, flags: OptionFlags) -> RecreateResult<()> {
    println!("{}", "🔍 Recast - Verifying workbook".bold().green());
    println!("   Metadata: {}", input.display());
    println!("   Workbook: {}\n", workbook.display());

    let options = flags.resolve()?;
    let metadata = load_metadata(&input)?;
    let report = verify_workbook(&workbook, &metadata, &options)?;
    print_report(&report)
}

fn print_report(report: &VerifyReport) -> RecreateResult<()> {
    if report.is_clean() {
        println!(
            "{}",
            format!(
                "✅ Verified {} sheets, {} cells",
                report.sheets_checked, report.cells_checked
            )
            .bold()
            .green()
        );
        return Ok(());
    }

    println!(
        "{}",
        format!("❌ {} mismatches found:", report.mismatches.len())
            .bold()
            .red()
    );
    for mismatch in &report.mismatches {
        println!("   {}", mismatch.to_string().red());
    }
    Err(RecreateError::Verify(format!(
        "{} cells differ from the metadata",
        report.mismatches.len()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_flags_override_config() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("recast.yaml");
        fs::write(&config, "preserveImages: false\ndefaultSheetName: Tab\n").unwrap();

        let flags = OptionFlags {
            config: Some(config),
            no_formulas: true,
            default_sheet_name: Some("Page".to_string()),
            ..OptionFlags::default()
        };
        let options = flags.resolve().unwrap();
        assert!(!options.preserve_formulas);
        assert!(!options.preserve_images);
        assert!(options.preserve_styles);
        assert_eq!(options.default_sheet_name, "Page");
    }
}
