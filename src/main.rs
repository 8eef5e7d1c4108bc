use clap::{Args, Parser, Subcommand};
use recast::cli::{self, OptionFlags};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recast")]
#[command(about = "Rebuild .xlsx workbooks from JSON/YAML metadata descriptions")]
#[command(long_about = "Recast - Metadata-to-workbook reconstruction

Reads a language-agnostic description of a workbook (sheets, cells, styles,
merges, validations, images, document properties) and writes an equivalent
.xlsx file.

COMMANDS:
  recreate  - Rebuild a workbook from a metadata file
  validate  - Check metadata files for structural problems
  verify    - Compare a saved workbook with its metadata

EXAMPLES:
  recast recreate report.json report.xlsx
  recast recreate report.yaml out.xlsx --no-styles --verify
  recast validate a.json b.yaml
  recast verify report.json report.xlsx

Set RUST_LOG (e.g. RUST_LOG=recast=debug) for detailed logs.")]
#[command(version)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct OptionArgs {
    /// Options file (.json, .yaml) providing defaults for the flags below
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write cached values instead of formulas and skip defined names
    #[arg(long)]
    no_formulas: bool,

    /// Do not register or apply cell styles
    #[arg(long)]
    no_styles: bool,

    /// Do not apply data validation rules
    #[arg(long)]
    no_validations: bool,

    /// Do not insert images
    #[arg(long)]
    no_images: bool,

    /// Visit cells that carry neither a value nor a formula
    #[arg(long)]
    keep_empty_cells: bool,

    /// Prefix for names given to unnamed sheets
    #[arg(long, value_name = "NAME", env = "RECAST_DEFAULT_SHEET_NAME")]
    default_sheet_name: Option<String>,
}

impl From<OptionArgs> for OptionFlags {
    fn from(args: OptionArgs) -> Self {
        OptionFlags {
            config: args.config,
            no_formulas: args.no_formulas,
            no_styles: args.no_styles,
            no_validations: args.no_validations,
            no_images: args.no_images,
            keep_empty_cells: args.keep_empty_cells,
            default_sheet_name: args.default_sheet_name,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Rebuild a workbook from a metadata file.

The metadata format is chosen from the extension (.json, .yaml, .yml).
Problems that do not prevent the workbook from being written (a style that
cannot be built, an overlapping merge, a malformed validation rule) are
reported as warnings; the affected item is skipped.

Use --verify to read the saved file back and compare it with the metadata.")]
    /// Rebuild a workbook from a metadata file
    Recreate {
        /// Metadata file (.json, .yaml, .yml)
        metadata: PathBuf,

        /// Output .xlsx file
        output: PathBuf,

        #[command(flatten)]
        options: OptionArgs,

        /// Read the saved workbook back and compare it with the metadata
        #[arg(long)]
        verify: bool,
    },

    /// Check metadata files for structural problems
    Validate {
        /// Metadata file(s) to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Compare a saved workbook with the metadata it was rebuilt from
    Verify {
        /// Metadata file (.json, .yaml, .yml)
        metadata: PathBuf,

        /// Workbook to check
        workbook: PathBuf,

        #[command(flatten)]
        options: OptionArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "recast=debug" } else { "recast=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Recreate {
            metadata,
            output,
            options,
            verify,
        } => cli::recreate(metadata, output, options.into(), verify, cli.verbose)?,

        Commands::Validate { files } => cli::validate(files)?,

        Commands::Verify {
            metadata,
            workbook,
            options,
        } => cli::verify(metadata, workbook, options.into())?,
    }

    Ok(())
}
