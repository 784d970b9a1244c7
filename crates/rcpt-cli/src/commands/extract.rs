//! Extract command - run the extractor on a file without storing it.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::{info, warn};

use rcpt_core::{Extractor, PdfReceiptExtractor};

use super::format::{OutputFormat, format_fields};
use super::load_config;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Receipt PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print the raw text layer instead of parsed fields
    #[arg(long)]
    raw_text: bool,
}

pub fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let config = load_config(config_path)?;
    let extractor =
        PdfReceiptExtractor::new().with_min_text_length(config.extraction.min_text_length);

    let data = fs::read(&args.input)?;
    info!("Extracting {} ({} bytes)", args.input.display(), data.len());

    let output = if args.raw_text {
        extractor.extract_text(&data)?
    } else {
        let fields = extractor.extract(&data)?;
        for issue in fields.issues() {
            warn!("{}: {}", args.input.display(), issue);
        }
        format_fields(&fields, args.format)?
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    Ok(())
}
