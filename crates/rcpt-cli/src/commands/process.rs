//! Process command - extract a validated document into a receipt.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use rcpt_core::DocumentId;

use super::format::{OutputFormat, format_fields};
use super::{close_database, load_config, open_lifecycle};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Document id
    id: DocumentId,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let (db, lifecycle) = open_lifecycle(&config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")?,
    );
    pb.set_message(format!("Extracting document {}...", args.id));

    let result = lifecycle.process(args.id).await;
    pb.finish_and_clear();
    let receipt = result?;

    debug!("Document {} processed in {:?}", args.id, start.elapsed());

    let output = format_fields(&receipt.fields, args.format)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Receipt {} written to {}",
            style("✓").green(),
            receipt.id,
            output_path.display()
        );
    } else {
        println!("{}", output);
        eprintln!(
            "{} Receipt {} stored in {:?}",
            style("✓").green(),
            receipt.id,
            start.elapsed()
        );
    }

    drop(lifecycle);
    close_database(db)
}
