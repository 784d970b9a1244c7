//! Batch command - submit, validate and process many receipt files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use rcpt_core::extract::rules::format_amount;
use rcpt_core::{DocumentId, DocumentState, Lifecycle, Receipt};

use super::{close_database, load_config, open_lifecycle};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Write a summary CSV to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Outcome for a single file.
struct BatchResult {
    path: PathBuf,
    document_id: Option<DocumentId>,
    receipt: Option<Receipt>,
    status: &'static str,
    error: Option<String>,
}

impl BatchResult {
    fn fail(mut self, status: &'static str, error: String) -> Self {
        self.status = status;
        self.error = Some(error);
        self
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let (db, lifecycle) = open_lifecycle(&config)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let result = ingest_file(&lifecycle, &path).await;

        if let Some(error_msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to ingest {}: {}", path.display(), error_msg);
            } else {
                error!("Failed to ingest {}: {}", path.display(), error_msg);
                pb.abandon();
                drop(lifecycle);
                close_database(db)?;
                anyhow::bail!("Batch stopped at {}: {}", path.display(), error_msg);
            }
        }

        results.push(result);
        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Ingested {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} processed, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    drop(lifecycle);
    close_database(db)
}

/// Run one file through the whole lifecycle.
async fn ingest_file(lifecycle: &Lifecycle, path: &Path) -> BatchResult {
    let mut result = BatchResult {
        path: path.to_path_buf(),
        document_id: None,
        receipt: None,
        status: "error",
        error: None,
    };

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return result.fail("error", e.to_string()),
    };
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let document = match lifecycle.submit(name, &bytes) {
        Ok(document) => document,
        Err(e) => return result.fail("error", e.to_string()),
    };
    result.document_id = Some(document.id);

    match lifecycle.validate(document.id) {
        Ok(doc) if doc.state == DocumentState::Validated => {}
        Ok(doc) => {
            let reason = doc.invalid_reason.unwrap_or_else(|| "rejected".to_string());
            return result.fail("rejected", reason);
        }
        Err(e) => return result.fail("error", e.to_string()),
    }

    match lifecycle.process(document.id).await {
        Ok(receipt) => {
            debug!("{} -> receipt {}", path.display(), receipt.id);
            result.receipt = Some(receipt);
            result.status = "processed";
            result
        }
        // Document stays validated, so a later `rcpt process` can retry
        Err(e) => result.fail("failed", e.to_string()),
    }
}

fn write_summary(path: &Path, results: &[BatchResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "document_id",
        "receipt_id",
        "merchant",
        "total",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();
        let receipt = result.receipt.as_ref();

        wtr.write_record([
            filename,
            result.status.to_string(),
            result.document_id.map(|id| id.to_string()).unwrap_or_default(),
            receipt.map(|r| r.id.to_string()).unwrap_or_default(),
            receipt
                .and_then(|r| r.fields.merchant_name.clone())
                .unwrap_or_default(),
            receipt
                .and_then(|r| r.fields.total_amount)
                .map(format_amount)
                .unwrap_or_default(),
            result.error.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, document_id: Option<DocumentId>) -> BatchResult {
        BatchResult {
            path: PathBuf::from("/tmp").join(name),
            document_id,
            receipt: None,
            status: "error",
            error: None,
        }
    }

    #[test]
    fn test_fail_records_status_and_error() {
        let failed = result("a.pdf", Some(3)).fail("rejected", "not found".to_string());
        assert_eq!(failed.status, "rejected");
        assert_eq!(failed.error.as_deref(), Some("not found"));
    }

    #[test]
    fn test_summary_has_one_row_per_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("summary.csv");

        let results = vec![
            result("a.pdf", Some(1)).fail("rejected", "not a PDF document".to_string()),
            result("b.pdf", None).fail("error", "io".to_string()),
        ];
        write_summary(&path, &results).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "filename,status,document_id,receipt_id,merchant,total,error");
        assert_eq!(lines[1], "a.pdf,rejected,1,,,,not a PDF document");
        assert_eq!(lines[2], "b.pdf,error,,,,,io");
    }
}
