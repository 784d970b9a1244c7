//! Document commands - submit, validate and inspect uploads.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use rcpt_core::{DocumentId, DocumentState};

use super::format::document_row;
use super::{close_database, load_config, open_lifecycle};

/// Arguments for the submit command.
#[derive(Args)]
pub struct SubmitArgs {
    /// Receipt document (PDF)
    #[arg(required = true)]
    file: PathBuf,

    /// Name to record instead of the file name
    #[arg(long)]
    name: Option<String>,

    /// Validate right after submitting
    #[arg(long)]
    validate: bool,
}

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// Document id
    id: DocumentId,
}

/// Arguments for the documents command.
#[derive(Args)]
pub struct DocumentsArgs {
    #[command(subcommand)]
    command: Option<DocumentsCommand>,
}

#[derive(Subcommand)]
enum DocumentsCommand {
    /// List all documents, newest first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one document
    Show {
        /// Document id
        id: DocumentId,
    },
}

pub fn submit(args: SubmitArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    if !args.file.exists() {
        anyhow::bail!("Input file not found: {}", args.file.display());
    }

    let config = load_config(config_path)?;
    let (db, lifecycle) = open_lifecycle(&config)?;

    let bytes = fs::read(&args.file)?;
    let name = match args.name {
        Some(name) => name,
        None => args
            .file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string(),
    };

    let mut document = lifecycle.submit(&name, &bytes)?;
    println!(
        "{} Submitted {} as document {}",
        style("✓").green(),
        document.name,
        document.id
    );

    if args.validate {
        document = lifecycle.validate(document.id)?;
        report_validation(document.id, document.state, document.invalid_reason.as_deref());
    }

    drop(lifecycle);
    close_database(db)
}

pub fn validate(args: ValidateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (db, lifecycle) = open_lifecycle(&config)?;

    let document = lifecycle.validate(args.id)?;
    report_validation(document.id, document.state, document.invalid_reason.as_deref());

    drop(lifecycle);
    close_database(db)
}

fn report_validation(id: DocumentId, state: DocumentState, reason: Option<&str>) {
    match state {
        DocumentState::Validated => {
            println!("{} Document {} is valid", style("✓").green(), id)
        }
        _ => println!(
            "{} Document {} rejected: {}",
            style("✗").red(),
            id,
            reason.unwrap_or("unknown reason")
        ),
    }
}

pub fn run(args: DocumentsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (db, lifecycle) = open_lifecycle(&config)?;

    match args.command.unwrap_or(DocumentsCommand::List { json: false }) {
        DocumentsCommand::List { json } => {
            let documents = lifecycle.list_documents()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&documents)?);
            } else if documents.is_empty() {
                println!("{} No documents uploaded yet.", style("ℹ").blue());
            } else {
                for document in &documents {
                    println!("{}", document_row(document));
                }
            }
        }
        DocumentsCommand::Show { id } => {
            let document = lifecycle.get_document(id)?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
    }

    drop(lifecycle);
    close_database(db)
}
