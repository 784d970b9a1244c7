//! CLI and HTTP front end for receipt document ingestion.

mod commands;
mod http;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, documents, extract, process, receipts, serve};

/// Receipt ingestion - upload, validate and extract receipt documents
#[derive(Parser)]
#[command(name = "rcpt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve(serve::ServeArgs),

    /// Upload a receipt document
    Submit(documents::SubmitArgs),

    /// Validate an uploaded document
    Validate(documents::ValidateArgs),

    /// Extract a validated document into a receipt
    Process(process::ProcessArgs),

    /// Inspect uploaded documents
    Documents(documents::DocumentsArgs),

    /// Inspect extracted receipts
    Receipts(receipts::ReceiptsArgs),

    /// Submit, validate and process many files
    Batch(batch::BatchArgs),

    /// Run the extractor on a file without storing anything
    Extract(extract::ExtractArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve(args) => serve::run(args, config_path).await,
        Commands::Submit(args) => documents::submit(args, config_path),
        Commands::Validate(args) => documents::validate(args, config_path),
        Commands::Process(args) => process::run(args, config_path).await,
        Commands::Documents(args) => documents::run(args, config_path),
        Commands::Receipts(args) => receipts::run(args, config_path),
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Extract(args) => extract::run(args, config_path),
        Commands::Config(args) => config::run(args, config_path),
    }
}
