//! Receipt commands - browse extracted receipts.

use clap::{Args, Subcommand};
use console::style;

use rcpt_core::ReceiptId;
use rcpt_core::extract::rules::format_amount;

use super::format::{OutputFormat, format_fields};
use super::{close_database, load_config, open_lifecycle};

/// Arguments for the receipts command.
#[derive(Args)]
pub struct ReceiptsArgs {
    #[command(subcommand)]
    command: Option<ReceiptsCommand>,
}

#[derive(Subcommand)]
enum ReceiptsCommand {
    /// List receipts, newest first
    List {
        /// Receipts to skip
        #[arg(long, default_value = "0")]
        skip: u64,

        /// Maximum receipts to show
        #[arg(long, default_value = "100")]
        limit: u64,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one receipt
    Show {
        /// Receipt id
        id: ReceiptId,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
}

pub fn run(args: ReceiptsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (db, lifecycle) = open_lifecycle(&config)?;

    let command = args.command.unwrap_or(ReceiptsCommand::List {
        skip: 0,
        limit: 100,
        json: false,
    });

    match command {
        ReceiptsCommand::List { skip, limit, json } => {
            let page = lifecycle.list_receipts(skip, limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else if page.receipts.is_empty() {
                println!("{} No receipts in this range.", style("ℹ").blue());
            } else {
                for receipt in &page.receipts {
                    println!(
                        "{:>5}  doc {:>5}  {:<30} {:>10}",
                        receipt.id,
                        receipt.document_id,
                        receipt.fields.merchant_name.as_deref().unwrap_or("-"),
                        receipt
                            .fields
                            .total_amount
                            .map(format_amount)
                            .unwrap_or_else(|| "-".to_string()),
                    );
                }
                println!();
                println!(
                    "Showing {} of {} receipts",
                    page.receipts.len(),
                    page.total
                );
            }
        }
        ReceiptsCommand::Show { id, format } => {
            let receipt = lifecycle.get_receipt(id)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&receipt)?),
                other => println!("{}", format_fields(&receipt.fields, other)?),
            }
        }
    }

    drop(lifecycle);
    close_database(db)
}
