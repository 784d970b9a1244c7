//! Output formatting shared by the commands.

use console::style;

use rcpt_core::extract::rules::format_amount;
use rcpt_core::{Document, DocumentState, ReceiptFields};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

/// Render receipt fields in the requested format.
pub fn format_fields(fields: &ReceiptFields, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(fields)?),
        OutputFormat::Csv => format_csv(fields),
        OutputFormat::Text => Ok(format_text(fields)),
    }
}

fn format_csv(fields: &ReceiptFields) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "purchased_at",
        "merchant_name",
        "subtotal",
        "tax_amount",
        "total_amount",
        "item_count",
        "payment_method",
        "receipt_number",
        "cashier",
    ])?;

    wtr.write_record([
        fields.purchased_at.map(|d| d.to_string()).unwrap_or_default(),
        fields.merchant_name.clone().unwrap_or_default(),
        fields.subtotal.map(|d| d.to_string()).unwrap_or_default(),
        fields.tax_amount.map(|d| d.to_string()).unwrap_or_default(),
        fields.total_amount.map(|d| d.to_string()).unwrap_or_default(),
        fields.items.len().to_string(),
        fields.payment_method.clone().unwrap_or_default(),
        fields.receipt_number.clone().unwrap_or_default(),
        fields.cashier.clone().unwrap_or_default(),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(fields: &ReceiptFields) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Merchant: {}\n",
        fields.merchant_name.as_deref().unwrap_or("-")
    ));
    if let Some(at) = fields.purchased_at {
        output.push_str(&format!("Date: {}\n", at));
    }
    if let Some(number) = &fields.receipt_number {
        output.push_str(&format!("Receipt: #{}\n", number));
    }
    if let Some(cashier) = &fields.cashier {
        output.push_str(&format!("Cashier: {}\n", cashier));
    }

    if !fields.items.is_empty() {
        output.push_str("\nItems:\n");
        for item in &fields.items {
            output.push_str(&format!("  {:<30} {:>10}\n", item.name, format_amount(item.price)));
        }
    }

    output.push('\n');
    for (label, amount) in [
        ("Subtotal", fields.subtotal),
        ("Tax", fields.tax_amount),
        ("Total", fields.total_amount),
    ] {
        if let Some(amount) = amount {
            output.push_str(&format!("  {:<30} {:>10}\n", label, format_amount(amount)));
        }
    }

    if let Some(method) = &fields.payment_method {
        output.push_str(&format!("\nPaid by: {}\n", method));
    }

    output
}

/// Coloured state label for terminal output.
pub fn state_label(state: DocumentState) -> String {
    let label = state.as_str();
    match state {
        DocumentState::Uploaded => style(label).blue().to_string(),
        DocumentState::Validated => style(label).cyan().to_string(),
        DocumentState::Rejected => style(label).red().to_string(),
        DocumentState::Processed => style(label).green().to_string(),
    }
}

/// One line per document.
pub fn document_row(doc: &Document) -> String {
    let mut row = format!(
        "{:>5}  {:<10}  {}  {}",
        doc.id,
        state_label(doc.state),
        doc.created_at.format("%Y-%m-%d %H:%M:%S"),
        doc.name
    );
    if let Some(reason) = &doc.invalid_reason {
        row.push_str(&format!("  ({})", reason));
    }
    row
}
