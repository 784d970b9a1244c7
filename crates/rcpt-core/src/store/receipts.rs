//! Receipt table access.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use crate::error::StorageError;
use crate::models::document::DocumentId;
use crate::models::receipt::{Receipt, ReceiptFields, ReceiptId, ReceiptItem};

const COLUMNS: &str = "id, document_id, purchased_at, merchant_name, total_amount, tax_amount, \
                       subtotal, items, payment_method, receipt_number, cashier, created_at, updated_at";

pub(super) fn insert_receipt(
    conn: &Connection,
    document_id: DocumentId,
    fields: &ReceiptFields,
    now: DateTime<Utc>,
) -> Result<ReceiptId, StorageError> {
    let items = serde_json::to_string(&fields.items).map_err(|e| StorageError::Corrupt {
        field: "items",
        value: e.to_string(),
    })?;

    conn.execute(
        "INSERT INTO receipts (document_id, purchased_at, merchant_name, total_amount, tax_amount,
         subtotal, items, payment_method, receipt_number, cashier, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
        params![
            document_id,
            fields.purchased_at,
            fields.merchant_name,
            fields.total_amount.map(|d| d.to_string()),
            fields.tax_amount.map(|d| d.to_string()),
            fields.subtotal.map(|d| d.to_string()),
            items,
            fields.payment_method,
            fields.receipt_number,
            fields.cashier,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(super) fn get_receipt(
    conn: &Connection,
    id: ReceiptId,
) -> Result<Option<Receipt>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM receipts WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id], ReceiptRow::from_row)
        .optional()?;
    row.map(ReceiptRow::into_receipt).transpose()
}

pub(super) fn list_receipts(
    conn: &Connection,
    skip: u64,
    limit: u64,
) -> Result<Vec<Receipt>, StorageError> {
    let sql = format!(
        "SELECT {COLUMNS} FROM receipts ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![clamp(limit), clamp(skip)], ReceiptRow::from_row)?;

    let mut receipts = Vec::new();
    for row in rows {
        receipts.push(row?.into_receipt()?);
    }
    Ok(receipts)
}

pub(super) fn count_receipts(conn: &Connection) -> Result<u64, StorageError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM receipts", [], |row| row.get(0))?;
    Ok(count.max(0) as u64)
}

/// SQLite integers are signed.
fn clamp(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn parse_amount(field: &'static str, value: Option<String>) -> Result<Option<Decimal>, StorageError> {
    value
        .map(|v| {
            Decimal::from_str(&v).map_err(|_| StorageError::Corrupt { field, value: v })
        })
        .transpose()
}

/// Raw column values before decimal and JSON decoding.
struct ReceiptRow {
    id: ReceiptId,
    document_id: DocumentId,
    purchased_at: Option<NaiveDateTime>,
    merchant_name: Option<String>,
    total_amount: Option<String>,
    tax_amount: Option<String>,
    subtotal: Option<String>,
    items: String,
    payment_method: Option<String>,
    receipt_number: Option<String>,
    cashier: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReceiptRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            document_id: row.get("document_id")?,
            purchased_at: row.get("purchased_at")?,
            merchant_name: row.get("merchant_name")?,
            total_amount: row.get("total_amount")?,
            tax_amount: row.get("tax_amount")?,
            subtotal: row.get("subtotal")?,
            items: row.get("items")?,
            payment_method: row.get("payment_method")?,
            receipt_number: row.get("receipt_number")?,
            cashier: row.get("cashier")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_receipt(self) -> Result<Receipt, StorageError> {
        let items: Vec<ReceiptItem> =
            serde_json::from_str(&self.items).map_err(|_| StorageError::Corrupt {
                field: "items",
                value: self.items.clone(),
            })?;

        Ok(Receipt {
            id: self.id,
            document_id: self.document_id,
            fields: ReceiptFields {
                purchased_at: self.purchased_at,
                merchant_name: self.merchant_name,
                total_amount: parse_amount("total_amount", self.total_amount)?,
                tax_amount: parse_amount("tax_amount", self.tax_amount)?,
                subtotal: parse_amount("subtotal", self.subtotal)?,
                items,
                payment_method: self.payment_method,
                receipt_number: self.receipt_number,
                cashier: self.cashier,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
