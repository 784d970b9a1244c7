//! Extracted receipt data.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::document::DocumentId;

/// Tolerance used when cross-checking extracted amounts.
pub const AMOUNT_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Surrogate key of a receipt row.
pub type ReceiptId = i64;

/// A stored receipt, created once when its document is processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,

    /// Document the data was extracted from.
    pub document_id: DocumentId,

    /// Extracted fields.
    #[serde(flatten)]
    pub fields: ReceiptFields,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Structured fields produced by an extractor. Every scalar is best-effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptFields {
    /// Merchant-reported transaction time (local to the merchant).
    pub purchased_at: Option<NaiveDateTime>,

    pub merchant_name: Option<String>,

    /// Amount charged, tax included.
    pub total_amount: Option<Decimal>,

    pub tax_amount: Option<Decimal>,

    /// Amount before tax.
    pub subtotal: Option<Decimal>,

    /// Purchased items in printed order.
    #[serde(default)]
    pub items: Vec<ReceiptItem>,

    pub payment_method: Option<String>,

    pub receipt_number: Option<String>,

    pub cashier: Option<String>,
}

/// A single purchased item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub name: String,
    pub price: Decimal,
}

/// One window of the receipt listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptPage {
    /// Receipts in the window, newest first.
    pub receipts: Vec<Receipt>,

    /// Count of all receipts regardless of the window.
    pub total: u64,
}

impl ReceiptFields {
    /// Whether nothing at all was recovered.
    pub fn is_empty(&self) -> bool {
        self.purchased_at.is_none()
            && self.merchant_name.is_none()
            && self.total_amount.is_none()
            && self.tax_amount.is_none()
            && self.subtotal.is_none()
            && self.items.is_empty()
            && self.payment_method.is_none()
            && self.receipt_number.is_none()
            && self.cashier.is_none()
    }

    /// Sum of item prices, `None` when there are no items or the sum
    /// overflows.
    pub fn items_total(&self) -> Option<Decimal> {
        if self.items.is_empty() {
            return None;
        }
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.price))
    }

    /// Report soft inconsistencies in the extracted data.
    ///
    /// Extraction is best-effort, so these are warnings and never block
    /// storage.
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.is_empty() {
            issues.push("No receipt fields extracted".to_string());
            return issues;
        }

        if let (Some(total), Some(subtotal), Some(tax)) =
            (self.total_amount, self.subtotal, self.tax_amount)
        {
            match subtotal.checked_add(tax).and_then(|sum| sum.checked_sub(total)) {
                Some(diff) if diff.abs() <= AMOUNT_EPSILON => {}
                Some(_) => issues.push(format!(
                    "Subtotal ({}) plus tax ({}) differs from total ({})",
                    subtotal, tax, total
                )),
                None => issues.push(format!(
                    "Subtotal ({}) plus tax ({}) is out of range",
                    subtotal, tax
                )),
            }
        }

        match self.items_total() {
            Some(items_total) => {
                let matches_any = [self.subtotal, self.total_amount]
                    .iter()
                    .flatten()
                    .any(|amount| {
                        items_total
                            .checked_sub(*amount)
                            .is_some_and(|diff| diff.abs() <= AMOUNT_EPSILON)
                    });
                let has_reference = self.subtotal.is_some() || self.total_amount.is_some();

                if has_reference && !matches_any {
                    issues.push(format!(
                        "Line item sum ({}) matches neither subtotal nor total",
                        items_total
                    ));
                }
            }
            None if !self.items.is_empty() => {
                issues.push("Line item sum is out of range".to_string());
            }
            None => {}
        }

        if self.total_amount.is_some_and(|t| t.is_sign_negative()) {
            issues.push("Total amount is negative".to_string());
        }

        issues
    }
}

/// Normalized payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    /// Credit card, including card brands printed instead of the kind.
    Credit,
    Debit,
    /// Phone or wallet payments.
    Mobile,
    /// Anything else, upper-cased as printed.
    Other(String),
}

impl PaymentMethod {
    /// Parse payment method from receipt text.
    pub fn from_str(s: &str) -> Self {
        let s = s.trim().to_lowercase();

        if s.contains("cash") {
            PaymentMethod::Cash
        } else if s.contains("debit") || s.contains("interac") || s.contains("maestro") {
            PaymentMethod::Debit
        } else if s.contains("apple pay") || s.contains("google pay") || s.contains("mobile") {
            PaymentMethod::Mobile
        } else if s.contains("credit")
            || s.contains("visa")
            || s.contains("mastercard")
            || s.contains("amex")
            || s.contains("american express")
            || s.contains("discover")
            || s.contains("card")
        {
            PaymentMethod::Credit
        } else {
            PaymentMethod::Other(s.to_uppercase())
        }
    }

    /// Label stored on the receipt record.
    pub fn label(&self) -> String {
        match self {
            PaymentMethod::Cash => "CASH".to_string(),
            PaymentMethod::Credit => "CREDIT".to_string(),
            PaymentMethod::Debit => "DEBIT".to_string(),
            PaymentMethod::Mobile => "MOBILE".to_string(),
            PaymentMethod::Other(raw) => raw.clone(),
        }
    }
}
