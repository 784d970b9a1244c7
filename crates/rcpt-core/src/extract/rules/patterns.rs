//! Common regex patterns for receipt extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Amounts: 25.99, $1,234.56, 1 234,56, -3.00
    pub static ref AMOUNT_PATTERN: Regex = Regex::new(
        r"(-)?[$€£]?\s?(\d{1,3}(?:[,\s\u{00a0}]\d{3})+|\d+)[.,](\d{2})\b"
    ).unwrap();

    // Labelled summary lines. Tax is checked before total so that
    // "Total tax" is not read as the grand total.
    pub static ref SUBTOTAL_LABEL: Regex = Regex::new(
        r"(?i)^\s*sub[\s\-]?total\b"
    ).unwrap();

    pub static ref TAX_LABEL: Regex = Regex::new(
        r"(?i)^\s*(?:total\s+|sales\s+)?(?:tax|vat|gst|hst)\b"
    ).unwrap();

    pub static ref TOTAL_LABEL: Regex = Regex::new(
        r"(?i)^\s*(?:(?:grand|order)\s+)?total\b|^\s*(?:amount|balance)\s+due\b"
    ).unwrap();

    // Lines that summarise or settle the purchase rather than list an item
    pub static ref SUMMARY_LINE: Regex = Regex::new(
        r"(?i)\b(?:sub[\s\-]?total|total|tax|vat|gst|hst|change|cash|tender(?:ed)?|payment|paid|balance|due|visa|mastercard|amex|debit|credit|savings|date|time|receipt|cashier)\b"
    ).unwrap();

    // Item lines: a description followed by a trailing price and an
    // optional single-letter tax flag
    pub static ref ITEM_LINE: Regex = Regex::new(
        r"^\s*(.*?[A-Za-z].*?)[\s.:$]*(-?[$€£]?\s?(?:\d{1,3}(?:,\d{3})+|\d+)[.,]\d{2})\s*[A-Z]?\s*$"
    ).unwrap();

    // Dates
    pub static ref DATE_MDY: Regex = Regex::new(
        r"\b(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b"
    ).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b"
    ).unwrap();

    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})\b"
    ).unwrap();

    pub static ref TIME: Regex = Regex::new(
        r"\b(\d{1,2}):(\d{2})(?::(\d{2}))?(?:\s*([AaPp][Mm]))?\b"
    ).unwrap();

    // Identification
    pub static ref RECEIPT_NUMBER: Regex = Regex::new(
        r"(?i)\b(?:receipt|invoice|order|transaction|trans|ticket)\s*(?:#|no\.?|number|num\.?|id)?\s*[:#]?\s*([A-Za-z0-9\-/]*\d[A-Za-z0-9\-/]*)"
    ).unwrap();

    pub static ref CASHIER: Regex = Regex::new(
        r"(?i)\b(?:cashier|server|clerk|operator)\b(?:\s+name)?\s*[:#\-]?\s*([A-Za-z][A-Za-z .'\-]*[A-Za-z])"
    ).unwrap();

    // Payment method
    pub static ref PAYMENT_METHOD: Regex = Regex::new(
        r"(?i)\b(?:payment(?:\s+method)?|paid\s+(?:by|with)|tender(?:ed)?|card\s+type)\b\s*[:\-]?\s*([A-Za-z][A-Za-z ]*[A-Za-z])"
    ).unwrap();

    pub static ref TENDER_NAME: Regex = Regex::new(
        r"(?i)\b(visa|mastercard|amex|american express|discover|debit card|credit card|cash|apple pay|google pay)\b"
    ).unwrap();

    // Header noise before the merchant name
    pub static ref HEADER_NOISE: Regex = Regex::new(
        r"(?i)^(?:(?:sales\s+)?receipt|customer\s+copy|merchant\s+copy|welcome|thank\s+you.*|\*+)$"
    ).unwrap();
}
