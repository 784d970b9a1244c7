//! Amount extraction for receipts.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{AMOUNT_PATTERN, SUBTOTAL_LABEL, TAX_LABEL, TOTAL_LABEL};
use super::{ExtractionMatch, FieldExtractor};

/// Amount field extractor.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        AMOUNT_PATTERN
            .captures_iter(text)
            .filter_map(|caps| {
                let full = caps.get(0)?;
                let integer_part: String =
                    caps[2].chars().filter(|c| c.is_ascii_digit()).collect();
                let sign = if caps.get(1).is_some() { "-" } else { "" };
                let amount =
                    Decimal::from_str(&format!("{}{}.{}", sign, integer_part, &caps[3])).ok()?;
                Some(
                    ExtractionMatch::new(amount, full.as_str().trim())
                        .with_position(full.start(), full.end()),
                )
            })
            .collect()
    }
}

/// Labelled summary amounts found on a receipt.
#[derive(Debug, Clone, Default)]
pub struct ReceiptAmounts {
    pub subtotal: Option<ExtractionMatch<Decimal>>,
    pub tax: Option<ExtractionMatch<Decimal>>,
    pub total: Option<ExtractionMatch<Decimal>>,
}

/// Extract labelled subtotal, tax and total from receipt text.
///
/// The first line carrying each label wins and its last amount is taken.
/// A label with no amount on its line borrows the amount from the next
/// non-empty line.
pub fn extract_amounts(text: &str) -> ReceiptAmounts {
    let mut result = ReceiptAmounts::default();
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    for (i, line) in lines.iter().enumerate() {
        let slot = if SUBTOTAL_LABEL.is_match(line) {
            &mut result.subtotal
        } else if TAX_LABEL.is_match(line) {
            &mut result.tax
        } else if TOTAL_LABEL.is_match(line) {
            &mut result.total
        } else {
            continue;
        };

        if slot.is_some() {
            continue;
        }

        *slot = last_amount(line).or_else(|| {
            lines
                .get(i + 1)
                .filter(|next| is_bare_amount(next))
                .and_then(|next| last_amount(next))
        });
    }

    // Fill in a single missing value from the other two, unless it overflows
    if result.total.is_none() {
        if let (Some(sub), Some(tax)) = (&result.subtotal, &result.tax) {
            result.total = sub
                .value
                .checked_add(tax.value)
                .map(|total| ExtractionMatch::new(total, "calculated"));
        }
    }
    if result.subtotal.is_none() {
        if let (Some(total), Some(tax)) = (&result.total, &result.tax) {
            result.subtotal = total
                .value
                .checked_sub(tax.value)
                .map(|sub| ExtractionMatch::new(sub, "calculated"));
        }
    }

    result
}

/// Last amount printed on a line.
pub fn last_amount(line: &str) -> Option<ExtractionMatch<Decimal>> {
    AmountExtractor::new().extract_all(line).pop()
}

fn is_bare_amount(line: &str) -> bool {
    AMOUNT_PATTERN
        .find(line)
        .map(|m| m.as_str().trim() == line.trim())
        .unwrap_or(false)
}

/// Parse an amount written either way round (e.g. "1,234.56" or "1 234,56").
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let negative = s.trim_start().starts_with('-');
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        // Whichever separator comes last is the decimal point
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(c), None) if cleaned.len() - c - 1 == 2 => {
            let (int, frac) = cleaned.split_at(c);
            format!("{}.{}", int.replace(',', ""), &frac[1..])
        }
        (Some(_), None) => cleaned.replace(',', ""),
        _ => cleaned,
    };

    let amount = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -amount } else { amount })
}

/// Format an amount with two decimals and thousands separators (1,234.56).
pub fn format_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.abs());
    let (integer_part, decimal_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(*c);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    format!("{}{}.{}", sign, formatted, decimal_part)
}
