//! Rule-based receipt parser.

use tracing::debug;

use crate::models::receipt::{PaymentMethod, ReceiptFields, ReceiptItem};

use super::rules::{
    amounts::{extract_amounts, parse_amount},
    dates::extract_purchased_at,
    patterns::*,
};

/// Turns the text of a printed receipt into receipt fields.
pub struct ReceiptParser {
    /// Non-empty lines searched for the merchant name.
    header_lines: usize,
}

impl ReceiptParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self { header_lines: 5 }
    }

    /// Set how many leading lines may hold the merchant name.
    pub fn with_header_lines(mut self, header_lines: usize) -> Self {
        self.header_lines = header_lines;
        self
    }

    /// Parse receipt text. Fields that cannot be recognized stay empty.
    pub fn parse(&self, text: &str) -> ReceiptFields {
        debug!("Parsing receipt from {} characters of text", text.len());

        let items = self.extract_items(text);
        let amounts = extract_amounts(text);

        let mut fields = ReceiptFields {
            purchased_at: extract_purchased_at(text),
            merchant_name: self.extract_merchant(text),
            total_amount: amounts.total.map(|m| m.value),
            tax_amount: amounts.tax.map(|m| m.value),
            subtotal: amounts.subtotal.map(|m| m.value),
            items,
            payment_method: self.extract_payment_method(text),
            receipt_number: self.extract_receipt_number(text),
            cashier: self.extract_cashier(text),
        };

        if fields.total_amount.is_none() && fields.subtotal.is_none() {
            fields.total_amount = fields.items_total();
        }

        debug!(
            "Parsed receipt: merchant={:?} total={:?} items={}",
            fields.merchant_name,
            fields.total_amount,
            fields.items.len()
        );
        fields
    }

    fn extract_merchant(&self, text: &str) -> Option<String> {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(self.header_lines)
            .map(strip_welcome)
            .find(|l| {
                l.chars().filter(|c| c.is_alphabetic()).count() >= 2
                    && !HEADER_NOISE.is_match(l)
                    && !SUMMARY_LINE.is_match(l)
                    && !RECEIPT_NUMBER.is_match(l)
                    && !CASHIER.is_match(l)
                    && !AMOUNT_PATTERN.is_match(l)
                    && !is_date_line(l)
            })
            .map(first_field)
    }

    fn extract_items(&self, text: &str) -> Vec<ReceiptItem> {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .filter(|l| {
                !SUMMARY_LINE.is_match(l)
                    && !RECEIPT_NUMBER.is_match(l)
                    && !CASHIER.is_match(l)
                    && !is_date_line(l)
            })
            .filter_map(|line| {
                let caps = ITEM_LINE.captures(line)?;
                let name = caps[1].trim_end_matches([' ', '.', ':', '-', '$', '@']).trim();
                let price = parse_amount(&caps[2])?;
                if name.is_empty() {
                    return None;
                }
                Some(ReceiptItem {
                    name: name.to_string(),
                    price,
                })
            })
            .collect()
    }

    fn extract_receipt_number(&self, text: &str) -> Option<String> {
        RECEIPT_NUMBER
            .captures(text)
            .map(|caps| caps[1].trim_matches(['-', '/']).to_string())
            .filter(|n| !n.is_empty())
    }

    fn extract_cashier(&self, text: &str) -> Option<String> {
        CASHIER.captures(text).map(|caps| first_field(&caps[1]))
    }

    fn extract_payment_method(&self, text: &str) -> Option<String> {
        let raw = PAYMENT_METHOD
            .captures(text)
            .map(|caps| first_field(&caps[1]))
            .or_else(|| TENDER_NAME.captures(text).map(|caps| caps[1].to_string()))?;

        Some(PaymentMethod::from_str(&raw).label())
    }
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_date_line(line: &str) -> bool {
    DATE_MDY.is_match(line) || DATE_YMD.is_match(line) || DATE_DMY.is_match(line)
}

fn strip_welcome(line: &str) -> &str {
    let lower = line.to_ascii_lowercase();
    match lower.strip_prefix("welcome to ") {
        Some(_) => line["welcome to ".len()..].trim(),
        None => line,
    }
}

/// Text up to the first run of column padding.
fn first_field(s: &str) -> String {
    s.split("  ").next().unwrap_or(s).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const GROCERY: &str = r#"
        WALMART
        Receipt #12345
        Date: 11/15/2023 3:42 PM
        Cashier: John Doe

        Milk                    $3.99
        Bread                   $2.49
        Eggs                    $4.99

        Subtotal:              $11.47
        Tax:                   $0.92
        Total:                 $12.39

        Payment: CREDIT
    "#;

    #[test]
    fn test_parse_grocery_receipt() {
        let fields = ReceiptParser::new().parse(GROCERY);

        assert_eq!(fields.merchant_name.as_deref(), Some("WALMART"));
        assert_eq!(fields.receipt_number.as_deref(), Some("12345"));
        assert_eq!(fields.cashier.as_deref(), Some("John Doe"));
        assert_eq!(fields.payment_method.as_deref(), Some("CREDIT"));
        assert_eq!(
            fields.purchased_at,
            NaiveDate::from_ymd_opt(2023, 11, 15).and_then(|d| d.and_hms_opt(15, 42, 0))
        );
        assert_eq!(fields.subtotal, Some(dec("11.47")));
        assert_eq!(fields.tax_amount, Some(dec("0.92")));
        assert_eq!(fields.total_amount, Some(dec("12.39")));
        assert_eq!(
            fields.items,
            vec![
                ReceiptItem { name: "Milk".into(), price: dec("3.99") },
                ReceiptItem { name: "Bread".into(), price: dec("2.49") },
                ReceiptItem { name: "Eggs".into(), price: dec("4.99") },
            ]
        );
        assert!(fields.issues().is_empty());
    }

    #[test]
    fn test_merchant_skips_header_noise() {
        let fields = ReceiptParser::new().parse("RECEIPT\nWelcome to Corner Cafe\nLatte 4.50");
        assert_eq!(fields.merchant_name.as_deref(), Some("Corner Cafe"));
    }

    #[test]
    fn test_merchant_limited_to_header() {
        let text = "12.00\n1.00\n2.00\n3.00\nSomething";
        let fields = ReceiptParser::new().with_header_lines(2).parse(text);
        assert_eq!(fields.merchant_name, None);
    }

    #[test]
    fn test_items_keep_tax_flag_and_discounts_out_of_name() {
        let fields = ReceiptParser::new().parse("Shop\nApples 1.25 F\nCoupon -0.50\nTOTAL 0.75");
        assert_eq!(
            fields.items,
            vec![
                ReceiptItem { name: "Apples".into(), price: dec("1.25") },
                ReceiptItem { name: "Coupon".into(), price: dec("-0.50") },
            ]
        );
    }

    #[test]
    fn test_total_falls_back_to_items() {
        let fields = ReceiptParser::new().parse("Kiosk\nWater 1.50\nSnack 2.25");
        assert_eq!(fields.total_amount, Some(dec("3.75")));
    }

    #[test]
    fn test_payment_method_from_tender_line() {
        let fields = ReceiptParser::new().parse("Shop\nTOTAL 5.00\nVISA 5.00");
        assert_eq!(fields.payment_method.as_deref(), Some("CREDIT"));

        let fields = ReceiptParser::new().parse("Shop\nTOTAL 5.00\nCASH TENDERED 10.00");
        assert_eq!(fields.payment_method.as_deref(), Some("CASH"));
    }

    #[test]
    fn test_cashier_stops_at_padding() {
        let fields = ReceiptParser::new().parse("Cashier: Ann Lee     Register 4");
        assert_eq!(fields.cashier.as_deref(), Some("Ann Lee"));
    }

    #[test]
    fn test_unrecognizable_text_is_empty() {
        let fields = ReceiptParser::new().parse("~~ ## ~~");
        assert!(fields.is_empty());
    }

    #[test]
    fn test_oversized_amounts_do_not_panic() {
        let fields = ReceiptParser::new().parse(
            "Shop\nSubtotal 70000000000000000000000000000.00\nTax 70000000000000000000000000000.00",
        );
        assert_eq!(fields.merchant_name.as_deref(), Some("Shop"));
        assert!(fields.subtotal.is_some());
        assert_eq!(fields.total_amount, None);
    }
}
