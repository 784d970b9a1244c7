//! Purchase date and time extraction.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::patterns::{DATE_DMY, DATE_MDY, DATE_YMD, TIME};
use super::{ExtractionMatch, FieldExtractor};

/// Date field extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    /// All dates in order of appearance.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        // MM/DD/YYYY, falling back to DD/MM/YYYY when the month is out of range
        for caps in DATE_MDY.captures_iter(text) {
            let first: u32 = caps[1].parse().unwrap_or(0);
            let second: u32 = caps[2].parse().unwrap_or(0);
            let year = parse_year(&caps[3]);

            let date = NaiveDate::from_ymd_opt(year, first, second)
                .or_else(|| NaiveDate::from_ymd_opt(year, second, first));
            push(&mut results, date, caps.get(0));
        }

        // YYYY-MM-DD
        for caps in DATE_YMD.captures_iter(text) {
            let year: i32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let day: u32 = caps[3].parse().unwrap_or(0);
            push(&mut results, NaiveDate::from_ymd_opt(year, month, day), caps.get(0));
        }

        // DD.MM.YYYY
        for caps in DATE_DMY.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let year: i32 = caps[3].parse().unwrap_or(0);
            push(&mut results, NaiveDate::from_ymd_opt(year, month, day), caps.get(0));
        }

        results.sort_by_key(|m| m.position.map(|(start, _)| start).unwrap_or(usize::MAX));
        results
    }
}

fn push(
    results: &mut Vec<ExtractionMatch<NaiveDate>>,
    date: Option<NaiveDate>,
    full: Option<regex::Match<'_>>,
) {
    if let (Some(date), Some(full)) = (date, full) {
        results.push(
            ExtractionMatch::new(date, full.as_str()).with_position(full.start(), full.end()),
        );
    }
}

/// Extract the purchase timestamp.
///
/// Takes the first date in the text. The time is read from the same line
/// when present, else from the first time anywhere, else midnight.
pub fn extract_purchased_at(text: &str) -> Option<NaiveDateTime> {
    let date = DateExtractor::new().extract(text)?;

    let line = date
        .position
        .map(|(start, end)| line_around(text, start, end))
        .unwrap_or_default();
    let time = extract_time(line)
        .or_else(|| extract_time(text))
        .unwrap_or(NaiveTime::MIN);

    Some(date.value.and_time(time))
}

/// First `HH:MM[:SS] [AM|PM]` in the text.
pub fn extract_time(text: &str) -> Option<NaiveTime> {
    TIME.captures_iter(text).find_map(|caps| {
        let mut hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        let second: u32 = caps.get(3).and_then(|s| s.as_str().parse().ok()).unwrap_or(0);

        if let Some(meridiem) = caps.get(4) {
            if hour == 0 || hour > 12 {
                return None;
            }
            let pm = meridiem.as_str().eq_ignore_ascii_case("pm");
            if pm && hour < 12 {
                hour += 12;
            } else if !pm && hour == 12 {
                hour = 0;
            }
        }

        NaiveTime::from_hms_opt(hour, minute, second)
    })
}

fn line_around(text: &str, start: usize, end: usize) -> &str {
    let line_start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = text[end..].find('\n').map(|i| end + i).unwrap_or(text.len());
    &text[line_start..line_end]
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        if year <= 50 { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_extract_date_mdy() {
        let result = DateExtractor::new().extract("Date: 11/15/2023").unwrap();
        assert_eq!(result.value, date(2023, 11, 15));
    }

    #[test]
    fn test_extract_date_mdy_falls_back_to_dmy() {
        let result = DateExtractor::new().extract("25/12/2023").unwrap();
        assert_eq!(result.value, date(2023, 12, 25));
    }

    #[test]
    fn test_extract_date_ymd() {
        let result = DateExtractor::new().extract("2024-01-15").unwrap();
        assert_eq!(result.value, date(2024, 1, 15));
    }

    #[test]
    fn test_extract_date_dmy() {
        let result = DateExtractor::new().extract("15.01.2024").unwrap();
        assert_eq!(result.value, date(2024, 1, 15));
    }

    #[test]
    fn test_two_digit_year() {
        let result = DateExtractor::new().extract("01/15/24").unwrap();
        assert_eq!(result.value, date(2024, 1, 15));
    }

    #[test]
    fn test_dates_in_order_of_appearance() {
        let all = DateExtractor::new().extract_all("Printed 2024-02-01\nSold 01/31/2024");
        let values: Vec<NaiveDate> = all.iter().map(|m| m.value).collect();
        assert_eq!(values, vec![date(2024, 2, 1), date(2024, 1, 31)]);
    }

    #[test]
    fn test_extract_time() {
        assert_eq!(extract_time("14:05"), NaiveTime::from_hms_opt(14, 5, 0));
        assert_eq!(extract_time("2:05:09 PM"), NaiveTime::from_hms_opt(14, 5, 9));
        assert_eq!(extract_time("12:30 am"), NaiveTime::from_hms_opt(0, 30, 0));
        assert_eq!(extract_time("no time here"), None);
    }

    #[test]
    fn test_purchased_at_uses_time_on_date_line() {
        let text = "Opened 08:00\nDate: 11/15/2023 3:42 PM";
        let at = extract_purchased_at(text).unwrap();
        assert_eq!(at, date(2023, 11, 15).and_hms_opt(15, 42, 0).unwrap());
    }

    #[test]
    fn test_purchased_at_defaults_to_midnight() {
        let at = extract_purchased_at("Date: 2023-11-15").unwrap();
        assert_eq!(at, date(2023, 11, 15).and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn test_no_date() {
        assert!(extract_purchased_at("TOTAL 12.00").is_none());
    }
}
