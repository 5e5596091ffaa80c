//! Display (`dd/mm/yyyy`) and transmission (`yyyy-mm-dd`) date formats

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 9999;

fn display_regex() -> &'static Regex {
    static DISPLAY: OnceLock<Regex> = OnceLock::new();
    DISPLAY.get_or_init(|| Regex::new(r"^([0-9]{2})/([0-9]{2})/([0-9]{4})$").expect("display date regex"))
}

fn iso_regex() -> &'static Regex {
    static ISO: OnceLock<Regex> = OnceLock::new();
    ISO.get_or_init(|| Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").expect("iso date regex"))
}

fn in_range(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse an exact `dd/mm/yyyy` string into a calendar date (years 1900..=9999)
pub fn parse_display(value: &str) -> Option<NaiveDate> {
    let caps = display_regex().captures(value)?;
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    in_range(year, month, day)
}

/// Parse an exact `yyyy-mm-dd` string into a calendar date (years 1900..=9999)
pub fn parse_iso(value: &str) -> Option<NaiveDate> {
    let caps = iso_regex().captures(value)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    in_range(year, month, day)
}

/// True iff `value` is exactly `dd/mm/yyyy` and names a real calendar day
pub fn is_valid_date_ddmmyyyy(value: &str) -> bool {
    parse_display(value).is_some()
}

pub fn format_display(date: NaiveDate) -> String {
    format!("{:02}/{:02}/{:04}", date.day(), date.month(), date.year())
}

pub fn format_iso(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// `dd/mm/yyyy` to `yyyy-mm-dd`; `None` unless the input is a valid display date
pub fn display_to_iso(value: &str) -> Option<String> {
    parse_display(value.trim()).map(format_iso)
}

/// `yyyy-mm-dd` to `dd/mm/yyyy`; `None` unless the input is a valid ISO date
pub fn iso_to_display(value: &str) -> Option<String> {
    parse_iso(value.trim()).map(format_display)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leap_years() {
        assert!(is_valid_date_ddmmyyyy("29/02/2024"));
        assert!(!is_valid_date_ddmmyyyy("29/02/2023"));
        assert!(is_valid_date_ddmmyyyy("29/02/2000"));
        assert!(!is_valid_date_ddmmyyyy("29/02/1900"));
    }

    #[test]
    fn test_month_lengths_and_bounds() {
        assert!(!is_valid_date_ddmmyyyy("31/04/2020"));
        assert!(is_valid_date_ddmmyyyy("30/04/2020"));
        assert!(!is_valid_date_ddmmyyyy("00/01/2020"));
        assert!(!is_valid_date_ddmmyyyy("01/13/2020"));
        assert!(!is_valid_date_ddmmyyyy("01/01/1899"));
        assert!(is_valid_date_ddmmyyyy("01/01/1900"));
        assert!(is_valid_date_ddmmyyyy("31/12/9999"));
    }

    #[test]
    fn test_only_ascii_digits() {
        assert!(!is_valid_date_ddmmyyyy("١٥/٠٣/٢٠٢٤"));
        assert_eq!(iso_to_display("٢٠٢٤-٠٣-١٥"), None);
    }

    #[test]
    fn test_shape_is_exact() {
        assert!(!is_valid_date_ddmmyyyy("1/1/2020"));
        assert!(!is_valid_date_ddmmyyyy(" 01/01/2020"));
        assert!(!is_valid_date_ddmmyyyy("01-01-2020"));
        assert!(!is_valid_date_ddmmyyyy("01/01/20201"));
        assert!(!is_valid_date_ddmmyyyy(""));
    }

    #[test]
    fn test_round_trip_through_iso() {
        for display in ["01/01/1900", "29/02/2024", "15/08/1947", "31/12/9999"] {
            let iso = display_to_iso(display).unwrap();
            assert_eq!(iso_to_display(&iso).unwrap(), display);
        }
        assert_eq!(display_to_iso("15/01/2024").as_deref(), Some("2024-01-15"));
        assert_eq!(display_to_iso("31/02/2024"), None);
    }
}
