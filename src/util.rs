// Utility helpers for parsing and basic statistics.
//
// This module centralizes all the "dirty" cell handling so the rest of the
// pipeline can work with typed `Option` values, where `None` means unknown.
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};
use std::cmp::Ordering;

/// Date layouts accepted for `PlantDate`, tried in order. The two-digit
/// year form must come before `%m/%d/%Y`, which would read `24` as 0024.
const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%d %B %Y",
    "%d.%m.%Y",
];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
/// Plant dates before this year are typos or truncated years, not data.
const MIN_PLANT_YEAR: i32 = 1900;

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports.
///
/// - Trims whitespace.
/// - Strips thousands separators like `","` before parsing.
/// - Accepts scientific notation (`2E+02`), as spreadsheet exports write it.
/// - Returns `None` for anything that cannot be safely parsed, including
///   `NaN` and infinities.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer cells often come out of a workbook as `2024.0`; accept those but
/// reject real fractions.
pub fn parse_i64_safe(s: Option<&str>) -> Option<i64> {
    let v = parse_f64_safe(s)?;
    if v.fract() != 0.0 || v.abs() > i64::MAX as f64 {
        return None;
    }
    Some(v as i64)
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
        .filter(|d| d.year() >= MIN_PLANT_YEAR)
}

/// Trimmed text, or `None` when the cell is blank.
pub fn parse_text(s: Option<&str>) -> Option<String> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Arithmetic mean; `None` for an empty slice instead of NaN.
pub fn mean(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

/// Round half to even at `decimals` places, the rounding the published
/// report tables use.
pub fn round_to(n: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (n * factor).round_ties_even() / factor
}

/// Order two optional keys with unknown values sorting after every known
/// one.
pub fn cmp_none_last<T: PartialOrd>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    if !n.is_finite() {
        return "-".to_string();
    }
    let s = format!("{:.*}", decimals, n.abs());
    let neg = n.is_sign_negative() && s.chars().any(|c| c != '0' && c != '.');
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in console messages
    // (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

// `tabled` display adapters for optional cells.

pub fn display_f64(v: &f64) -> String {
    format_number(*v, 2)
}

pub fn display_opt_f64(v: &Option<f64>) -> String {
    v.map(|v| format_number(v, 2)).unwrap_or_else(|| "-".to_string())
}

pub fn display_opt_date(v: &Option<NaiveDate>) -> String {
    v.map(|d| d.to_string()).unwrap_or_else(|| "unknown".to_string())
}

pub fn display_opt_str(v: &Option<String>) -> String {
    v.clone().unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_coerced_or_unknown() {
        assert_eq!(parse_f64_safe(Some(" 1,250.5 ")), Some(1250.5));
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("2E+02")), Some(200.0));
        assert_eq!(parse_f64_safe(Some("1.5e2")), Some(150.0));
        assert_eq!(parse_f64_safe(Some("NaN")), None);
        assert_eq!(parse_f64_safe(Some("inf")), None);
        assert_eq!(parse_f64_safe(Some("-infinity")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
        assert_eq!(parse_i64_safe(Some("2024.0")), Some(2024));
        assert_eq!(parse_i64_safe(Some("12.5")), None);
    }

    #[test]
    fn dates_accept_common_export_layouts() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        assert_eq!(parse_date_safe(Some("2024-03-06")), Some(d));
        assert_eq!(parse_date_safe(Some("2024-03-06 00:00:00")), Some(d));
        assert_eq!(parse_date_safe(Some("03/06/2024")), Some(d));
        assert_eq!(parse_date_safe(Some("06-Mar-2024")), Some(d));
        assert_eq!(parse_date_safe(Some("yesterday")), None);
    }

    #[test]
    fn two_digit_years_are_not_read_as_year_24() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        assert_eq!(parse_date_safe(Some("3/6/24")), Some(d));
        assert_eq!(parse_date_safe(Some("3/6/2024")), Some(d));
        assert_eq!(parse_date_safe(Some("0024-03-06")), None);
    }

    #[test]
    fn mean_of_nothing_is_unknown() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
    }

    #[test]
    fn rounding_and_formatting() {
        assert_eq!(round_to(3.9104, 1), 3.9);
        assert_eq!(round_to(977.6, 0), 978.0);
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(format_number(48880.0, 0), "48,880");
        assert_eq!(format_number(-1234.567, 2), "-1,234.57");
        assert_eq!(format_number(-0.001, 1), "0.0");
        assert_eq!(format_int(9855usize), "9,855");
    }

    #[test]
    fn unknown_keys_sort_last() {
        let mut v = vec![None, Some(3), Some(1), None, Some(2)];
        v.sort_by(cmp_none_last);
        assert_eq!(v, vec![Some(1), Some(2), Some(3), None, None]);
    }
}
