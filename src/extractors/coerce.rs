// src/extractors/coerce.rs

// --- Imports ---
use crate::grid::Cell;
use crate::utils::error::CoerceError;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

// Largest magnitude an f64 holds without skipping integers (2^53).
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

// --- Date Formats ---
// Full dates, tried in order with chrono.
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

// Month-only shapes, pinned to the first of the month.
static YEAR_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})[-/](\d{1,2})$").expect("Failed to compile YEAR_MONTH_RE")
});
static MONTH_YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{4})$").expect("Failed to compile MONTH_YEAR_RE")
});
static MONTH_NAME_YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]+)\.?\s+(\d{4})$").expect("Failed to compile MONTH_NAME_YEAR_RE")
});

/// Coerces a cell to a finite number. Text is trimmed and parsed.
pub fn to_number(cell: &Cell) -> Result<f64, CoerceError> {
    match cell {
        Cell::Empty => Err(CoerceError::Empty),
        Cell::Numeric(n) if n.is_finite() => Ok(*n),
        Cell::Numeric(n) => Err(CoerceError::NotNumeric(n.to_string())),
        Cell::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(CoerceError::Empty);
            }
            match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(n),
                _ => Err(CoerceError::NotNumeric(trimmed.to_string())),
            }
        }
    }
}

/// Coerces a cell to a whole count. Fractional values are rejected.
///
/// Integer text is parsed exactly; anything that goes through `f64` must
/// stay within 2^53 so no count is silently rounded.
pub fn to_count(cell: &Cell) -> Result<i64, CoerceError> {
    if let Cell::Text(s) = cell {
        if let Ok(n) = s.trim().parse::<i64>() {
            return Ok(n);
        }
    }
    let n = to_number(cell)?;
    if n.fract() != 0.0 {
        return Err(CoerceError::NotInteger(n));
    }
    if n.abs() > MAX_EXACT_FLOAT_INT {
        return Err(CoerceError::OutOfRange(n));
    }
    Ok(n as i64)
}

/// Parses a text cell as a date. Numeric cells are never treated as dates.
pub fn to_date(cell: &Cell) -> Result<NaiveDateTime, CoerceError> {
    match cell {
        Cell::Empty => Err(CoerceError::Empty),
        Cell::Numeric(n) => Err(CoerceError::NotText(*n)),
        Cell::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(CoerceError::Empty);
            }
            parse_date_text(trimmed).ok_or_else(|| CoerceError::NotDate(trimmed.to_string()))
        }
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, format) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    if let Some(caps) = YEAR_MONTH_RE.captures(text) {
        return first_of_month(caps[1].parse().ok()?, caps[2].parse().ok()?);
    }
    if let Some(caps) = MONTH_YEAR_RE.captures(text) {
        return first_of_month(caps[2].parse().ok()?, caps[1].parse().ok()?);
    }
    if let Some(caps) = MONTH_NAME_YEAR_RE.captures(text) {
        return first_of_month(caps[2].parse().ok()?, month_from_name(&caps[1])?);
    }
    None
}

fn first_of_month(year: i32, month: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
}

fn month_from_name(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january", "february", "march", "april", "may", "june",
        "july", "august", "september", "october", "november", "december",
    ];
    let lower = name.to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| *m == lower || (lower.len() == 3 && m.starts_with(&lower)))
        .map(|i| i as u32 + 1)
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_to_count() {
        assert_eq!(to_count(&Cell::Numeric(100.0)), Ok(100));
        assert_eq!(to_count(&text(" 200 ")), Ok(200));
        assert_eq!(to_count(&text("N/A")), Err(CoerceError::NotNumeric("N/A".into())));
        assert_eq!(to_count(&Cell::Empty), Err(CoerceError::Empty));
        assert_eq!(to_count(&text("   ")), Err(CoerceError::Empty));
        assert_eq!(to_count(&Cell::Numeric(2.5)), Err(CoerceError::NotInteger(2.5)));
    }

    #[test]
    fn test_to_count_never_rounds_or_saturates() {
        assert_eq!(to_count(&text("9007199254740993")), Ok(9_007_199_254_740_993));
        assert_eq!(to_count(&text("-42")), Ok(-42));
        assert_eq!(
            to_count(&text("9223372036854775808")),
            Err(CoerceError::OutOfRange(9_223_372_036_854_775_808.0))
        );
        assert_eq!(to_count(&Cell::Numeric(9_007_199_254_740_992.0)), Ok(9_007_199_254_740_992));
        assert!(matches!(
            to_count(&Cell::Numeric(1e16)),
            Err(CoerceError::OutOfRange(_))
        ));
        assert_eq!(to_count(&text("1e3")), Ok(1000));
    }

    #[test]
    fn test_to_number_rejects_non_finite() {
        assert_eq!(to_number(&text("3.25")), Ok(3.25));
        assert!(to_number(&text("NaN")).is_err());
        assert!(to_number(&Cell::Numeric(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_to_date_formats() {
        assert_eq!(to_date(&text("2020-01-15")), Ok(ymd(2020, 1, 15)));
        assert_eq!(to_date(&text("2020/01/15")), Ok(ymd(2020, 1, 15)));
        assert_eq!(to_date(&text("01/15/2020")), Ok(ymd(2020, 1, 15)));
        assert_eq!(to_date(&text("2020-01")), Ok(ymd(2020, 1, 1)));
        assert_eq!(to_date(&text("03/2020")), Ok(ymd(2020, 3, 1)));
        assert_eq!(to_date(&text("February 2020")), Ok(ymd(2020, 2, 1)));
        assert_eq!(to_date(&text("Feb 2020")), Ok(ymd(2020, 2, 1)));
        assert_eq!(
            to_date(&text("2020-01-15 08:30:00")),
            Ok(NaiveDate::from_ymd_opt(2020, 1, 15).unwrap().and_hms_opt(8, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_to_date_failures() {
        assert_eq!(to_date(&Cell::Empty), Err(CoerceError::Empty));
        assert_eq!(to_date(&Cell::Numeric(43831.0)), Err(CoerceError::NotText(43831.0)));
        assert_eq!(to_date(&text("Total")), Err(CoerceError::NotDate("Total".into())));
        assert!(to_date(&text("2020-13")).is_err());
        assert!(to_date(&text("Ma 2020")).is_err());
    }
}
