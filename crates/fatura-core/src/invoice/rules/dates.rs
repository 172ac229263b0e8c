//! Date parsing and formatting for invoice fields.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime};

/// Day/month/year format stored in the ledger.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Parse a "dd/mm/yyyy" date. Day and month may have one or two digits.
pub fn parse_dmy(s: &str) -> Option<NaiveDate> {
    let mut parts = s.trim().split('/');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let year_str = parts.next()?.trim();
    if parts.next().is_some() || year_str.len() != 4 {
        return None;
    }
    let year: i32 = year_str.parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Format a date as "dd/mm/yyyy".
pub fn format_dmy(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse an ISO-8601 timestamp and keep its calendar date.
///
/// Accepts full RFC 3339 timestamps ("2024-02-15T10:30:00-03:00"),
/// timestamps without offset, and plain dates. The date is taken in the
/// timestamp's own offset.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Last calendar day of the date's month.
///
/// Day 28 plus four days always lands in the following month; stepping back
/// by that date's day-of-month returns the last day of the original month.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let day_28 = date.with_day(28).unwrap_or(date);
    let next_month = day_28 + Days::new(4);
    next_month - Days::new(u64::from(next_month.day()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_dmy() {
        assert_eq!(parse_dmy("15/02/2024"), Some(ymd(2024, 2, 15)));
        assert_eq!(parse_dmy("1/2/2024"), Some(ymd(2024, 2, 1)));
        assert_eq!(parse_dmy("31/02/2024"), None);
        assert_eq!(parse_dmy("15/02/24"), None);
        assert_eq!(parse_dmy("15/02/2024/1"), None);
        assert_eq!(parse_dmy("abc"), None);
    }

    #[test]
    fn test_format_dmy_pads() {
        assert_eq!(format_dmy(ymd(2024, 2, 1)), "01/02/2024");
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_iso_date("2024-02-15T10:30:00-03:00"), Some(ymd(2024, 2, 15)));
        assert_eq!(parse_iso_date("2023-12-31T23:59:59+00:00"), Some(ymd(2023, 12, 31)));
        assert_eq!(parse_iso_date("2024-02-15T10:30:00"), Some(ymd(2024, 2, 15)));
        assert_eq!(parse_iso_date("2024-02-15"), Some(ymd(2024, 2, 15)));
        assert_eq!(parse_iso_date("15/02/2024"), None);
    }

    #[test]
    fn test_month_end() {
        assert_eq!(month_end(ymd(2024, 2, 15)), ymd(2024, 2, 29));
        assert_eq!(month_end(ymd(2023, 2, 1)), ymd(2023, 2, 28));
        assert_eq!(month_end(ymd(2023, 4, 10)), ymd(2023, 4, 30));
        assert_eq!(month_end(ymd(2023, 12, 31)), ymd(2023, 12, 31));
        assert_eq!(month_end(ymd(2024, 1, 30)), ymd(2024, 1, 31));
    }
}
