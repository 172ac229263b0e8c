//! Amount parsing for locale-formatted and canonical decimals.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::models::record::NumberFormat;

/// Parse a "thousands-dot, decimal-comma" amount (e.g. "1.234,56").
///
/// Thousands separators are removed and the decimal comma becomes a point
/// before parsing, so "1.234,56" yields 1234.56 and "1.500" yields 1500.
pub fn parse_locale_amount(s: &str) -> Option<Decimal> {
    let normalized = s.trim().replace('.', "").replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    Decimal::from_str(&normalized).ok()
}

/// Parse a dot-decimal amount without grouping (e.g. "1234.56").
pub fn parse_canonical_amount(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

/// Parse an amount written in the given format.
pub fn parse_amount(s: &str, format: NumberFormat) -> Option<Decimal> {
    match format {
        NumberFormat::Locale => parse_locale_amount(s),
        NumberFormat::Canonical => parse_canonical_amount(s),
    }
}

/// Format an amount in locale style (1.234,56).
pub fn format_locale_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount);
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };
    let Some((integer_part, decimal_part)) = digits.split_once('.') else {
        return s;
    };

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    format!("{}{},{}", sign, formatted, decimal_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_locale_amount() {
        assert_eq!(parse_locale_amount("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_locale_amount("234,56"), Some(dec("234.56")));
        assert_eq!(parse_locale_amount("12.345.678,90"), Some(dec("12345678.90")));
        assert_eq!(parse_locale_amount("1.500"), Some(dec("1500")));
        assert_eq!(parse_locale_amount(" 150 "), Some(dec("150")));
    }

    #[test]
    fn test_parse_locale_amount_rejects_garbage() {
        assert_eq!(parse_locale_amount(""), None);
        assert_eq!(parse_locale_amount("R$"), None);
        assert_eq!(parse_locale_amount("12,3,4"), None);
    }

    #[test]
    fn test_parse_canonical_amount() {
        assert_eq!(parse_canonical_amount("1234.56"), Some(dec("1234.56")));
        assert_eq!(parse_canonical_amount("10.0000"), Some(dec("10")));
        assert_eq!(parse_canonical_amount("1,5"), None);
    }

    #[test]
    fn test_format_locale_amount() {
        assert_eq!(format_locale_amount(dec("1234.56")), "1.234,56");
        assert_eq!(format_locale_amount(dec("12345678.9")), "12.345.678,90");
        assert_eq!(format_locale_amount(dec("5")), "5,00");
        assert_eq!(format_locale_amount(dec("-1000")), "-1.000,00");
    }
}
