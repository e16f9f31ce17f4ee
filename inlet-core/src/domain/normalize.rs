//! Shared amount and date normalization used by every statement parser.
//!
//! Amount rule: currency symbols and thousands separators are stripped,
//! parentheses and trailing minus mean negative, and the result is rounded
//! to 2 fractional digits (banker's rounding). Date rule: configured formats
//! are tried in order, ISO first; the first format that fully consumes the
//! input wins.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Date formats tried when a profile supplies none.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%m/%d/%y",
];

/// Parse a dot-decimal amount string into a 2-dp decimal.
///
/// Handles `$1,234.56`, `(25.50)` (negative), `-42.50`, `42.50-` (trailing
/// sign) and quoted CSV leftovers. Returns `None` for malformed input.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let s = raw.trim().trim_matches('"').trim();
    if s.is_empty() {
        return None;
    }

    // Parentheses notation for negatives: (100.00) -> -100.00
    let (paren_negative, s) = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, s),
    };

    // Trailing sign: 42.50- -> -42.50
    let (trailing_negative, s) = match s.strip_suffix('-') {
        Some(head) => (true, head.trim()),
        None => (false, s),
    };

    // Strip currency symbols, thousands separators, whitespace
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-' || *c == '+')
        .collect();
    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let mut amount: Decimal = cleaned.trim_start_matches('+').parse().ok()?;
    if (paren_negative || trailing_negative) && amount > Decimal::ZERO {
        amount = -amount;
    }

    Some(round_amount(amount))
}

/// Round an amount to 2 fractional digits (banker's rounding).
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// Parse a date by trying `formats` in order; falls back to the defaults
/// when the slice is empty. A format must fully consume the input to match.
pub fn parse_date(raw: &str, formats: &[String]) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if formats.is_empty() {
        for fmt in DEFAULT_DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                return Some(date);
            }
        }
        return None;
    }

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount_plain() {
        assert_eq!(parse_amount("42.50"), Some(dec("42.50")));
        assert_eq!(parse_amount("-42.50"), Some(dec("-42.50")));
        assert_eq!(parse_amount("0"), Some(dec("0")));
    }

    #[test]
    fn test_parse_amount_currency_and_thousands() {
        assert_eq!(parse_amount("$1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("-$50.00"), Some(dec("-50.00")));
        assert_eq!(parse_amount("\"2,000.00\""), Some(dec("2000.00")));
    }

    #[test]
    fn test_parse_amount_parenthesized_negative() {
        assert_eq!(parse_amount("(25.50)"), Some(dec("-25.50")));
        assert_eq!(parse_amount("($1,234.56)"), Some(dec("-1234.56")));
    }

    #[test]
    fn test_parse_amount_trailing_sign() {
        assert_eq!(parse_amount("42.50-"), Some(dec("-42.50")));
    }

    #[test]
    fn test_parse_amount_rounds_to_two_digits() {
        // Banker's rounding: 2.345 -> 2.34, 2.355 -> 2.36
        assert_eq!(parse_amount("2.345"), Some(dec("2.34")));
        assert_eq!(parse_amount("2.355"), Some(dec("2.36")));
    }

    #[test]
    fn test_parse_amount_malformed() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount("--"), None);
    }

    #[test]
    fn test_parse_date_iso_first() {
        assert_eq!(
            parse_date("2025-01-15", &[]),
            NaiveDate::from_ymd_opt(2025, 1, 15)
        );
        assert_eq!(
            parse_date("01/15/2025", &[]),
            NaiveDate::from_ymd_opt(2025, 1, 15)
        );
    }

    #[test]
    fn test_parse_date_profile_formats_win() {
        // With a DMY-only profile, 03/04/2025 is April 3rd
        let formats = vec!["%d/%m/%Y".to_string()];
        assert_eq!(
            parse_date("03/04/2025", &formats),
            NaiveDate::from_ymd_opt(2025, 4, 3)
        );
    }

    #[test]
    fn test_parse_date_invalid() {
        assert_eq!(parse_date("not a date", &[]), None);
        assert_eq!(parse_date("2025-13-40", &[]), None);
    }
}
