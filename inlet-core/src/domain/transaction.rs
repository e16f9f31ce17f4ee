//! Normalized statement transaction model

use std::collections::BTreeMap;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::normalize::round_amount;

/// One normalized statement line, parser-agnostic.
///
/// Sign convention: negative amounts are outflows. `amount` is always a
/// 2-dp decimal after construction; `date` is always a fully resolved
/// calendar date (`year_inferred` marks dates whose year came from
/// statement context rather than the line itself).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub merchant: Option<String>,
    pub category: Option<String>,
    pub account: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    /// True when the year was taken from the statement period, not the line
    pub year_inferred: bool,
    /// Original fields as extracted, for audit
    pub raw_data: BTreeMap<String, String>,
}

impl ParsedTransaction {
    /// Create a transaction with the required fields; rounds the amount
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date,
            description: description.into(),
            amount: round_amount(amount),
            merchant: None,
            category: None,
            account: None,
            reference: None,
            notes: None,
            year_inferred: false,
            raw_data: BTreeMap::new(),
        }
    }

    /// Stable hash over date, amount and normalized description.
    ///
    /// Used for re-import protection and by repository adapters; 16 hex chars.
    pub fn fingerprint(&self) -> String {
        let date = self.date.format("%Y-%m-%d").to_string();

        // Treat -0 as 0
        let amount = if self.amount == Decimal::ZERO {
            Decimal::ZERO
        } else {
            self.amount
        };

        let input = format!(
            "{}|{:.2}|{}",
            date,
            amount,
            normalize_description(&self.description)
        );

        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..8])
    }
}

/// Normalize a description for fingerprinting and similarity comparison:
/// lowercase, card-mask and account-number collapse, alphanumeric only.
pub fn normalize_description(desc: &str) -> String {
    let desc = desc.to_lowercase();

    // Remove card number masks (10+ X's followed by 4 digits)
    let card_mask_re = Regex::new(r"x{10,}\d{4}").unwrap();
    let mut normalized = card_mask_re.replace_all(&desc, "").to_string();

    // Normalize account/phone numbers (7-12 chars of X's and digits)
    // to their last 4 digits
    let account_re = Regex::new(r"[x0-9]{7,12}").unwrap();
    normalized = account_re
        .replace_all(&normalized, |caps: &regex::Captures| {
            let text = caps.get(0).unwrap().as_str();
            let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.len() >= 4 {
                digits[digits.len() - 4..].to_string()
            } else {
                text.to_string()
            }
        })
        .to_string();

    // Keep only alphanumeric characters
    normalized.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParsedTransaction {
        ParsedTransaction::new(
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            "ACME STORE",
            Decimal::new(-5000, 2), // -50.00
        )
    }

    #[test]
    fn test_new_rounds_amount() {
        let tx = ParsedTransaction::new(
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            "X",
            Decimal::new(12345, 3), // 12.345
        );
        assert_eq!(tx.amount, Decimal::new(1234, 2)); // 12.34 (banker's)
    }

    #[test]
    fn test_fingerprint_stable() {
        let a = sample();
        let b = sample();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
    }

    #[test]
    fn test_fingerprint_ignores_whitespace_and_case() {
        let mut a = sample();
        let mut b = sample();
        a.description = "Acme   Store".to_string();
        b.description = "ACME STORE".to_string();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_differs_on_amount() {
        let a = sample();
        let mut b = sample();
        b.amount = Decimal::new(-5001, 2);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_description_normalization() {
        assert!(!normalize_description("PURCHASE XXXXXXXXXXXX1234 STORE").contains("xxxx"));
        let normalized = normalize_description("PAYMENT 7208987070");
        assert!(normalized.contains("7070"));
        assert!(!normalized.contains("7208987070"));
    }
}
