//! QIF statement parser
//!
//! QIF records are line-oriented: each line carries a one-letter field code
//! (D date, T/U amount, P payee, M memo, N number, L category) and `^`
//! terminates a record. Dates come in several vintages, including the
//! `MM/DD'YY` apostrophe form.

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::normalize::parse_amount;
use crate::domain::result::Result;
use crate::domain::{BankProfile, ParseResult, ParsedTransaction, ParserConfig};
use crate::ports::StatementParser;

pub struct QifParser {
    config: ParserConfig,
}

impl QifParser {
    pub fn new() -> Self {
        Self {
            config: ParserConfig::new("qif", &["qif"], &["application/x-qif"]),
        }
    }
}

impl Default for QifParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser for QifParser {
    fn config(&self) -> &ParserConfig {
        &self.config
    }

    fn parse(&self, path: &Path, _profile: Option<&BankProfile>) -> Result<ParseResult> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(parse_qif_text(&text))
    }
}

#[derive(Default)]
struct Record {
    date: Option<String>,
    amount: Option<String>,
    payee: Option<String>,
    memo: Option<String>,
    number: Option<String>,
    category: Option<String>,
    seen_any: bool,
}

pub(crate) fn parse_qif_text(text: &str) -> ParseResult {
    let mut result = ParseResult::new();

    let mut account_type: Option<String> = None;
    let mut record = Record::default();
    let mut record_number = 0usize;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix("!Type:") {
            account_type = Some(header.trim().to_string());
            continue;
        }
        if line.starts_with('!') {
            continue;
        }
        if line == "^" {
            if record.seen_any {
                record_number += 1;
                match finish_record(std::mem::take(&mut record)) {
                    Ok(tx) => result.transactions.push(tx),
                    Err(problem) => result
                        .warnings
                        .push(format!("record {record_number}: {problem}")),
                }
            }
            record = Record::default();
            continue;
        }

        if !line.is_char_boundary(1) {
            continue;
        }
        let (code, value) = line.split_at(1);
        let value = value.trim();
        record.seen_any = true;
        match code {
            "D" => record.date = Some(value.to_string()),
            // U duplicates T in newer exports; either carries the amount
            "T" | "U" => record.amount = Some(value.to_string()),
            "P" => record.payee = Some(value.to_string()),
            "M" => record.memo = Some(value.to_string()),
            "N" => record.number = Some(value.to_string()),
            "L" => record.category = Some(value.to_string()),
            _ => {}
        }
    }

    // A trailing record without its ^ terminator still counts
    if record.seen_any {
        record_number += 1;
        match finish_record(record) {
            Ok(tx) => result.transactions.push(tx),
            Err(problem) => result
                .warnings
                .push(format!("record {record_number}: {problem}")),
        }
    }

    if record_number == 0 {
        return ParseResult::failed("no QIF records found");
    }

    result.set_meta("extraction_method", "qif");
    if let Some(account_type) = account_type {
        result.set_meta("account_type", account_type);
    }
    result
}

fn finish_record(record: Record) -> std::result::Result<ParsedTransaction, String> {
    let date_raw = record.date.ok_or("record has no date")?;
    let date = parse_qif_date(&date_raw).ok_or_else(|| format!("unparseable date '{date_raw}'"))?;

    let amount_raw = record.amount.ok_or("record has no amount")?;
    let amount: Decimal =
        parse_amount(&amount_raw).ok_or_else(|| format!("malformed amount '{amount_raw}'"))?;

    let description = record
        .payee
        .clone()
        .or_else(|| record.memo.clone())
        .ok_or("record has neither payee nor memo")?;

    let mut tx = ParsedTransaction::new(date, description, amount);
    tx.merchant = record.payee;
    tx.notes = record.memo;
    tx.reference = record.number;
    tx.category = record.category.clone();
    if let Some(category) = record.category {
        tx.raw_data.insert("qif_category".to_string(), category);
    }
    Ok(tx)
}

/// QIF date vintages: `MM/DD/YYYY`, `MM/DD'YY` (apostrophe years 2000+),
/// `DD/MM/YYYY` and ISO
fn parse_qif_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim().replace(' ', "");

    if let Some((head, year)) = s.split_once('\'') {
        let parts: Vec<&str> = head.split('/').collect();
        if parts.len() == 2 {
            let m: u32 = parts[0].parse().ok()?;
            let d: u32 = parts[1].parse().ok()?;
            let yy: i32 = year.parse().ok()?;
            return NaiveDate::from_ymd_opt(2000 + yy, m, d);
        }
        return None;
    }

    for fmt in ["%m/%d/%Y", "%d/%m/%Y", "%m/%d/%y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(&s, fmt) {
            return Some(date);
        }
    }
    None
}
