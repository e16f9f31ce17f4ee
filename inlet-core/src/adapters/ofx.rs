//! OFX / QFX statement parser
//!
//! OFX is SGML-flavored: tags open values on the same line and aggregate
//! tags group records. A streaming line tokenizer collects `<STMTTRN>`
//! blocks and maps the known tags (DTPOSTED, TRNAMT, NAME, MEMO, FITID,
//! CHECKNUM) onto the shared transaction model.

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::normalize::{parse_amount, round_amount};
use crate::domain::result::Result;
use crate::domain::{BankProfile, ParseResult, ParsedTransaction, ParserConfig};
use crate::ports::StatementParser;

pub struct OfxParser {
    config: ParserConfig,
}

impl OfxParser {
    pub fn new() -> Self {
        Self {
            config: ParserConfig::new("ofx", &["ofx", "qfx"], &["application/x-ofx"]),
        }
    }
}

impl Default for OfxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser for OfxParser {
    fn config(&self) -> &ParserConfig {
        &self.config
    }

    fn parse(&self, path: &Path, _profile: Option<&BankProfile>) -> Result<ParseResult> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(parse_ofx_text(&text))
    }
}

/// Fields accumulated for one `<STMTTRN>` block
#[derive(Default)]
struct BuildingTrx {
    fit_id: Option<String>,
    date: Option<NaiveDate>,
    amount: Option<Decimal>,
    name: Option<String>,
    memo: Option<String>,
    check_number: Option<String>,
    trn_type: Option<String>,
}

pub(crate) fn parse_ofx_text(text: &str) -> ParseResult {
    let mut result = ParseResult::new();

    if !text.to_uppercase().contains("<OFX>") {
        return ParseResult::failed("no <OFX> envelope found");
    }

    let mut in_stmttrn = false;
    let mut current: Option<BuildingTrx> = None;
    let mut block_count = 0usize;

    for line in text.lines() {
        let line = line.trim();
        let Some(tag) = line.strip_prefix('<') else {
            continue;
        };
        let (tag_name, value) = match tag.split_once('>') {
            Some((name, rest)) => (name.trim().to_uppercase(), non_empty(rest)),
            None => (tag.trim_end_matches('>').trim().to_uppercase(), None),
        };

        match tag_name.as_str() {
            "STMTTRN" => {
                in_stmttrn = true;
                block_count += 1;
                current = Some(BuildingTrx::default());
            }
            "/STMTTRN" => {
                if let Some(trx) = current.take() {
                    match finish_transaction(trx) {
                        Ok(tx) => result.transactions.push(tx),
                        Err(problem) => result
                            .warnings
                            .push(format!("transaction {block_count}: {problem}")),
                    }
                }
                in_stmttrn = false;
            }
            "DTSTART" => {
                if let Some(v) = value.as_deref().and_then(parse_ofx_date) {
                    result.set_meta("statement_start", v.to_string());
                }
            }
            "DTEND" => {
                if let Some(v) = value.as_deref().and_then(parse_ofx_date) {
                    result.set_meta("statement_end", v.to_string());
                }
            }
            "ACCTID" => {
                if let Some(v) = value {
                    result.set_meta("account_number", v);
                }
            }
            "CURDEF" => {
                if let Some(v) = value {
                    result.set_meta("currency", v);
                }
            }
            _ if in_stmttrn => {
                if let Some(trx) = current.as_mut() {
                    match tag_name.as_str() {
                        "FITID" => trx.fit_id = value,
                        "DTPOSTED" => trx.date = value.as_deref().and_then(parse_ofx_date),
                        "TRNAMT" => trx.amount = value.as_deref().and_then(parse_amount),
                        "NAME" => trx.name = value,
                        "MEMO" => trx.memo = value,
                        "CHECKNUM" => trx.check_number = value,
                        "TRNTYPE" => trx.trn_type = value,
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    result.set_meta("extraction_method", "ofx");
    result
}

fn finish_transaction(trx: BuildingTrx) -> std::result::Result<ParsedTransaction, String> {
    let date = trx.date.ok_or("missing or unparseable DTPOSTED")?;
    let amount = trx.amount.ok_or("missing or unparseable TRNAMT")?;
    let description = match (&trx.name, &trx.memo) {
        (Some(name), _) => name.clone(),
        (None, Some(memo)) => memo.clone(),
        (None, None) => return Err("transaction has neither NAME nor MEMO".to_string()),
    };

    let mut tx = ParsedTransaction::new(date, description, round_amount(amount));
    tx.merchant = trx.name.clone();
    tx.notes = trx.memo.clone();
    tx.reference = trx.fit_id.clone().or(trx.check_number.clone());

    if let Some(fit_id) = trx.fit_id {
        tx.raw_data.insert("fit_id".to_string(), fit_id);
    }
    if let Some(check) = trx.check_number {
        tx.raw_data.insert("check_number".to_string(), check);
    }
    if let Some(trn_type) = trx.trn_type {
        tx.raw_data.insert("trn_type".to_string(), trn_type);
    }
    Ok(tx)
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// OFX dates are `YYYYMMDD`, often with a time and timezone suffix that is
/// ignored here
fn parse_ofx_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim().get(0..8).filter(|h| h.is_ascii())?;
    let y: i32 = s[0..4].parse().ok()?;
    let m: u32 = s[4..6].parse().ok()?;
    let d: u32 = s[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}
