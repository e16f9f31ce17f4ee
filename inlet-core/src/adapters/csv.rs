//! CSV statement parser
//!
//! Detects the delimiter and header row, maps columns to semantic fields
//! (explicit profile mappings first, case-insensitive substring heuristics
//! otherwise) and applies the shared amount/date normalization. Supports a
//! single signed amount column or split debit/credit columns, where a
//! positive debit is merged as negative.

use std::path::Path;

use log::debug;
use regex::Regex;
use rust_decimal::Decimal;

use crate::domain::normalize::{parse_amount, parse_date};
use crate::domain::result::Result;
use crate::domain::{BankProfile, CsvProfileConfig, ParseResult, ParsedTransaction, ParserConfig};
use crate::ports::StatementParser;

/// Column -> field heuristics, matched case-insensitively as substrings
const DATE_HEURISTICS: &[&str] = &[
    "date", "trans date", "post date", "posted", "txn date", "datum",
];
const DESC_HEURISTICS: &[&str] = &[
    "description", "desc", "memo", "payee", "merchant", "details", "narration", "popis",
];
const AMOUNT_HEURISTICS: &[&str] = &["amount", "amt", "total", "suma"];
const DEBIT_HEURISTICS: &[&str] = &["debit", "withdrawal"];
const CREDIT_HEURISTICS: &[&str] = &["credit", "deposit"];
const REFERENCE_HEURISTICS: &[&str] = &["reference", "ref number", "check number", "cheque"];
const ACCOUNT_HEURISTICS: &[&str] = &["account"];

const DELIMITER_CANDIDATES: &[u8] = b",;\t|";

/// Resolved column positions for one file
#[derive(Debug, Clone)]
pub(crate) struct ColumnMap {
    pub date: usize,
    pub description: usize,
    pub amount: Option<usize>,
    pub debit: Option<usize>,
    pub credit: Option<usize>,
    pub reference: Option<usize>,
    pub account: Option<usize>,
    /// Negate unsigned positive amounts (single-column policy)
    pub negate_unsigned: bool,
}

pub struct CsvParser {
    config: ParserConfig,
}

impl CsvParser {
    pub fn new() -> Self {
        Self {
            config: ParserConfig::new("csv", &["csv"], &["text/csv", "text/plain"]),
        }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser for CsvParser {
    fn config(&self) -> &ParserConfig {
        &self.config
    }

    fn parse(&self, path: &Path, profile: Option<&BankProfile>) -> Result<ParseResult> {
        let bytes = std::fs::read(path)?;
        let text = decode_text(&bytes);
        Ok(parse_csv_text(&text, profile.map(|p| &p.csv_config)))
    }
}

/// Strip a UTF-8 BOM and decode leniently; the detector has already
/// rejected binary content
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF][..]).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Pure parse over the decoded text; separated from I/O for testability
pub(crate) fn parse_csv_text(text: &str, profile: Option<&CsvProfileConfig>) -> ParseResult {
    let mut result = ParseResult::new();

    let delimiter = detect_delimiter(text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    // Collect rows up-front; statements are small (hundreds of lines)
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        match record {
            Ok(r) => rows.push(r.iter().map(|f| f.to_string()).collect()),
            Err(e) => result.warnings.push(format!("unreadable row: {e}")),
        }
    }

    // Locate the header row: banks often prepend account banners
    let mut header: Option<(usize, Vec<String>, ColumnMap)> = None;
    for (idx, row) in rows.iter().take(10).enumerate() {
        if let Some(map) = map_columns(row, profile) {
            header = Some((idx, row.clone(), map));
            break;
        }
    }
    let Some((header_idx, headers, columns)) = header else {
        return ParseResult::failed(
            "could not locate a header row mapping date, description and amount columns",
        );
    };
    debug!(
        "csv header at row {header_idx}, delimiter {:?}",
        delimiter as char
    );

    let date_formats: Vec<String> = profile.map(|p| p.date_formats.clone()).unwrap_or_default();

    for (row_number, row) in rows.iter().enumerate().skip(header_idx + 1) {
        match convert_row(row, &headers, &columns, &date_formats) {
            Ok(Some(tx)) => result.transactions.push(tx),
            Ok(None) => {} // blank or filler row
            Err(problem) => result
                .warnings
                .push(format!("row {}: {problem}", row_number + 1)),
        }
    }

    result.set_meta("extraction_method", "csv");
    result.set_meta("delimiter", (delimiter as char).to_string());
    result.set_meta("header_row", header_idx);
    result.set_meta("row_count", result.transactions.len());
    result
}

/// Count candidate delimiters in the first non-empty line; comma wins ties
fn detect_delimiter(text: &str) -> u8 {
    let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let mut best = b',';
    let mut best_count = 0usize;
    for &candidate in DELIMITER_CANDIDATES {
        let count = line.bytes().filter(|&b| b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// Build the column map from a candidate header row. Explicit profile
/// mappings are consulted first; heuristics fill the gaps. None when the
/// row cannot satisfy date + description + an amount policy.
pub(crate) fn map_columns(
    headers: &[String],
    profile: Option<&CsvProfileConfig>,
) -> Option<ColumnMap> {
    let lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

    let by_profile = |field: &str| -> Option<usize> {
        let candidates = profile?.field_mappings.get(field)?;
        for candidate in candidates {
            let want = candidate.trim().to_lowercase();
            if let Some(idx) = lower.iter().position(|h| *h == want) {
                return Some(idx);
            }
        }
        None
    };
    let by_heuristic = |patterns: &[&str], exclude: &[Option<usize>]| -> Option<usize> {
        lower.iter().position(|h| {
            !h.is_empty()
                && patterns.iter().any(|p| h.contains(p))
                && !exclude
                    .iter()
                    .flatten()
                    .any(|&taken| lower.get(taken) == Some(h))
        })
    };

    let date = by_profile("date").or_else(|| by_heuristic(DATE_HEURISTICS, &[]))?;

    let description = by_profile("description")
        .or_else(|| by_heuristic(DESC_HEURISTICS, &[Some(date)]))?;

    // Amount policy: profile decides; heuristics prefer a single column
    let (amount, debit, credit, negate_unsigned) = match profile.map(|p| &p.amount_columns) {
        Some(policy) if !policy.single => {
            let debit = policy
                .debit_column
                .as_ref()
                .and_then(|c| lower.iter().position(|h| *h == c.trim().to_lowercase()))?;
            let credit = policy
                .credit_column
                .as_ref()
                .and_then(|c| lower.iter().position(|h| *h == c.trim().to_lowercase()))?;
            (None, Some(debit), Some(credit), false)
        }
        Some(policy) => {
            let amount = by_profile("amount")
                .or_else(|| by_heuristic(AMOUNT_HEURISTICS, &[Some(date), Some(description)]))?;
            (Some(amount), None, None, policy.negative_debits)
        }
        None => {
            if let Some(amount) =
                by_heuristic(AMOUNT_HEURISTICS, &[Some(date), Some(description)])
            {
                (Some(amount), None, None, false)
            } else {
                let debit = by_heuristic(DEBIT_HEURISTICS, &[]);
                let credit = by_heuristic(CREDIT_HEURISTICS, &[]);
                if debit.is_none() && credit.is_none() {
                    return None;
                }
                (None, debit, credit, false)
            }
        }
    };

    Some(ColumnMap {
        date,
        description,
        amount,
        debit,
        credit,
        reference: by_heuristic(REFERENCE_HEURISTICS, &[]),
        account: by_heuristic(ACCOUNT_HEURISTICS, &[Some(date), Some(description)]),
        negate_unsigned,
    })
}

/// Convert one data row. Ok(None) skips filler rows silently; Err degrades
/// the row to a warning.
pub(crate) fn convert_row(
    row: &[String],
    headers: &[String],
    columns: &ColumnMap,
    date_formats: &[String],
) -> std::result::Result<Option<ParsedTransaction>, String> {
    if row.iter().all(|f| f.trim().is_empty()) {
        return Ok(None);
    }

    let cell = |idx: usize| row.get(idx).map(|s| s.trim()).unwrap_or("");

    let date_raw = cell(columns.date);
    if date_raw.is_empty() {
        return Ok(None);
    }
    let date = parse_date(date_raw, date_formats)
        .ok_or_else(|| format!("unparseable date '{date_raw}'"))?;

    let description = cell(columns.description).to_string();
    if description.is_empty() {
        return Err("missing description".to_string());
    }

    let amount = resolve_amount(row, columns)?;

    let mut tx = ParsedTransaction::new(date, description.clone(), amount);
    tx.reference = columns
        .reference
        .map(cell)
        .filter(|s| !s.is_empty())
        .map(String::from);
    tx.account = columns
        .account
        .map(cell)
        .filter(|s| !s.is_empty())
        .map(String::from);

    let merchant = extract_merchant(&description);
    tx.category = suggest_category(&merchant);
    tx.merchant = Some(merchant);

    for (idx, header) in headers.iter().enumerate() {
        if !header.trim().is_empty() {
            tx.raw_data
                .insert(header.trim().to_string(), cell(idx).to_string());
        }
    }

    Ok(Some(tx))
}

fn resolve_amount(row: &[String], columns: &ColumnMap) -> std::result::Result<Decimal, String> {
    let cell = |idx: usize| row.get(idx).map(|s| s.trim()).unwrap_or("");

    if let Some(idx) = columns.amount {
        let raw = cell(idx);
        let mut amount =
            parse_amount(raw).ok_or_else(|| format!("malformed amount '{raw}'"))?;
        if columns.negate_unsigned && amount > Decimal::ZERO {
            amount = -amount;
        }
        return Ok(amount);
    }

    // Split debit/credit: debit merges as negative, credit keeps its sign
    let debit = columns
        .debit
        .map(cell)
        .filter(|s| !s.is_empty())
        .map(|raw| parse_amount(raw).ok_or_else(|| format!("malformed debit '{raw}'")))
        .transpose()?;
    let credit = columns
        .credit
        .map(cell)
        .filter(|s| !s.is_empty())
        .map(|raw| parse_amount(raw).ok_or_else(|| format!("malformed credit '{raw}'")))
        .transpose()?;

    match (debit, credit) {
        (Some(d), None) => Ok(if d > Decimal::ZERO { -d } else { d }),
        (None, Some(c)) => Ok(c),
        (Some(d), Some(c)) => {
            // Both populated: take the larger magnitude
            if d.abs() >= c.abs() {
                Ok(if d > Decimal::ZERO { -d } else { d })
            } else {
                Ok(c)
            }
        }
        (None, None) => Err("no amount in either debit or credit column".to_string()),
    }
}

/// Strip trailing reference numbers, card masks and dates from a
/// description to get a stable merchant name
pub(crate) fn extract_merchant(description: &str) -> String {
    let trailing_noise =
        Regex::new(r"(?i)\s+(#?\d{4,}|x{2,}\d{2,4}|\d{1,2}/\d{1,2}(/\d{2,4})?)\s*$").unwrap();

    let mut merchant = description.trim().to_string();
    loop {
        let stripped = trailing_noise.replace(&merchant, "").trim().to_string();
        if stripped == merchant || stripped.is_empty() {
            break;
        }
        merchant = stripped;
    }
    merchant
}

/// Keyword table for best-effort category suggestions; never authoritative
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Groceries",
        &["grocery", "supermarket", "market", "aldi", "lidl", "tesco", "kroger", "safeway"],
    ),
    (
        "Transportation",
        &["fuel", "gas station", "shell", "chevron", "petrol", "uber", "lyft", "parking", "transit"],
    ),
    (
        "Dining",
        &["restaurant", "cafe", "coffee", "pizza", "bistro", "diner", "mcdonald", "starbucks"],
    ),
    ("Entertainment", &["netflix", "spotify", "cinema", "theatre", "steam"]),
    ("Health", &["pharmacy", "drugstore", "clinic", "dental"]),
    ("Housing", &["rent", "mortgage", "landlord"]),
    ("Utilities", &["electric", "water", "internet", "telecom", "mobile"]),
    ("Income", &["salary", "payroll", "wages", "direct deposit"]),
];

pub(crate) fn suggest_category(merchant: &str) -> Option<String> {
    let lower = merchant.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|k| lower.contains(k)) {
            return Some(category.to_string());
        }
    }
    None
}
