//! PDF bank-profile statement parser
//!
//! Source PDFs are unstructured prose, not tables. Text is extracted per
//! page, then scanned line by line: a profile pattern with `day`/`month`/
//! optional `year`/`desc` capture groups opens a transaction block, and a
//! bounded look-ahead window collects the amount, a `Miesto:` merchant/
//! location line, a reference line and an optional foreign-exchange
//! annotation (`Suma: <amt> <CUR> <date> Kurz: [<rate>]`). The reference
//! profile uses comma as the decimal separator and space as the thousands
//! separator.
//!
//! Block extraction is a pure function over the indexed line buffer
//! returning `(outcome, lines_consumed)`; the scanning loop carries no
//! hidden state. A block that cannot resolve an amount becomes a warning
//! and never aborts the rest of the file.

use std::path::Path;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use log::debug;
use regex::Regex;
use rust_decimal::Decimal;

use crate::domain::normalize::round_amount;
use crate::domain::result::Result;
use crate::domain::{BankProfile, ParseResult, ParsedTransaction, ParserConfig, PdfProfileConfig};
use crate::ports::StatementParser;
use crate::services::profiles::builtin_profile;

/// How many lines after a transaction start may belong to its block
const LOOKAHEAD_WINDOW: usize = 10;

/// Known city tokens for merchant/location splitting, multi-word first
const KNOWN_CITIES: &[&str] = &[
    "BANSKA BYSTRICA",
    "SPISSKA NOVA VES",
    "NOVE ZAMKY",
    "BRATISLAVA",
    "KOSICE",
    "PRESOV",
    "ZILINA",
    "NITRA",
    "TRNAVA",
    "TRENCIN",
    "MARTIN",
    "POPRAD",
    "PIESTANY",
    "PRAHA",
    "BRNO",
    "OSTRAVA",
    "WIEN",
    "BUDAPEST",
    "WARSZAWA",
    "KRAKOW",
    "BERLIN",
    "LONDON",
];

const CARD_KEYWORDS: &[&str] = &["platba kartou", "card payment", "kartou", "vyber z bankomatu"];
const LOAN_KEYWORDS: &[&str] = &["splatka", "splátka", "uver", "úver", "loan"];
const TRANSFER_KEYWORDS: &[&str] = &[
    "prevod",
    "uhrada",
    "úhrada",
    "transfer",
    "trvaly prikaz",
    "standing order",
];

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(-?\d{1,3}(?: \d{3})*,\d{2})(?:\s*EUR)?\s*$").unwrap())
}

fn location_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:miesto|location)\s*:\s*(.+)$").unwrap())
}

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:ref(?:erencia|erence)?|vs)\s*:?\s*([A-Za-z0-9/\-]+)\s*$").unwrap()
    })
}

fn exchange_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^suma:\s*(?P<amt>\d+(?:[.,]\d+)?)\s+(?P<cur>[A-Za-z]{3})\s+(?P<date>\d{1,2}\.\d{1,2}\.\d{4})\s+kurz:\s*(?P<rate>\d+(?:[.,]\d+)?)?\s*$",
        )
        .unwrap()
    })
}

fn period_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{1,2}\.\s*\d{1,2}\.\s*\d{4})\s*(?:-|–|do)\s*(\d{1,2}\.\s*\d{1,2}\.\s*\d{4})")
            .unwrap()
    })
}

fn iban_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Z]{2}\d{2}(?:\s?\d{4}){3,7})\b").unwrap())
}

fn legal_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)[,\s]+(spol\.?\s*s\s*r\.?\s*o\.?|s\.?\s*r\.?\s*o\.?|a\.\s*s\.?|inc\.?|llc\.?|ltd\.?|gmbh|plc)\s*$",
        )
        .unwrap()
    })
}

fn country_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+(SK|SVK|CZ|CZE|PL|POL|AT|AUT|HU|HUN|DE|DEU)\s*$").unwrap())
}

/// Compiled regexes for one profile, built once per parse
struct CompiledProfile {
    transaction_patterns: Vec<Regex>,
    ignore_patterns: Vec<Regex>,
}

impl CompiledProfile {
    fn new(config: &PdfProfileConfig) -> std::result::Result<Self, String> {
        let compile = |patterns: &[String]| -> std::result::Result<Vec<Regex>, String> {
            patterns
                .iter()
                .map(|p| Regex::new(p).map_err(|e| format!("invalid pattern '{p}': {e}")))
                .collect()
        };
        Ok(Self {
            transaction_patterns: compile(&config.transaction_patterns)?,
            ignore_patterns: compile(&config.ignore_patterns)?,
        })
    }

    fn is_ignored(&self, line: &str) -> bool {
        self.ignore_patterns.iter().any(|re| re.is_match(line))
    }

    fn match_start<'a>(&self, line: &'a str) -> Option<regex::Captures<'a>> {
        self.transaction_patterns
            .iter()
            .find_map(|re| re.captures(line))
    }
}

/// Statement-level facts gathered before block scanning
#[derive(Debug, Default, Clone)]
pub(crate) struct StatementContext {
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub account: Option<String>,
}

/// Foreign-exchange annotation parsed from a `Suma:` line
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExchangeInfo {
    pub original_amount: Decimal,
    pub currency: String,
    pub value_date: Option<NaiveDate>,
    pub rate: Option<Decimal>,
}

pub struct PdfStatementParser {
    config: ParserConfig,
}

impl PdfStatementParser {
    pub fn new() -> Self {
        Self {
            config: ParserConfig::new("pdf", &["pdf"], &["application/pdf"]),
        }
    }

    /// Parse already-extracted statement text; the entry point for tests
    /// and callers that run their own text extraction
    pub fn parse_statement_text(&self, text: &str, profile: Option<&BankProfile>) -> ParseResult {
        let fallback;
        let profile = match profile {
            Some(p) if !p.pdf_config.transaction_patterns.is_empty() => p,
            _ => {
                fallback = builtin_profile("tatra").expect("builtin reference profile");
                &fallback
            }
        };

        let compiled = match CompiledProfile::new(&profile.pdf_config) {
            Ok(c) => c,
            Err(e) => return ParseResult::failed(e),
        };

        let lines: Vec<&str> = text.lines().map(|l| l.trim_end()).collect();
        let context = scan_context(&lines);
        debug!(
            "pdf statement context: period {:?}..{:?}, account {:?}",
            context.period_start, context.period_end, context.account
        );

        let mut result = ParseResult::new();
        let mut i = 0;
        while i < lines.len() {
            let line = lines[i].trim();
            if line.is_empty() || compiled.is_ignored(line) {
                i += 1;
                continue;
            }
            let (outcome, consumed) = extract_block(&lines, i, &compiled, &context);
            match outcome {
                Some(Ok(mut tx)) => {
                    if let Some(account) = &context.account {
                        tx.account.get_or_insert_with(|| account.clone());
                    }
                    result.transactions.push(tx);
                }
                Some(Err(problem)) => {
                    result.warnings.push(format!("line {}: {problem}", i + 1));
                }
                None => {}
            }
            i += consumed.max(1);
        }

        result.set_meta("extraction_method", "pdf_profile");
        result.set_meta("bank", profile.name.clone());
        if let Some(account) = &context.account {
            result.set_meta("account_number", account.clone());
        }
        if let (Some(start), Some(end)) = (context.period_start, context.period_end) {
            result.set_meta(
                "statement_period",
                serde_json::json!({
                    "start": start.to_string(),
                    "end": end.to_string(),
                }),
            );
        }
        result
    }
}

impl Default for PdfStatementParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser for PdfStatementParser {
    fn config(&self) -> &ParserConfig {
        &self.config
    }

    fn parse(&self, path: &Path, profile: Option<&BankProfile>) -> Result<ParseResult> {
        let bytes = std::fs::read(path)?;
        let text = match pdf_extract::extract_text_from_mem(&bytes) {
            Ok(text) => text,
            Err(e) => return Ok(ParseResult::failed(format!("PDF text extraction failed: {e}"))),
        };
        Ok(self.parse_statement_text(&text, profile))
    }
}

/// Gather statement period and account number from header lines
fn scan_context(lines: &[&str]) -> StatementContext {
    let mut context = StatementContext::default();
    for line in lines {
        if context.period_start.is_none() {
            if let Some(caps) = period_re().captures(line) {
                context.period_start = parse_dotted_date(&caps[1]);
                context.period_end = parse_dotted_date(&caps[2]);
            }
        }
        if context.account.is_none() {
            if let Some(caps) = iban_re().captures(line) {
                context.account = Some(caps[1].split_whitespace().collect::<String>());
            }
        }
        if context.period_start.is_some() && context.account.is_some() {
            break;
        }
    }
    context
}

/// Parse `d. m. yyyy` / `dd.mm.yyyy` tolerating spaces after the dots
fn parse_dotted_date(raw: &str) -> Option<NaiveDate> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    NaiveDate::parse_from_str(&compact, "%d.%m.%Y").ok()
}

/// Extract one transaction block starting at `start`.
///
/// Returns `(None, 1)` when the line does not open a block, otherwise the
/// parsed transaction (or the warning that sank it) plus the number of
/// lines the block consumed.
fn extract_block(
    lines: &[&str],
    start: usize,
    compiled: &CompiledProfile,
    context: &StatementContext,
) -> (Option<std::result::Result<ParsedTransaction, String>>, usize) {
    let first = lines[start].trim();
    let Some(caps) = compiled.match_start(first) else {
        return (None, 1);
    };

    let day: u32 = match caps.name("day").and_then(|m| m.as_str().parse().ok()) {
        Some(d) => d,
        None => return (Some(Err("transaction start without a day".to_string())), 1),
    };
    let month: u32 = match caps.name("month").and_then(|m| m.as_str().parse().ok()) {
        Some(m) => m,
        None => return (Some(Err("transaction start without a month".to_string())), 1),
    };
    let explicit_year: Option<i32> = caps.name("year").and_then(|m| m.as_str().parse().ok());

    let mut description = caps
        .name("desc")
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    // The start line may carry the amount at its tail
    let mut amount: Option<Decimal> = None;
    let desc_scan = description.clone();
    if let Some(m) = amount_re().captures(&desc_scan) {
        amount = parse_locale_amount(&m[1]);
        description = desc_scan[..m.get(0).map(|g| g.start()).unwrap_or(0)]
            .trim()
            .to_string();
    }

    let mut location_line: Option<String> = None;
    let mut reference: Option<String> = None;
    let mut exchange: Option<ExchangeInfo> = None;

    // Bounded look-ahead: stop at the next transaction start
    let mut end = start + 1;
    let limit = (start + 1 + LOOKAHEAD_WINDOW).min(lines.len());
    while end < limit {
        let line = lines[end].trim();
        if compiled.match_start(line).is_some() {
            break;
        }
        if line.is_empty() || compiled.is_ignored(line) {
            end += 1;
            continue;
        }
        if let Some(caps) = location_re().captures(line) {
            location_line = Some(caps[1].trim().to_string());
        } else if let Some(info) = parse_exchange_annotation(line) {
            exchange = Some(info);
        } else if let Some(caps) = reference_re().captures(line) {
            reference = Some(caps[1].to_string());
        } else if amount.is_none() {
            if let Some(caps) = amount_re().captures(line) {
                amount = parse_locale_amount(&caps[1]);
            }
        }
        end += 1;
    }
    let consumed = end - start;

    let Some(amount) = amount else {
        return (
            Some(Err(format!(
                "transaction block '{}' has no resolvable amount",
                truncate(&description, 40)
            ))),
            consumed,
        );
    };

    let (date, year_inferred) = match resolve_date(day, month, explicit_year, context) {
        Some(resolved) => resolved,
        None => {
            return (
                Some(Err(format!(
                    "cannot resolve a calendar date for {day}. {month}. without year context"
                ))),
                consumed,
            )
        }
    };

    let mut tx = ParsedTransaction::new(date, description.clone(), amount);
    tx.year_inferred = year_inferred;
    tx.reference = reference;

    let tx_type = classify_transaction_type(&description);
    tx.raw_data
        .insert("transaction_type".to_string(), tx_type.to_string());

    if let Some(raw_location) = location_line {
        let (merchant, city) = split_merchant_location(&raw_location);
        tx.merchant = Some(clean_business_name(&merchant));
        if let Some(city) = city {
            tx.raw_data.insert("location".to_string(), city);
        }
        tx.raw_data.insert("location_raw".to_string(), raw_location);
    }

    if let Some(fx) = exchange {
        tx.raw_data
            .insert("fx_amount".to_string(), fx.original_amount.to_string());
        tx.raw_data.insert("fx_currency".to_string(), fx.currency);
        if let Some(date) = fx.value_date {
            tx.raw_data.insert("fx_value_date".to_string(), date.to_string());
        }
        if let Some(rate) = fx.rate {
            tx.raw_data.insert("fx_rate".to_string(), rate.to_string());
        }
    }

    (Some(Ok(tx)), consumed)
}

/// Resolve the year for a short-form date, preferring an explicit year,
/// else the year consistent with the statement period (which may span a
/// year boundary). Returns `(date, year_inferred)`.
fn resolve_date(
    day: u32,
    month: u32,
    explicit_year: Option<i32>,
    context: &StatementContext,
) -> Option<(NaiveDate, bool)> {
    if let Some(year) = explicit_year {
        return NaiveDate::from_ymd_opt(year, month, day).map(|d| (d, false));
    }

    let (start, end) = match (context.period_start, context.period_end) {
        (Some(s), Some(e)) => (s, e),
        (Some(s), None) => (s, s),
        (None, Some(e)) => (e, e),
        (None, None) => return None,
    };

    // Pick the candidate year that lands inside the period; a December/
    // January statement makes start.year() != end.year()
    for year in [start.year(), end.year()] {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            if date >= start && date <= end {
                return Some((date, true));
            }
        }
    }
    // Outside the declared period: fall back to the period start's year
    NaiveDate::from_ymd_opt(start.year(), month, day).map(|d| (d, true))
}

/// Parse a comma-decimal, space-thousands amount: `1 300,54` -> 1300.54
pub(crate) fn parse_locale_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned.parse::<Decimal>().ok().map(round_amount)
}

/// Parse a decimal that may use either separator convention: `4,2`,
/// `4.83`, `1 300,54`, `1,234.56`
pub(crate) fn parse_flexible_decimal(raw: &str) -> Option<Decimal> {
    let compact: String = raw.trim().chars().filter(|c| !c.is_whitespace()).collect();
    let has_comma = compact.contains(',');
    let has_dot = compact.contains('.');

    let normalized = match (has_comma, has_dot) {
        (true, true) => {
            // The later separator is the decimal point
            if compact.rfind(',') > compact.rfind('.') {
                compact.replace('.', "").replace(',', ".")
            } else {
                compact.replace(',', "")
            }
        }
        (true, false) => compact.replace(',', "."),
        _ => compact,
    };
    normalized.parse::<Decimal>().ok()
}

/// Parse a `Suma: 4.83 PLN 02.05.2025 Kurz: 4,2` annotation; the rate-free
/// form leaves `Kurz:` empty
pub(crate) fn parse_exchange_annotation(line: &str) -> Option<ExchangeInfo> {
    let caps = exchange_re().captures(line.trim())?;
    let original_amount = parse_flexible_decimal(&caps["amt"])?;
    Some(ExchangeInfo {
        original_amount,
        currency: caps["cur"].to_uppercase(),
        value_date: parse_dotted_date(&caps["date"]),
        rate: caps.name("rate").and_then(|m| parse_flexible_decimal(m.as_str())),
    })
}

/// Split a location line into merchant and city using the known-city
/// table; no recognized city leaves the whole string as the merchant
pub(crate) fn split_merchant_location(raw: &str) -> (String, Option<String>) {
    let trimmed = raw.trim();
    let upper = trimmed.to_uppercase();
    for city in KNOWN_CITIES {
        if let Some(head) = upper.strip_suffix(city) {
            if head.is_empty() {
                // The line is only the city
                return (trimmed.to_string(), Some((*city).to_string()));
            }
            // Uppercasing is length-preserving for the statement alphabet;
            // bail out of the split if it was not
            if head.ends_with([' ', ',']) && trimmed.is_char_boundary(head.len()) {
                let merchant = trimmed[..head.len()].trim_end_matches([' ', ',']).to_string();
                return (merchant, Some((*city).to_string()));
            }
        }
    }
    (trimmed.to_string(), None)
}

/// Strip legal-entity suffixes and trailing country tokens to get a stable
/// merchant key
pub(crate) fn clean_business_name(name: &str) -> String {
    let mut cleaned = name.trim().to_string();
    loop {
        let next = country_token_re().replace(&cleaned, "").to_string();
        let next = legal_suffix_re().replace(&next, "").trim().to_string();
        if next == cleaned || next.is_empty() {
            break;
        }
        cleaned = next;
    }
    cleaned.trim_end_matches([',', '.', ' ']).to_string()
}

/// Keyword classifier: card payment, loan payment, transfer or unknown
pub(crate) fn classify_transaction_type(description: &str) -> &'static str {
    let lower = description.to_lowercase();
    if CARD_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return "card_payment";
    }
    if LOAN_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return "loan_payment";
    }
    if TRANSFER_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return "transfer";
    }
    "unknown"
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const STATEMENT: &str = "\
Tatra banka, a.s.
Vypis z uctu
IBAN SK31 1200 0000 1987 4263 7541
Obdobie: 01.05.2025 - 31.05.2025

2. 5. Platba kartou -12,90
Miesto: SUPERMARKET FRESH KOSICE
Ref: 8837421

3. 5. Platba kartou -4,15
Miesto: ZABKA 2231 WARSZAWA
Suma: 4.83 PLN 02.05.2025 Kurz: 4,2

15. 5. Prevod prijaty 1 300,54
VS: 1122334455

20. 5. Splatka uveru
-250,00
Strana 1
Zostatok: 2 480,11
";

    fn parse(text: &str) -> ParseResult {
        PdfStatementParser::new().parse_statement_text(text, None)
    }

    #[test]
    fn test_reference_statement_extraction() {
        let result = parse(STATEMENT);
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(result.transactions.len(), 4, "{:?}", result.warnings);

        let card = &result.transactions[0];
        assert_eq!(card.date, NaiveDate::from_ymd_opt(2025, 5, 2).unwrap());
        assert!(card.year_inferred);
        assert_eq!(card.amount, dec("-12.90"));
        assert_eq!(card.merchant.as_deref(), Some("SUPERMARKET FRESH"));
        assert_eq!(card.raw_data.get("location").unwrap(), "KOSICE");
        assert_eq!(card.reference.as_deref(), Some("8837421"));
        assert_eq!(card.raw_data.get("transaction_type").unwrap(), "card_payment");

        let transfer = &result.transactions[2];
        assert_eq!(transfer.amount, dec("1300.54"));
        assert_eq!(transfer.raw_data.get("transaction_type").unwrap(), "transfer");
        assert_eq!(transfer.reference.as_deref(), Some("1122334455"));

        let loan = &result.transactions[3];
        assert_eq!(loan.amount, dec("-250.00"));
        assert_eq!(loan.raw_data.get("transaction_type").unwrap(), "loan_payment");
    }

    #[test]
    fn test_statement_metadata() {
        let result = parse(STATEMENT);
        assert_eq!(result.metadata.get("bank").unwrap(), "Tatra banka");
        assert_eq!(
            result.metadata.get("account_number").unwrap(),
            "SK3112000000198742637541"
        );
        let period = result.metadata.get("statement_period").unwrap();
        assert_eq!(period["start"], "2025-05-01");
        assert_eq!(period["end"], "2025-05-31");
    }

    #[test]
    fn test_fx_annotation_attached() {
        let result = parse(STATEMENT);
        let fx = &result.transactions[1];
        assert_eq!(fx.raw_data.get("fx_amount").unwrap(), "4.83");
        assert_eq!(fx.raw_data.get("fx_currency").unwrap(), "PLN");
        assert_eq!(fx.raw_data.get("fx_rate").unwrap(), "4.2");
    }

    #[test]
    fn test_block_without_amount_becomes_warning() {
        let text = "\
Obdobie: 01.05.2025 - 31.05.2025
2. 5. Platba kartou
Miesto: SUPERMARKET FRESH KOSICE
3. 5. Platba kartou -4,15
";
        let result = parse(text);
        assert!(result.success);
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("no resolvable amount"));
    }

    #[test]
    fn test_year_boundary_inference() {
        let text = "\
Obdobie: 28.12.2024 - 05.01.2025
30. 12. Platba kartou -10,00
2. 1. Platba kartou -20,00
";
        let result = parse(text);
        assert_eq!(result.transactions.len(), 2);
        assert_eq!(
            result.transactions[0].date,
            NaiveDate::from_ymd_opt(2024, 12, 30).unwrap()
        );
        assert_eq!(
            result.transactions[1].date,
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
        );
        assert!(result.transactions.iter().all(|t| t.year_inferred));
    }

    #[test]
    fn test_explicit_year_not_flagged() {
        let text = "\
Obdobie: 01.05.2025 - 31.05.2025
2. 5. 2025 Platba kartou -12,90
";
        let result = parse(text);
        assert_eq!(result.transactions.len(), 1);
        assert!(!result.transactions[0].year_inferred);
    }

    #[test]
    fn test_no_year_context_drops_block() {
        let text = "2. 5. Platba kartou -12,90\n";
        let result = parse(text);
        assert!(result.transactions.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("year context"));
    }

    #[test]
    fn test_parse_locale_amount() {
        assert_eq!(parse_locale_amount("-12,90"), Some(dec("-12.90")));
        assert_eq!(parse_locale_amount("1 300,54"), Some(dec("1300.54")));
        assert_eq!(parse_locale_amount("0,01"), Some(dec("0.01")));
        assert_eq!(parse_locale_amount("garbage"), None);
    }

    #[test]
    fn test_parse_flexible_decimal() {
        assert_eq!(parse_flexible_decimal("4,2"), Some(dec("4.2")));
        assert_eq!(parse_flexible_decimal("4.83"), Some(dec("4.83")));
        assert_eq!(parse_flexible_decimal("1 300,54"), Some(dec("1300.54")));
        assert_eq!(parse_flexible_decimal("1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_flexible_decimal("1.234,56"), Some(dec("1234.56")));
    }

    #[test]
    fn test_exchange_annotation_full_and_rate_free() {
        let full = parse_exchange_annotation("Suma: 4.83 PLN 02.05.2025 Kurz: 4,2").unwrap();
        assert_eq!(full.original_amount, dec("4.83"));
        assert_eq!(full.currency, "PLN");
        assert_eq!(full.rate, Some(dec("4.2")));
        assert_eq!(
            full.value_date,
            NaiveDate::from_ymd_opt(2025, 5, 2)
        );

        let rate_free = parse_exchange_annotation("Suma: 12.9 EUR 30.04.2025 Kurz:").unwrap();
        assert_eq!(rate_free.original_amount, dec("12.9"));
        assert_eq!(rate_free.currency, "EUR");
        assert_eq!(rate_free.rate, None);

        assert!(parse_exchange_annotation("Miesto: KOSICE").is_none());
    }

    #[test]
    fn test_split_merchant_location() {
        assert_eq!(
            split_merchant_location("SUPERMARKET FRESH KOSICE"),
            ("SUPERMARKET FRESH".to_string(), Some("KOSICE".to_string()))
        );
        assert_eq!(
            split_merchant_location("HORSKY HOTEL BANSKA BYSTRICA"),
            (
                "HORSKY HOTEL".to_string(),
                Some("BANSKA BYSTRICA".to_string())
            )
        );
        assert_eq!(
            split_merchant_location("ONLINE SUBSCRIPTION SERVICE"),
            ("ONLINE SUBSCRIPTION SERVICE".to_string(), None)
        );
    }

    #[test]
    fn test_clean_business_name() {
        assert_eq!(clean_business_name("POTRAVINY KLAS, S.R.O."), "POTRAVINY KLAS");
        assert_eq!(clean_business_name("TATRA BANKA, A.S."), "TATRA BANKA");
        assert_eq!(clean_business_name("ACME WIDGETS LLC"), "ACME WIDGETS");
        assert_eq!(clean_business_name("ZABKA POLSKA SP"), "ZABKA POLSKA SP");
        assert_eq!(clean_business_name("DATART CZ"), "DATART");
    }

    #[test]
    fn test_classify_transaction_type() {
        assert_eq!(classify_transaction_type("Platba kartou"), "card_payment");
        assert_eq!(classify_transaction_type("Splatka uveru"), "loan_payment");
        assert_eq!(classify_transaction_type("Prevod prijaty"), "transfer");
        assert_eq!(classify_transaction_type("Poplatok za vedenie"), "unknown");
    }

    #[test]
    fn test_idempotent_extraction() {
        let a = parse(STATEMENT);
        let b = parse(STATEMENT);
        assert_eq!(a.transactions, b.transactions);
    }
}
