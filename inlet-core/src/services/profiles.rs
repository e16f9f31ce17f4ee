//! Bank profile store - durable per-institution extraction profiles
//!
//! One JSON document per bank key in the profiles directory. A missing
//! profile is not an error: callers fall back to the generic heuristics.
//! Known institutions ship as compiled-in defaults that a saved document
//! under the same key overrides.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;

use crate::domain::result::{Error, Result};
use crate::domain::{AmountColumns, BankProfile, CsvProfileConfig, PdfProfileConfig};

/// Heuristic vocabulary for column -> field suggestions, in match order
const DATE_PATTERNS: &[&str] = &[
    "date", "transaction date", "trans date", "txn date", "posted", "post date", "datum",
];
const DESC_PATTERNS: &[&str] = &[
    "description", "desc", "memo", "payee", "merchant", "details", "narration", "popis",
];
const AMOUNT_PATTERNS: &[&str] = &["amount", "amt", "total", "suma"];
const DEBIT_PATTERNS: &[&str] = &["debit", "withdrawal"];
const CREDIT_PATTERNS: &[&str] = &["credit", "deposit"];
const DESC_FALLBACK_PATTERNS: &[&str] = &["name", "type", "ref", "reference", "category"];

/// Loads and saves bank profiles from a directory of JSON documents
pub struct BankProfileStore {
    profiles_dir: PathBuf,
}

impl BankProfileStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            profiles_dir: data_dir.join("profiles"),
        }
    }

    fn profile_path(&self, bank_key: &str) -> PathBuf {
        self.profiles_dir.join(format!("{bank_key}.json"))
    }

    /// Load a profile by bank key: saved document first, then the built-in
    /// defaults. None when the key is unknown.
    pub fn load_profile(&self, bank_key: &str) -> Result<Option<BankProfile>> {
        let path = self.profile_path(bank_key);
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let profile: BankProfile = serde_json::from_str(&content)
                .map_err(|e| Error::Profile(format!("profile '{bank_key}' is malformed: {e}")))?;
            return Ok(Some(profile));
        }
        Ok(builtin_profile(bank_key))
    }

    /// Persist a profile under a bank key, creating the directory on first
    /// use. The profile must validate.
    pub fn save_profile(&self, bank_key: &str, profile: &BankProfile) -> Result<()> {
        let (ok, errors) = profile.validate();
        if !ok {
            return Err(Error::Profile(format!(
                "profile '{}' is incomplete: {}",
                bank_key,
                errors.join("; ")
            )));
        }
        std::fs::create_dir_all(&self.profiles_dir)?;
        let content = serde_json::to_string_pretty(profile)?;
        std::fs::write(self.profile_path(bank_key), content)?;
        debug!("saved bank profile '{bank_key}'");
        Ok(())
    }

    /// Known bank keys: saved documents plus built-ins, sorted, deduplicated
    pub fn list_profiles(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = BUILTIN_KEYS.iter().map(|k| k.to_string()).collect();
        if self.profiles_dir.exists() {
            for entry in std::fs::read_dir(&self.profiles_dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) == Some("json") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        keys.push(stem.to_string());
                    }
                }
            }
        }
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    /// Delegates to [`BankProfile::validate`]
    pub fn validate_profile(&self, profile: &BankProfile) -> (bool, Vec<String>) {
        profile.validate()
    }

    /// Best-guess field -> column mapping from raw header names; the
    /// onboarding assist for a new bank
    pub fn suggest_field_mapping(&self, column_names: &[String]) -> HashMap<String, String> {
        let mut suggested = HashMap::new();
        let lower: Vec<String> = column_names.iter().map(|c| c.to_lowercase()).collect();

        let find = |patterns: &[&str], taken: &HashMap<String, String>| -> Option<String> {
            for (idx, header) in lower.iter().enumerate() {
                let original = &column_names[idx];
                if taken.values().any(|v| v == original) {
                    continue;
                }
                if patterns.iter().any(|p| header.contains(p)) {
                    return Some(original.clone());
                }
            }
            None
        };

        if let Some(col) = find(DATE_PATTERNS, &suggested) {
            suggested.insert("date".to_string(), col);
        }
        if let Some(col) = find(AMOUNT_PATTERNS, &suggested) {
            suggested.insert("amount".to_string(), col);
        } else {
            if let Some(col) = find(DEBIT_PATTERNS, &suggested) {
                suggested.insert("debit".to_string(), col);
            }
            if let Some(col) = find(CREDIT_PATTERNS, &suggested) {
                suggested.insert("credit".to_string(), col);
            }
        }
        if let Some(col) = find(DESC_PATTERNS, &suggested) {
            suggested.insert("description".to_string(), col);
        } else if let Some(col) = find(DESC_FALLBACK_PATTERNS, &suggested) {
            suggested.insert("description".to_string(), col);
        }

        suggested
    }
}

const BUILTIN_KEYS: &[&str] = &["tatra"];

/// Compiled-in defaults for known institutions
pub fn builtin_profile(bank_key: &str) -> Option<BankProfile> {
    match bank_key {
        "tatra" => Some(tatra_profile()),
        _ => None,
    }
}

/// Reference profile: Slovak retail-bank PDF statement. Prose-style
/// statement lines opened by a short `d. m.` date, comma decimals with
/// space thousands separators, `Miesto:` merchant/location lines and
/// `Suma: ... Kurz: ...` foreign-exchange annotations.
fn tatra_profile() -> BankProfile {
    let mut field_mappings = HashMap::new();
    field_mappings.insert(
        "date".to_string(),
        vec!["Datum".to_string(), "Date".to_string()],
    );
    field_mappings.insert(
        "description".to_string(),
        vec!["Popis".to_string(), "Description".to_string()],
    );
    field_mappings.insert(
        "amount".to_string(),
        vec!["Suma".to_string(), "Amount".to_string()],
    );

    BankProfile {
        name: "Tatra banka".to_string(),
        csv_config: CsvProfileConfig {
            field_mappings,
            date_formats: vec!["%d.%m.%Y".to_string()],
            amount_columns: AmountColumns::default(),
        },
        pdf_config: PdfProfileConfig {
            transaction_patterns: vec![
                r"^(?P<day>\d{1,2})\.\s*(?P<month>\d{1,2})\.(?:\s*(?P<year>\d{4}))?\s+(?P<desc>\D.*)$"
                    .to_string(),
            ],
            date_formats: vec!["%d.%m.%Y".to_string()],
            ignore_patterns: vec![
                r"(?i)^v[yý]pis".to_string(),
                r"(?i)^strana\s+\d+".to_string(),
                r"(?i)^pokra[cč]ovanie".to_string(),
                r"(?i)^zostatok".to_string(),
                r"^IBAN\b".to_string(),
                r"(?i)^tatra banka".to_string(),
            ],
            custom_processing: HashMap::new(),
        },
    }
}
