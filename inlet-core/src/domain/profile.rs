//! Per-bank extraction profiles
//!
//! A profile tells the CSV and PDF parsers how one institution lays out its
//! exports: which columns map to which fields, which date formats to try,
//! and which regex patterns open a PDF transaction block. Profiles are plain
//! JSON documents (camelCase, one per bank key) and are immutable during a
//! single parse.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Extraction profile for one institution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankProfile {
    pub name: String,
    #[serde(default)]
    pub csv_config: CsvProfileConfig,
    #[serde(default)]
    pub pdf_config: PdfProfileConfig,
}

/// CSV column mapping section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvProfileConfig {
    /// Semantic field -> acceptable column names, e.g.
    /// `"date" -> ["Date", "Posting Date"]`
    #[serde(default)]
    pub field_mappings: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub date_formats: Vec<String>,
    #[serde(default)]
    pub amount_columns: AmountColumns,
}

/// Amount column policy: one signed column, or split debit/credit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountColumns {
    pub single: bool,
    #[serde(default)]
    pub debit_column: Option<String>,
    #[serde(default)]
    pub credit_column: Option<String>,
    /// Negate debit values when the export lists them unsigned
    #[serde(default)]
    pub negative_debits: bool,
}

impl Default for AmountColumns {
    fn default() -> Self {
        Self {
            single: true,
            debit_column: None,
            credit_column: None,
            negative_debits: false,
        }
    }
}

/// PDF pattern section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfProfileConfig {
    /// Patterns that open a transaction block; tried in order per line
    #[serde(default)]
    pub transaction_patterns: Vec<String>,
    #[serde(default)]
    pub date_formats: Vec<String>,
    /// Lines matching any of these are skipped before block matching
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default)]
    pub custom_processing: HashMap<String, JsonValue>,
}

impl BankProfile {
    /// Validate profile completeness.
    ///
    /// A profile is usable only when `field_mappings` supplies non-empty
    /// mappings for date, description and amount, and a split-column amount
    /// policy names both of its columns.
    pub fn validate(&self) -> (bool, Vec<String>) {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("profile name must not be empty".to_string());
        }

        for field in ["date", "description", "amount"] {
            match self.csv_config.field_mappings.get(field) {
                Some(columns) if !columns.is_empty() => {}
                _ => errors.push(format!("fieldMappings.{field} must supply at least one column")),
            }
        }

        let amounts = &self.csv_config.amount_columns;
        if !amounts.single {
            if amounts.debit_column.is_none() {
                errors.push("split amount columns require debitColumn".to_string());
            }
            if amounts.credit_column.is_none() {
                errors.push("split amount columns require creditColumn".to_string());
            }
        }

        for pattern in &self.pdf_config.transaction_patterns {
            if let Err(e) = regex::Regex::new(pattern) {
                errors.push(format!("invalid transaction pattern '{pattern}': {e}"));
            }
        }
        for pattern in &self.pdf_config.ignore_patterns {
            if let Err(e) = regex::Regex::new(pattern) {
                errors.push(format!("invalid ignore pattern '{pattern}': {e}"));
            }
        }

        (errors.is_empty(), errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_profile() -> BankProfile {
        let mut mappings = HashMap::new();
        mappings.insert("date".to_string(), vec!["Date".to_string()]);
        mappings.insert("description".to_string(), vec!["Description".to_string()]);
        mappings.insert("amount".to_string(), vec!["Amount".to_string()]);
        BankProfile {
            name: "Test Bank".to_string(),
            csv_config: CsvProfileConfig {
                field_mappings: mappings,
                ..Default::default()
            },
            pdf_config: PdfProfileConfig::default(),
        }
    }

    #[test]
    fn test_valid_profile_passes() {
        let (ok, errors) = valid_profile().validate();
        assert!(ok, "{errors:?}");
    }

    #[test]
    fn test_missing_mapping_fails() {
        let mut profile = valid_profile();
        profile.csv_config.field_mappings.remove("amount");
        let (ok, errors) = profile.validate();
        assert!(!ok);
        assert!(errors.iter().any(|e| e.contains("amount")));
    }

    #[test]
    fn test_split_columns_require_both() {
        let mut profile = valid_profile();
        profile.csv_config.amount_columns = AmountColumns {
            single: false,
            debit_column: Some("Debit".to_string()),
            credit_column: None,
            negative_debits: true,
        };
        let (ok, errors) = profile.validate();
        assert!(!ok);
        assert!(errors.iter().any(|e| e.contains("creditColumn")));
    }

    #[test]
    fn test_bad_regex_fails() {
        let mut profile = valid_profile();
        profile.pdf_config.transaction_patterns = vec!["([unclosed".to_string()];
        let (ok, _) = profile.validate();
        assert!(!ok);
    }

    #[test]
    fn test_profile_roundtrips_camel_case() {
        let json = serde_json::to_string(&valid_profile()).unwrap();
        assert!(json.contains("fieldMappings"));
        assert!(json.contains("csvConfig"));
        let back: BankProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "Test Bank");
    }
}
