//! Parser output contract shared by every statement format

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::transaction::ParsedTransaction;

/// Outcome of parsing one statement file.
///
/// `success == false` means a file-level failure; `transactions` may still
/// carry a partial extraction but callers must not commit it without an
/// explicit override. Per-line problems land in `warnings` and never flip
/// `success` on their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    pub success: bool,
    pub transactions: Vec<ParsedTransaction>,
    /// Fatal, file-level errors
    pub errors: Vec<String>,
    /// Per-line, non-fatal problems (the line is dropped, parsing continues)
    pub warnings: Vec<String>,
    /// Extraction method, detected bank, account number, statement period
    pub metadata: HashMap<String, JsonValue>,
}

impl ParseResult {
    /// An empty, successful result
    pub fn new() -> Self {
        Self {
            success: true,
            transactions: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// A file-level failure with a single error
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            transactions: Vec::new(),
            errors: vec![error.into()],
            warnings: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn set_meta(&mut self, key: &str, value: impl Into<JsonValue>) {
        self.metadata.insert(key.to_string(), value.into());
    }
}

impl Default for ParseResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Static descriptor for one registered parser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Unique registry key, e.g. "csv"
    pub name: String,
    /// Lowercase extensions without the dot
    pub supported_extensions: BTreeSet<String>,
    pub mime_types: BTreeSet<String>,
    /// Parser tunables (delimiter, amount-column policy, ...)
    #[serde(default)]
    pub settings: HashMap<String, JsonValue>,
}

impl ParserConfig {
    pub fn new(name: &str, extensions: &[&str], mime_types: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            supported_extensions: extensions.iter().map(|e| e.to_string()).collect(),
            mime_types: mime_types.iter().map(|m| m.to_string()).collect(),
            settings: HashMap::new(),
        }
    }

    pub fn matches_extension(&self, extension: &str) -> bool {
        self.supported_extensions
            .contains(&extension.trim_start_matches('.').to_lowercase())
    }

    pub fn matches_mime(&self, mime: &str) -> bool {
        self.mime_types.contains(&mime.to_lowercase())
    }
}
