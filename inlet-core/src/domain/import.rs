//! Import outcome types: duplicate matches, conflict policy, final result

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transaction::ParsedTransaction;

/// Duplicate verdict for one candidate transaction.
///
/// Produced per transaction by duplicate detection, consumed once by the
/// conflict resolver; never persisted independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateMatch {
    /// Position of the transaction in the parsed batch
    pub index: usize,
    pub transaction: ParsedTransaction,
    pub is_likely_duplicate: bool,
    /// Best similarity score against existing records, in [0, 1]
    pub confidence_score: f64,
    /// Existing record ids above the inclusion threshold, best match first
    pub duplicates: Vec<Uuid>,
}

/// How the resolver treats likely duplicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportPolicy {
    /// Drop likely duplicates from the committed set
    AutoSkipDuplicates,
    /// Keep them but mark them for operator review
    FlagDuplicates,
    /// Import everything as-is
    KeepAll,
}

impl FromStr for ImportPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "auto_skip_duplicates" | "auto_skip" | "skip" => Ok(Self::AutoSkipDuplicates),
            "flag_duplicates" | "flag" => Ok(Self::FlagDuplicates),
            "keep_all" | "keep" => Ok(Self::KeepAll),
            other => Err(format!("unknown import policy: {other}")),
        }
    }
}

/// What happened to one conflicted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictAction {
    Skipped,
    Flagged,
    Kept,
}

/// One line of the conflict report handed back to the operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictReportEntry {
    pub index: usize,
    pub action: ConflictAction,
    pub confidence_score: f64,
    pub duplicates: Vec<Uuid>,
}

/// Final outcome of one confirmed import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub import_id: Uuid,
    pub success: bool,
    pub imported_count: usize,
    pub skipped_count: usize,
    pub duplicate_count: usize,
    pub errors: Vec<String>,
    /// Single-use credential for deleting everything created under
    /// `import_id`; issued on every confirm outcome, including failures
    pub rollback_token: String,
    pub conflicts: Vec<ConflictReportEntry>,
}
