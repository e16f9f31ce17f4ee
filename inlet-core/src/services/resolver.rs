//! Import conflict resolver - applies a duplicate policy to a parsed batch

use crate::domain::{
    ConflictAction, ConflictReportEntry, DuplicateMatch, ImportPolicy, ParsedTransaction,
};

/// Outcome of resolving one batch: the set to commit plus the report
#[derive(Debug, Clone)]
pub struct Resolution {
    pub clean: Vec<ParsedTransaction>,
    /// Likely duplicates acted on (skipped or flagged)
    pub duplicate_count: usize,
    pub report: Vec<ConflictReportEntry>,
}

/// Applies an [`ImportPolicy`] to the duplicate verdicts of a batch
#[derive(Debug, Default)]
pub struct ImportConflictResolver;

impl ImportConflictResolver {
    pub fn new() -> Self {
        Self
    }

    /// Produce the clean transaction set and a conflict report. `matches`
    /// must be the verdicts for `transactions` in batch order, as returned
    /// by duplicate detection.
    pub fn resolve(
        &self,
        transactions: Vec<ParsedTransaction>,
        matches: &[DuplicateMatch],
        policy: ImportPolicy,
    ) -> Resolution {
        let mut clean = Vec::with_capacity(transactions.len());
        let mut report = Vec::new();
        let mut duplicate_count = 0;

        for (index, mut tx) in transactions.into_iter().enumerate() {
            let verdict = match matches.iter().find(|m| m.index == index) {
                Some(v) if v.is_likely_duplicate => v,
                _ => {
                    clean.push(tx);
                    continue;
                }
            };
            duplicate_count += 1;

            let action = match policy {
                ImportPolicy::AutoSkipDuplicates => ConflictAction::Skipped,
                ImportPolicy::FlagDuplicates => ConflictAction::Flagged,
                ImportPolicy::KeepAll => ConflictAction::Kept,
            };

            match action {
                ConflictAction::Skipped => {}
                ConflictAction::Flagged => {
                    let note = format!(
                        "possible duplicate (score {:.2})",
                        verdict.confidence_score
                    );
                    tx.notes = Some(match tx.notes.take() {
                        Some(existing) => format!("{existing}; {note}"),
                        None => note,
                    });
                    clean.push(tx);
                }
                ConflictAction::Kept => clean.push(tx),
            }

            report.push(ConflictReportEntry {
                index,
                action,
                confidence_score: verdict.confidence_score,
                duplicates: verdict.duplicates.clone(),
            });
        }

        Resolution {
            clean,
            duplicate_count,
            report,
        }
    }
}
