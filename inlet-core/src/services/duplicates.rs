//! Duplicate detection - weighted similarity against recorded transactions
//!
//! Each newly parsed transaction is scored against candidate existing
//! records (narrowed beforehand by a coarse date-window query): amount
//! equality carries 40 % with linear partial credit, date proximity 30 %
//! decaying to zero beyond the window, description similarity 30 % via
//! token-set overlap. New transactions are never scored against each other.

use std::collections::HashSet;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::{DuplicateMatch, ParsedTransaction};
use crate::ports::StoredTransaction;

/// Scoring weights and thresholds
#[derive(Debug, Clone)]
pub struct DuplicateConfig {
    /// Score at or above which a transaction is marked a likely duplicate
    pub likely_threshold: f64,
    /// Candidates at or above this are attached for operator review
    pub include_threshold: f64,
    /// Days of date distance at which the date score reaches zero
    pub date_window_days: i64,
    pub amount_weight: f64,
    pub date_weight: f64,
    pub description_weight: f64,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            likely_threshold: 0.7,
            include_threshold: 0.4,
            date_window_days: 3,
            amount_weight: 0.4,
            date_weight: 0.3,
            description_weight: 0.3,
        }
    }
}

/// Scores parsed transactions against existing records
pub struct DuplicateDetectionService {
    config: DuplicateConfig,
}

impl DuplicateDetectionService {
    pub fn new(config: DuplicateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DuplicateConfig {
        &self.config
    }

    /// Score every transaction in the batch against the candidate set.
    /// Returns one match per transaction, batch order preserved.
    pub fn check_batch(
        &self,
        batch: &[ParsedTransaction],
        existing: &[StoredTransaction],
    ) -> Vec<DuplicateMatch> {
        batch
            .iter()
            .enumerate()
            .map(|(index, tx)| self.check_one(index, tx, existing))
            .collect()
    }

    fn check_one(
        &self,
        index: usize,
        tx: &ParsedTransaction,
        existing: &[StoredTransaction],
    ) -> DuplicateMatch {
        let mut scored: Vec<(f64, &StoredTransaction)> = existing
            .iter()
            .map(|candidate| (self.score(tx, candidate), candidate))
            .filter(|(score, _)| *score >= self.config.include_threshold)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let best = scored.first().map(|(score, _)| *score).unwrap_or(0.0);
        DuplicateMatch {
            index,
            transaction: tx.clone(),
            is_likely_duplicate: best >= self.config.likely_threshold,
            confidence_score: best,
            duplicates: scored.iter().map(|(_, c)| c.id).collect(),
        }
    }

    /// Weighted similarity in [0, 1]
    pub fn score(&self, tx: &ParsedTransaction, existing: &StoredTransaction) -> f64 {
        let amount = amount_score(tx.amount, existing.amount);
        let date = self.date_score(tx, existing);
        let description = description_score(&tx.description, &existing.description);

        self.config.amount_weight * amount
            + self.config.date_weight * date
            + self.config.description_weight * description
    }

    fn date_score(&self, tx: &ParsedTransaction, existing: &StoredTransaction) -> f64 {
        let days = (tx.date - existing.date).num_days().abs();
        if days > self.config.date_window_days {
            return 0.0;
        }
        1.0 - days as f64 / self.config.date_window_days as f64
    }
}

impl Default for DuplicateDetectionService {
    fn default() -> Self {
        Self::new(DuplicateConfig::default())
    }
}

/// Exact match scores 1.0; partial credit decays linearly with the relative
/// difference
fn amount_score(a: Decimal, b: Decimal) -> f64 {
    if a == b {
        return 1.0;
    }
    let denominator = a.abs().max(b.abs());
    if denominator == Decimal::ZERO {
        return 1.0;
    }
    let relative = ((a - b).abs() / denominator).to_f64().unwrap_or(1.0);
    (1.0 - relative).max(0.0)
}

/// Jaccard overlap of lower-cased word sets
fn description_score(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 1.0;
    }
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    intersection as f64 / union as f64
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}
