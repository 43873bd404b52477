//! Pattern detection and per-row sentiment scoring.
//!
//! Scoring runs every row of the working column through a [`RowScorer`] on a
//! dedicated worker pool. Two scorers are provided:
//!
//! - [`LexiconScorer`] - positive minus negative terms present (default)
//! - [`WeightedRuleScorer`] - weighted regex rules over cleaned text

mod lexicon;
mod patterns;
mod rules;

pub use lexicon::{Lexicon, LexiconScorer};
pub use patterns::{PatternRegistry, detect_patterns};
pub use rules::{WeightedRuleScorer, clean_text};

use crate::error::{InsightError, Result};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::debug;

/// Assigns an integer sentiment score to a row of text.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; rows are scored concurrently.
pub trait RowScorer: Send + Sync {
    /// Score one row. Positive is favourable, negative unfavourable.
    fn score(&self, text: &str) -> i32;

    /// Get the scorer name for logging and debugging.
    fn name(&self) -> &str;
}

/// Score every value on a pool of `workers` threads.
///
/// `scores[i]` always belongs to `values[i]`; nulls score as empty text.
///
/// # Errors
///
/// [`InsightError::Internal`] if the worker pool cannot be started.
pub fn score_rows(
    values: &[Option<String>],
    scorer: &dyn RowScorer,
    workers: usize,
) -> Result<Vec<i32>> {
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("lex-score-{}", i))
        .build()
        .map_err(|e| InsightError::Internal(format!("scoring pool: {}", e)))?;

    debug!(
        "Scoring {} rows with {} ({} workers)",
        values.len(),
        scorer.name(),
        workers
    );

    let scores = pool.install(|| {
        values
            .par_iter()
            .map(|value| scorer.score(value.as_deref().unwrap_or_default()))
            .collect()
    });

    Ok(scores)
}
