//! Lexicon-based row scoring.

use super::RowScorer;
use serde::{Deserialize, Serialize};

const DEFAULT_POSITIVE: [&str; 10] = [
    "total",
    "graduate",
    "agriculture",
    "forestry",
    "fishing",
    "support",
    "active",
    "success",
    "helpful",
    "profit",
];

const DEFAULT_NEGATIVE: [&str; 10] = [
    "debt",
    "overdraft",
    "outstanding",
    "issue",
    "delayed",
    "fail",
    "error",
    "poor",
    "unpaid",
    "loss",
];

/// Positive and negative term sets, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lexicon {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new(DEFAULT_POSITIVE, DEFAULT_NEGATIVE)
    }
}

impl Lexicon {
    pub fn new<P, N>(positive: P, negative: N) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        Self {
            positive: normalise_terms(positive),
            negative: normalise_terms(negative),
        }
    }

    pub fn positive(&self) -> &[String] {
        &self.positive
    }

    pub fn negative(&self) -> &[String] {
        &self.negative
    }
}

fn normalise_terms<I>(terms: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for term in terms {
        let term = term.as_ref().trim().to_lowercase();
        if !term.is_empty() && !out.contains(&term) {
            out.push(term);
        }
    }
    out
}

/// Scores a row as (positive terms present) minus (negative terms present).
///
/// Terms match as case-insensitive substrings and count once per row,
/// however often they occur.
#[derive(Debug, Clone, Default)]
pub struct LexiconScorer {
    lexicon: Lexicon,
}

impl LexiconScorer {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }
}

impl RowScorer for LexiconScorer {
    fn score(&self, text: &str) -> i32 {
        let lowered = text.to_lowercase();
        let hits = |terms: &[String]| terms.iter().filter(|t| lowered.contains(t.as_str())).count();
        hits(&self.lexicon.positive) as i32 - hits(&self.lexicon.negative) as i32
    }

    fn name(&self) -> &str {
        "Lexicon"
    }
}
