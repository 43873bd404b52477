//! Weighted regex rules over cleaned text.

use super::RowScorer;
use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").expect("Invalid regex: html tag"));

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\s]").expect("Invalid regex: non-alphanumeric"));

const DEFAULT_RULES: [(&str, i32); 4] = [
    (r"urgent|immediate|asap", -5),
    (r"excellent|perfect|great|happy", 5),
    (r"error|fail|broken|bad", -3),
    (r"provisional|success", 2),
];

/// Strip HTML tags and anything outside ASCII letters, digits and whitespace.
pub fn clean_text(text: &str) -> String {
    let without_tags = HTML_TAG.replace_all(text, "");
    NON_ALPHANUMERIC
        .replace_all(&without_tags, "")
        .trim()
        .to_string()
}

#[derive(Debug, Clone)]
struct ScoringRule {
    pattern: Regex,
    weight: i32,
}

/// Adds the weight of every rule that matches the cleaned, lowercased row.
///
/// A rule contributes at most once per row.
#[derive(Debug, Clone)]
pub struct WeightedRuleScorer {
    rules: Vec<ScoringRule>,
}

impl Default for WeightedRuleScorer {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES
                .iter()
                .map(|(pattern, weight)| ScoringRule {
                    pattern: Regex::new(pattern).expect("Invalid regex: default scoring rule"),
                    weight: *weight,
                })
                .collect(),
        }
    }
}

impl WeightedRuleScorer {
    /// Build a scorer from `(pattern, weight)` pairs, matched against lowercase text.
    pub fn new<'a, I>(rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, i32)>,
    {
        let rules = rules
            .into_iter()
            .map(|(pattern, weight)| -> Result<ScoringRule> {
                Ok(ScoringRule {
                    pattern: Regex::new(pattern)?,
                    weight,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl RowScorer for WeightedRuleScorer {
    fn score(&self, text: &str) -> i32 {
        let cleaned = clean_text(text).to_lowercase();
        self.rules
            .iter()
            .filter(|rule| rule.pattern.is_match(&cleaned))
            .map(|rule| rule.weight)
            .sum()
    }

    fn name(&self) -> &str {
        "WeightedRules"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("<b>Great!</b> service :)"), "Great service");
        assert_eq!(clean_text("  plain text  "), "plain text");
        assert_eq!(clean_text("<p></p>"), "");
    }

    #[test]
    fn test_default_rules() {
        let scorer = WeightedRuleScorer::default();
        assert_eq!(scorer.rule_count(), 4);
        assert_eq!(scorer.score("An EXCELLENT result"), 5);
        assert_eq!(scorer.score("urgent: system error"), -8);
        assert_eq!(scorer.score("provisional success, happy"), 7);
        assert_eq!(scorer.score("neutral remark"), 0);
    }

    #[test]
    fn test_rule_counts_once_per_row() {
        let scorer = WeightedRuleScorer::default();
        assert_eq!(scorer.score("bad bad broken fail"), -3);
    }

    #[test]
    fn test_tags_are_removed_before_matching() {
        let scorer = WeightedRuleScorer::default();
        assert_eq!(scorer.score("<span class=\"great\">ok</span>"), 0);
    }

    #[test]
    fn test_custom_rules() {
        let scorer = WeightedRuleScorer::new([("refund", -2), ("thanks", 1)]).unwrap();
        assert_eq!(scorer.score("Thanks, refund please"), -1);
        assert!(WeightedRuleScorer::new([("(", 1)]).is_err());
    }
}
