//! Report sections and run statistics.

mod assembler;

pub use assembler::{AnalysisContext, ReportAssembler};

use crate::config::AnalysisConfig;
use crate::error::InsightError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Operations run when the caller does not name any.
pub const DEFAULT_OPERATIONS: [&str; 4] = [
    "Summarization",
    "Sentiment Analysis",
    "Keyword Extraction",
    "Translation",
];

/// A requested report operation.
///
/// Names match exactly; anything else is [`Operation::Unsupported`] and
/// still produces a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Summarization,
    SentimentAnalysis,
    KeywordExtraction,
    Translation,
    Unsupported,
}

impl Operation {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Summarization" => Self::Summarization,
            "Sentiment Analysis" => Self::SentimentAnalysis,
            "Keyword Extraction" => Self::KeywordExtraction,
            "Translation" => Self::Translation,
            _ => Self::Unsupported,
        }
    }
}

/// One titled block of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    pub output: String,
    pub success: bool,
}

impl ReportSection {
    pub fn new(title: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            output: output.into(),
            success: true,
        }
    }

    /// The single section reported for a failed run.
    pub fn failure(error: &InsightError) -> Self {
        Self {
            title: "Error".to_string(),
            output: error.to_string(),
            success: false,
        }
    }
}

/// Ordered report sections; serialises as a plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisReport {
    sections: Vec<ReportSection>,
}

impl AnalysisReport {
    pub fn new(sections: Vec<ReportSection>) -> Self {
        Self { sections }
    }

    /// A report holding only the failure section for `error`.
    pub fn failure(error: &InsightError) -> Self {
        Self::new(vec![ReportSection::failure(error)])
    }

    pub fn push(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReportSection> {
        self.sections.iter()
    }

    /// True unless some section failed.
    pub fn is_success(&self) -> bool {
        self.sections.iter().all(|s| s.success)
    }

    pub fn into_sections(self) -> Vec<ReportSection> {
        self.sections
    }
}

impl<'a> IntoIterator for &'a AnalysisReport {
    type Item = &'a ReportSection;
    type IntoIter = std::slice::Iter<'a, ReportSection>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}

/// Aggregate statistics of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_rows: usize,
    /// Notional groups of `rows_per_chunk` rows, rounded up, at least 1.
    pub total_chunks: usize,
    /// Wall-clock seconds for the whole run.
    pub processing_time: f64,
    pub avg_score: f64,
    /// Average score fell below the configured alert threshold.
    pub alert: bool,
}

impl Stats {
    pub fn compute(
        total_rows: usize,
        scores: &[i32],
        elapsed: Duration,
        config: &AnalysisConfig,
    ) -> Self {
        let avg_score = average_score(scores);
        Self {
            total_rows,
            total_chunks: total_rows.div_ceil(config.rows_per_chunk.max(1)).max(1),
            processing_time: elapsed.as_secs_f64(),
            avg_score,
            alert: avg_score < config.alert_threshold,
        }
    }
}

/// Mean of the scores, 0.0 when there are none.
pub fn average_score(scores: &[i32]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().map(|&s| s as f64).sum::<f64>() / scores.len() as f64
}
