//! What a pipeline run hands back to its caller.

use crate::error::InsightError;
use crate::language::DetectedLanguage;
use crate::report::{AnalysisReport, Stats};
use crate::table::RowRecord;
use serde::{Deserialize, Serialize};

/// Result of [`Pipeline::run`](super::Pipeline::run).
///
/// On failure `report` holds a single `"Error"` section and every other
/// field is `None`. Check [`is_success`](Self::is_success) before
/// persisting anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub report: AnalysisReport,
    /// Every row of the table, including the derived translation column.
    pub rows: Option<Vec<RowRecord>>,
    pub stats: Option<Stats>,
    /// One score per row, aligned with `rows`.
    pub scores: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<RunDetails>,
}

impl PipelineOutcome {
    /// Outcome of a run that stopped with `error`.
    pub fn failure(error: &InsightError) -> Self {
        Self {
            report: AnalysisReport::failure(error),
            rows: None,
            stats: None,
            scores: None,
            details: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.stats.is_some() && self.report.is_success()
    }
}

/// Intermediate decisions of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDetails {
    pub target_column: String,
    /// Target column, or its `_en` translation when one was made.
    pub working_column: String,
    pub language: DetectedLanguage,
    pub patterns: Vec<String>,
    pub translated_rows: usize,
    pub translation_fallbacks: usize,
    pub delimiter: char,
    pub skipped_rows: usize,
    pub scorer: String,
}
