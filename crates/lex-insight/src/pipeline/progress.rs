//! Progress reporting and cancellation for the analysis pipeline.
//!
//! The translation step is the long one (one network call per row), so it
//! reports per-row progress and checks the cancellation token before each
//! call. Other stages report once on entry.
//!
//! # Example
//!
//! ```rust,ignore
//! use lex_insight::{CancellationToken, Pipeline};
//!
//! // Give up once 20 rows have been translated.
//! let token = CancellationToken::new();
//! let stop = token.clone();
//!
//! let outcome = Pipeline::builder()
//!     .translator(translator)
//!     .cancellation_token(token)
//!     .on_progress(move |update| {
//!         if update.items_processed.is_some_and(|done| done >= 20) {
//!             stop.cancel();
//!         }
//!     })
//!     .build()?
//!     .run(&raw, &["Translation"]);
//!
//! assert!(!outcome.is_success());
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Stages of the analysis pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    /// Parsing raw text into a table
    Parsing,
    /// Choosing the free-text column
    ColumnSelection,
    /// Detecting the language of the target column
    LanguageDetection,
    /// Translating the leading rows
    Translation,
    /// Matching pattern categories
    PatternDetection,
    /// Scoring every row
    Scoring,
    /// Building report sections and stats
    ReportAssembly,
    /// Terminal: outcome returned
    Complete,
    /// Terminal: the token was cancelled
    Cancelled,
    /// Terminal: a fatal error stopped the run
    Failed,
}

impl AnalysisStage {
    /// Label used in CLI progress lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Parsing => "Parsing Input",
            Self::ColumnSelection => "Selecting Column",
            Self::LanguageDetection => "Detecting Language",
            Self::Translation => "Translating Rows",
            Self::PatternDetection => "Detecting Patterns",
            Self::Scoring => "Scoring Rows",
            Self::ReportAssembly => "Assembling Report",
            Self::Complete => "Complete",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Failed",
        }
    }

    /// Share of the overall run spent in this stage (0.0 - 1.0).
    ///
    /// Working stages sum to 1.0; terminal states weigh nothing.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Parsing => 0.10,
            Self::ColumnSelection => 0.05,
            Self::LanguageDetection => 0.05,
            Self::Translation => 0.40,
            Self::PatternDetection => 0.05,
            Self::Scoring => 0.25,
            Self::ReportAssembly => 0.10,
            Self::Complete | Self::Cancelled | Self::Failed => 0.0,
        }
    }

    /// Overall progress when this stage starts.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Parsing => 0.0,
            Self::ColumnSelection => 0.10,
            Self::LanguageDetection => 0.15,
            Self::Translation => 0.20,
            Self::PatternDetection => 0.60,
            Self::Scoring => 0.65,
            Self::ReportAssembly => 0.90,
            Self::Complete => 1.0,
            Self::Cancelled | Self::Failed => 0.0,
        }
    }
}

/// One progress event. Both fractions are clamped to `0.0..=1.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: AnalysisStage,

    /// Fraction of the whole run
    pub progress: f32,

    /// Fraction of `stage`
    pub stage_progress: f32,

    pub message: String,

    /// Rows processed so far in the current stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    /// Rows to process in the current stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    /// Update `stage_progress` of the way through `stage`.
    pub fn new(stage: AnalysisStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Update after `current` of `total` rows; stage progress is their ratio.
    pub fn with_items(
        stage: AnalysisStage,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = match total {
            0 => 0.0,
            total => current as f32 / total as f32,
        };
        Self {
            items_processed: Some(current),
            items_total: Some(total),
            ..Self::new(stage, stage_progress, message)
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(AnalysisStage::Complete, 1.0, message)
    }

    pub fn cancelled() -> Self {
        Self::new(AnalysisStage::Cancelled, 0.0, "Analysis cancelled")
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(AnalysisStage::Failed, 0.0, message)
    }
}

/// Receives progress updates during a run.
///
/// Translation progress is reported from worker threads, so implementations
/// must be `Send + Sync` and should return quickly.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure, see [`PipelineBuilder::on_progress`](super::PipelineBuilder::on_progress).
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

/// Token for cancelling a running pipeline.
///
/// Clones share state. Translation workers check the token before every
/// call; the pipeline checks it between stages and returns a failure outcome
/// with [`InsightError::Cancelled`](crate::error::InsightError::Cancelled).
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(CancellationToken: Send, Sync);
static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. Safe to call from any thread.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once this token or any clone has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused for another run.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_token_starts_clear() {
        assert!(!CancellationToken::default().is_cancelled());
    }

    #[test]
    fn test_token_clones_see_cancel_and_reset() {
        let original = CancellationToken::new();
        let worker = original.clone();

        worker.cancel();
        assert!(original.is_cancelled());

        original.reset();
        assert!(!worker.is_cancelled());
    }

    #[test]
    fn test_progress_update_with_items() {
        let update = ProgressUpdate::with_items(AnalysisStage::Translation, 25, 50, "Translating");
        assert_eq!(update.stage, AnalysisStage::Translation);
        assert_eq!(update.stage_progress, 0.5);
        assert!((update.progress - 0.40).abs() < 1e-6);
        assert_eq!(update.items_processed, Some(25));
        assert_eq!(update.items_total, Some(50));
    }

    #[test]
    fn test_progress_update_terminal_states() {
        let done = ProgressUpdate::complete("Done");
        assert_eq!(done.stage, AnalysisStage::Complete);
        assert_eq!(done.progress, 1.0);

        assert_eq!(ProgressUpdate::cancelled().stage, AnalysisStage::Cancelled);
        assert_eq!(ProgressUpdate::failed("boom").message, "boom");
    }

    #[test]
    fn test_stage_weights_sum() {
        let stages = [
            AnalysisStage::Parsing,
            AnalysisStage::ColumnSelection,
            AnalysisStage::LanguageDetection,
            AnalysisStage::Translation,
            AnalysisStage::PatternDetection,
            AnalysisStage::Scoring,
            AnalysisStage::ReportAssembly,
        ];

        let total: f32 = stages.iter().map(AnalysisStage::weight).sum();
        assert!((total - 1.0).abs() < 1e-4);

        for pair in stages.windows(2) {
            let expected = pair[0].base_progress() + pair[0].weight();
            assert!((pair[1].base_progress() - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_closure_reporter_from_worker_threads() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ClosureProgressReporter::new(move |update: ProgressUpdate| {
            sink.lock().push(update.items_processed);
        });

        std::thread::scope(|scope| {
            for row in 1..=4 {
                let reporter = &reporter;
                scope.spawn(move || {
                    reporter.report(ProgressUpdate::with_items(
                        AnalysisStage::Translation,
                        row,
                        4,
                        "row",
                    ));
                });
            }
        });

        let mut seen = seen.lock().clone();
        seen.sort();
        assert_eq!(seen, vec![Some(1), Some(2), Some(3), Some(4)]);
    }

    #[test]
    fn test_stage_json_values() {
        let json = serde_json::to_string(&AnalysisStage::LanguageDetection).unwrap();
        assert_eq!(json, "\"language_detection\"");
        let json = serde_json::to_string(&AnalysisStage::ReportAssembly).unwrap();
        assert_eq!(json, "\"report_assembly\"");
    }
}
