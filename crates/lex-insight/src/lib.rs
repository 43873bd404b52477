//! Tabular Text Analysis Library
//!
//! Turns an uploaded delimited text file into a short analysis report, built
//! on Rust and Polars.
//!
//! # Overview
//!
//! A run goes through these stages:
//!
//! - **Parsing**: Delimiter inference with tolerant row handling
//! - **Column Selection**: Picks the free-text column with the longest values
//! - **Language Detection**: Stop-word heuristic or a remote service
//! - **Translation**: Bounded, concurrent translation with per-row fallback
//! - **Pattern Detection**: Named regex patterns over a sample of rows
//! - **Scoring**: Concurrent, order-preserving lexicon sentiment
//! - **Reporting**: Titled report sections plus run statistics
//!
//! Every run returns a [`PipelineOutcome`]. Failures never escape
//! [`Pipeline::run`]; they come back as a single `"Error"` section.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_insight::{Pipeline, AnalysisConfig, CancellationToken};
//! use lex_insight::language::GoogleTranslateClient;
//! use std::sync::Arc;
//!
//! let raw = std::fs::read_to_string("reviews.csv")?;
//!
//! // Option 1: Defaults (stop-word detection, no translation)
//! let outcome = lex_insight::run_pipeline(&raw, &["Summarization", "Sentiment Analysis"]);
//!
//! // Option 2: Remote translation with progress reporting
//! let token = CancellationToken::new();
//! let pipeline = Pipeline::builder()
//!     .translator(Arc::new(GoogleTranslateClient::new()?))
//!     .cancellation_token(token.clone())
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?;
//!
//! let outcome = pipeline.run(&raw, &lex_insight::DEFAULT_OPERATIONS);
//! for section in outcome.report.iter() {
//!     println!("{}\n{}", section.title, section.output);
//! }
//! ```
//!
//! # Configuration
//!
//! Use [`AnalysisConfig`] to tune the run:
//!
//! ```rust,ignore
//! use lex_insight::AnalysisConfig;
//!
//! let config = AnalysisConfig::builder()
//!     .translation_row_limit(50)     // Translate at most 50 rows
//!     .translation_workers(10)
//!     .scoring_workers(15)
//!     .alert_threshold(-0.3)         // Alert when the mean score is below this
//!     .build()?;
//! ```
//!
//! # History
//!
//! The [`history`] module persists successful runs (a sample of rows, an inbox
//! message and an activity record) through the [`history::HistoryStore`] trait.

pub mod config;
pub mod error;
pub mod history;
pub mod language;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod table;

// Re-export main types for convenience
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ConfigValidationError};
pub use error::{InsightError, Result as InsightResult};
pub use history::{HistoryStore, InMemoryHistoryStore, record_run};
pub use language::{DetectedLanguage, LanguageDetector, StopwordDetector, Translator};
pub use pipeline::{
    AnalysisStage, CancellationToken, ClosureProgressReporter, Pipeline, PipelineBuilder,
    PipelineOutcome, ProgressReporter, ProgressUpdate, RunDetails,
};
pub use report::{AnalysisReport, DEFAULT_OPERATIONS, Operation, ReportSection, Stats};
pub use scoring::{Lexicon, LexiconScorer, PatternRegistry, RowScorer, WeightedRuleScorer};
pub use table::{RowRecord, Table, parse_table};

/// Run the default pipeline over `raw` text.
///
/// Shorthand for `Pipeline::default().run(raw, operations)`.
pub fn run_pipeline<S: AsRef<str>>(raw: &str, operations: &[S]) -> PipelineOutcome {
    Pipeline::default().run(raw, operations)
}
