//! Error types for the text analysis pipeline.
//!
//! Pipeline-fatal kinds (empty input, invalid format, no eligible column,
//! cancellation) abort a run and surface as a single failure section.
//! Translation and detection failures are recovered per call and only appear
//! here so they can be logged and tested as values.
//!
//! Errors are serializable as `{code, message}` so a service layer can hand
//! them to a frontend unchanged.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum InsightError {
    /// Input text was empty or contained only whitespace.
    #[error("Invalid Data Format: input is empty")]
    EmptyInput,

    /// Input could not be parsed as delimited tabular data.
    #[error("Invalid Data Format: {0}")]
    InvalidFormat(String),

    /// The parsed table has no column to analyse.
    #[error("No eligible text column found")]
    NoEligibleColumn,

    /// A single translation call failed. Recovered by keeping the original text.
    #[error("Translation of row {row} failed: {reason}")]
    TranslationCall { row: usize, reason: String },

    /// Language detection failed. Recovered by assuming English.
    #[error("Language detection failed: {0}")]
    Detection(String),

    /// Pipeline was cancelled by the caller.
    #[error("Pipeline cancelled")]
    Cancelled,

    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// Internal error (e.g., worker pool failed to start).
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reader/writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid regular expression in a pattern registry or rule set.
    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    /// HTTP request error (only with the "remote" feature).
    #[cfg(feature = "remote")]
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),
}

impl InsightError {
    /// Stable error code for callers that branch on the failure kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "EMPTY_INPUT",
            Self::InvalidFormat(_) => "INVALID_FORMAT",
            Self::NoEligibleColumn => "NO_ELIGIBLE_COLUMN",
            Self::TranslationCall { .. } => "TRANSLATION_CALL_FAILED",
            Self::Detection(_) => "DETECTION_FAILED",
            Self::Cancelled => "CANCELLED",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Csv(_) => "CSV_ERROR",
            Self::Regex(_) => "INVALID_PATTERN",
            #[cfg(feature = "remote")]
            Self::HttpRequest(_) => "HTTP_REQUEST_ERROR",
        }
    }

    /// Check if this error represents a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this error aborts the whole run.
    ///
    /// Translation and detection failures are recovered where they happen.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::TranslationCall { .. } | Self::Detection(_))
    }
}

impl Serialize for InsightError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("InsightError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, InsightError>;
