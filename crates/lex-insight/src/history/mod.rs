//! Run history: processed rows, inbox messages and activity records.
//!
//! The pipeline itself never persists anything. Callers hand a finished
//! [`PipelineOutcome`] to [`record_run`], which refuses failed outcomes and
//! otherwise writes a bounded sample of rows plus one inbox message and one
//! activity record.

mod memory;

pub use memory::InMemoryHistoryStore;

use crate::error::Result;
use crate::pipeline::PipelineOutcome;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Filename recorded when the caller does not supply one.
pub const DEFAULT_FILENAME: &str = "Bulk_Data.csv";

/// Rows persisted per run.
pub const DEFAULT_ROW_LIMIT: usize = 50;

/// Results returned by a search when no limit is given.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// A persisted row with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRow {
    pub id: u64,
    /// JSON rendering of the row record.
    pub content: String,
    pub score: i32,
    /// RFC 3339 local time.
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxMessage {
    pub id: u64,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Report sections as a JSON array.
    pub report_data: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: u64,
    pub filename: String,
    /// Requested operations joined with `", "`.
    pub operations: String,
    pub status: String,
    pub records_count: usize,
    pub processing_time: f64,
    pub report_data: String,
    pub timestamp: String,
}

/// Inbox message before the store assigns an id and timestamp.
#[derive(Debug, Clone)]
pub struct InboxDraft {
    pub title: String,
    pub message: String,
    pub kind: MessageKind,
    pub report_data: String,
}

/// Activity record before the store assigns an id and timestamp.
#[derive(Debug, Clone)]
pub struct ActivityDraft {
    pub filename: String,
    pub operations: String,
    pub status: String,
    pub records_count: usize,
    pub processing_time: f64,
    pub report_data: String,
}

/// Storage for run history.
///
/// Listing methods return newest entries first.
pub trait HistoryStore: Send + Sync {
    /// Append `(content, score)` rows.
    fn append_rows(&self, rows: Vec<(String, i32)>) -> Result<()>;

    fn push_inbox(&self, draft: InboxDraft) -> Result<InboxMessage>;

    fn push_activity(&self, draft: ActivityDraft) -> Result<ActivityRecord>;

    /// Rows whose content contains `query`, case-insensitively.
    fn search(&self, query: &str, limit: usize) -> Result<Vec<ProcessedRow>>;

    fn activity(&self) -> Result<Vec<ActivityRecord>>;

    fn inbox(&self) -> Result<Vec<InboxMessage>>;

    /// Remove rows, inbox messages and activity records.
    fn clear(&self) -> Result<()>;
}

/// Persist a successful run.
///
/// Returns `Ok(false)` without writing anything when `outcome` is a failure.
/// Otherwise stores the first `row_limit` rows with their aligned scores, an
/// "Analysis Task Completed" inbox message and a "Completed" activity record.
pub fn record_run<S: AsRef<str>>(
    store: &dyn HistoryStore,
    outcome: &PipelineOutcome,
    filename: &str,
    operations: &[S],
    row_limit: usize,
) -> Result<bool> {
    let (Some(rows), Some(stats), Some(scores)) = (&outcome.rows, &outcome.stats, &outcome.scores)
    else {
        debug!("Not recording a failed run");
        return Ok(false);
    };
    if !outcome.report.is_success() {
        debug!("Not recording a failed run");
        return Ok(false);
    }

    let sample = rows
        .iter()
        .zip(scores)
        .take(row_limit)
        .map(|(row, score)| -> Result<(String, i32)> {
            Ok((serde_json::to_string(row)?, *score))
        })
        .collect::<Result<Vec<_>>>()?;
    let stored = sample.len();
    store.append_rows(sample)?;

    let report_data = serde_json::to_string(&outcome.report)?;
    store.push_inbox(InboxDraft {
        title: "Analysis Task Completed".to_string(),
        message: format!("Successfully processed {} records.", rows.len()),
        kind: MessageKind::Success,
        report_data: report_data.clone(),
    })?;

    let filename = if filename.trim().is_empty() {
        DEFAULT_FILENAME
    } else {
        filename
    };
    store.push_activity(ActivityDraft {
        filename: filename.to_string(),
        operations: operations
            .iter()
            .map(|op| op.as_ref())
            .collect::<Vec<_>>()
            .join(", "),
        status: "Completed".to_string(),
        records_count: rows.len(),
        processing_time: stats.processing_time,
        report_data,
    })?;

    info!("Recorded run of {} rows ({} stored)", rows.len(), stored);
    Ok(true)
}
