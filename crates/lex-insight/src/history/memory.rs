//! In-process history store with JSON snapshots.

use super::{
    ActivityDraft, ActivityRecord, HistoryStore, InboxDraft, InboxMessage, ProcessedRow,
};
use crate::error::Result;
use chrono::Local;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryData {
    next_id: u64,
    rows: Vec<ProcessedRow>,
    inbox: Vec<InboxMessage>,
    activity: Vec<ActivityRecord>,
}

impl HistoryData {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn now() -> String {
    Local::now().to_rfc3339()
}

/// History kept in memory behind a `parking_lot::RwLock`.
///
/// Entries are stored oldest first; listings reverse them. Use
/// [`save`](Self::save) and [`load`](Self::load) to keep history between
/// processes.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    data: RwLock<HistoryData>,
}

static_assertions::assert_impl_all!(InMemoryHistoryStore: Send, Sync);

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot written by [`save`](Self::save).
    ///
    /// A missing file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No history at {}, starting empty", path.display());
            return Ok(Self::new());
        }
        let text = fs::read_to_string(path)?;
        let data: HistoryData = serde_json::from_str(&text)?;
        debug!(
            "Loaded history from {} ({} rows, {} runs)",
            path.display(),
            data.rows.len(),
            data.activity.len()
        );
        Ok(Self {
            data: RwLock::new(data),
        })
    }

    /// Write the whole store as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&*self.data.read())?;
        fs::write(path, json)?;
        info!("History saved: {}", path.display());
        Ok(())
    }

    /// Number of stored rows.
    pub fn row_count(&self) -> usize {
        self.data.read().rows.len()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn append_rows(&self, rows: Vec<(String, i32)>) -> Result<()> {
        let mut data = self.data.write();
        let timestamp = now();
        for (content, score) in rows {
            let id = data.allocate_id();
            data.rows.push(ProcessedRow {
                id,
                content,
                score,
                timestamp: timestamp.clone(),
            });
        }
        Ok(())
    }

    fn push_inbox(&self, draft: InboxDraft) -> Result<InboxMessage> {
        let mut data = self.data.write();
        let message = InboxMessage {
            id: data.allocate_id(),
            title: draft.title,
            message: draft.message,
            kind: draft.kind,
            report_data: draft.report_data,
            timestamp: now(),
        };
        data.inbox.push(message.clone());
        Ok(message)
    }

    fn push_activity(&self, draft: ActivityDraft) -> Result<ActivityRecord> {
        let mut data = self.data.write();
        let record = ActivityRecord {
            id: data.allocate_id(),
            filename: draft.filename,
            operations: draft.operations,
            status: draft.status,
            records_count: draft.records_count,
            processing_time: draft.processing_time,
            report_data: draft.report_data,
            timestamp: now(),
        };
        data.activity.push(record.clone());
        Ok(record)
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<ProcessedRow>> {
        let needle = query.to_lowercase();
        Ok(self
            .data
            .read()
            .rows
            .iter()
            .rev()
            .filter(|row| row.content.to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }

    fn activity(&self) -> Result<Vec<ActivityRecord>> {
        Ok(self.data.read().activity.iter().rev().cloned().collect())
    }

    fn inbox(&self) -> Result<Vec<InboxMessage>> {
        Ok(self.data.read().inbox.iter().rev().cloned().collect())
    }

    fn clear(&self) -> Result<()> {
        let mut data = self.data.write();
        data.rows.clear();
        data.inbox.clear();
        data.activity.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MessageKind;
    use pretty_assertions::assert_eq;

    fn activity(filename: &str) -> ActivityDraft {
        ActivityDraft {
            filename: filename.to_string(),
            operations: "Summarization".to_string(),
            status: "Completed".to_string(),
            records_count: 3,
            processing_time: 0.25,
            report_data: "[]".to_string(),
        }
    }

    #[test]
    fn test_search_is_case_insensitive_and_newest_first() {
        let store = InMemoryHistoryStore::new();
        store
            .append_rows(vec![
                ("Loan DEBT overdue".to_string(), -1),
                ("all good".to_string(), 0),
                ("more debt".to_string(), -1),
            ])
            .unwrap();

        let hits = store.search("debt", 10).unwrap();
        let contents: Vec<&str> = hits.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["more debt", "Loan DEBT overdue"]);

        assert_eq!(store.search("debt", 1).unwrap().len(), 1);
        assert_eq!(store.search("", 10).unwrap().len(), 3);
    }

    #[test]
    fn test_listings_are_newest_first() {
        let store = InMemoryHistoryStore::new();
        store.push_activity(activity("first.csv")).unwrap();
        let second = store.push_activity(activity("second.csv")).unwrap();

        let listed = store.activity().unwrap();
        assert_eq!(listed[0], second);
        assert_eq!(listed[1].filename, "first.csv");
        assert!(listed[0].id > listed[1].id);
    }

    #[test]
    fn test_clear_removes_everything() {
        let store = InMemoryHistoryStore::new();
        store.append_rows(vec![("row".to_string(), 1)]).unwrap();
        store.push_activity(activity("a.csv")).unwrap();
        store
            .push_inbox(InboxDraft {
                title: "t".to_string(),
                message: "m".to_string(),
                kind: MessageKind::Info,
                report_data: "[]".to_string(),
            })
            .unwrap();

        store.clear().unwrap();
        assert_eq!(store.row_count(), 0);
        assert!(store.activity().unwrap().is_empty());
        assert!(store.inbox().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_snapshot() {
        let dir = std::env::temp_dir().join(format!("lex-insight-history-{}", std::process::id()));
        let path = dir.join("nested").join("history.json");

        let store = InMemoryHistoryStore::new();
        store.append_rows(vec![("saved row".to_string(), 2)]).unwrap();
        store.push_activity(activity("saved.csv")).unwrap();
        store.save(&path).unwrap();

        let loaded = InMemoryHistoryStore::load(&path).unwrap();
        assert_eq!(loaded.search("saved", 10).unwrap()[0].score, 2);
        assert_eq!(loaded.activity().unwrap()[0].filename, "saved.csv");

        // ids keep increasing after a reload
        let next = loaded.push_activity(activity("after.csv")).unwrap();
        assert_eq!(next.id, 3);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let store = InMemoryHistoryStore::load("/definitely/not/here/history.json").unwrap();
        assert_eq!(store.row_count(), 0);
    }
}
