//! Bounded concurrent translation of the leading rows of a column.

use super::Translator;
use crate::error::{InsightError, Result};
use crate::pipeline::CancellationToken;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Source language passed to the translator; the service detects it.
pub const AUTO_SOURCE: &str = "auto";

/// Result of translating a single row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowTranslation {
    /// The service returned a translation.
    Translated { text: String },
    /// The call failed; the original text is kept.
    Fallback { original: String, reason: String },
    /// Nothing was sent (null value or cancellation).
    Skipped,
}

impl RowTranslation {
    /// Translated text, if the call succeeded.
    pub fn translated_text(&self) -> Option<&str> {
        match self {
            Self::Translated { text } => Some(text),
            _ => None,
        }
    }
}

/// Options for one translation batch.
#[derive(Debug, Clone)]
pub struct TranslationOptions {
    /// Maximum rows sent to the service.
    pub row_limit: usize,
    /// Concurrent in-flight calls.
    pub workers: usize,
    /// Language to translate into.
    pub target_language: String,
}

/// Per-row results for the translated prefix of a column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationBatch {
    pub rows: Vec<RowTranslation>,
}

impl TranslationBatch {
    /// Rows the service translated.
    pub fn translated_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r, RowTranslation::Translated { .. }))
            .count()
    }

    /// Rows that kept their original text after a failed call.
    pub fn fallback_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r, RowTranslation::Fallback { .. }))
            .count()
    }

    /// Build the working column: translations where available, originals elsewhere.
    ///
    /// Rows past the translated prefix keep their original text.
    pub fn working_values(&self, originals: &[Option<String>]) -> Vec<Option<String>> {
        originals
            .iter()
            .enumerate()
            .map(|(row, original)| {
                match self.rows.get(row).and_then(RowTranslation::translated_text) {
                    Some(text) => Some(text.to_string()),
                    None => original.clone(),
                }
            })
            .collect()
    }
}

/// Translate the first `options.row_limit` values through a bounded pool.
///
/// Results are collected by row index. A failed call becomes
/// [`RowTranslation::Fallback`]; once `cancel` is triggered the remaining
/// rows are [`RowTranslation::Skipped`]. The pool is dropped on return.
///
/// `on_row_done` receives `(completed, total)` after every row. Calls are
/// serialised, so `completed` arrives as 1, 2, ... up to `total`.
pub fn translate_values(
    values: &[Option<String>],
    translator: &dyn Translator,
    options: &TranslationOptions,
    cancel: &CancellationToken,
    on_row_done: Option<&(dyn Fn(usize, usize) + Sync)>,
) -> Result<TranslationBatch> {
    let limit = values.len().min(options.row_limit);
    if limit == 0 {
        return Ok(TranslationBatch::default());
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(options.workers.max(1))
        .thread_name(|i| format!("lex-translate-{}", i))
        .build()
        .map_err(|e| InsightError::Internal(format!("translation pool: {}", e)))?;

    debug!(
        "Translating {} of {} rows with {} ({} workers)",
        limit,
        values.len(),
        translator.name(),
        options.workers
    );

    let completed = Mutex::new(0usize);
    let target = options.target_language.as_str();

    let rows: Vec<RowTranslation> = pool.install(|| {
        values[..limit]
            .par_iter()
            .enumerate()
            .map(|(row, value)| {
                let outcome = match value {
                    None => RowTranslation::Skipped,
                    Some(_) if cancel.is_cancelled() => RowTranslation::Skipped,
                    Some(text) => match translator.translate(text, AUTO_SOURCE, target) {
                        Ok(translated) => RowTranslation::Translated { text: translated },
                        Err(e) => {
                            let error = InsightError::TranslationCall {
                                row,
                                reason: e.to_string(),
                            };
                            warn!("{}; keeping original text", error);
                            RowTranslation::Fallback {
                                original: text.clone(),
                                reason: e.to_string(),
                            }
                        }
                    },
                };
                let mut done = completed.lock();
                *done += 1;
                if let Some(callback) = on_row_done {
                    callback(*done, limit);
                }
                drop(done);
                outcome
            })
            .collect()
    });

    Ok(TranslationBatch { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Uppercases text, failing on rows containing "boom".
    struct ShoutingTranslator {
        seen: Mutex<HashSet<String>>,
    }

    impl ShoutingTranslator {
        fn new() -> Self {
            Self {
                seen: Mutex::new(HashSet::new()),
            }
        }
    }

    impl Translator for ShoutingTranslator {
        fn translate(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String> {
            assert_eq!(source, AUTO_SOURCE);
            assert_eq!(target, "en");
            self.seen.lock().insert(text.to_string());
            let delay = 20u64.saturating_sub(text.len() as u64);
            std::thread::sleep(Duration::from_millis(delay));
            if text.contains("boom") {
                return Err(anyhow!("service unavailable"));
            }
            Ok(text.to_uppercase())
        }

        fn name(&self) -> &str {
            "Shouting"
        }
    }

    /// Tracks how many calls are in flight at once.
    struct GaugeTranslator {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Translator for GaugeTranslator {
        fn translate(&self, text: &str, _source: &str, _target: &str) -> anyhow::Result<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(10));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(text.to_uppercase())
        }

        fn name(&self) -> &str {
            "Gauge"
        }
    }

    /// Sleeps longest on the first rows so later rows finish first.
    struct ReversingTranslator {
        rows: u64,
        finished: Mutex<Vec<usize>>,
    }

    impl Translator for ReversingTranslator {
        fn translate(&self, text: &str, _source: &str, _target: &str) -> anyhow::Result<String> {
            let row: u64 = text.trim_start_matches("row ").parse()?;
            std::thread::sleep(Duration::from_millis((self.rows - row) * 5));
            self.finished.lock().push(row as usize);
            Ok(text.to_uppercase())
        }

        fn name(&self) -> &str {
            "Reversing"
        }
    }

    fn options(limit: usize) -> TranslationOptions {
        TranslationOptions {
            row_limit: limit,
            workers: 4,
            target_language: "en".to_string(),
        }
    }

    fn values(n: usize) -> Vec<Option<String>> {
        (0..n).map(|i| Some(format!("row {}", i))).collect()
    }

    #[test]
    fn test_results_align_with_rows() {
        let translator = ShoutingTranslator::new();
        let input = values(12);
        let batch =
            translate_values(&input, &translator, &options(50), &CancellationToken::new(), None)
                .unwrap();

        assert_eq!(batch.rows.len(), 12);
        for (i, row) in batch.rows.iter().enumerate() {
            assert_eq!(row.translated_text(), Some(format!("ROW {}", i).as_str()));
        }
    }

    #[test]
    fn test_row_limit_is_respected() {
        let translator = ShoutingTranslator::new();
        let input = values(60);
        let batch =
            translate_values(&input, &translator, &options(50), &CancellationToken::new(), None)
                .unwrap();

        assert_eq!(batch.rows.len(), 50);
        assert_eq!(translator.seen.lock().len(), 50);

        let working = batch.working_values(&input);
        assert_eq!(working.len(), 60);
        assert_eq!(working[49].as_deref(), Some("ROW 49"));
        assert_eq!(working[50].as_deref(), Some("row 50"));
        assert_eq!(working[59].as_deref(), Some("row 59"));
    }

    #[test]
    fn test_failed_call_falls_back_to_original() {
        let translator = ShoutingTranslator::new();
        let input = vec![
            Some("hola".to_string()),
            Some("boom".to_string()),
            None,
            Some("adios".to_string()),
        ];
        let batch =
            translate_values(&input, &translator, &options(50), &CancellationToken::new(), None)
                .unwrap();

        assert_eq!(batch.translated_count(), 2);
        assert_eq!(batch.fallback_count(), 1);
        assert!(matches!(batch.rows[1], RowTranslation::Fallback { .. }));
        assert_eq!(batch.rows[2], RowTranslation::Skipped);

        let working = batch.working_values(&input);
        assert_eq!(
            working,
            vec![
                Some("HOLA".to_string()),
                Some("boom".to_string()),
                None,
                Some("ADIOS".to_string()),
            ]
        );
    }

    #[test]
    fn test_cancelled_batch_skips_calls() {
        let translator = ShoutingTranslator::new();
        let token = CancellationToken::new();
        token.cancel();

        let batch = translate_values(&values(5), &translator, &options(50), &token, None).unwrap();
        assert!(batch.rows.iter().all(|r| *r == RowTranslation::Skipped));
        assert!(translator.seen.lock().is_empty());
    }

    #[test]
    fn test_progress_callback_counts_every_row() {
        let translator = ShoutingTranslator::new();
        let max_seen = AtomicUsize::new(0);
        let callback = |done: usize, total: usize| {
            assert_eq!(total, 8);
            max_seen.fetch_max(done, Ordering::SeqCst);
        };

        translate_values(
            &values(8),
            &translator,
            &options(50),
            &CancellationToken::new(),
            Some(&callback),
        )
        .unwrap();

        assert_eq!(max_seen.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_in_flight_calls_never_exceed_workers() {
        let translator = GaugeTranslator {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };
        let batch = translate_values(
            &values(40),
            &translator,
            &options(50),
            &CancellationToken::new(),
            None,
        )
        .unwrap();

        assert_eq!(batch.translated_count(), 40);
        let peak = translator.peak.load(Ordering::SeqCst);
        assert!(peak <= 4, "peak in-flight calls was {}", peak);
        assert!(peak > 1, "calls never overlapped");
    }

    #[test]
    fn test_rows_keep_input_order_when_completion_is_reversed() {
        let translator = ReversingTranslator {
            rows: 16,
            finished: Mutex::new(Vec::new()),
        };
        let batch = translate_values(
            &values(16),
            &translator,
            &options(50),
            &CancellationToken::new(),
            None,
        )
        .unwrap();

        let finished = translator.finished.lock().clone();
        assert_ne!(finished, (0..16).collect::<Vec<_>>());

        for (i, row) in batch.rows.iter().enumerate() {
            assert_eq!(row.translated_text(), Some(format!("ROW {}", i).as_str()));
        }
    }

    #[test]
    fn test_progress_updates_are_monotonic() {
        let translator = ReversingTranslator {
            rows: 12,
            finished: Mutex::new(Vec::new()),
        };
        let reported = Mutex::new(Vec::new());
        let callback = |done: usize, _total: usize| reported.lock().push(done);

        translate_values(
            &values(12),
            &translator,
            &options(50),
            &CancellationToken::new(),
            Some(&callback),
        )
        .unwrap();

        assert_eq!(reported.into_inner(), (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_input_translates_nothing() {
        let translator = ShoutingTranslator::new();
        let batch =
            translate_values(&[], &translator, &options(50), &CancellationToken::new(), None)
                .unwrap();
        assert!(batch.rows.is_empty());
    }
}
