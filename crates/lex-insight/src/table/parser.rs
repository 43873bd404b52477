//! Delimited text parsing with delimiter inference.
//!
//! Records are split with the `csv` crate so quoted fields survive, cleaned
//! (malformed rows dropped, short rows padded, leading blanks trimmed), then
//! re-emitted as plain CSV and handed to polars for schema inference.

use super::Table;
use crate::error::{InsightError, Result};
use csv::{ReaderBuilder, WriterBuilder};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::{debug, warn};

/// Delimiters tried during inference, in priority order.
pub const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Split text into records, counting records the reader could not decode.
fn read_records(text: &str, delimiter: u8, limit: Option<usize>) -> (Vec<Vec<String>>, usize) {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    let mut undecodable = 0usize;

    for result in reader.records() {
        if limit.is_some_and(|limit| records.len() >= limit) {
            break;
        }
        match result {
            Ok(record) => {
                let fields: Vec<String> = record
                    .iter()
                    .map(|field| field.trim_start().to_string())
                    .collect();
                if fields.iter().all(|field| field.trim().is_empty()) {
                    continue;
                }
                records.push(fields);
            }
            Err(e) => {
                debug!("Skipping undecodable record: {}", e);
                undecodable += 1;
            }
        }
    }

    (records, undecodable)
}

/// Infer the delimiter from the first `sample_records` records.
///
/// A candidate is scored by how many sampled records share the header's
/// field count; the header must split into at least two fields. Ties go to
/// the candidate producing more columns, then to candidate order. Falls
/// back to a comma when no candidate splits the header.
pub fn infer_delimiter(text: &str, sample_records: usize) -> u8 {
    let mut best: Option<(u8, usize, usize)> = None;

    for &delimiter in &CANDIDATE_DELIMITERS {
        let (records, _) = read_records(text, delimiter, Some(sample_records.max(1)));
        let Some(header) = records.first() else {
            continue;
        };
        let columns = header.len();
        if columns < 2 {
            continue;
        }
        let consistent = records.iter().filter(|r| r.len() == columns).count();

        let better = match best {
            None => true,
            Some((_, best_consistent, best_columns)) => {
                (consistent, columns) > (best_consistent, best_columns)
            }
        };
        if better {
            best = Some((delimiter, consistent, columns));
        }
    }

    best.map(|(delimiter, _, _)| delimiter).unwrap_or(b',')
}

/// Give blank header cells a positional name and make duplicates unique.
fn normalise_header(header: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let base = match name.trim() {
                "" => format!("column_{}", idx + 1),
                trimmed => trimmed.to_string(),
            };
            let occurrences = seen.entry(base.clone()).or_insert(0);
            *occurrences += 1;
            if *occurrences == 1 {
                base
            } else {
                format!("{}_{}", base, *occurrences - 1)
            }
        })
        .collect()
}

/// Parse raw delimited text into a [`Table`].
///
/// # Errors
///
/// - [`InsightError::EmptyInput`] for empty or whitespace-only input
/// - [`InsightError::InvalidFormat`] when no header or no data rows survive
pub fn parse_table(raw: &str, sample_records: usize) -> Result<Table> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(InsightError::EmptyInput);
    }

    let delimiter = infer_delimiter(text, sample_records);
    debug!("Inferred delimiter: {:?}", delimiter as char);

    let (mut records, undecodable) = read_records(text, delimiter, None);
    if records.is_empty() {
        return Err(InsightError::InvalidFormat("no header row found".to_string()));
    }

    let header = normalise_header(&records.remove(0));
    let columns = header.len();

    let mut skipped = undecodable;
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(records.len());
    for mut record in records {
        if record.len() > columns {
            skipped += 1;
            continue;
        }
        record.resize(columns, String::new());
        rows.push(record);
    }

    if skipped > 0 {
        warn!("Skipped {} malformed rows", skipped);
    }
    if rows.is_empty() {
        return Err(InsightError::InvalidFormat("no data rows found".to_string()));
    }

    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(&header)?;
    for row in &rows {
        writer.write_record(row)?;
    }
    let cleaned = writer
        .into_inner()
        .map_err(|e| InsightError::Internal(format!("failed to flush CSV buffer: {}", e)))?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .into_reader_with_file_handle(Cursor::new(cleaned))
        .finish()
        .map_err(|e| InsightError::InvalidFormat(e.to_string()))?;

    debug!("Parsed table shape: {:?}", df.shape());
    Table::with_parse_info(df, delimiter, skipped)
}
