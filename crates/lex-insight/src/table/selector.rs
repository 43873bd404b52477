//! Target column selection.
//!
//! The column with the longest average value is assumed to carry free text.

use super::Table;
use crate::config::AnalysisConfig;
use crate::error::{InsightError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The column chosen for textual analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetColumn {
    pub name: String,
    pub mean_length: f64,
}

/// Columns eligible for text analysis, in table order.
///
/// Names in the excluded set are dropped unless that would leave nothing,
/// in which case every column is a candidate.
pub fn candidate_columns(table: &Table, config: &AnalysisConfig) -> Vec<String> {
    let all = table.column_names();
    let eligible: Vec<String> = all
        .iter()
        .filter(|name| !config.is_excluded(name))
        .cloned()
        .collect();

    if eligible.is_empty() {
        debug!("Every column is excluded, considering all {} columns", all.len());
        all
    } else {
        eligible
    }
}

/// Mean character length of each candidate column's values.
///
/// Nulls count as empty strings.
pub fn column_mean_lengths(table: &Table, config: &AnalysisConfig) -> Result<Vec<(String, f64)>> {
    let rows = table.height();
    let mut lengths = Vec::new();

    for name in candidate_columns(table, config) {
        let total: usize = table
            .string_values(&name)?
            .iter()
            .map(|value| value.as_deref().map_or(0, |s| s.chars().count()))
            .sum();
        let mean = if rows == 0 {
            0.0
        } else {
            total as f64 / rows as f64
        };
        lengths.push((name, mean));
    }

    Ok(lengths)
}

/// Pick the column with the greatest mean length; ties go to the earliest.
pub fn pick_best_column(mean_lengths: &[(String, f64)]) -> Option<TargetColumn> {
    let mut best: Option<&(String, f64)> = None;
    for entry in mean_lengths {
        match best {
            Some((_, best_mean)) if entry.1 <= *best_mean => {}
            _ => best = Some(entry),
        }
    }
    best.map(|(name, mean_length)| TargetColumn {
        name: name.clone(),
        mean_length: *mean_length,
    })
}

/// Select the target column of a table.
///
/// # Errors
///
/// [`InsightError::NoEligibleColumn`] when the table has no columns.
pub fn select_target_column(table: &Table, config: &AnalysisConfig) -> Result<TargetColumn> {
    let lengths = column_mean_lengths(table, config)?;
    let target = pick_best_column(&lengths).ok_or(InsightError::NoEligibleColumn)?;
    debug!(
        "Selected target column '{}' (mean length {:.1})",
        target.name, target.mean_length
    );
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_table;

    fn lengths(entries: &[(&str, f64)]) -> Vec<(String, f64)> {
        entries
            .iter()
            .map(|(name, mean)| (name.to_string(), *mean))
            .collect()
    }

    #[test]
    fn test_pick_best_column_maximum() {
        let best = pick_best_column(&lengths(&[("a", 3.0), ("b", 10.5), ("c", 7.0)])).unwrap();
        assert_eq!(best.name, "b");
        assert_eq!(best.mean_length, 10.5);
    }

    #[test]
    fn test_pick_best_column_tie_goes_to_first() {
        let best = pick_best_column(&lengths(&[("first", 4.0), ("second", 4.0)])).unwrap();
        assert_eq!(best.name, "first");
    }

    #[test]
    fn test_pick_best_column_empty() {
        assert!(pick_best_column(&[]).is_none());
    }

    #[test]
    fn test_excluded_columns_are_skipped() {
        let table = parse_table(
            "id,value,comment\n1,a very long value that should not win,short\n2,another long value here,tiny\n",
            20,
        )
        .unwrap();
        let target = select_target_column(&table, &AnalysisConfig::default()).unwrap();
        assert_eq!(target.name, "comment");
    }

    #[test]
    fn test_all_excluded_falls_back_to_all_columns() {
        let table = parse_table("ID,Value,Year\n1,long text value,2020\n2,more text,2021\n", 20)
            .unwrap();
        let config = AnalysisConfig::default();
        assert_eq!(candidate_columns(&table, &config).len(), 3);
        let target = select_target_column(&table, &config).unwrap();
        assert_eq!(target.name, "Value");
    }

    #[test]
    fn test_selection_is_deterministic() {
        let table = parse_table(
            "id,title,body\n1,Short,This is a much longer body of text\n2,Tiny,Another long body\n",
            20,
        )
        .unwrap();
        let config = AnalysisConfig::default();
        let first = select_target_column(&table, &config).unwrap();
        let second = select_target_column(&table, &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.name, "body");
    }
}
