//! Tabular data model, parser and target column selection.
//!
//! A [`Table`] wraps a polars `DataFrame` that was produced by
//! [`parse_table`]. It always holds at least one row and one column.

mod parser;
mod selector;

pub use parser::{CANDIDATE_DELIMITERS, infer_delimiter, parse_table};
pub use selector::{
    TargetColumn, candidate_columns, column_mean_lengths, pick_best_column, select_target_column,
};

use crate::error::{InsightError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::HashMap;

/// One row of the table keyed by column name, in column order.
pub type RowRecord = serde_json::Map<String, Value>;

/// Coarse kind of a column, inferred from its polars dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer or floating point numbers
    Numeric,
    /// Boolean values
    Boolean,
    /// Strings and everything that reads as text
    Text,
    /// Other/unknown types
    Other,
}

#[inline]
fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

#[inline]
fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Map a polars dtype onto a [`ColumnKind`].
pub fn column_kind_of(dtype: &DataType) -> ColumnKind {
    if is_integer_dtype(dtype) || is_float_dtype(dtype) {
        ColumnKind::Numeric
    } else if matches!(dtype, DataType::Boolean) {
        ColumnKind::Boolean
    } else if matches!(dtype, DataType::String | DataType::Categorical(_, _)) {
        ColumnKind::Text
    } else {
        ColumnKind::Other
    }
}

/// Parsed delimited data.
#[derive(Debug, Clone)]
pub struct Table {
    df: DataFrame,
    delimiter: u8,
    skipped_rows: usize,
}

impl Table {
    /// Wrap an existing DataFrame.
    ///
    /// Fails with [`InsightError::InvalidFormat`] when the frame has no rows
    /// or no columns.
    pub fn from_data_frame(df: DataFrame) -> Result<Self> {
        Self::with_parse_info(df, b',', 0)
    }

    pub(crate) fn with_parse_info(df: DataFrame, delimiter: u8, skipped_rows: usize) -> Result<Self> {
        if df.width() == 0 {
            return Err(InsightError::InvalidFormat("no columns found".to_string()));
        }
        if df.height() == 0 {
            return Err(InsightError::InvalidFormat("no data rows found".to_string()));
        }
        Ok(Self {
            df,
            delimiter,
            skipped_rows,
        })
    }

    /// The underlying DataFrame.
    pub fn data_frame(&self) -> &DataFrame {
        &self.df
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.df.width()
    }

    /// Delimiter the table was parsed with.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Number of malformed input rows dropped while parsing.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    fn series(&self, name: &str) -> Result<&Series> {
        self.df
            .column(name)
            .map(|column| column.as_materialized_series())
            .map_err(|_| InsightError::ColumnNotFound(name.to_string()))
    }

    /// Inferred kind of a column.
    pub fn column_kind(&self, name: &str) -> Result<ColumnKind> {
        Ok(column_kind_of(self.series(name)?.dtype()))
    }

    /// String representation of every value in a column, `None` for nulls.
    pub fn string_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let series = self.series(name)?;
        let as_text = series.cast(&DataType::String)?;
        Ok(as_text
            .str()?
            .into_iter()
            .map(|value| value.map(str::to_string))
            .collect())
    }

    /// Mean of a numeric column, `None` for non-numeric or all-null columns.
    pub fn numeric_mean(&self, name: &str) -> Result<Option<f64>> {
        let series = self.series(name)?;
        if column_kind_of(series.dtype()) != ColumnKind::Numeric {
            return Ok(None);
        }
        Ok(series.mean())
    }

    /// The `top` most frequent non-null values of a column.
    ///
    /// Sorted by count descending; ties keep first-occurrence order.
    pub fn value_counts(&self, name: &str, top: usize) -> Result<Vec<(String, usize)>> {
        let values = self.string_values(name)?;

        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();
        for value in values.into_iter().flatten() {
            let count = counts.entry(value.clone()).or_insert(0);
            if *count == 0 {
                order.push(value);
            }
            *count += 1;
        }

        let mut ranked: Vec<(String, usize)> = order
            .into_iter()
            .map(|value| {
                let count = counts[&value];
                (value, count)
            })
            .collect();
        // stable sort keeps first-occurrence order among equal counts
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(top);
        Ok(ranked)
    }

    /// Append a text column, replacing any column of the same name.
    pub fn set_text_column(&mut self, name: &str, values: Vec<Option<String>>) -> Result<()> {
        if values.len() != self.height() {
            return Err(InsightError::Internal(format!(
                "column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.height()
            )));
        }
        let series = Series::new(name.into(), values);
        self.df.with_column(series)?;
        Ok(())
    }

    /// Convert every row into a JSON record, preserving column order.
    pub fn to_records(&self) -> Result<Vec<RowRecord>> {
        let names = self.column_names();
        let mut columns: Vec<Vec<Value>> = Vec::with_capacity(names.len());

        for name in &names {
            let series = self.series(name)?;
            let dtype = series.dtype();
            let values: Vec<Value> = if is_integer_dtype(dtype) {
                series
                    .cast(&DataType::Int64)?
                    .i64()?
                    .into_iter()
                    .map(|v| v.map(Value::from).unwrap_or(Value::Null))
                    .collect()
            } else if is_float_dtype(dtype) {
                series
                    .cast(&DataType::Float64)?
                    .f64()?
                    .into_iter()
                    .map(|v| {
                        v.and_then(Number::from_f64)
                            .map(Value::Number)
                            .unwrap_or(Value::Null)
                    })
                    .collect()
            } else if matches!(dtype, DataType::Boolean) {
                series
                    .bool()?
                    .into_iter()
                    .map(|v| v.map(Value::Bool).unwrap_or(Value::Null))
                    .collect()
            } else {
                self.string_values(name)?
                    .into_iter()
                    .map(|v| v.map(Value::String).unwrap_or(Value::Null))
                    .collect()
            };
            columns.push(values);
        }

        let mut records = Vec::with_capacity(self.height());
        for row in 0..self.height() {
            let mut record = RowRecord::new();
            for (name, values) in names.iter().zip(&columns) {
                record.insert(name.clone(), values[row].clone());
            }
            records.push(record);
        }
        Ok(records)
    }
}
