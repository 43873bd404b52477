//! Builds one report section per requested operation.

use super::{AnalysisReport, Operation, ReportSection, average_score};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::language::DetectedLanguage;
use crate::table::{ColumnKind, Table};
use std::fmt::Write;

/// Everything the sections are computed from.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub table: &'a Table,
    /// Candidate columns in table order (excluded names removed).
    pub candidates: &'a [String],
    pub patterns: &'a [String],
    pub scores: &'a [i32],
    pub language: &'a DetectedLanguage,
    pub config: &'a AnalysisConfig,
}

/// Renders report sections from an [`AnalysisContext`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportAssembler;

impl ReportAssembler {
    /// One section per operation, in request order, duplicates kept.
    ///
    /// The section title is the requested name verbatim.
    pub fn assemble<S: AsRef<str>>(
        &self,
        operations: &[S],
        context: &AnalysisContext<'_>,
    ) -> Result<AnalysisReport> {
        let mut report = AnalysisReport::default();
        for name in operations {
            let name = name.as_ref();
            let output = match Operation::from_name(name) {
                Operation::Summarization => self.summarization(context)?,
                Operation::SentimentAnalysis => self.sentiment(context),
                Operation::KeywordExtraction => self.keywords(context)?,
                Operation::Translation => self.translation(context),
                Operation::Unsupported => self.not_applicable(),
            };
            report.push(ReportSection::new(name, output));
        }
        Ok(report)
    }

    fn summarization(&self, context: &AnalysisContext<'_>) -> Result<String> {
        let table = context.table;
        let patterns = if context.patterns.is_empty() {
            "Factual".to_string()
        } else {
            context.patterns.join(", ")
        };

        let mut output = format!(
            "📊 Data Analysis: {} Records\n- Patterns: {}\n",
            table.height(),
            patterns
        );

        for column in table.column_names() {
            if column.to_lowercase().contains("id")
                || table.column_kind(&column)? != ColumnKind::Numeric
            {
                continue;
            }
            if let Some(mean) = table.numeric_mean(&column)? {
                let _ = writeln!(output, "- Avg {}: {:.2}", column, mean);
            }
        }
        Ok(output)
    }

    fn sentiment(&self, context: &AnalysisContext<'_>) -> String {
        let avg = average_score(context.scores);
        let label = if avg > 0.0 {
            "Growth/Positive"
        } else if avg < 0.0 {
            "Risk/Negative"
        } else {
            "Neutral"
        };
        let matches = context.scores.iter().filter(|&&s| s != 0).count();
        format!(
            "🧠 Scorer: {}\n- Index: {:.2}\n- Matches: {}",
            label, avg, matches
        )
    }

    fn keywords(&self, context: &AnalysisContext<'_>) -> Result<String> {
        let mut output = "🔑 Category Frequency:\n".to_string();
        for column in context.candidates.iter().take(context.config.keyword_columns) {
            let top = context
                .table
                .value_counts(column, context.config.keywords_per_column)?
                .into_iter()
                .map(|(value, count)| format!("{}({})", value, count))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(output, "- {}: {}", column, top);
        }
        Ok(output)
    }

    fn translation(&self, context: &AnalysisContext<'_>) -> String {
        format!(
            "🌐 Detect: {}\n- Target: English Standard Analysis.",
            context.language.code.to_uppercase()
        )
    }

    fn not_applicable(&self) -> String {
        "Status: Not Applicable\nReason: Dataset contains factual categorical data.".to_string()
    }
}
