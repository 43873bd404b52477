//! Configuration types for the analysis pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup. Lexicons and pattern
//! registries are configured separately (see [`crate::scoring`]) because
//! they hold compiled state.

use serde::{Deserialize, Serialize};

/// Column names never chosen as the target unless nothing else is left.
pub const DEFAULT_EXCLUDED_COLUMNS: [&str; 4] = ["id", "value", "line_code", "year"];

/// Configuration for the analysis pipeline.
///
/// Use [`AnalysisConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use lex_insight::config::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .alert_threshold(-0.5)
///     .scoring_workers(8)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Column names (case-insensitive) skipped by target selection and
    /// keyword extraction.
    /// Default: id, value, line_code, year
    pub excluded_columns: Vec<String>,

    /// Number of records sampled when inferring the delimiter.
    /// Default: 20
    pub parse_sample_records: usize,

    /// Number of non-null target values concatenated for language detection.
    /// Default: 5
    pub detection_sample_size: usize,

    /// Number of leading rows searched by the pattern registry.
    /// Default: 20
    pub pattern_sample_rows: usize,

    /// Hard cap on rows sent to the translation service per run.
    /// Default: 50
    pub translation_row_limit: usize,

    /// Concurrent in-flight translation calls.
    /// Default: 10
    pub translation_workers: usize,

    /// Worker threads used for per-row scoring.
    /// Default: 15
    pub scoring_workers: usize,

    /// Average score below which a run raises the alert flag.
    /// Default: -0.3
    pub alert_threshold: f64,

    /// Rows per notional chunk in the reported chunk count.
    /// Default: 10
    pub rows_per_chunk: usize,

    /// Number of candidate columns listed by keyword extraction.
    /// Default: 3
    pub keyword_columns: usize,

    /// Number of most frequent values listed per column.
    /// Default: 3
    pub keywords_per_column: usize,

    /// Language every analysis is normalised to.
    /// Default: "en"
    pub target_language: String,

    /// Whether non-English tables are sent to the translator at all.
    /// Default: true
    pub enable_translation: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            excluded_columns: DEFAULT_EXCLUDED_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            parse_sample_records: 20,
            detection_sample_size: 5,
            pattern_sample_rows: 20,
            translation_row_limit: 50,
            translation_workers: 10,
            scoring_workers: 15,
            alert_threshold: -0.3,
            rows_per_chunk: 10,
            keyword_columns: 3,
            keywords_per_column: 3,
            target_language: "en".to_string(),
            enable_translation: true,
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [
            ("translation_workers", self.translation_workers),
            ("scoring_workers", self.scoring_workers),
            ("rows_per_chunk", self.rows_per_chunk),
            ("parse_sample_records", self.parse_sample_records),
        ] {
            if value == 0 {
                return Err(ConfigValidationError::MustBePositive {
                    field: field.to_string(),
                });
            }
        }

        if !self.alert_threshold.is_finite() || self.alert_threshold > 0.0 {
            return Err(ConfigValidationError::InvalidAlertThreshold(
                self.alert_threshold,
            ));
        }

        if self.target_language.trim().is_empty() {
            return Err(ConfigValidationError::EmptyTargetLanguage);
        }

        Ok(())
    }

    /// Case-insensitive membership test against the excluded column names.
    pub fn is_excluded(&self, column: &str) -> bool {
        self.excluded_columns
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(column))
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid value for '{field}': must be at least 1")]
    MustBePositive { field: String },

    #[error("Invalid alert threshold: {0} (must be a finite value <= 0.0)")]
    InvalidAlertThreshold(f64),

    #[error("Target language must not be empty")]
    EmptyTargetLanguage,
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    excluded_columns: Option<Vec<String>>,
    parse_sample_records: Option<usize>,
    detection_sample_size: Option<usize>,
    pattern_sample_rows: Option<usize>,
    translation_row_limit: Option<usize>,
    translation_workers: Option<usize>,
    scoring_workers: Option<usize>,
    alert_threshold: Option<f64>,
    rows_per_chunk: Option<usize>,
    keyword_columns: Option<usize>,
    keywords_per_column: Option<usize>,
    target_language: Option<String>,
    enable_translation: Option<bool>,
}

impl AnalysisConfigBuilder {
    /// Replace the excluded column names.
    pub fn excluded_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set how many records are sampled for delimiter inference.
    pub fn parse_sample_records(mut self, records: usize) -> Self {
        self.parse_sample_records = Some(records);
        self
    }

    /// Set how many non-null values feed language detection.
    pub fn detection_sample_size(mut self, size: usize) -> Self {
        self.detection_sample_size = Some(size);
        self
    }

    /// Set how many leading rows the pattern registry inspects.
    pub fn pattern_sample_rows(mut self, rows: usize) -> Self {
        self.pattern_sample_rows = Some(rows);
        self
    }

    /// Set the per-run cap on translated rows.
    pub fn translation_row_limit(mut self, limit: usize) -> Self {
        self.translation_row_limit = Some(limit);
        self
    }

    /// Set the number of concurrent translation calls.
    pub fn translation_workers(mut self, workers: usize) -> Self {
        self.translation_workers = Some(workers);
        self
    }

    /// Set the number of scoring worker threads.
    pub fn scoring_workers(mut self, workers: usize) -> Self {
        self.scoring_workers = Some(workers);
        self
    }

    /// Set the average score below which the alert flag is raised.
    ///
    /// # Arguments
    /// * `threshold` - A finite value <= 0.0 (e.g., -0.3)
    pub fn alert_threshold(mut self, threshold: f64) -> Self {
        self.alert_threshold = Some(threshold);
        self
    }

    /// Set the rows per notional chunk.
    pub fn rows_per_chunk(mut self, rows: usize) -> Self {
        self.rows_per_chunk = Some(rows);
        self
    }

    /// Set how many columns keyword extraction reports.
    pub fn keyword_columns(mut self, columns: usize) -> Self {
        self.keyword_columns = Some(columns);
        self
    }

    /// Set how many top values keyword extraction lists per column.
    pub fn keywords_per_column(mut self, count: usize) -> Self {
        self.keywords_per_column = Some(count);
        self
    }

    /// Set the language text is normalised to.
    pub fn target_language(mut self, language: impl Into<String>) -> Self {
        self.target_language = Some(language.into());
        self
    }

    /// Enable or disable translation of non-English tables.
    pub fn enable_translation(mut self, enable: bool) -> Self {
        self.enable_translation = Some(enable);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let defaults = AnalysisConfig::default();
        let config = AnalysisConfig {
            excluded_columns: self.excluded_columns.unwrap_or(defaults.excluded_columns),
            parse_sample_records: self
                .parse_sample_records
                .unwrap_or(defaults.parse_sample_records),
            detection_sample_size: self
                .detection_sample_size
                .unwrap_or(defaults.detection_sample_size),
            pattern_sample_rows: self
                .pattern_sample_rows
                .unwrap_or(defaults.pattern_sample_rows),
            translation_row_limit: self
                .translation_row_limit
                .unwrap_or(defaults.translation_row_limit),
            translation_workers: self
                .translation_workers
                .unwrap_or(defaults.translation_workers),
            scoring_workers: self.scoring_workers.unwrap_or(defaults.scoring_workers),
            alert_threshold: self.alert_threshold.unwrap_or(defaults.alert_threshold),
            rows_per_chunk: self.rows_per_chunk.unwrap_or(defaults.rows_per_chunk),
            keyword_columns: self.keyword_columns.unwrap_or(defaults.keyword_columns),
            keywords_per_column: self
                .keywords_per_column
                .unwrap_or(defaults.keywords_per_column),
            target_language: self.target_language.unwrap_or(defaults.target_language),
            enable_translation: self
                .enable_translation
                .unwrap_or(defaults.enable_translation),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.translation_row_limit, 50);
        assert_eq!(config.translation_workers, 10);
        assert_eq!(config.scoring_workers, 15);
        assert_eq!(config.alert_threshold, -0.3);
        assert_eq!(config.rows_per_chunk, 10);
        assert_eq!(config.target_language, "en");
        assert!(config.enable_translation);
    }

    #[test]
    fn test_builder_defaults_match_default() {
        let config = AnalysisConfig::builder().build().unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = AnalysisConfig::builder()
            .alert_threshold(-1.0)
            .scoring_workers(4)
            .translation_row_limit(5)
            .excluded_columns(["code"])
            .enable_translation(false)
            .build()
            .unwrap();

        assert_eq!(config.alert_threshold, -1.0);
        assert_eq!(config.scoring_workers, 4);
        assert_eq!(config.translation_row_limit, 5);
        assert_eq!(config.excluded_columns, vec!["code".to_string()]);
        assert!(!config.enable_translation);
    }

    #[test]
    fn test_is_excluded_case_insensitive() {
        let config = AnalysisConfig::default();
        assert!(config.is_excluded("ID"));
        assert!(config.is_excluded("Line_Code"));
        assert!(!config.is_excluded("comment"));
    }

    #[test]
    fn test_validation_zero_workers() {
        let result = AnalysisConfig::builder().scoring_workers(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::MustBePositive { field } if field == "scoring_workers"
        ));
    }

    #[test]
    fn test_validation_positive_alert_threshold() {
        let result = AnalysisConfig::builder().alert_threshold(0.5).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidAlertThreshold(_)
        ));

        let result = AnalysisConfig::builder().alert_threshold(f64::NAN).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_empty_language() {
        let result = AnalysisConfig::builder().target_language("  ").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyTargetLanguage
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "excluded_columns": ["id"],
            "parse_sample_records": 10,
            "detection_sample_size": 3,
            "pattern_sample_rows": 5,
            "translation_row_limit": 25,
            "translation_workers": 2,
            "scoring_workers": 3,
            "alert_threshold": -0.8,
            "rows_per_chunk": 20,
            "keyword_columns": 2,
            "keywords_per_column": 5,
            "target_language": "en",
            "enable_translation": false
        }"#;

        let config: AnalysisConfig = serde_json::from_str(json).expect("Should deserialize");
        assert!(config.validate().is_ok());
        assert_eq!(config.translation_row_limit, 25);
        assert_eq!(config.alert_threshold, -0.8);
        assert_eq!(config.keywords_per_column, 5);
        assert!(!config.enable_translation);
    }
}
