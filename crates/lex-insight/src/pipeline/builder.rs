//! Main analysis pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating parsing, column selection, translation, scoring and
//! report assembly.

use crate::config::{AnalysisConfig, ConfigValidationError};
use crate::error::{InsightError, Result};
use crate::language::{
    LanguageDetector, StopwordDetector, TranslationBatch, TranslationOptions, Translator,
    detect_language, detection_sample, translate_values,
};
use crate::pipeline::outcome::{PipelineOutcome, RunDetails};
use crate::pipeline::progress::{
    AnalysisStage, CancellationToken, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::report::{AnalysisContext, ReportAssembler, Stats};
use crate::scoring::{Lexicon, LexiconScorer, PatternRegistry, RowScorer, detect_patterns, score_rows};
use crate::table::{candidate_columns, parse_table, select_target_column};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// The text analysis pipeline.
///
/// Use [`Pipeline::builder()`] to create a pipeline with custom
/// configuration, or [`Pipeline::default()`] for the offline defaults
/// (stop-word detection, no translator, lexicon scoring).
///
/// # Example
///
/// ```rust,ignore
/// use lex_insight::{AnalysisConfig, CancellationToken, Pipeline};
/// use lex_insight::language::GoogleTranslateClient;
/// use std::sync::Arc;
///
/// let translator = Arc::new(GoogleTranslateClient::new()?);
/// let token = CancellationToken::new();
///
/// let outcome = Pipeline::builder()
///     .translator(translator)
///     .cancellation_token(token.clone())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .config(AnalysisConfig::builder().scoring_workers(8).build()?)
///     .build()?
///     .run(&raw, &["Summarization", "Sentiment Analysis"]);
///
/// if !outcome.is_success() {
///     eprintln!("{}", outcome.report.sections()[0].output);
/// }
/// ```
pub struct Pipeline {
    config: AnalysisConfig,
    scorer: Arc<dyn RowScorer>,
    patterns: PatternRegistry,
    detector: Option<Arc<dyn LanguageDetector>>,
    translator: Option<Arc<dyn Translator>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: CancellationToken,
    assembler: ReportAssembler,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Default for Pipeline {
    fn default() -> Self {
        PipelineBuilder::default().assemble(AnalysisConfig::default())
    }
}

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the pipeline over raw delimited text.
    ///
    /// Never fails: a fatal error becomes a failure outcome with a single
    /// `"Error"` section (see [`PipelineOutcome::failure`]).
    pub fn run<S: AsRef<str>>(&self, raw: &str, operations: &[S]) -> PipelineOutcome {
        match self.try_run(raw, operations) {
            Ok(outcome) => outcome,
            Err(e) => PipelineOutcome::failure(&e),
        }
    }

    /// Run the pipeline, returning the fatal error instead of a failure outcome.
    ///
    /// # Errors
    ///
    /// Returns `Err(InsightError::Cancelled)` if the pipeline was cancelled
    /// via the cancellation token, and the parse or selection error when the
    /// input cannot be analysed.
    pub fn try_run<S: AsRef<str>>(&self, raw: &str, operations: &[S]) -> Result<PipelineOutcome> {
        match self.run_internal(raw, operations) {
            Ok(outcome) => {
                self.report_progress(ProgressUpdate::complete("Analysis completed successfully"));
                Ok(outcome)
            }
            Err(e) => {
                if e.is_cancelled() {
                    self.report_progress(ProgressUpdate::cancelled());
                } else {
                    self.report_progress(ProgressUpdate::failed(e.to_string()));
                }
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Check if cancellation has been requested.
    fn check_cancelled(&self) -> Result<()> {
        if self.cancellation_token.is_cancelled() {
            return Err(InsightError::Cancelled);
        }
        Ok(())
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_internal<S: AsRef<str>>(&self, raw: &str, operations: &[S]) -> Result<PipelineOutcome> {
        let start_time = Instant::now();

        info!("Starting analysis pipeline...");
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Parsing,
            0.0,
            "Parsing input...",
        ));

        // Step 1: Parse
        let mut table = parse_table(raw, self.config.parse_sample_records)?;
        info!(
            "Step 1: Parsed {} rows x {} columns (delimiter {:?})",
            table.height(),
            table.width(),
            table.delimiter() as char
        );

        self.check_cancelled()?;

        // Step 2: Select the free-text column
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::ColumnSelection,
            0.0,
            "Selecting target column...",
        ));
        let candidates = candidate_columns(&table, &self.config);
        let target = select_target_column(&table, &self.config)?;
        info!("Step 2: Target column '{}'", target.name);
        let originals = table.string_values(&target.name)?;

        self.check_cancelled()?;

        // Step 3: Language detection
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::LanguageDetection,
            0.0,
            "Detecting language...",
        ));
        let sample = detection_sample(&originals, self.config.detection_sample_size);
        let language = detect_language(self.detector.as_deref(), &sample);
        info!(
            "Step 3: Language '{}'{}",
            language.code,
            if language.defaulted { " (default)" } else { "" }
        );

        self.check_cancelled()?;

        // Step 4: Translation of the leading rows
        let mut working_column = target.name.clone();
        let mut batch = TranslationBatch::default();
        let working = if !language.needs_translation(&self.config.target_language) {
            originals
        } else if !self.config.enable_translation {
            info!("Step 4: Translation disabled, analysing original text");
            originals
        } else if let Some(translator) = &self.translator {
            self.report_progress(ProgressUpdate::new(
                AnalysisStage::Translation,
                0.0,
                format!("Translating with {}...", translator.name()),
            ));
            batch = self.translate(&originals, translator.as_ref())?;
            self.check_cancelled()?;

            let working = batch.working_values(&originals);
            working_column = format!("{}_en", target.name);
            table.set_text_column(&working_column, working.clone())?;
            info!(
                "Step 4: Translated {} rows into '{}' ({} kept original text)",
                batch.translated_count(),
                working_column,
                batch.fallback_count()
            );
            working
        } else {
            warn!(
                "No translator configured; analysing '{}' text untranslated",
                language.code
            );
            originals
        };

        // Step 5: Pattern detection
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::PatternDetection,
            0.0,
            "Detecting patterns...",
        ));
        let patterns = detect_patterns(&working, &self.patterns, self.config.pattern_sample_rows);
        debug!("Step 5: Patterns {:?}", patterns);

        self.check_cancelled()?;

        // Step 6: Scoring
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Scoring,
            0.0,
            format!("Scoring {} rows...", working.len()),
        ));
        let scores = score_rows(&working, self.scorer.as_ref(), self.config.scoring_workers)?;
        info!("Step 6: Scored {} rows with {}", scores.len(), self.scorer.name());

        self.check_cancelled()?;

        // Step 7: Report
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::ReportAssembly,
            0.0,
            "Assembling report...",
        ));
        let context = AnalysisContext {
            table: &table,
            candidates: &candidates,
            patterns: &patterns,
            scores: &scores,
            language: &language,
            config: &self.config,
        };
        let report = self.assembler.assemble(operations, &context)?;
        let rows = table.to_records()?;

        let stats = Stats::compute(table.height(), &scores, start_time.elapsed(), &self.config);
        info!(
            "Step 7: {} sections, avg score {:.2}{}",
            report.len(),
            stats.avg_score,
            if stats.alert { " (alert)" } else { "" }
        );

        let details = RunDetails {
            target_column: target.name,
            working_column,
            language,
            patterns,
            translated_rows: batch.translated_count(),
            translation_fallbacks: batch.fallback_count(),
            delimiter: table.delimiter() as char,
            skipped_rows: table.skipped_rows(),
            scorer: self.scorer.name().to_string(),
        };

        Ok(PipelineOutcome {
            report,
            rows: Some(rows),
            stats: Some(stats),
            scores: Some(scores),
            details: Some(details),
        })
    }

    fn translate(
        &self,
        originals: &[Option<String>],
        translator: &dyn Translator,
    ) -> Result<TranslationBatch> {
        let options = TranslationOptions {
            row_limit: self.config.translation_row_limit,
            workers: self.config.translation_workers,
            target_language: self.config.target_language.clone(),
        };
        let on_row_done = |done: usize, total: usize| {
            self.report_progress(ProgressUpdate::with_items(
                AnalysisStage::Translation,
                done,
                total,
                format!("Translated {}/{} rows", done, total),
            ));
        };

        translate_values(
            originals,
            translator,
            &options,
            &self.cancellation_token,
            Some(&on_row_done),
        )
    }
}

/// Builder for creating a [`Pipeline`] with custom configuration.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<AnalysisConfig>,
    scorer: Option<Arc<dyn RowScorer>>,
    patterns: Option<PatternRegistry>,
    detector: Option<Arc<dyn LanguageDetector>>,
    translator: Option<Arc<dyn Translator>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: Option<CancellationToken>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Score rows with a [`LexiconScorer`] over `lexicon`.
    pub fn lexicon(mut self, lexicon: Lexicon) -> Self {
        self.scorer = Some(Arc::new(LexiconScorer::new(lexicon)));
        self
    }

    /// Set the row scorer. Defaults to [`LexiconScorer`] with the default lexicon.
    pub fn scorer(mut self, scorer: Arc<dyn RowScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Set the pattern categories reported by the summary.
    pub fn pattern_registry(mut self, registry: PatternRegistry) -> Self {
        self.patterns = Some(registry);
        self
    }

    /// Set the language detector. Defaults to [`StopwordDetector`].
    pub fn language_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Set the translator used for non-English tables.
    ///
    /// Without one, non-English text is analysed untranslated.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use lex_insight::language::GoogleTranslateClient;
    /// use std::sync::Arc;
    ///
    /// let client = Arc::new(GoogleTranslateClient::new()?);
    ///
    /// // The same client can detect and translate
    /// let pipeline = Pipeline::builder()
    ///     .language_detector(client.clone())
    ///     .translator(client)
    ///     .build()?;
    /// ```
    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Set a progress reporter for receiving updates during a run.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// Translation progress arrives from worker threads.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Set a cancellation token for stopping the pipeline.
    ///
    /// Clone the token and call [`CancellationToken::cancel()`] from any
    /// thread. The run stops at the next stage boundary, or after in-flight
    /// translation calls finish, and returns a failure outcome.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.clone().unwrap_or_default();
        config.validate()?;
        Ok(self.assemble(config))
    }

    fn assemble(self, config: AnalysisConfig) -> Pipeline {
        Pipeline {
            config,
            scorer: self
                .scorer
                .unwrap_or_else(|| Arc::new(LexiconScorer::default())),
            patterns: self.patterns.unwrap_or_default(),
            detector: Some(
                self.detector
                    .unwrap_or_else(|| Arc::new(StopwordDetector::default())),
            ),
            translator: self.translator,
            progress_reporter: self.progress_reporter,
            cancellation_token: self.cancellation_token.unwrap_or_default(),
            assembler: ReportAssembler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::WeightedRuleScorer;
    use anyhow::anyhow;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SPANISH: &str = "id,comentario\n\
        1,el servicio fue muy bueno y la entrega a tiempo\n\
        2,la factura tiene un error y el pago fue delayed\n\
        3,gracias por el support de los agentes\n";

    /// Translates by prefixing "EN:"; fails on rows containing "factura".
    struct PrefixTranslator {
        calls: AtomicUsize,
    }

    impl PrefixTranslator {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Translator for PrefixTranslator {
        fn translate(&self, text: &str, _source: &str, _target: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("factura") {
                return Err(anyhow!("quota exceeded"));
            }
            Ok(format!("EN: {}", text))
        }

        fn name(&self) -> &str {
            "Prefix"
        }
    }

    /// Cancels the token on its first call.
    struct CancellingTranslator {
        token: CancellationToken,
    }

    impl Translator for CancellingTranslator {
        fn translate(&self, text: &str, _source: &str, _target: &str) -> anyhow::Result<String> {
            self.token.cancel();
            Ok(text.to_string())
        }

        fn name(&self) -> &str {
            "Cancelling"
        }
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert!(pipeline.translator.is_none());
        assert!(pipeline.detector.is_some());
        assert_eq!(pipeline.scorer.name(), "Lexicon");
        assert_eq!(pipeline.patterns.len(), 2);
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = AnalysisConfig {
            scoring_workers: 0,
            ..AnalysisConfig::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_check_cancelled() {
        let token = CancellationToken::new();
        let pipeline = Pipeline::builder()
            .cancellation_token(token.clone())
            .build()
            .unwrap();

        assert!(pipeline.check_cancelled().is_ok());

        token.cancel();
        assert!(matches!(
            pipeline.check_cancelled().unwrap_err(),
            InsightError::Cancelled
        ));
    }

    #[test]
    fn test_run_translates_non_english_rows() {
        let translator = Arc::new(PrefixTranslator::new());
        let pipeline = Pipeline::builder()
            .translator(translator.clone())
            .build()
            .unwrap();

        let outcome = pipeline.run(SPANISH, &["Translation"]);
        assert!(outcome.is_success());

        let details = outcome.details.as_ref().unwrap();
        assert_eq!(details.language.code, "es");
        assert_eq!(details.target_column, "comentario");
        assert_eq!(details.working_column, "comentario_en");
        assert_eq!(details.translated_rows, 2);
        assert_eq!(details.translation_fallbacks, 1);
        assert_eq!(translator.calls.load(Ordering::SeqCst), 3);

        let rows = outcome.rows.as_ref().unwrap();
        assert_eq!(
            rows[0]["comentario_en"],
            "EN: el servicio fue muy bueno y la entrega a tiempo"
        );
        assert_eq!(
            rows[1]["comentario_en"],
            "la factura tiene un error y el pago fue delayed"
        );

        // row 1 keeps "error" and "delayed" from the original text
        let scores = outcome.scores.as_ref().unwrap();
        assert_eq!(scores, &vec![0, -2, 1]);
        assert_eq!(
            outcome.report.sections()[0].output,
            "🌐 Detect: ES\n- Target: English Standard Analysis."
        );
    }

    #[test]
    fn test_run_without_translator_keeps_original_column() {
        let outcome = Pipeline::default().run(SPANISH, &["Sentiment Analysis"]);
        assert!(outcome.is_success());
        let details = outcome.details.unwrap();
        assert_eq!(details.working_column, "comentario");
        assert_eq!(details.translated_rows, 0);
        assert!(!outcome.rows.unwrap()[0].contains_key("comentario_en"));
    }

    #[test]
    fn test_translation_disabled_skips_translator() {
        let translator = Arc::new(PrefixTranslator::new());
        let pipeline = Pipeline::builder()
            .translator(translator.clone())
            .config(AnalysisConfig::builder().enable_translation(false).build().unwrap())
            .build()
            .unwrap();

        let outcome = pipeline.run(SPANISH, &["Translation"]);
        assert!(outcome.is_success());
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancellation_during_translation_fails_run() {
        let token = CancellationToken::new();
        let pipeline = Pipeline::builder()
            .translator(Arc::new(CancellingTranslator {
                token: token.clone(),
            }))
            .cancellation_token(token)
            .config(AnalysisConfig::builder().translation_workers(1).build().unwrap())
            .build()
            .unwrap();

        let err = pipeline.try_run(SPANISH, &["Translation"]).unwrap_err();
        assert!(err.is_cancelled());

        let outcome = pipeline.run(SPANISH, &["Translation"]);
        assert!(!outcome.is_success());
        assert_eq!(outcome.report.sections()[0].output, "Pipeline cancelled");
    }

    #[test]
    fn test_progress_reaches_completion() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |update| stages_clone.lock().push(update.stage))
            .build()
            .unwrap();
        pipeline.run("id,text\n1,hello there\n", &["Summarization"]);

        let stages = stages.lock();
        assert_eq!(stages.first(), Some(&AnalysisStage::Parsing));
        assert_eq!(stages.last(), Some(&AnalysisStage::Complete));
        assert!(stages.contains(&AnalysisStage::Scoring));
    }

    #[test]
    fn test_progress_reports_failure() {
        let last = Arc::new(Mutex::new(None));
        let last_clone = last.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |update| *last_clone.lock() = Some(update.stage))
            .build()
            .unwrap();
        let outcome = pipeline.run("   ", &["Summarization"]);

        assert!(!outcome.is_success());
        assert_eq!(*last.lock(), Some(AnalysisStage::Failed));
    }

    #[test]
    fn test_custom_scorer() {
        let pipeline = Pipeline::builder()
            .scorer(Arc::new(WeightedRuleScorer::default()))
            .build()
            .unwrap();
        let outcome = pipeline.run(
            "id,text\n1,<b>Great</b> work\n2,urgent: broken pipe\n",
            &["Sentiment Analysis"],
        );
        assert_eq!(outcome.scores.unwrap(), vec![5, -8]);
        assert_eq!(outcome.details.unwrap().scorer, "WeightedRules");
    }
}
