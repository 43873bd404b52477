//! Traits for the external language services.
//!
//! The pipeline only depends on these two traits, so a hosted translation
//! API, an offline heuristic, or a test double can be swapped in without
//! touching the analysis logic.
//!
//! # Implementing a New Service
//!
//! 1. Create a new file in `src/language/` (e.g., `deepl.rs`)
//! 2. Implement [`Translator`] and/or [`LanguageDetector`]
//! 3. Export the type in `src/language/mod.rs`
//!
//! # Example
//!
//! ```rust,ignore
//! use lex_insight::language::{GoogleTranslateClient, StopwordDetector};
//! use lex_insight::Pipeline;
//! use std::sync::Arc;
//!
//! let pipeline = Pipeline::builder()
//!     .language_detector(Arc::new(StopwordDetector::default()))
//!     .translator(Arc::new(GoogleTranslateClient::new()?))
//!     .build()?;
//! ```

use anyhow::Result;

/// Translates text between languages.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; calls are issued concurrently from
/// the translation worker pool.
///
/// # Error Handling
///
/// A failed call is not fatal. The pipeline keeps the original text for that
/// row and logs the error.
pub trait Translator: Send + Sync {
    /// Translate `text` from `source` (e.g. `"auto"`) into `target` (e.g. `"en"`).
    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;

    /// Get the service name for logging and debugging.
    fn name(&self) -> &str;
}

/// Detects the dominant language of a text sample.
///
/// Implementations return a lowercase ISO 639-1 code such as `"en"` or `"es"`.
/// The pipeline falls back to English when detection fails.
pub trait LanguageDetector: Send + Sync {
    /// Detect the language of `text`.
    fn detect(&self, text: &str) -> Result<String>;

    /// Get the detector name for logging and debugging.
    fn name(&self) -> &str;
}
