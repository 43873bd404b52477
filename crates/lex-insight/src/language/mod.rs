//! Language detection and translation.
//!
//! The pipeline talks to language services only through the
//! [`LanguageDetector`] and [`Translator`] traits. Two implementations ship
//! with the crate:
//!
//! - [`StopwordDetector`] - offline detection from stop-word counts
//! - [`GoogleTranslateClient`] - remote detection and translation (requires
//!   the `remote` feature)
//!
//! Detection failures never abort a run: [`detect_language`] falls back to
//! English and records that it did so in [`DetectedLanguage::defaulted`].

mod provider;
mod stopwords;
mod translation;

#[cfg(feature = "remote")]
mod google;

pub use provider::{LanguageDetector, Translator};
pub use stopwords::StopwordDetector;
pub use translation::{
    AUTO_SOURCE, RowTranslation, TranslationBatch, TranslationOptions, translate_values,
};

#[cfg(feature = "remote")]
pub use google::{GoogleTranslateClient, GoogleTranslateConfig, GoogleTranslateConfigBuilder};

use crate::error::InsightError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Language assumed when detection is unavailable or fails.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Outcome of language detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedLanguage {
    /// Lowercase language code, e.g. `"es"`.
    pub code: String,
    /// True when the code is the fallback rather than a detection.
    pub defaulted: bool,
}

impl DetectedLanguage {
    fn fallback() -> Self {
        Self {
            code: DEFAULT_LANGUAGE.to_string(),
            defaulted: true,
        }
    }

    /// Whether text in this language must be translated into `target`.
    pub fn needs_translation(&self, target: &str) -> bool {
        !self.code.eq_ignore_ascii_case(target)
    }
}

/// Join the first `size` non-null, non-blank values with a space.
pub fn detection_sample(values: &[Option<String>], size: usize) -> String {
    values
        .iter()
        .flatten()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .take(size)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Detect the language of `sample`, falling back to English.
///
/// A missing detector, a detector error or an empty answer all yield
/// `"en"` with `defaulted` set. Region suffixes (`"pt-BR"`) are dropped.
pub fn detect_language(detector: Option<&dyn LanguageDetector>, sample: &str) -> DetectedLanguage {
    let Some(detector) = detector else {
        debug!("No language detector configured, assuming '{}'", DEFAULT_LANGUAGE);
        return DetectedLanguage::fallback();
    };

    match detector.detect(sample) {
        Ok(code) => {
            let code = code
                .split(['-', '_'])
                .next()
                .unwrap_or_default()
                .trim()
                .to_lowercase();
            if code.is_empty() {
                warn!("{} returned an empty language code", detector.name());
                return DetectedLanguage::fallback();
            }
            debug!("{} detected language '{}'", detector.name(), code);
            DetectedLanguage {
                code,
                defaulted: false,
            }
        }
        Err(e) => {
            let error = InsightError::Detection(e.to_string());
            warn!("{}; assuming '{}'", error, DEFAULT_LANGUAGE);
            DetectedLanguage::fallback()
        }
    }
}
