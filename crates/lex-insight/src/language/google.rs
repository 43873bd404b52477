//! Google Translate (`client=gtx`) service client.
//!
//! This module provides the [`GoogleTranslateClient`] which implements both
//! [`Translator`] and [`LanguageDetector`] against the public
//! `translate_a/single` JSON endpoint, or any proxy exposing the same shape.

use super::{LanguageDetector, Translator};
use anyhow::{Result, anyhow};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

/// Default translation endpoint.
const DEFAULT_BASE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Default timeout for API requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Language requested when only detecting.
const DETECTION_TARGET: &str = "en";

/// Configuration for the Google Translate client.
#[derive(Debug, Clone)]
pub struct GoogleTranslateConfig {
    /// Base URL for the API (useful for proxies or a local mock).
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GoogleTranslateConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GoogleTranslateConfig {
    /// Create a new configuration builder.
    pub fn builder() -> GoogleTranslateConfigBuilder {
        GoogleTranslateConfigBuilder::default()
    }
}

/// Builder for [`GoogleTranslateConfig`].
#[derive(Default)]
pub struct GoogleTranslateConfigBuilder {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl GoogleTranslateConfigBuilder {
    /// Set a custom base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the request timeout in seconds.
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GoogleTranslateConfig {
        GoogleTranslateConfig {
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// A translation as returned by the service.
#[derive(Debug, Clone, PartialEq)]
struct TranslationResponse {
    text: String,
    source_language: Option<String>,
}

/// Blocking client for the Google Translate JSON endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use lex_insight::language::{GoogleTranslateClient, GoogleTranslateConfig};
///
/// let client = GoogleTranslateClient::new()?;
///
/// let config = GoogleTranslateConfig::builder()
///     .base_url("http://localhost:8080/translate_a/single")
///     .timeout_secs(3)
///     .build();
/// let client = GoogleTranslateClient::with_config(config)?;
/// ```
pub struct GoogleTranslateClient {
    config: GoogleTranslateConfig,
    client: Client,
}

impl GoogleTranslateClient {
    /// Create a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_config(GoogleTranslateConfig::default())
    }

    /// Create a client with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_config(config: GoogleTranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self { config, client })
    }

    /// The configuration in use.
    pub fn config(&self) -> &GoogleTranslateConfig {
        &self.config
    }

    fn call_api(&self, text: &str, source: &str, target: &str) -> Result<TranslationResponse> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Translate API Error {}: {}",
                response.status(),
                response.text()?
            ));
        }

        let body: Value = response.json()?;
        parse_response(&body)
    }
}

/// Extract the translation from a `translate_a/single` response.
///
/// The body is a nested array: `body[0]` holds one `[translated, original, ..]`
/// entry per sentence and `body[2]` the detected source language.
fn parse_response(body: &Value) -> Result<TranslationResponse> {
    let sentences = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("No translation segments in response"))?;

    let text: String = sentences
        .iter()
        .filter_map(|sentence| sentence.get(0).and_then(Value::as_str))
        .collect();

    if text.is_empty() && !sentences.is_empty() {
        return Err(anyhow!("Translation segments contained no text"));
    }

    let source_language = body
        .get(2)
        .and_then(Value::as_str)
        .map(|code| code.to_lowercase());

    Ok(TranslationResponse {
        text,
        source_language,
    })
}

impl Translator for GoogleTranslateClient {
    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        Ok(self.call_api(text, source, target)?.text)
    }

    fn name(&self) -> &str {
        "GoogleTranslate"
    }
}

impl LanguageDetector for GoogleTranslateClient {
    fn detect(&self, text: &str) -> Result<String> {
        self.call_api(text, "auto", DETECTION_TARGET)?
            .source_language
            .ok_or_else(|| anyhow!("Response did not include a source language"))
    }

    fn name(&self) -> &str {
        "GoogleTranslate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -------------------------------------------------------------------------
    // Response parsing
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_single_sentence() {
        let body = json!([[["Good service", "Buen servicio", null, null, 10]], null, "es"]);
        let parsed = parse_response(&body).unwrap();
        assert_eq!(parsed.text, "Good service");
        assert_eq!(parsed.source_language.as_deref(), Some("es"));
    }

    #[test]
    fn test_parse_concatenates_sentences() {
        let body = json!([
            [["Hello. ", "Hola. ", null, null, 1], ["How are you?", "¿Cómo estás?", null, null, 1]],
            null,
            "ES"
        ]);
        let parsed = parse_response(&body).unwrap();
        assert_eq!(parsed.text, "Hello. How are you?");
        assert_eq!(parsed.source_language.as_deref(), Some("es"));
    }

    #[test]
    fn test_parse_missing_language() {
        let body = json!([[["Hi", "Hi", null, null, 1]]]);
        let parsed = parse_response(&body).unwrap();
        assert_eq!(parsed.text, "Hi");
        assert!(parsed.source_language.is_none());
    }

    #[test]
    fn test_parse_malformed_body() {
        assert!(parse_response(&json!({"error": "quota"})).is_err());
        assert!(parse_response(&json!([null, null, "es"])).is_err());
        assert!(parse_response(&json!([[[null, "x"]], null, "es"])).is_err());
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    #[test]
    fn test_config_defaults() {
        let config = GoogleTranslateConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_config_builder() {
        let config = GoogleTranslateConfig::builder()
            .base_url("http://localhost:9000/translate")
            .timeout_secs(2)
            .build();
        assert_eq!(config.base_url, "http://localhost:9000/translate");
        assert_eq!(config.timeout_secs, 2);

        let client = GoogleTranslateClient::with_config(config).unwrap();
        assert_eq!(Translator::name(&client), "GoogleTranslate");
        assert_eq!(client.config().timeout_secs, 2);
    }
}
