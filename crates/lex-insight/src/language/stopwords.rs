//! Offline language detection from stop-word frequency.

use super::LanguageDetector;
use anyhow::{Result, anyhow};
use once_cell::sync::Lazy;
use std::collections::HashSet;

static DEFAULT_STOPWORDS: Lazy<Vec<(&'static str, Vec<&'static str>)>> = Lazy::new(|| {
    vec![
        (
            "en",
            vec![
                "i", "me", "my", "the", "and", "a", "an", "is", "it", "of", "to", "in", "that",
                "with", "this", "was", "for", "are", "on", "be", "at", "by", "not", "or", "have",
                "very", "but", "we", "you", "they",
            ],
        ),
        (
            "es",
            vec![
                "el", "la", "los", "las", "y", "es", "de", "que", "en", "un", "una", "por", "con",
                "para", "muy", "pero", "del", "al", "lo", "se", "su", "fue", "está", "como",
            ],
        ),
        (
            "fr",
            vec![
                "le", "la", "les", "et", "est", "des", "une", "un", "du", "que", "qui", "dans",
                "pour", "pas", "sur", "avec", "très", "mais", "nous", "vous", "ce", "sont",
            ],
        ),
        (
            "de",
            vec![
                "der", "die", "das", "und", "ist", "nicht", "ein", "eine", "mit", "zu", "den",
                "von", "sehr", "aber", "wir", "sie", "auf", "für", "auch", "war", "ich",
            ],
        ),
        (
            "pt",
            vec![
                "o", "os", "as", "e", "é", "um", "uma", "não", "com", "para", "muito", "mas",
                "do", "da", "dos", "das", "em", "foi", "está", "são",
            ],
        ),
        (
            "it",
            vec![
                "il", "lo", "gli", "e", "è", "di", "che", "non", "un", "uno", "una", "per", "con",
                "molto", "ma", "sono", "della", "nel", "questo",
            ],
        ),
        (
            "nl",
            vec![
                "de", "het", "een", "en", "is", "niet", "van", "dat", "met", "zijn", "voor", "op",
                "maar", "heel", "wij", "ook", "naar",
            ],
        ),
        (
            "id",
            vec![
                "dan", "yang", "di", "ini", "itu", "dengan", "untuk", "tidak", "adalah", "ke",
                "dari", "sangat", "tetapi", "kami", "saya", "ada",
            ],
        ),
    ]
});

/// Detects language by counting stop words of each known language.
///
/// The language with the most hits wins. Detection fails when the sample
/// contains no known stop word, or when two languages share the top count
/// (short samples made of words like "de" or "e").
#[derive(Debug, Clone)]
pub struct StopwordDetector {
    languages: Vec<(String, HashSet<String>)>,
}

impl Default for StopwordDetector {
    fn default() -> Self {
        Self::new(DEFAULT_STOPWORDS.iter().map(|(code, words)| {
            (
                code.to_string(),
                words.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
            )
        }))
    }
}

impl StopwordDetector {
    /// Build a detector from `(language code, stop words)` pairs.
    pub fn new<I, W>(languages: I) -> Self
    where
        I: IntoIterator<Item = (String, W)>,
        W: IntoIterator<Item = String>,
    {
        Self {
            languages: languages
                .into_iter()
                .map(|(code, words)| {
                    (
                        code.to_lowercase(),
                        words.into_iter().map(|w| w.to_lowercase()).collect(),
                    )
                })
                .collect(),
        }
    }

    /// Language codes known to this detector, in priority order.
    pub fn languages(&self) -> Vec<&str> {
        self.languages.iter().map(|(code, _)| code.as_str()).collect()
    }

    fn hits(&self, text: &str) -> Vec<(&str, usize)> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphabetic())
            .filter(|token| !token.is_empty())
            .collect();

        self.languages
            .iter()
            .map(|(code, words)| {
                let count = tokens.iter().filter(|t| words.contains(**t)).count();
                (code.as_str(), count)
            })
            .collect()
    }
}

impl LanguageDetector for StopwordDetector {
    fn detect(&self, text: &str) -> Result<String> {
        let hits = self.hits(text);
        let top = hits.iter().map(|(_, count)| *count).max().unwrap_or(0);
        if top == 0 {
            return Err(anyhow!("no known stop words in sample"));
        }

        let leaders: Vec<&str> = hits
            .iter()
            .filter(|(_, count)| *count == top)
            .map(|(code, _)| *code)
            .collect();
        match leaders.as_slice() {
            [code] => Ok(code.to_string()),
            _ => Err(anyhow!(
                "ambiguous sample: {} each have {} stop words",
                leaders.join(", "),
                top
            )),
        }
    }

    fn name(&self) -> &str {
        "Stopwords"
    }
}
