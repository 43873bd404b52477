//! Named regex categories detected within a column sample.

use crate::error::Result;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Serialize;

static DEFAULT_REGISTRY: Lazy<PatternRegistry> = Lazy::new(|| {
    PatternRegistry::new()
        .with_pattern(
            "Financial Indicators",
            r"\b(debt|overdraft|income|value|finance|bank)\b",
        )
        .expect("Invalid regex: financial indicators")
        .with_pattern(
            "Industrial Sectors",
            r"\b(agriculture|forestry|retail|manufacturing|mining)\b",
        )
        .expect("Invalid regex: industrial sectors")
});

/// A named, case-insensitive pattern.
#[derive(Debug, Clone)]
struct PatternEntry {
    name: String,
    regex: Regex,
}

/// Ordered mapping of category name to regular expression.
///
/// Registry order is the order categories are reported in.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    entries: Vec<PatternEntry>,
}

impl Default for PatternRegistry {
    /// Financial indicators and industrial sectors.
    fn default() -> Self {
        DEFAULT_REGISTRY.clone()
    }
}

impl PatternRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a category, builder style.
    pub fn with_pattern(mut self, name: impl Into<String>, pattern: &str) -> Result<Self> {
        self.insert(name, pattern)?;
        Ok(self)
    }

    /// Add a category, replacing the pattern of an existing name in place.
    ///
    /// # Errors
    ///
    /// [`crate::InsightError::Regex`] when `pattern` does not compile.
    pub fn insert(&mut self, name: impl Into<String>, pattern: &str) -> Result<()> {
        let name = name.into();
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;

        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.regex = regex,
            None => self.entries.push(PatternEntry { name, regex }),
        }
        Ok(())
    }

    /// Category names in registry order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Categories whose pattern matches anywhere in `text`.
    pub fn matching(&self, text: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.regex.is_match(text))
            .map(|entry| entry.name.clone())
            .collect()
    }
}

impl Serialize for PatternRegistry {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.name, entry.regex.as_str())?;
        }
        map.end()
    }
}

/// Detect categories in the first `sample_rows` values of a column.
///
/// The sample is joined with spaces and lowercased; nulls contribute nothing.
pub fn detect_patterns(
    values: &[Option<String>],
    registry: &PatternRegistry,
    sample_rows: usize,
) -> Vec<String> {
    let sample = values
        .iter()
        .take(sample_rows)
        .map(|value| value.as_deref().unwrap_or_default())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    registry.matching(&sample)
}
