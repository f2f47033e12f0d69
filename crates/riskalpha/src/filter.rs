//! Document validity filtering.

use crate::config::PipelineConfig;
use riskalpha_data::{Corpus, Document};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Why a document left the valid corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Raw text is empty or whitespace
    EmptyText,
    /// Raw text is an extraction placeholder
    PlaceholderText,
    /// Trimmed raw text is not longer than the configured minimum, or cleans to nothing
    TooShort,
    /// The entity has no price series
    NoPriceData,
    /// No horizon has a defined label
    NoDefinedLabel,
}

impl ExclusionReason {
    /// Stable snake_case name used in reports.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyText => "empty_text",
            Self::PlaceholderText => "placeholder_text",
            Self::TooShort => "too_short",
            Self::NoPriceData => "no_price_data",
            Self::NoDefinedLabel => "no_defined_label",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document that passed text and price checks, with its cleaned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedDocument<'a> {
    /// Source document
    pub document: &'a Document,
    /// Output of [`riskalpha_text::clean`] on the raw text
    pub cleaned: String,
}

/// Applies the text and price checks of the validity filter.
///
/// The label check needs the label table and is applied by the pipeline
/// afterwards through [`FilterOutcome::exclude`].
#[derive(Debug, Clone)]
pub struct DocumentFilter {
    min_text_chars: usize,
    placeholder_markers: Vec<String>,
}

impl DocumentFilter {
    /// Filter with explicit thresholds.
    pub fn new(min_text_chars: usize, placeholder_markers: Vec<String>) -> Self {
        Self {
            min_text_chars,
            placeholder_markers,
        }
    }

    /// Filter using the thresholds of a configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.min_text_chars, config.placeholder_markers.clone())
    }

    /// Check a document's text. Returns the cleaned text when usable.
    pub fn check_text(&self, raw: &str) -> Result<String, ExclusionReason> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ExclusionReason::EmptyText);
        }
        if self.placeholder_markers.iter().any(|m| m == trimmed) {
            return Err(ExclusionReason::PlaceholderText);
        }
        if trimmed.chars().count() <= self.min_text_chars {
            return Err(ExclusionReason::TooShort);
        }
        let cleaned = riskalpha_text::clean(raw);
        if cleaned.is_empty() {
            return Err(ExclusionReason::TooShort);
        }
        Ok(cleaned)
    }

    /// Check one document against the corpus.
    pub fn check(&self, corpus: &Corpus, document: &Document) -> Result<String, ExclusionReason> {
        let cleaned = self.check_text(&document.raw_text)?;
        if !corpus.has_prices(&document.entity) {
            return Err(ExclusionReason::NoPriceData);
        }
        Ok(cleaned)
    }
}

/// Result of filtering a corpus.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome<'a> {
    /// Documents still valid, ordered by id
    pub valid: Vec<CleanedDocument<'a>>,
    /// Excluded document ids per reason
    pub excluded: BTreeMap<ExclusionReason, Vec<String>>,
}

impl<'a> FilterOutcome<'a> {
    /// Record an exclusion.
    pub fn exclude(&mut self, reason: ExclusionReason, document_id: impl Into<String>) {
        self.excluded.entry(reason).or_default().push(document_id.into());
    }

    /// Excluded counts keyed by reason name.
    pub fn excluded_counts(&self) -> BTreeMap<String, usize> {
        self.excluded
            .iter()
            .map(|(reason, ids)| (reason.as_str().to_string(), ids.len()))
            .collect()
    }

    /// Total excluded documents.
    pub fn excluded_total(&self) -> usize {
        self.excluded.values().map(Vec::len).sum()
    }
}
