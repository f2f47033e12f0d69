//! Risk-disclosure documents.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier of a document (for EDGAR filings, the accession number).
pub type DocumentId = String;

/// A single ingested risk disclosure.
///
/// Immutable once ingested. Cleaned text is derived from `raw_text` by the
/// vectorizer's cleaning function and is never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier
    pub id: DocumentId,
    /// Owning entity (ticker symbol)
    pub entity: String,
    /// Disclosure (filing) date
    pub date: NaiveDate,
    /// Extracted risk-factor text
    pub raw_text: String,
}

impl Document {
    /// Create a new document.
    pub fn new(
        id: impl Into<DocumentId>,
        entity: impl Into<String>,
        date: NaiveDate,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            entity: entity.into(),
            date,
            raw_text: raw_text.into(),
        }
    }

    /// Length of the raw text in characters.
    pub fn text_len(&self) -> usize {
        self.raw_text.chars().count()
    }
}
