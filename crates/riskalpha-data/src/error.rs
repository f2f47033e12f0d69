//! Error types for corpus and label operations.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading the corpus or computing labels.
#[derive(Debug, Error)]
pub enum DataError {
    /// The corpus or the benchmark series cannot be loaded at all.
    #[error("Corpus load failure: {0}")]
    CorpusLoad(String),

    /// A document/horizon pair cannot be labeled.
    #[error("Missing price data for {entity} on {date} (horizon {horizon}): {reason}")]
    MissingPriceData {
        /// Entity (or benchmark) whose series lacked the required prices
        entity: String,
        /// Disclosure date that was being aligned
        date: NaiveDate,
        /// Horizon in trading days
        horizon: usize,
        /// Why the label is undefined
        reason: String,
    },

    /// A price series violates its ordering or value invariants.
    #[error("Invalid price series for {entity}: {reason}")]
    InvalidSeries {
        /// Entity identifier of the series
        entity: String,
        /// Description of the violation
        reason: String,
    },

    /// Document lookup failed.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DataError {
    /// Whether this error only invalidates a single document/horizon pair.
    pub const fn is_missing_price_data(&self) -> bool {
        matches!(self, Self::MissingPriceData { .. })
    }
}
