//! Error types for text vectorization.

use thiserror::Error;

/// Result type for vectorizer operations.
pub type Result<T> = std::result::Result<T, TextError>;

/// Errors raised while fitting or applying a vectorizer.
#[derive(Debug, Error)]
pub enum TextError {
    /// Fitting produced no usable terms.
    #[error("Empty vocabulary: {0}")]
    EmptyVocabulary(String),

    /// Vectorizer options are inconsistent.
    #[error("Invalid vectorizer configuration: {0}")]
    InvalidConfig(String),

    /// A stored vocabulary has mismatched term and weight arrays.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },
}
