//! Error types for model fitting and training.

use thiserror::Error;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while fitting or evaluating models.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A horizon has too few labeled documents to train on.
    #[error("Insufficient data for horizon {horizon}: need at least {required} samples, got {actual}")]
    InsufficientData {
        /// Horizon in trading days
        horizon: usize,
        /// Required number of samples
        required: usize,
        /// Actual number of samples
        actual: usize,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// The normal equations could not be factorized.
    #[error("Singular system: {0}")]
    Singular(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ModelError {
    /// Whether the error only disqualifies a single horizon.
    pub const fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}
