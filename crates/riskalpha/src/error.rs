//! Run-level error type.

use riskalpha_data::DataError;
use riskalpha_model::ModelError;
use riskalpha_output::ExportError;
use riskalpha_text::TextError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that abort a pipeline run or an artifact operation.
///
/// Per-document and per-horizon problems never surface here; they are
/// recorded in the run output instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The corpus or benchmark prices could not be loaded.
    #[error("Corpus load failure: {0}")]
    CorpusLoadFailure(String),

    /// No vocabulary could be fitted.
    #[error("Vectorization failure: {0}")]
    VectorizationFailure(String),

    /// Data error
    #[error("Data error: {0}")]
    Data(DataError),

    /// Text error
    #[error("Text error: {0}")]
    Text(TextError),

    /// Model error
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Export error
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Artifact is missing from the output directory.
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<DataError> for PipelineError {
    fn from(e: DataError) -> Self {
        match e {
            DataError::CorpusLoad(msg) => Self::CorpusLoadFailure(msg),
            other => Self::Data(other),
        }
    }
}

impl From<TextError> for PipelineError {
    fn from(e: TextError) -> Self {
        match e {
            TextError::EmptyVocabulary(msg) => Self::VectorizationFailure(msg),
            TextError::InvalidConfig(msg) => Self::Config(msg),
            other => Self::Text(other),
        }
    }
}

impl PipelineError {
    /// Whether the error is one of the fatal run-level causes.
    pub const fn is_fatal_run_cause(&self) -> bool {
        matches!(
            self,
            Self::CorpusLoadFailure(_) | Self::VectorizationFailure(_) | Self::Config(_)
        )
    }
}
