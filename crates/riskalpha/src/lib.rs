#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/riskalpha/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod artifacts;
pub mod config;
pub mod error;
pub mod filter;
pub mod pipeline;

pub use artifacts::ArtifactStore;
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use filter::{DocumentFilter, ExclusionReason};
pub use pipeline::{Pipeline, PipelineOutput, predict_text};

pub use riskalpha_data as data;
pub use riskalpha_model as model;
pub use riskalpha_output as output;
pub use riskalpha_text as text;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
