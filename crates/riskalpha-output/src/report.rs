//! Run report: what a pipeline run saw and produced.

use crate::export::{ExportError, ExportFormat, Exporter, to_json};
use crate::summary::MetricsSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Document counts through filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusCounts {
    /// Documents loaded from the corpus store
    pub loaded: usize,
    /// Documents that passed validity filtering
    pub valid: usize,
    /// Excluded documents per exclusion reason
    pub excluded: BTreeMap<String, usize>,
    /// Fitted vocabulary cardinality
    pub vocabulary_size: usize,
    /// Vocabulary size the run asked for
    #[serde(default)]
    pub vocabulary_requested: usize,
}

impl CorpusCounts {
    /// Whether the corpus had fewer distinct terms than requested.
    pub const fn vocabulary_truncated(&self) -> bool {
        self.vocabulary_size < self.vocabulary_requested
    }
}

/// Report of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Crate version that produced the run.
    pub version: String,

    /// Effective configuration.
    pub config: serde_json::Value,

    /// Corpus counts.
    pub corpus: CorpusCounts,

    /// Per-horizon outcomes.
    pub horizons: MetricsSummary,
}

impl RunReport {
    /// Create a new report stamped with the current time.
    pub fn new(
        version: impl Into<String>,
        config: serde_json::Value,
        corpus: CorpusCounts,
        horizons: MetricsSummary,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            version: version.into(),
            config,
            corpus,
            horizons,
        }
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Exporter for RunReport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => Err(ExportError::InvalidFormat(
                "run reports are exported as JSON".to_string(),
            )),
            _ => to_json(self, format),
        }
    }
}

/// Builder for creating run reports.
#[derive(Debug, Default)]
pub struct RunReportBuilder {
    version: Option<String>,
    config: Option<serde_json::Value>,
    corpus: CorpusCounts,
    horizons: MetricsSummary,
}

impl RunReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the producing version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the effective configuration.
    pub fn config(mut self, config: serde_json::Value) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the corpus counts.
    pub fn corpus(mut self, corpus: CorpusCounts) -> Self {
        self.corpus = corpus;
        self
    }

    /// Set the horizon outcomes.
    pub fn horizons(mut self, horizons: MetricsSummary) -> Self {
        self.horizons = horizons;
        self
    }

    /// Build the report.
    pub fn build(self) -> RunReport {
        RunReport::new(
            self.version.unwrap_or_default(),
            self.config.unwrap_or(serde_json::Value::Null),
            self.corpus,
            self.horizons,
        )
    }
}
