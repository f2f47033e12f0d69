//! Per-horizon metrics and training status.

use crate::export::{ExportError, ExportFormat, Exporter, to_csv, to_json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of one horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HorizonStatus {
    /// A model and report were produced.
    Trained,
    /// The horizon was skipped; no model or report exists for it.
    Skipped {
        /// Why the horizon was skipped
        reason: String,
    },
}

impl HorizonStatus {
    /// Whether the horizon produced a model.
    pub const fn is_trained(&self) -> bool {
        matches!(self, Self::Trained)
    }
}

impl fmt::Display for HorizonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trained => write!(f, "trained"),
            Self::Skipped { reason } => write!(f, "skipped ({})", reason),
        }
    }
}

/// Metrics and status for one horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonMetrics {
    /// Horizon in trading days
    pub horizon: usize,
    /// Trained or skipped
    #[serde(flatten)]
    pub status: HorizonStatus,
    /// Model family, when trained
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    /// Documents with a defined label for this horizon
    pub n_labeled: usize,
    /// Documents excluded for missing price data at this horizon
    pub n_excluded: usize,
    /// Metric name to value (empty when skipped)
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

impl HorizonMetrics {
    /// A trained horizon.
    pub fn trained(
        horizon: usize,
        family: impl Into<String>,
        n_labeled: usize,
        n_excluded: usize,
        metrics: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            horizon,
            status: HorizonStatus::Trained,
            family: Some(family.into()),
            n_labeled,
            n_excluded,
            metrics,
        }
    }

    /// A skipped horizon.
    pub fn skipped(
        horizon: usize,
        reason: impl Into<String>,
        n_labeled: usize,
        n_excluded: usize,
    ) -> Self {
        Self {
            horizon,
            status: HorizonStatus::Skipped {
                reason: reason.into(),
            },
            family: None,
            n_labeled,
            n_excluded,
            metrics: BTreeMap::new(),
        }
    }

    /// A single metric.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// Metrics for every configured horizon, keyed by horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    /// Per-horizon entries
    pub horizons: BTreeMap<usize, HorizonMetrics>,
}

impl MetricsSummary {
    /// Create an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a horizon entry.
    pub fn insert(&mut self, entry: HorizonMetrics) {
        self.horizons.insert(entry.horizon, entry);
    }

    /// Entry for a horizon.
    pub fn get(&self, horizon: usize) -> Option<&HorizonMetrics> {
        self.horizons.get(&horizon)
    }

    /// Horizons that produced a model.
    pub fn trained(&self) -> Vec<usize> {
        self.horizons
            .values()
            .filter(|h| h.status.is_trained())
            .map(|h| h.horizon)
            .collect()
    }

    /// Horizons that were skipped.
    pub fn skipped(&self) -> Vec<usize> {
        self.horizons
            .values()
            .filter(|h| !h.status.is_trained())
            .map(|h| h.horizon)
            .collect()
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();
        output.push_str("\nHorizon Metrics\n");
        output.push_str(&"=".repeat(78));
        output.push('\n');
        output.push_str(&format!(
            "{:>7}  {:<14} {:>8} {:>8} {:>10} {:>10} {:>10}\n",
            "Horizon", "Family", "Labeled", "Test", "R2", "MSE", "MAE"
        ));
        output.push_str(&"-".repeat(78));
        output.push('\n');

        for entry in self.horizons.values() {
            match &entry.status {
                HorizonStatus::Trained => {
                    output.push_str(&format!(
                        "{:>7}  {:<14} {:>8} {:>8} {:>10.4} {:>10.6} {:>10.6}\n",
                        format!("T+{}", entry.horizon),
                        entry.family.as_deref().unwrap_or("-"),
                        entry.n_labeled,
                        entry.metric("n_test").unwrap_or(0.0),
                        entry.metric("r2").unwrap_or(f64::NAN),
                        entry.metric("mse").unwrap_or(f64::NAN),
                        entry.metric("mae").unwrap_or(f64::NAN),
                    ));
                }
                HorizonStatus::Skipped { reason } => {
                    output.push_str(&format!(
                        "{:>7}  skipped: {}\n",
                        format!("T+{}", entry.horizon),
                        reason
                    ));
                }
            }
        }
        output.push_str(&"=".repeat(78));
        output.push('\n');
        output
    }
}

#[derive(Serialize)]
struct MetricRow<'a> {
    horizon: usize,
    status: &'static str,
    metric: &'a str,
    value: f64,
}

impl Exporter for MetricsSummary {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let rows = self.horizons.values().flat_map(|entry| {
                    let status = if entry.status.is_trained() {
                        "trained"
                    } else {
                        "skipped"
                    };
                    entry.metrics.iter().map(move |(metric, &value)| MetricRow {
                        horizon: entry.horizon,
                        status,
                        metric,
                        value,
                    })
                });
                to_csv(rows)
            }
            _ => to_json(self, format),
        }
    }
}
