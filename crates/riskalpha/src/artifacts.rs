//! Run artifacts on disk.
//!
//! ```text
//! <dir>/vocabulary.json
//! <dir>/model_T<k>.json
//! <dir>/attribution_T<k>.json
//! <dir>/attribution_T<k>.csv
//! <dir>/impact_words_T<k>.csv
//! <dir>/metrics.json
//! <dir>/report.json
//! ```

use crate::error::{PipelineError, Result};
use riskalpha_model::FittedModel;
use riskalpha_output::{
    AttributionReport, ExportFormat, Exporter, MetricsSummary, RunReport, TermImpact,
};
use riskalpha_text::Vocabulary;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Persisted vocabulary file name.
pub const VOCABULARY_FILE: &str = "vocabulary.json";

/// Per-horizon metrics file name.
pub const METRICS_FILE: &str = "metrics.json";

/// Run report file name.
pub const REPORT_FILE: &str = "report.json";

const HORIZON_PREFIXES: [&str; 3] = ["model_T", "attribution_T", "impact_words_T"];

/// Horizon of a per-horizon artifact file name such as `attribution_T5.csv`.
fn artifact_horizon(file_name: &str) -> Option<usize> {
    let (stem, _ext) = file_name.rsplit_once('.')?;
    HORIZON_PREFIXES
        .iter()
        .find_map(|prefix| stem.strip_prefix(prefix))
        .and_then(|k| k.parse().ok())
}

/// Reads and writes the artifacts of one run directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Artifacts rooted at `dir`. Nothing is created until the first write.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the persisted model for a horizon.
    pub fn model_path(&self, horizon: usize) -> PathBuf {
        self.dir.join(format!("model_T{}.json", horizon))
    }

    /// Path of an attribution report for a horizon.
    pub fn attribution_path(&self, horizon: usize, format: ExportFormat) -> PathBuf {
        self.dir
            .join(format!("attribution_T{}.{}", horizon, format.extension()))
    }

    /// Path of the full impact table for a horizon.
    pub fn impact_path(&self, horizon: usize) -> PathBuf {
        self.dir.join(format!("impact_words_T{}.csv", horizon))
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(path, serde_json::to_string_pretty(value)?)?;
        debug!(path = %path.display(), "artifact written");
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        if !path.exists() {
            return Err(PipelineError::ArtifactNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Delete per-horizon artifacts of every horizon not in `keep`.
    ///
    /// Returns the horizons whose files were removed. A missing directory
    /// has nothing to prune.
    pub fn prune_horizons(&self, keep: &BTreeSet<usize>) -> Result<BTreeSet<usize>> {
        let mut removed = BTreeSet::new();
        if !self.dir.is_dir() {
            return Ok(removed);
        }
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(horizon) = name.to_str().and_then(artifact_horizon) else {
                continue;
            };
            if keep.contains(&horizon) || !entry.file_type()?.is_file() {
                continue;
            }
            fs::remove_file(entry.path())?;
            debug!(path = %entry.path().display(), "stale artifact removed");
            removed.insert(horizon);
        }
        if !removed.is_empty() {
            info!(horizons = ?removed, "removed artifacts of horizons without a model");
        }
        Ok(removed)
    }

    /// Persist the fitted vocabulary.
    pub fn save_vocabulary(&self, vocabulary: &Vocabulary) -> Result<()> {
        self.write_json(&self.dir.join(VOCABULARY_FILE), vocabulary)
    }

    /// Load a persisted vocabulary.
    pub fn load_vocabulary(&self) -> Result<Vocabulary> {
        self.read_json(&self.dir.join(VOCABULARY_FILE))
    }

    /// Persist a horizon's fitted model.
    pub fn save_model(&self, horizon: usize, model: &FittedModel) -> Result<()> {
        self.write_json(&self.model_path(horizon), model)
    }

    /// Load a horizon's fitted model.
    pub fn load_model(&self, horizon: usize) -> Result<FittedModel> {
        self.read_json(&self.model_path(horizon))
    }

    /// Persist an attribution report as JSON and CSV.
    pub fn save_attribution(&self, report: &AttributionReport) -> Result<()> {
        report.export_to_file(
            &self.attribution_path(report.horizon, ExportFormat::PrettyJson),
            ExportFormat::PrettyJson,
        )?;
        report.export_to_file(
            &self.attribution_path(report.horizon, ExportFormat::Csv),
            ExportFormat::Csv,
        )?;
        Ok(())
    }

    /// Load a horizon's attribution report.
    pub fn load_attribution(&self, horizon: usize) -> Result<AttributionReport> {
        self.read_json(&self.attribution_path(horizon, ExportFormat::Json))
    }

    /// Persist the full impact table of a horizon.
    pub fn save_impacts(&self, horizon: usize, impacts: &[TermImpact]) -> Result<()> {
        impacts.export_to_file(&self.impact_path(horizon), ExportFormat::Csv)?;
        Ok(())
    }

    /// Persist the metrics summary.
    pub fn save_metrics(&self, summary: &MetricsSummary) -> Result<()> {
        summary.export_to_file(&self.dir.join(METRICS_FILE), ExportFormat::PrettyJson)?;
        Ok(())
    }

    /// Load the metrics summary.
    pub fn load_metrics(&self) -> Result<MetricsSummary> {
        self.read_json(&self.dir.join(METRICS_FILE))
    }

    /// Persist the run report.
    pub fn save_report(&self, report: &RunReport) -> Result<()> {
        report.export_to_file(&self.dir.join(REPORT_FILE), ExportFormat::PrettyJson)?;
        Ok(())
    }

    /// Load the run report.
    pub fn load_report(&self) -> Result<RunReport> {
        self.read_json(&self.dir.join(REPORT_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskalpha_model::{ModelSpec, Predictor};
    use riskalpha_text::{TextOptions, TfidfVectorizer};
    use ndarray::array;
    use tempfile::TempDir;

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(
            store.load_model(5),
            Err(PipelineError::ArtifactNotFound(_))
        ));
        assert!(matches!(
            store.load_vocabulary(),
            Err(PipelineError::ArtifactNotFound(_))
        ));
    }

    #[test]
    fn test_vocabulary_and_model_reload() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("run"));

        let vocabulary = TfidfVectorizer::new(10, TextOptions::default())
            .fit(&["mobile growth", "fuel costs"])
            .unwrap();
        store.save_vocabulary(&vocabulary).unwrap();
        assert_eq!(store.load_vocabulary().unwrap().terms(), vocabulary.terms());

        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]];
        let y = array![1.0, -1.0, 0.0, 0.0];
        let model = ModelSpec::default().fit(x.view(), y.view()).unwrap();
        store.save_model(5, &model).unwrap();

        let loaded = store.load_model(5).unwrap();
        assert_eq!(loaded.family(), model.family());
        assert_eq!(loaded.n_features(), 2);
        assert!(store.model_path(5).ends_with("model_T5.json"));
    }

    #[test]
    fn test_attribution_written_in_both_formats() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let terms = vec!["fuel".to_string(), "mobile".to_string()];
        let report = AttributionReport::from_importances(1, "ridge", &terms, &[-0.5, 0.5], 20).unwrap();

        store.save_attribution(&report).unwrap();
        assert!(dir.path().join("attribution_T1.json").exists());
        assert!(dir.path().join("attribution_T1.csv").exists());
        assert_eq!(store.load_attribution(1).unwrap(), report);
    }

    #[test]
    fn test_artifact_horizon_names() {
        assert_eq!(artifact_horizon("model_T10.json"), Some(10));
        assert_eq!(artifact_horizon("attribution_T5.csv"), Some(5));
        assert_eq!(artifact_horizon("impact_words_T1.csv"), Some(1));
        assert_eq!(artifact_horizon("metrics.json"), None);
        assert_eq!(artifact_horizon("model_Tx.json"), None);
    }

    #[test]
    fn test_prune_keeps_trained_horizons() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let terms = vec!["fuel".to_string(), "mobile".to_string()];
        for horizon in [1, 10] {
            let report =
                AttributionReport::from_importances(horizon, "ridge", &terms, &[-0.5, 0.5], 20)
                    .unwrap();
            store.save_attribution(&report).unwrap();
        }
        fs::write(store.model_path(10), "{}").unwrap();
        fs::write(dir.path().join(METRICS_FILE), "{}").unwrap();

        let removed = store.prune_horizons(&BTreeSet::from([1])).unwrap();
        assert_eq!(removed, BTreeSet::from([10]));
        assert!(!store.model_path(10).exists());
        assert!(!dir.path().join("attribution_T10.csv").exists());
        assert!(matches!(
            store.load_attribution(10),
            Err(PipelineError::ArtifactNotFound(_))
        ));
        assert!(store.load_attribution(1).is_ok());
        assert!(dir.path().join(METRICS_FILE).exists());
    }

    #[test]
    fn test_prune_missing_dir() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("absent"));
        assert!(store.prune_horizons(&BTreeSet::new()).unwrap().is_empty());
    }
}
