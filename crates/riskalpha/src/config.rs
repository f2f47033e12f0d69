//! Pipeline configuration.
//!
//! Every field has a default, so an empty TOML file is a valid configuration.
//!
//! ```toml
//! horizons = [1, 5, 10]
//! vocabulary_size = 3000
//! min_samples = 30
//! test_ratio = 0.2
//!
//! [model]
//! family = "ridge"
//! alpha = 1.0
//!
//! [horizon_models.10]
//! family = "random_forest"
//! n_trees = 100
//!
//! [alignment]
//! rule = "nearest_prior"
//! max_gap_days = 3
//! ```

use crate::error::{PipelineError, Result};
use riskalpha_data::AlignmentRule;
use riskalpha_model::{ModelSpec, TrainerConfig};
use riskalpha_text::TextOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Raw text that the extraction step writes when no risk-factor section was found.
pub const DEFAULT_PLACEHOLDER: &str = "SECTION_NOT_FOUND_OR_REFERENCE_ONLY";

/// Configuration of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Horizons in trading days
    pub horizons: Vec<usize>,
    /// Vocabulary size V
    pub vocabulary_size: usize,
    /// Minimum labeled documents per horizon
    pub min_samples: usize,
    /// Held-out fraction in `[0, 1)`
    pub test_ratio: f64,
    /// Seed for the split and stochastic models
    pub seed: u64,
    /// Default model family
    pub model: ModelSpec,
    /// Model family per horizon, keyed by horizon
    pub horizon_models: BTreeMap<String, ModelSpec>,
    /// Families trained alongside for comparison metrics
    pub comparison_models: Vec<ModelSpec>,
    /// Terms per attribution direction
    pub top_n: usize,
    /// Disclosure-date alignment rule
    pub alignment: AlignmentRule,
    /// Benchmark symbol for directory corpora
    pub benchmark: String,
    /// A valid document's trimmed raw text must be longer than this, in characters
    pub min_text_chars: usize,
    /// Raw texts equal to one of these markers are invalid
    pub placeholder_markers: Vec<String>,
    /// Vectorizer options
    pub text: TextOptions,
    /// Horizon worker-pool size (0 = available cores)
    pub max_parallel_horizons: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            horizons: vec![1, 5, 10],
            vocabulary_size: 3000,
            min_samples: 30,
            test_ratio: 0.2,
            seed: 42,
            model: ModelSpec::default(),
            horizon_models: BTreeMap::new(),
            comparison_models: Vec::new(),
            top_n: 20,
            alignment: AlignmentRule::default(),
            benchmark: "SPY".to_string(),
            min_text_chars: 100,
            placeholder_markers: vec![DEFAULT_PLACEHOLDER.to_string()],
            text: TextOptions::default(),
            max_parallel_horizons: 0,
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Sort and deduplicate horizons, then check every field.
    ///
    /// # Errors
    /// [`PipelineError::Config`] describing the first invalid field.
    pub fn validated(mut self) -> Result<Self> {
        self.horizons.sort_unstable();
        self.horizons.dedup();

        if self.horizons.is_empty() {
            return Err(PipelineError::Config("horizon set is empty".to_string()));
        }
        if self.horizons[0] == 0 {
            return Err(PipelineError::Config("horizons must be >= 1".to_string()));
        }
        if self.vocabulary_size == 0 {
            return Err(PipelineError::Config("vocabulary_size must be >= 1".to_string()));
        }
        if !(0.0..1.0).contains(&self.test_ratio) {
            return Err(PipelineError::Config(format!(
                "test_ratio must lie in [0, 1), got {}",
                self.test_ratio
            )));
        }
        if self.top_n == 0 {
            return Err(PipelineError::Config("top_n must be >= 1".to_string()));
        }
        self.text.validate()?;

        self.model
            .validate()
            .map_err(|e| PipelineError::Config(format!("model: {}", e)))?;
        for spec in &self.comparison_models {
            spec.validate()
                .map_err(|e| PipelineError::Config(format!("comparison model: {}", e)))?;
        }
        for (horizon, spec) in self.parsed_horizon_models()? {
            if !self.horizons.contains(&horizon) {
                return Err(PipelineError::Config(format!(
                    "model override for horizon {} which is not configured",
                    horizon
                )));
            }
            spec.validate()
                .map_err(|e| PipelineError::Config(format!("horizon {} model: {}", horizon, e)))?;
        }
        Ok(self)
    }

    fn parsed_horizon_models(&self) -> Result<BTreeMap<usize, ModelSpec>> {
        self.horizon_models
            .iter()
            .map(|(key, spec)| {
                key.trim()
                    .parse::<usize>()
                    .map(|h| (h, *spec))
                    .map_err(|_| PipelineError::Config(format!("invalid horizon key '{}'", key)))
            })
            .collect()
    }

    /// Trainer settings derived from this configuration.
    ///
    /// `seed` drives the split and every forest that does not set its own.
    pub fn trainer_config(&self) -> Result<TrainerConfig> {
        let seed = self.seed;
        Ok(TrainerConfig {
            min_samples: self.min_samples,
            test_ratio: self.test_ratio,
            seed,
            model: self.model.seeded(seed),
            horizon_models: self
                .parsed_horizon_models()?
                .into_iter()
                .map(|(h, spec)| (h, spec.seeded(seed)))
                .collect(),
            comparison_models: self.comparison_models.iter().map(|s| s.seeded(seed)).collect(),
            max_parallel: self.max_parallel_horizons,
        })
    }

    /// Configuration as JSON for the run report.
    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskalpha_model::{ForestParams, RidgeParams};
    use rstest::rstest;

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(PipelineConfig::from_toml_str("").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_parse_full_toml() {
        let config = PipelineConfig::from_toml_str(
            r#"
            horizons = [10, 1, 5, 5]
            vocabulary_size = 500
            test_ratio = 0.25

            [model]
            family = "ridge"
            alpha = 2.5

            [horizon_models.10]
            family = "random_forest"
            n_trees = 50

            [alignment]
            rule = "next_trading"
            max_gap_days = 2

            [text]
            ngram_max = 2
            min_df = 0.01
            "#,
        )
        .unwrap()
        .validated()
        .unwrap();

        assert_eq!(config.horizons, vec![1, 5, 10]);
        assert_eq!(config.model, ModelSpec::Ridge(RidgeParams { alpha: 2.5 }));
        assert_eq!(config.alignment, AlignmentRule::NextTrading { max_gap_days: 2 });
        assert_eq!(config.text.ngram_max, 2);

        let trainer = config.trainer_config().unwrap();
        assert_eq!(
            trainer.horizon_models[&10],
            ModelSpec::RandomForest(ForestParams {
                n_trees: 50,
                seed: Some(42),
                ..ForestParams::default()
            })
        );
    }

    fn forest_seeds(config: &PipelineConfig) -> Vec<Option<u64>> {
        let trainer = config.trainer_config().unwrap();
        std::iter::once(trainer.model)
            .chain(trainer.horizon_models.into_values())
            .chain(trainer.comparison_models)
            .filter_map(|spec| match spec {
                ModelSpec::RandomForest(params) => Some(params.seed),
                ModelSpec::Ridge(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_run_seed_reaches_forests() {
        let toml = |seed: u64| {
            format!(
                "seed = {seed}\n\
                 comparison_models = [{{ family = \"random_forest\" }}]\n\
                 [model]\nfamily = \"random_forest\"\n\
                 [horizon_models.5]\nfamily = \"random_forest\"\n"
            )
        };
        let one = PipelineConfig::from_toml_str(&toml(1)).unwrap().validated().unwrap();
        let other = PipelineConfig::from_toml_str(&toml(999)).unwrap().validated().unwrap();

        assert_eq!(forest_seeds(&one), vec![Some(1); 3]);
        assert_eq!(forest_seeds(&other), vec![Some(999); 3]);
        assert_eq!(one.trainer_config().unwrap().seed, 1);
    }

    #[test]
    fn test_explicit_forest_seed_wins() {
        let config = PipelineConfig::from_toml_str(
            "seed = 5\n[model]\nfamily = \"random_forest\"\nseed = 11\n",
        )
        .unwrap()
        .validated()
        .unwrap();
        assert_eq!(forest_seeds(&config), vec![Some(11)]);
    }

    #[rstest]
    #[case::empty_horizons("horizons = []")]
    #[case::zero_horizon("horizons = [0, 1]")]
    #[case::zero_vocabulary("vocabulary_size = 0")]
    #[case::full_test_ratio("test_ratio = 1.0")]
    #[case::zero_top_n("top_n = 0")]
    #[case::df_bounds("[text]\nmin_df = 0.9\nmax_df = 0.1")]
    #[case::unknown_override("[horizon_models.3]\nfamily = \"ridge\"")]
    #[case::negative_alpha("[model]\nfamily = \"ridge\"\nalpha = -1.0")]
    fn test_invalid_configs(#[case] toml: &str) {
        let result = PipelineConfig::from_toml_str(toml).and_then(PipelineConfig::validated);
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            PipelineConfig::from_toml_str("vocab = 10"),
            Err(PipelineError::Toml(_))
        ));
    }
}
