//! Multi-horizon training.
//!
//! Each horizon is split, fitted and evaluated on its own data only; the
//! only thing horizons share is the frozen feature space. Horizons run
//! concurrently in a dedicated rayon pool of bounded size.

use crate::error::{ModelError, Result};
use crate::metrics::{EvaluationMetrics, mean_absolute_error, mean_squared_error, r2_score};
use crate::predictor::{FittedModel, ModelSpec, Predictor};
use crate::split::{TrainTestSplit, train_test_split};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Labeled feature rows for one horizon.
#[derive(Debug, Clone)]
pub struct HorizonDataset {
    /// Horizon in trading days
    pub horizon: usize,
    /// Document id of each row
    pub document_ids: Vec<String>,
    /// Feature rows
    pub features: Array2<f64>,
    /// Alpha label of each row
    pub labels: Array1<f64>,
}

impl HorizonDataset {
    /// Assemble a dataset, checking that rows line up.
    pub fn new(
        horizon: usize,
        document_ids: Vec<String>,
        features: Array2<f64>,
        labels: Array1<f64>,
    ) -> Result<Self> {
        if features.nrows() != labels.len() || document_ids.len() != labels.len() {
            return Err(ModelError::DimensionMismatch {
                expected: labels.len(),
                actual: features.nrows().min(document_ids.len()),
            });
        }
        Ok(Self {
            horizon,
            document_ids,
            features,
            labels,
        })
    }

    /// Number of labeled documents.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Trainer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Minimum labeled documents per horizon
    pub min_samples: usize,
    /// Held-out fraction in `[0, 1)`
    pub test_ratio: f64,
    /// Split seed
    pub seed: u64,
    /// Default model family
    pub model: ModelSpec,
    /// Per-horizon family overrides
    pub horizon_models: BTreeMap<usize, ModelSpec>,
    /// Families fitted alongside for comparison metrics only
    pub comparison_models: Vec<ModelSpec>,
    /// Worker-pool size for horizons (0 = available cores)
    pub max_parallel: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            min_samples: 30,
            test_ratio: 0.2,
            seed: 42,
            model: ModelSpec::default(),
            horizon_models: BTreeMap::new(),
            comparison_models: Vec::new(),
            max_parallel: 0,
        }
    }
}

/// A trained horizon.
#[derive(Debug, Clone)]
pub struct HorizonModel {
    /// Horizon in trading days
    pub horizon: usize,
    /// Fitted primary model
    pub model: FittedModel,
    /// Evaluation of the primary model
    pub metrics: EvaluationMetrics,
    /// Document ids used for training
    pub train_ids: Vec<String>,
    /// Document ids held out
    pub test_ids: Vec<String>,
}

/// Fits one model per horizon.
#[derive(Debug, Clone, Default)]
pub struct MultiHorizonTrainer {
    config: TrainerConfig,
}

impl MultiHorizonTrainer {
    /// Create a trainer.
    pub const fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    /// Trainer settings.
    pub const fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Model spec in force for a horizon.
    pub fn spec_for(&self, horizon: usize) -> ModelSpec {
        self.config
            .horizon_models
            .get(&horizon)
            .copied()
            .unwrap_or(self.config.model)
    }

    /// Minimum rows a horizon needs before it can be trained.
    pub fn required_samples(&self) -> usize {
        let floor = if self.config.test_ratio > 0.0 { 2 } else { 1 };
        self.config.min_samples.max(floor)
    }

    /// Train and evaluate a single horizon.
    ///
    /// # Errors
    /// [`ModelError::InsufficientData`] if the dataset is below the sample
    /// threshold; fitting errors otherwise.
    pub fn train_horizon(&self, dataset: &HorizonDataset) -> Result<HorizonModel> {
        let required = self.required_samples();
        if dataset.len() < required {
            return Err(ModelError::InsufficientData {
                horizon: dataset.horizon,
                required,
                actual: dataset.len(),
            });
        }

        let split = train_test_split(&dataset.document_ids, self.config.test_ratio, self.config.seed)?;
        if !split.is_held_out() {
            warn!(
                horizon = dataset.horizon,
                test_ratio = self.config.test_ratio,
                "no held-out rows, metrics are in-sample"
            );
        }
        let spec = self.spec_for(dataset.horizon);
        let (model, mut metrics) = fit_and_evaluate(&spec, dataset, &split)?;

        for comparison in &self.config.comparison_models {
            if comparison.family() == spec.family() {
                continue;
            }
            let (_, other) = fit_and_evaluate(comparison, dataset, &split)?;
            metrics
                .comparison
                .insert(comparison.family().name().to_string(), other.r2);
        }

        info!(
            horizon = dataset.horizon,
            family = %spec.family(),
            n_train = metrics.n_train,
            n_test = metrics.n_test,
            r2 = metrics.r2,
            "horizon trained"
        );

        let ids = |rows: &[usize]| -> Vec<String> {
            rows.iter()
                .map(|&i| dataset.document_ids[i].clone())
                .collect()
        };
        Ok(HorizonModel {
            horizon: dataset.horizon,
            model,
            metrics,
            train_ids: ids(&split.train),
            test_ids: ids(&split.test),
        })
    }

    /// Train every horizon in a bounded worker pool.
    ///
    /// Failures are returned per horizon; one horizon failing never stops
    /// the others. Results are keyed by horizon.
    pub fn train_all(&self, datasets: &[HorizonDataset]) -> Result<BTreeMap<usize, Result<HorizonModel>>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_parallel)
            .build()
            .map_err(|e| ModelError::InvalidParameter(format!("worker pool: {}", e)))?;

        let outcomes: Vec<(usize, Result<HorizonModel>)> = pool.install(|| {
            datasets
                .par_iter()
                .map(|dataset| (dataset.horizon, self.train_horizon(dataset)))
                .collect()
        });

        for (horizon, outcome) in &outcomes {
            if let Err(e) = outcome {
                warn!(horizon, error = %e, "horizon skipped");
            }
        }
        Ok(outcomes.into_iter().collect())
    }
}

fn fit_and_evaluate(
    spec: &ModelSpec,
    dataset: &HorizonDataset,
    split: &TrainTestSplit,
) -> Result<(FittedModel, EvaluationMetrics)> {
    let x_train = dataset.features.select(Axis(0), &split.train);
    let y_train = dataset.labels.select(Axis(0), &split.train);
    let model = spec.fit(x_train.view(), y_train.view())?;

    let rows = split.evaluation_rows();
    let x_eval = dataset.features.select(Axis(0), rows);
    let y_eval = dataset.labels.select(Axis(0), rows);
    let predicted = model.predict_batch(x_eval.view());

    let metrics = EvaluationMetrics {
        r2: r2_score(y_eval.view(), predicted.view()),
        mse: mean_squared_error(y_eval.view(), predicted.view()),
        mae: mean_absolute_error(y_eval.view(), predicted.view()),
        n_train: split.train.len(),
        n_test: split.test.len(),
        out_of_sample: split.is_held_out(),
        ..EvaluationMetrics::default()
    };
    Ok((model, metrics))
}
