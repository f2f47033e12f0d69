//! The predictor capability and model-family selection.

use crate::error::Result;
use crate::forest::{ForestParams, RandomForestModel};
use crate::ridge::{RidgeModel, RidgeParams};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Model family identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Ridge regression
    Ridge,
    /// Random forest regression
    RandomForest,
}

impl ModelFamily {
    /// Stable lowercase name used in metric keys and file names.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ridge => "ridge",
            Self::RandomForest => "random_forest",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fitted model mapping a feature vector to predicted alpha.
pub trait Predictor {
    /// Family of the fitted model.
    fn family(&self) -> ModelFamily;

    /// Feature-vector length the model was fitted on.
    fn n_features(&self) -> usize;

    /// Predict a single document.
    fn predict(&self, features: &[f64]) -> f64;

    /// Predict every row of `features`.
    fn predict_batch(&self, features: ArrayView2<'_, f64>) -> Array1<f64> {
        features
            .rows()
            .into_iter()
            .map(|row| predict_view(self, row))
            .collect()
    }

    /// Signed importance per feature, comparable in sign and relative
    /// magnitude within one model.
    fn importances(&self) -> Vec<f64>;
}

fn predict_view<P: Predictor + ?Sized>(model: &P, row: ArrayView1<'_, f64>) -> f64 {
    match row.as_slice() {
        Some(slice) => model.predict(slice),
        None => model.predict(&row.to_vec()),
    }
}

/// Model family and hyperparameters, chosen by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ModelSpec {
    /// Ridge regression
    Ridge(RidgeParams),
    /// Random forest regression
    RandomForest(ForestParams),
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self::Ridge(RidgeParams::default())
    }
}

impl ModelSpec {
    /// Family this spec fits.
    pub const fn family(&self) -> ModelFamily {
        match self {
            Self::Ridge(_) => ModelFamily::Ridge,
            Self::RandomForest(_) => ModelFamily::RandomForest,
        }
    }

    /// Check hyperparameter ranges.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Ridge(params) => params.validate(),
            Self::RandomForest(params) => params.validate(),
        }
    }

    /// Give a stochastic model the run seed unless it carries its own.
    #[must_use]
    pub const fn seeded(self, seed: u64) -> Self {
        match self {
            Self::Ridge(_) => self,
            Self::RandomForest(params) => Self::RandomForest(params.or_seed(seed)),
        }
    }

    /// Fit the model on rows of `features` against `labels`.
    pub fn fit(
        &self,
        features: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, f64>,
    ) -> Result<FittedModel> {
        Ok(match self {
            Self::Ridge(params) => FittedModel::Ridge(RidgeModel::fit(features, labels, *params)?),
            Self::RandomForest(params) => {
                FittedModel::RandomForest(RandomForestModel::fit(features, labels, *params)?)
            }
        })
    }
}

/// A fitted model of any family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum FittedModel {
    /// Fitted ridge model
    Ridge(RidgeModel),
    /// Fitted random forest
    RandomForest(RandomForestModel),
}

impl FittedModel {
    fn inner(&self) -> &dyn Predictor {
        match self {
            Self::Ridge(model) => model,
            Self::RandomForest(model) => model,
        }
    }
}

impl Predictor for FittedModel {
    fn family(&self) -> ModelFamily {
        self.inner().family()
    }

    fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    fn predict(&self, features: &[f64]) -> f64 {
        self.inner().predict(features)
    }

    fn importances(&self) -> Vec<f64> {
        self.inner().importances()
    }
}
