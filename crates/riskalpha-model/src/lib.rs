#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/riskalpha/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod forest;
pub mod linalg;
pub mod metrics;
pub mod predictor;
pub mod ridge;
pub mod split;
pub mod trainer;

pub use error::{ModelError, Result};
pub use forest::{DEFAULT_FOREST_SEED, ForestParams, RandomForestModel};
pub use metrics::{EvaluationMetrics, pearson_correlation, r2_score};
pub use predictor::{FittedModel, ModelFamily, ModelSpec, Predictor};
pub use ridge::{RidgeModel, RidgeParams};
pub use split::{TrainTestSplit, train_test_split};
pub use trainer::{HorizonDataset, HorizonModel, MultiHorizonTrainer, TrainerConfig};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
