//! Trainer behavior across model families.

use approx::assert_relative_eq;
use ndarray::{Array1, Array2};
use riskalpha_model::{
    ForestParams, HorizonDataset, ModelSpec, MultiHorizonTrainer, Predictor, RidgeParams,
    TrainerConfig,
};
use rstest::rstest;

/// Sparse "term" features where term 0 lifts alpha and term 1 depresses it.
fn term_dataset(horizon: usize, n: usize) -> HorizonDataset {
    let mut features = Array2::zeros((n, 4));
    let mut labels = Array1::zeros(n);
    for i in 0..n {
        let positive = i % 3 == 0;
        let negative = i % 3 == 1;
        if positive {
            features[[i, 0]] = 1.0;
        }
        if negative {
            features[[i, 1]] = 1.0;
        }
        features[[i, 2]] = 0.5;
        features[[i, 3]] = (i % 2) as f64;
        labels[i] = match (positive, negative) {
            (true, _) => 0.04,
            (_, true) => -0.04,
            _ => 0.0,
        };
    }
    let ids = (0..n).map(|i| format!("acc-{:03}", i)).collect();
    HorizonDataset::new(horizon, ids, features, labels).unwrap()
}

#[rstest]
#[case::ridge(ModelSpec::Ridge(RidgeParams { alpha: 0.1 }))]
#[case::forest(ModelSpec::RandomForest(ForestParams { n_trees: 25, ..ForestParams::default() }))]
fn test_importance_signs_follow_labels(#[case] spec: ModelSpec) {
    let trainer = MultiHorizonTrainer::new(TrainerConfig {
        min_samples: 10,
        model: spec,
        ..TrainerConfig::default()
    });
    let trained = trainer.train_horizon(&term_dataset(5, 30)).unwrap();
    let importances = trained.model.importances();

    assert_eq!(importances.len(), 4);
    assert!(importances[0] > 0.0);
    assert!(importances[1] < 0.0);
    assert!(trained.metrics.r2 > 0.5);
}

#[test]
fn test_training_is_reproducible() {
    let config = TrainerConfig {
        min_samples: 10,
        model: ModelSpec::RandomForest(ForestParams {
            n_trees: 10,
            max_features: Some(2),
            ..ForestParams::default()
        }),
        max_parallel: 3,
        ..TrainerConfig::default()
    };
    let datasets = [term_dataset(1, 30), term_dataset(5, 24)];

    let first = MultiHorizonTrainer::new(config.clone()).train_all(&datasets).unwrap();
    let second = MultiHorizonTrainer::new(config).train_all(&datasets).unwrap();

    for horizon in [1, 5] {
        let a = first[&horizon].as_ref().unwrap();
        let b = second[&horizon].as_ref().unwrap();
        assert_eq!(a.model, b.model);
        assert_eq!(a.metrics, b.metrics);
        assert_eq!(a.test_ids, b.test_ids);
    }
}

#[test]
fn test_in_sample_evaluation_when_nothing_held_out() {
    let trainer = MultiHorizonTrainer::new(TrainerConfig {
        min_samples: 3,
        test_ratio: 0.0,
        ..TrainerConfig::default()
    });
    let trained = trainer.train_horizon(&term_dataset(1, 3)).unwrap();
    assert!(!trained.metrics.out_of_sample);
    assert_eq!(trained.metrics.n_test, 0);
    assert_eq!(trained.metrics.n_train, 3);
    assert!(trained.test_ids.is_empty());
    assert_relative_eq!(
        trained.model.predict(&[1.0, 0.0, 0.5, 0.0]) - trained.model.predict(&[0.0, 1.0, 0.5, 1.0]),
        trained.model.importances()[0] - trained.model.importances()[1] - trained.model.importances()[3],
        epsilon = 1e-12
    );
}
