//! Seeded train/test partitioning of documents.

use crate::error::{ModelError, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Row positions assigned to training and evaluation.
///
/// The two sets are disjoint. With a zero test ratio `test` is empty and
/// evaluation falls back to the training rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainTestSplit {
    /// Training row positions, ascending
    pub train: Vec<usize>,
    /// Held-out row positions, ascending
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    /// Whether metrics on this split are out-of-sample.
    pub fn is_held_out(&self) -> bool {
        !self.test.is_empty()
    }

    /// Rows to evaluate on: the held-out rows, or the training rows when
    /// nothing was held out.
    pub fn evaluation_rows(&self) -> &[usize] {
        if self.test.is_empty() {
            &self.train
        } else {
            &self.test
        }
    }
}

/// Number of rows held out for `n` samples.
///
/// `round(n * ratio)`, at least one when the ratio is positive, and never so
/// many that training is left empty.
pub fn test_size(n: usize, test_ratio: f64) -> usize {
    if test_ratio <= 0.0 || n < 2 {
        return 0;
    }
    let size = (n as f64 * test_ratio).round() as usize;
    size.clamp(1, n - 1)
}

/// Partition `ids` into train and test sets.
///
/// Rows are ordered by id, shuffled with a `seed`-initialized RNG, and the
/// last [`test_size`] rows are held out, so the split depends only on the set
/// of ids and the seed.
pub fn train_test_split<S: AsRef<str>>(ids: &[S], test_ratio: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(0.0..1.0).contains(&test_ratio) {
        return Err(ModelError::InvalidParameter(format!(
            "test_ratio must lie in [0, 1), got {}",
            test_ratio
        )));
    }

    let mut order: Vec<usize> = (0..ids.len()).collect();
    order.sort_by(|&a, &b| ids[a].as_ref().cmp(ids[b].as_ref()));
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let n_test = test_size(ids.len(), test_ratio);
    let mut test = order.split_off(order.len() - n_test);
    let mut train = order;
    train.sort_unstable();
    test.sort_unstable();
    Ok(TrainTestSplit { train, test })
}
