//! Feature matrices keyed by document id.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use std::collections::HashMap;

/// Dense TF-IDF features, one row per document, one column per vocabulary term.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    document_ids: Vec<String>,
    index: HashMap<String, usize>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    pub(crate) fn from_rows(document_ids: Vec<String>, rows: Vec<Vec<f64>>, width: usize) -> Self {
        let mut values = Array2::zeros((rows.len(), width));
        for (mut target, row) in values.axis_iter_mut(Axis(0)).zip(rows) {
            target.assign(&Array1::from(row));
        }
        let index = document_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        Self {
            document_ids,
            index,
            values,
        }
    }

    /// Number of documents.
    pub fn n_documents(&self) -> usize {
        self.values.nrows()
    }

    /// Feature-vector length (vocabulary cardinality).
    pub fn dimension(&self) -> usize {
        self.values.ncols()
    }

    /// Document ids in row order.
    pub fn document_ids(&self) -> &[String] {
        &self.document_ids
    }

    /// All features.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Feature vector of one document.
    pub fn row(&self, document_id: &str) -> Option<ArrayView1<'_, f64>> {
        self.index
            .get(document_id)
            .map(|&i| self.values.row(i))
    }

    /// Gather the rows of `document_ids`, in that order.
    ///
    /// Returns `None` if any id is unknown.
    pub fn select(&self, document_ids: &[String]) -> Option<Array2<f64>> {
        let positions = document_ids
            .iter()
            .map(|id| self.index.get(id).copied())
            .collect::<Option<Vec<_>>>()?;
        Some(self.values.select(Axis(0), &positions))
    }
}
