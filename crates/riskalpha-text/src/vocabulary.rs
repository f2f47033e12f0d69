//! Frozen vocabulary and document transformation.

use crate::clean::clean;
use crate::error::{Result, TextError};
use crate::features::FeatureMatrix;
use crate::vectorizer::{TextOptions, count_terms, l2_normalize};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VocabularyState {
    terms: Vec<String>,
    idf: Vec<f64>,
    options: TextOptions,
    n_documents: usize,
}

/// Ordered set of terms with their IDF weights.
///
/// Fitted once per run and never refit; shared immutably across horizons.
/// Position `i` of every feature vector corresponds to `terms()[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VocabularyState", into = "VocabularyState")]
pub struct Vocabulary {
    terms: Vec<String>,
    idf: Vec<f64>,
    options: TextOptions,
    n_documents: usize,
    index: HashMap<String, usize>,
}

impl TryFrom<VocabularyState> for Vocabulary {
    type Error = TextError;

    fn try_from(state: VocabularyState) -> Result<Self> {
        Self::new(state.terms, state.idf, state.options, state.n_documents)
    }
}

impl From<Vocabulary> for VocabularyState {
    fn from(vocabulary: Vocabulary) -> Self {
        Self {
            terms: vocabulary.terms,
            idf: vocabulary.idf,
            options: vocabulary.options,
            n_documents: vocabulary.n_documents,
        }
    }
}

impl Vocabulary {
    /// Assemble a vocabulary from terms and matching IDF weights.
    ///
    /// # Errors
    /// [`TextError::DimensionMismatch`] if the arrays differ in length,
    /// [`TextError::EmptyVocabulary`] if there are no terms.
    pub fn new(
        terms: Vec<String>,
        idf: Vec<f64>,
        options: TextOptions,
        n_documents: usize,
    ) -> Result<Self> {
        if terms.len() != idf.len() {
            return Err(TextError::DimensionMismatch {
                expected: terms.len(),
                actual: idf.len(),
            });
        }
        if terms.is_empty() {
            return Err(TextError::EmptyVocabulary("vocabulary has no terms".to_string()));
        }
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();
        Ok(Self {
            terms,
            idf,
            options,
            n_documents,
            index,
        })
    }

    /// Number of terms, which is also the feature-vector length.
    pub const fn len(&self) -> usize {
        self.terms.len()
    }

    /// Always false for a constructed vocabulary.
    pub const fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms in feature order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// IDF weights in feature order.
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Term at a feature position.
    pub fn term(&self, position: usize) -> Option<&str> {
        self.terms.get(position).map(String::as_str)
    }

    /// Feature position of a term.
    pub fn position(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    /// Options the vocabulary was fitted with.
    pub const fn options(&self) -> &TextOptions {
        &self.options
    }

    /// Number of documents seen during fitting.
    pub const fn n_documents(&self) -> usize {
        self.n_documents
    }

    /// Vectorize raw text, cleaning it first.
    pub fn transform(&self, raw: &str) -> Vec<f64> {
        self.transform_cleaned(&clean(raw))
    }

    /// Vectorize text that has already been through [`clean`].
    pub fn transform_cleaned(&self, cleaned: &str) -> Vec<f64> {
        let mut vector = vec![0.0; self.len()];
        for (term, count) in count_terms(cleaned, self.options.ngram_max) {
            if let Some(i) = self.position(&term) {
                vector[i] = self.options.term_weight(count) * self.idf[i];
            }
        }
        if self.options.normalize {
            l2_normalize(&mut vector);
        }
        vector
    }

    /// Vectorize many cleaned documents in parallel.
    ///
    /// Rows follow the order of `documents` regardless of scheduling.
    pub fn transform_batch<I, S>(&self, documents: &[(I, S)]) -> FeatureMatrix
    where
        I: AsRef<str> + Sync,
        S: AsRef<str> + Sync,
    {
        let rows: Vec<Vec<f64>> = documents
            .par_iter()
            .map(|(_, text)| self.transform_cleaned(text.as_ref()))
            .collect();
        let ids = documents
            .iter()
            .map(|(id, _)| id.as_ref().to_string())
            .collect();
        FeatureMatrix::from_rows(ids, rows, self.len())
    }
}
