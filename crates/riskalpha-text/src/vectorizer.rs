//! TF-IDF vocabulary fitting.

use crate::clean::{terms, tokenize};
use crate::error::{Result, TextError};
use crate::vocabulary::Vocabulary;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Tokenization and weighting options shared by fit and transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    /// Longest n-gram to extract (1 = unigrams only)
    pub ngram_max: usize,
    /// Minimum document frequency as a fraction of documents
    pub min_df: f64,
    /// Maximum document frequency as a fraction of documents
    pub max_df: f64,
    /// Replace raw term counts with `1 + ln(count)`
    pub sublinear_tf: bool,
    /// L2-normalize each document vector
    pub normalize: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            ngram_max: 1,
            min_df: 0.0,
            max_df: 1.0,
            sublinear_tf: false,
            normalize: true,
        }
    }
}

impl TextOptions {
    /// Check option consistency.
    pub fn validate(&self) -> Result<()> {
        if self.ngram_max == 0 {
            return Err(TextError::InvalidConfig("ngram_max must be >= 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.min_df) || !(0.0..=1.0).contains(&self.max_df) {
            return Err(TextError::InvalidConfig(format!(
                "document frequency bounds must lie in [0, 1], got min_df={} max_df={}",
                self.min_df, self.max_df
            )));
        }
        if self.min_df > self.max_df {
            return Err(TextError::InvalidConfig(format!(
                "min_df ({}) exceeds max_df ({})",
                self.min_df, self.max_df
            )));
        }
        Ok(())
    }

    pub(crate) fn term_weight(&self, count: f64) -> f64 {
        if self.sublinear_tf && count > 0.0 {
            1.0 + count.ln()
        } else {
            count
        }
    }
}

/// Smoothed inverse document frequency.
pub fn smoothed_idf(n_documents: usize, document_frequency: usize) -> f64 {
    ((1.0 + n_documents as f64) / (1.0 + document_frequency as f64)).ln() + 1.0
}

/// Scale `values` to unit L2 norm in place. All-zero input is left untouched.
pub(crate) fn l2_normalize(values: &mut [f64]) {
    let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        values.iter_mut().for_each(|v| *v /= norm);
    }
}

/// Term counts of one cleaned document. Ordered so that float sums never
/// depend on hash iteration order.
pub(crate) fn count_terms(cleaned: &str, ngram_max: usize) -> BTreeMap<String, f64> {
    let tokens = tokenize(cleaned);
    let mut counts = BTreeMap::new();
    for term in terms(&tokens, ngram_max) {
        *counts.entry(term).or_insert(0.0) += 1.0;
    }
    counts
}

/// Fits a fixed-size TF-IDF [`Vocabulary`] over a corpus of cleaned texts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TfidfVectorizer {
    vocabulary_size: usize,
    options: TextOptions,
}

impl TfidfVectorizer {
    /// Create a vectorizer retaining at most `vocabulary_size` terms.
    pub const fn new(vocabulary_size: usize, options: TextOptions) -> Self {
        Self {
            vocabulary_size,
            options,
        }
    }

    /// Configured vocabulary size.
    pub const fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }

    /// Tokenization and weighting options.
    pub const fn options(&self) -> &TextOptions {
        &self.options
    }

    /// Fit the vocabulary.
    ///
    /// Candidate terms pass the document-frequency bounds; each is scored by
    /// its TF-IDF weight summed over all documents. The top
    /// `vocabulary_size` candidates by score are kept (ties by term order)
    /// and stored in lexicographic order.
    ///
    /// # Errors
    /// Returns [`TextError::EmptyVocabulary`] if no term survives, and
    /// [`TextError::InvalidConfig`] for a zero size or inconsistent options.
    pub fn fit<S: AsRef<str> + Sync>(&self, cleaned: &[S]) -> Result<Vocabulary> {
        if self.vocabulary_size == 0 {
            return Err(TextError::InvalidConfig(
                "vocabulary_size must be >= 1".to_string(),
            ));
        }
        self.options.validate()?;

        let n = cleaned.len();
        if n == 0 {
            return Err(TextError::EmptyVocabulary("no documents to fit".to_string()));
        }

        let counts: Vec<BTreeMap<String, f64>> = cleaned
            .par_iter()
            .map(|text| count_terms(text.as_ref(), self.options.ngram_max))
            .collect();

        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in &counts {
            for term in doc.keys() {
                *document_frequency.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let min_docs = self.options.min_df * n as f64;
        let max_docs = self.options.max_df * n as f64;
        let idf: BTreeMap<&str, f64> = document_frequency
            .iter()
            .filter(|&(_, &df)| df as f64 >= min_docs && df as f64 <= max_docs)
            .map(|(&term, &df)| (term, smoothed_idf(n, df)))
            .collect();

        if idf.is_empty() {
            return Err(TextError::EmptyVocabulary(format!(
                "no terms survive cleaning and document-frequency bounds across {} documents",
                n
            )));
        }

        let mut scores: BTreeMap<&str, f64> = BTreeMap::new();
        for doc in &counts {
            let mut weights: Vec<(&str, f64)> = doc
                .iter()
                .filter_map(|(term, &count)| {
                    idf.get(term.as_str())
                        .map(|&w| (term.as_str(), self.options.term_weight(count) * w))
                })
                .collect();
            if self.options.normalize {
                let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    weights.iter_mut().for_each(|(_, w)| *w /= norm);
                }
            }
            for (term, w) in weights {
                *scores.entry(term).or_insert(0.0) += w;
            }
        }

        let mut ranked: Vec<(&str, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.vocabulary_size);

        let mut selected: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        selected.sort_unstable();

        let weights: Vec<f64> = selected.iter().map(|term| idf[term]).collect();
        let terms: Vec<String> = selected.into_iter().map(str::to_string).collect();

        info!(
            documents = n,
            candidates = idf.len(),
            vocabulary = terms.len(),
            requested = self.vocabulary_size,
            "vocabulary fitted"
        );

        Vocabulary::new(terms, weights, self.options, n)
    }
}
