//! Market-adjusted excess returns ("alpha") per document and horizon.
//!
//! For a disclosure aligned to trading day `t` and a horizon of `k` trading days:
//!
//! ```text
//! R(t, t+k)  = price(t+k) / price(t) - 1
//! alpha      = R_entity(t, t+k) - R_benchmark(t, t+k)
//! ```
//!
//! `t+k` is the k-th subsequent trading day present in each series. Entity and
//! benchmark are aligned independently since their trading calendars may differ.
//! Each horizon is computed from raw prices; nothing is derived from a shorter
//! horizon.

use crate::document::{Document, DocumentId};
use crate::error::{DataError, Result};
use crate::prices::{AlignmentRule, PriceSeries};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Simple return between two prices.
pub fn simple_return(start_price: f64, end_price: f64) -> f64 {
    end_price / start_price - 1.0
}

/// Forward simple return of `series` over `horizon` trading days from `date`.
///
/// # Errors
/// Returns [`DataError::MissingPriceData`] if the date cannot be aligned or
/// fewer than `horizon` trading days follow it.
pub fn forward_return(
    series: &PriceSeries,
    date: NaiveDate,
    horizon: usize,
    rule: AlignmentRule,
) -> Result<f64> {
    let missing = |reason: String| DataError::MissingPriceData {
        entity: series.entity().to_string(),
        date,
        horizon,
        reason,
    };

    let start = series
        .align(date, rule)
        .ok_or_else(|| missing("disclosure date not found in series".to_string()))?;

    let end = start.checked_add(horizon).and_then(|i| series.get(i)).ok_or_else(|| {
        missing(format!(
            "only {} trading days after disclosure",
            series.len() - start - 1
        ))
    })?;

    let base = series.points()[start].price;
    Ok(simple_return(base, end.price))
}

/// Excess return of an entity over the benchmark for one horizon.
///
/// # Errors
/// Returns [`DataError::MissingPriceData`] if either series lacks the required prices.
pub fn compute_alpha(
    entity: &PriceSeries,
    benchmark: &PriceSeries,
    date: NaiveDate,
    horizon: usize,
    rule: AlignmentRule,
) -> Result<f64> {
    let entity_return = forward_return(entity, date, horizon, rule)?;
    let benchmark_return = forward_return(benchmark, date, horizon, rule)?;
    Ok(entity_return - benchmark_return)
}

/// A defined excess-return label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaLabel {
    /// Labeled document
    pub document_id: DocumentId,
    /// Horizon in trading days
    pub horizon: usize,
    /// Market-adjusted excess return
    pub value: f64,
}

/// Why a (document, horizon) pair has no label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelExclusion {
    /// Excluded document
    pub document_id: DocumentId,
    /// Horizon in trading days
    pub horizon: usize,
    /// Human-readable cause
    pub reason: String,
}

/// Labels for every document and horizon of a run.
///
/// Undefined labels are absent from `labels` and recorded in `exclusions`;
/// they are never defaulted to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelTable {
    horizons: Vec<usize>,
    labels: BTreeMap<usize, BTreeMap<DocumentId, f64>>,
    exclusions: BTreeMap<usize, Vec<LabelExclusion>>,
}

impl LabelTable {
    /// Configured horizons in order.
    pub fn horizons(&self) -> &[usize] {
        &self.horizons
    }

    /// Defined labels for a horizon, ordered by document id.
    pub fn defined(&self, horizon: usize) -> Vec<AlphaLabel> {
        self.labels
            .get(&horizon)
            .map(|by_doc| {
                by_doc
                    .iter()
                    .map(|(id, &value)| AlphaLabel {
                        document_id: id.clone(),
                        horizon,
                        value,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Label value for a document and horizon, if defined.
    pub fn get(&self, document_id: &str, horizon: usize) -> Option<f64> {
        self.labels.get(&horizon)?.get(document_id).copied()
    }

    /// Number of defined labels for a horizon.
    pub fn defined_count(&self, horizon: usize) -> usize {
        self.labels.get(&horizon).map_or(0, BTreeMap::len)
    }

    /// Exclusions recorded for a horizon.
    pub fn exclusions(&self, horizon: usize) -> &[LabelExclusion] {
        self.exclusions
            .get(&horizon)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the document has a defined label for at least one horizon.
    pub fn has_any_label(&self, document_id: &str) -> bool {
        self.labels
            .values()
            .any(|by_doc| by_doc.contains_key(document_id))
    }

    /// Drop every label and exclusion belonging to documents not in `keep`.
    pub fn retain_documents(&mut self, keep: impl Fn(&str) -> bool) {
        for by_doc in self.labels.values_mut() {
            by_doc.retain(|id, _| keep(id));
        }
        for excluded in self.exclusions.values_mut() {
            excluded.retain(|e| keep(&e.document_id));
        }
    }
}

/// Computes labels across documents and horizons.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphaCalculator {
    rule: AlignmentRule,
}

impl AlphaCalculator {
    /// Create a calculator using the given alignment rule.
    pub const fn new(rule: AlignmentRule) -> Self {
        Self { rule }
    }

    /// Alignment rule in use.
    pub const fn rule(&self) -> AlignmentRule {
        self.rule
    }

    /// Label one document for one horizon.
    ///
    /// # Errors
    /// Returns [`DataError::MissingPriceData`] if the label is undefined.
    pub fn label(
        &self,
        document: &Document,
        entity: &PriceSeries,
        benchmark: &PriceSeries,
        horizon: usize,
    ) -> Result<AlphaLabel> {
        let value = compute_alpha(entity, benchmark, document.date, horizon, self.rule)?;
        Ok(AlphaLabel {
            document_id: document.id.clone(),
            horizon,
            value,
        })
    }

    /// Label every document for every horizon.
    ///
    /// Documents are processed in parallel; results are keyed by document id so
    /// the table is identical regardless of scheduling. A document whose entity
    /// has no price series is excluded for every horizon.
    pub fn label_all(
        &self,
        documents: &[Document],
        prices: &HashMap<String, PriceSeries>,
        benchmark: &PriceSeries,
        horizons: &[usize],
    ) -> LabelTable {
        let per_document: Vec<(DocumentId, Vec<(usize, Result<f64>)>)> = documents
            .par_iter()
            .map(|doc| {
                let outcomes = horizons
                    .iter()
                    .map(|&horizon| {
                        let outcome = prices.get(&doc.entity).map_or_else(
                            || {
                                Err(DataError::MissingPriceData {
                                    entity: doc.entity.clone(),
                                    date: doc.date,
                                    horizon,
                                    reason: "no price series for entity".to_string(),
                                })
                            },
                            |series| {
                                compute_alpha(series, benchmark, doc.date, horizon, self.rule)
                            },
                        );
                        (horizon, outcome)
                    })
                    .collect();
                (doc.id.clone(), outcomes)
            })
            .collect();

        let mut table = LabelTable {
            horizons: horizons.to_vec(),
            labels: horizons.iter().map(|&h| (h, BTreeMap::new())).collect(),
            exclusions: horizons.iter().map(|&h| (h, Vec::new())).collect(),
        };

        for (document_id, outcomes) in per_document {
            for (horizon, outcome) in outcomes {
                match outcome {
                    Ok(value) => {
                        table
                            .labels
                            .entry(horizon)
                            .or_default()
                            .insert(document_id.clone(), value);
                    }
                    Err(e) => {
                        debug!(document = %document_id, horizon, error = %e, "label undefined");
                        table
                            .exclusions
                            .entry(horizon)
                            .or_default()
                            .push(LabelExclusion {
                                document_id: document_id.clone(),
                                horizon,
                                reason: e.to_string(),
                            });
                    }
                }
            }
        }

        for excluded in table.exclusions.values_mut() {
            excluded.sort_by(|a, b| a.document_id.cmp(&b.document_id));
        }

        table
    }
}
