//! Pipeline orchestration.
//!
//! Stages run strictly forward: load, filter, label, fit the vocabulary once,
//! vectorize, train every horizon, attribute. Only a corpus-level load failure
//! or an empty vocabulary aborts the run; everything per document or per
//! horizon is recorded in the output instead.

use crate::artifacts::ArtifactStore;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::filter::{CleanedDocument, DocumentFilter, ExclusionReason, FilterOutcome};
use ndarray::Array1;
use rayon::prelude::*;
use riskalpha_data::{AlphaCalculator, Corpus, CorpusStore, Document, LabelTable};
use riskalpha_model::{
    FittedModel, HorizonDataset, HorizonModel, MultiHorizonTrainer, Predictor, pearson_correlation,
};
use riskalpha_output::{
    AttributionReport, CorpusCounts, HorizonMetrics, MetricsSummary, RunReport, TermImpact,
    impact_table,
};
use riskalpha_text::{FeatureMatrix, TextError, TfidfVectorizer, Vocabulary};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Diagnostic metric: correlation of log raw-text length with alpha.
pub const TEXT_LENGTH_CORR: &str = "text_length_corr";

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Vocabulary shared by every horizon
    pub vocabulary: Arc<Vocabulary>,
    /// Labels of the valid corpus
    pub labels: LabelTable,
    /// Excluded document ids per reason
    pub excluded: BTreeMap<ExclusionReason, Vec<String>>,
    /// Trained horizons
    pub models: BTreeMap<usize, HorizonModel>,
    /// Attribution report per trained horizon
    pub reports: BTreeMap<usize, AttributionReport>,
    /// Full term impact table per trained horizon
    pub impacts: BTreeMap<usize, Vec<TermImpact>>,
    /// Status and metrics of every configured horizon
    pub summary: MetricsSummary,
    /// Run report
    pub report: RunReport,
}

impl PipelineOutput {
    /// Attribution report of a horizon, if it was trained.
    pub fn attribution(&self, horizon: usize) -> Option<&AttributionReport> {
        self.reports.get(&horizon)
    }

    /// Predict alpha for new raw text with a trained horizon's model.
    ///
    /// # Errors
    /// [`PipelineError::ArtifactNotFound`] if the horizon has no model.
    pub fn predict(&self, horizon: usize, raw_text: &str) -> Result<f64> {
        let trained = self
            .models
            .get(&horizon)
            .ok_or_else(|| PipelineError::ArtifactNotFound(format!("model for T+{}", horizon)))?;
        predict_text(&self.vocabulary, &trained.model, raw_text)
    }

    /// Write every artifact of the run.
    ///
    /// Per-horizon files left in the directory by an earlier run for a
    /// horizon this run did not train are removed first.
    pub fn persist(&self, store: &ArtifactStore) -> Result<()> {
        store.prune_horizons(&self.models.keys().copied().collect())?;
        store.save_vocabulary(&self.vocabulary)?;
        for (horizon, trained) in &self.models {
            store.save_model(*horizon, &trained.model)?;
        }
        for report in self.reports.values() {
            store.save_attribution(report)?;
        }
        for (horizon, impacts) in &self.impacts {
            store.save_impacts(*horizon, impacts)?;
        }
        store.save_metrics(&self.summary)?;
        store.save_report(&self.report)?;
        info!(dir = %store.dir().display(), "artifacts written");
        Ok(())
    }
}

/// Score raw text with a vocabulary and a model fitted on it.
///
/// # Errors
/// [`PipelineError::Text`] if the model was fitted on a different feature length.
pub fn predict_text(vocabulary: &Vocabulary, model: &FittedModel, raw_text: &str) -> Result<f64> {
    if model.n_features() != vocabulary.len() {
        return Err(TextError::DimensionMismatch {
            expected: vocabulary.len(),
            actual: model.n_features(),
        }
        .into());
    }
    Ok(model.predict(&vocabulary.transform(raw_text)))
}

/// Runs the full analysis over one corpus.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline from a validated copy of `config`.
    ///
    /// # Errors
    /// [`PipelineError::Config`] if the configuration is invalid.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Ok(Self {
            config: config.validated()?,
        })
    }

    /// Effective configuration.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage over the documents and prices of `store`.
    ///
    /// # Errors
    /// [`PipelineError::CorpusLoadFailure`] if the corpus or benchmark cannot be
    /// loaded and [`PipelineError::VectorizationFailure`] if no vocabulary can be
    /// fitted. Skipped horizons are not errors.
    pub fn run(&self, store: &dyn CorpusStore) -> Result<PipelineOutput> {
        let corpus = Corpus::load(store)?;
        let loaded = corpus.documents().len();

        let mut outcome = self.filter(&corpus);
        let calculator = AlphaCalculator::new(self.config.alignment);
        let candidates: Vec<Document> = outcome.valid.iter().map(|c| c.document.clone()).collect();
        let mut labels = calculator.label_all(
            &candidates,
            corpus.prices(),
            corpus.benchmark(),
            &self.config.horizons,
        );

        let (labeled, unlabeled): (Vec<_>, Vec<_>) = std::mem::take(&mut outcome.valid)
            .into_iter()
            .partition(|c| labels.has_any_label(&c.document.id));
        for doc in unlabeled {
            debug!(document = %doc.document.id, "no defined label for any horizon");
            outcome.exclude(ExclusionReason::NoDefinedLabel, doc.document.id.clone());
        }
        outcome.valid = labeled;
        let valid = &outcome.valid;
        labels.retain_documents(|id| {
            valid
                .binary_search_by(|c| c.document.id.as_str().cmp(id))
                .is_ok()
        });

        if outcome.excluded_total() > 0 {
            warn!(
                excluded = outcome.excluded_total(),
                valid = outcome.valid.len(),
                "documents excluded from the corpus"
            );
        }
        if outcome.valid.is_empty() {
            return Err(PipelineError::VectorizationFailure(format!(
                "no valid documents remain out of {} loaded",
                loaded
            )));
        }

        let vocabulary = Arc::new(self.fit_vocabulary(&outcome.valid)?);
        let features = self.vectorize(&vocabulary, &outcome.valid);
        let datasets = self.datasets(&labels, &features)?;

        let trainer = MultiHorizonTrainer::new(self.config.trainer_config()?);
        let results = trainer.train_all(&datasets)?;

        let log_lengths: HashMap<&str, f64> = outcome
            .valid
            .iter()
            .map(|c| (c.document.id.as_str(), (c.document.text_len() as f64).ln()))
            .collect();

        let mut models = BTreeMap::new();
        let mut reports = BTreeMap::new();
        let mut impacts = BTreeMap::new();
        let mut summary = MetricsSummary::new();

        for (horizon, result) in results {
            let n_labeled = labels.defined_count(horizon);
            let n_excluded = labels.exclusions(horizon).len();
            match result {
                Ok(mut trained) => {
                    if let Some(corr) = text_length_correlation(&labels, horizon, &log_lengths) {
                        trained.metrics.diagnostics.insert(TEXT_LENGTH_CORR.to_string(), corr);
                    }
                    let importances = trained.model.importances();
                    let family = trained.model.family().name();
                    let report = AttributionReport::from_importances(
                        horizon,
                        family,
                        vocabulary.terms(),
                        &importances,
                        self.config.top_n,
                    )?;
                    let table = impact_table(vocabulary.terms(), &importances)?;

                    summary.insert(HorizonMetrics::trained(
                        horizon,
                        family,
                        n_labeled,
                        n_excluded,
                        trained.metrics.to_map(),
                    ));
                    reports.insert(horizon, report);
                    impacts.insert(horizon, table);
                    models.insert(horizon, trained);
                }
                Err(e) => {
                    summary.insert(HorizonMetrics::skipped(
                        horizon,
                        e.to_string(),
                        n_labeled,
                        n_excluded,
                    ));
                }
            }
        }

        let counts = CorpusCounts {
            loaded,
            valid: outcome.valid.len(),
            excluded: outcome.excluded_counts(),
            vocabulary_size: vocabulary.len(),
            vocabulary_requested: self.config.vocabulary_size,
        };
        let report = RunReport::new(
            crate::VERSION,
            self.config.to_json_value()?,
            counts,
            summary.clone(),
        );

        info!(
            trained = ?summary.trained(),
            skipped = ?summary.skipped(),
            vocabulary = vocabulary.len(),
            "pipeline finished"
        );

        Ok(PipelineOutput {
            vocabulary,
            labels,
            excluded: outcome.excluded,
            models,
            reports,
            impacts,
            summary,
            report,
        })
    }

    /// Text and price checks, in parallel, preserving document-id order.
    fn filter<'a>(&self, corpus: &'a Corpus) -> FilterOutcome<'a> {
        let filter = DocumentFilter::from_config(&self.config);
        let checked: Vec<_> = corpus
            .documents()
            .par_iter()
            .map(|doc| (doc, filter.check(corpus, doc)))
            .collect();

        let mut outcome = FilterOutcome::default();
        for (document, result) in checked {
            match result {
                Ok(cleaned) => outcome.valid.push(CleanedDocument { document, cleaned }),
                Err(reason) => {
                    debug!(document = %document.id, %reason, "document excluded");
                    outcome.exclude(reason, document.id.clone());
                }
            }
        }
        outcome
    }

    fn fit_vocabulary(&self, valid: &[CleanedDocument<'_>]) -> Result<Vocabulary> {
        let cleaned: Vec<&str> = valid.iter().map(|c| c.cleaned.as_str()).collect();
        let vectorizer = TfidfVectorizer::new(self.config.vocabulary_size, self.config.text);
        let vocabulary = vectorizer.fit(&cleaned)?;
        if vocabulary.len() < self.config.vocabulary_size {
            warn!(
                requested = self.config.vocabulary_size,
                fitted = vocabulary.len(),
                "corpus has fewer eligible terms than the requested vocabulary size"
            );
        }
        Ok(vocabulary)
    }

    fn vectorize(&self, vocabulary: &Vocabulary, valid: &[CleanedDocument<'_>]) -> FeatureMatrix {
        let rows: Vec<(&str, &str)> = valid
            .iter()
            .map(|c| (c.document.id.as_str(), c.cleaned.as_str()))
            .collect();
        vocabulary.transform_batch(&rows)
    }

    fn datasets(&self, labels: &LabelTable, features: &FeatureMatrix) -> Result<Vec<HorizonDataset>> {
        self.config
            .horizons
            .iter()
            .map(|&horizon| {
                let defined = labels.defined(horizon);
                let ids: Vec<String> = defined.iter().map(|l| l.document_id.clone()).collect();
                let x = features.select(&ids).ok_or_else(|| {
                    PipelineError::VectorizationFailure(format!(
                        "labeled document without features at T+{}",
                        horizon
                    ))
                })?;
                let y: Array1<f64> = defined.iter().map(|l| l.value).collect();
                Ok(HorizonDataset::new(horizon, ids, x, y)?)
            })
            .collect()
    }
}

fn text_length_correlation(
    labels: &LabelTable,
    horizon: usize,
    log_lengths: &HashMap<&str, f64>,
) -> Option<f64> {
    let (lengths, alphas): (Vec<f64>, Vec<f64>) = labels
        .defined(horizon)
        .iter()
        .filter_map(|l| log_lengths.get(l.document_id.as_str()).map(|&len| (len, l.value)))
        .unzip();
    pearson_correlation(&lengths, &alphas)
}
