//! End-to-end pipeline scenarios over an in-memory SQLite corpus.

use chrono::{Days, NaiveDate};
use riskalpha::data::{Document, PricePoint, PriceSeries, SqliteCorpus};
use riskalpha::model::{ForestParams, ModelSpec, Predictor, RidgeParams};
use riskalpha::output::{Direction, HorizonStatus};
use riskalpha::{ExclusionReason, Pipeline, PipelineConfig, PipelineError};

fn day(offset: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(offset)
}

/// `days` daily prices starting at 100 that jump to `100 * (1 + jump)` on day 1.
fn stepped(entity: &str, days: u64, jump: f64) -> PriceSeries {
    let points = (0..days)
        .map(|i| {
            let price = if i == 0 { 100.0 } else { 100.0 * (1.0 + jump) };
            PricePoint::new(day(i), price)
        })
        .collect();
    PriceSeries::new(entity, points).unwrap()
}

fn store(documents: &[Document], series: &[PriceSeries]) -> SqliteCorpus {
    let store = SqliteCorpus::in_memory().unwrap();
    store.put_prices(&stepped("SPY", 20, 0.0)).unwrap();
    store.set_benchmark("SPY").unwrap();
    for s in series {
        store.put_prices(s).unwrap();
    }
    store.put_documents_batch(documents).unwrap();
    store
}

fn three_document_store() -> SqliteCorpus {
    store(
        &[
            Document::new("A", "MOBI", day(0), "Mobile mobile mobile growth."),
            Document::new("B", "FUEL", day(0), "Fuel fuel fuel costs."),
            Document::new("C", "FLAT", day(0), "Quarterly results remain steady overall."),
        ],
        &[
            stepped("MOBI", 15, 0.2),
            stepped("FUEL", 15, -0.2),
            stepped("FLAT", 15, 0.0),
        ],
    )
}

fn small_config() -> PipelineConfig {
    PipelineConfig {
        min_samples: 1,
        test_ratio: 0.0,
        min_text_chars: 10,
        model: ModelSpec::Ridge(RidgeParams { alpha: 0.1 }),
        max_parallel_horizons: 2,
        ..PipelineConfig::default()
    }
}

const WORDS: [&str; 10] = [
    "litigation", "currency", "cyber", "pandemic", "tariff", "supplier", "patent", "weather",
    "pension", "inflation",
];

/// Ten documents; the first five entities only have eight trading days of
/// prices, so horizon 10 is labeled for the other five alone.
fn ten_document_store() -> SqliteCorpus {
    let mut documents = Vec::new();
    let mut series = Vec::new();
    for (i, word) in WORDS.iter().enumerate() {
        let entity = format!("E{}", i);
        let text = format!(
            "{w} {w} exposure could affect operating results. Regulatory {w} risk and {o} pressure.",
            w = word,
            o = WORDS[(i + 3) % WORDS.len()]
        );
        documents.push(Document::new(format!("doc{:02}", i), &entity, day(0), text));
        let days = if i < 5 { 8 } else { 15 };
        series.push(stepped(&entity, days, (i as f64 - 4.5) * 0.01));
    }
    store(&documents, &series)
}

fn starvation_config(model: ModelSpec) -> PipelineConfig {
    PipelineConfig {
        horizons: vec![1, 5, 10],
        min_samples: 8,
        test_ratio: 0.2,
        min_text_chars: 20,
        model,
        ..PipelineConfig::default()
    }
}

#[test]
fn test_mobile_positive_fuel_negative() {
    let output = Pipeline::new(small_config())
        .unwrap()
        .run(&three_document_store())
        .unwrap();

    assert_eq!(output.summary.trained(), vec![1, 5, 10]);
    // Nothing is held out with a zero test ratio, and the metrics say so.
    assert_eq!(output.summary.get(1).unwrap().metric("out_of_sample"), Some(0.0));
    // Three short documents cannot fill a 3000-term vocabulary.
    let counts = &output.report.corpus;
    assert_eq!(counts.vocabulary_requested, 3000);
    assert_eq!(counts.vocabulary_size, output.vocabulary.len());
    assert!(counts.vocabulary_truncated());
    for horizon in [1, 5, 10] {
        let report = output.attribution(horizon).unwrap();
        assert!(report.contains(Direction::Positive, "mobile"), "{}", report);
        assert!(report.contains(Direction::Negative, "fuel"), "{}", report);
        assert!(!report.contains(Direction::Negative, "mobile"));
        assert!(!report.contains(Direction::Positive, "fuel"));
    }
}

#[test]
fn test_starved_horizon_is_skipped() {
    let output = Pipeline::new(starvation_config(ModelSpec::default()))
        .unwrap()
        .run(&ten_document_store())
        .unwrap();

    assert_eq!(output.summary.trained(), vec![1, 5]);
    assert_eq!(output.summary.skipped(), vec![10]);
    assert!(output.models.contains_key(&1) && output.models.contains_key(&5));
    assert!(!output.models.contains_key(&10));
    assert!(output.attribution(10).is_none());

    let skipped = output.summary.get(10).unwrap();
    assert!(matches!(skipped.status, HorizonStatus::Skipped { .. }));
    assert_eq!(skipped.n_labeled, 5);
    assert_eq!(skipped.n_excluded, 5);
    assert!(skipped.metrics.is_empty());

    let trained = output.summary.get(5).unwrap();
    assert_eq!(trained.metric("out_of_sample"), Some(1.0));
    assert_eq!(trained.n_labeled, 10);
    assert_eq!(trained.metric("n_test"), Some(2.0));
    assert_eq!(trained.metric("n_train"), Some(8.0));

    for trained in output.models.values() {
        assert_eq!(trained.model.n_features(), output.vocabulary.len());
        assert_eq!(trained.train_ids.len() + trained.test_ids.len(), 10);
    }
    assert_eq!(output.report.corpus.valid, 10);
}

#[test]
fn test_rerun_is_identical() {
    let forest = ModelSpec::RandomForest(ForestParams {
        n_trees: 20,
        max_depth: 4,
        ..ForestParams::default()
    });
    let pipeline = Pipeline::new(starvation_config(forest)).unwrap();

    let first = pipeline.run(&ten_document_store()).unwrap();
    let second = pipeline.run(&ten_document_store()).unwrap();

    assert_eq!(first.vocabulary.terms(), second.vocabulary.terms());
    assert_eq!(first.summary, second.summary);
    assert_eq!(first.reports, second.reports);
    assert_eq!(first.impacts, second.impacts);
}

#[test]
fn test_invalid_documents_are_excluded() {
    let corpus = store(
        &[
            Document::new("A", "MOBI", day(0), "Mobile mobile mobile growth."),
            Document::new("B", "FUEL", day(0), "Fuel fuel fuel costs."),
            Document::new("C", "FLAT", day(0), "Quarterly results remain steady overall."),
            Document::new("D", "FLAT", day(0), "SECTION_NOT_FOUND_OR_REFERENCE_ONLY"),
            Document::new("E", "NOPX", day(0), "Entity without any price history at all."),
            Document::new("F", "LATE", day(0), "Listed too recently for any forward return."),
            Document::new("G", "FLAT", day(0), "   "),
        ],
        &[
            stepped("MOBI", 15, 0.2),
            stepped("FUEL", 15, -0.2),
            stepped("FLAT", 15, 0.0),
            stepped("LATE", 1, 0.0),
        ],
    );

    let output = Pipeline::new(small_config()).unwrap().run(&corpus).unwrap();

    let counts = &output.report.corpus;
    assert_eq!(counts.loaded, 7);
    assert_eq!(counts.valid, 3);
    assert_eq!(counts.excluded["placeholder_text"], 1);
    assert_eq!(counts.excluded["no_price_data"], 1);
    assert_eq!(counts.excluded["no_defined_label"], 1);
    assert_eq!(counts.excluded["empty_text"], 1);
    assert_eq!(output.excluded[&ExclusionReason::NoDefinedLabel], vec!["F".to_string()]);

    // Excluded documents never reach the vocabulary or the labels.
    assert!(output.vocabulary.position("listed").is_none());
    assert!(output.labels.get("F", 1).is_none());
    assert_eq!(output.labels.defined_count(1), 3);
}

#[test]
fn test_missing_benchmark_aborts() {
    let corpus = SqliteCorpus::in_memory().unwrap();
    corpus
        .put_document(&Document::new("A", "MOBI", day(0), "Mobile mobile growth."))
        .unwrap();

    let result = Pipeline::new(small_config()).unwrap().run(&corpus);
    assert!(matches!(result, Err(PipelineError::CorpusLoadFailure(_))));
}

#[test]
fn test_empty_corpus_aborts() {
    let corpus = store(&[], &[]);
    let result = Pipeline::new(small_config()).unwrap().run(&corpus);
    assert!(matches!(result, Err(PipelineError::CorpusLoadFailure(_))));
}

#[test]
fn test_nothing_valid_is_vectorization_failure() {
    let corpus = store(
        &[
            Document::new("A", "MOBI", day(0), "SECTION_NOT_FOUND_OR_REFERENCE_ONLY"),
            Document::new("B", "MOBI", day(0), ""),
        ],
        &[stepped("MOBI", 15, 0.2)],
    );

    let result = Pipeline::new(small_config()).unwrap().run(&corpus);
    let err = result.unwrap_err();
    assert!(matches!(err, PipelineError::VectorizationFailure(_)));
    assert!(err.is_fatal_run_cause());
}

#[test]
fn test_text_length_diagnostic_reported() {
    let output = Pipeline::new(starvation_config(ModelSpec::default()))
        .unwrap()
        .run(&ten_document_store())
        .unwrap();

    let corr = output
        .summary
        .get(1)
        .unwrap()
        .metric(riskalpha::pipeline::TEXT_LENGTH_CORR)
        .unwrap();
    assert!((-1.0..=1.0).contains(&corr));
}

#[test]
fn test_rerun_removes_artifacts_of_skipped_horizon() {
    let dir = tempfile::TempDir::new().unwrap();
    let artifacts = riskalpha::ArtifactStore::new(dir.path());
    let pipeline = Pipeline::new(small_config()).unwrap();

    pipeline
        .run(&three_document_store())
        .unwrap()
        .persist(&artifacts)
        .unwrap();
    assert!(artifacts.load_attribution(10).is_ok());
    assert!(artifacts.model_path(10).exists());

    // Eight days of prices leave T+10 without a single label.
    let starved = store(
        &[
            Document::new("A", "MOBI", day(0), "Mobile mobile mobile growth."),
            Document::new("B", "FUEL", day(0), "Fuel fuel fuel costs."),
            Document::new("C", "FLAT", day(0), "Quarterly results remain steady overall."),
        ],
        &[
            stepped("MOBI", 8, 0.2),
            stepped("FUEL", 8, -0.2),
            stepped("FLAT", 8, 0.0),
        ],
    );
    let second = pipeline.run(&starved).unwrap();
    assert_eq!(second.summary.skipped(), vec![10]);
    second.persist(&artifacts).unwrap();

    assert_eq!(artifacts.load_metrics().unwrap().skipped(), vec![10]);
    assert!(!artifacts.model_path(10).exists());
    assert!(!artifacts.impact_path(10).exists());
    assert!(matches!(
        artifacts.load_attribution(10),
        Err(PipelineError::ArtifactNotFound(_))
    ));
    assert!(matches!(artifacts.load_model(10), Err(PipelineError::ArtifactNotFound(_))));
    assert!(artifacts.load_model(5).is_ok());
}
