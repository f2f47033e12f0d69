//! Corpus store: documents plus entity and benchmark price series.
//!
//! The store is read-only for the duration of a pipeline run. Ingestion into a
//! [`SqliteCorpus`] happens in a separate phase.

pub mod files;
pub mod sqlite;

pub use files::FileCorpus;
pub use sqlite::{SqliteCorpus, StoreStats};

use crate::document::Document;
use crate::error::{DataError, Result};
use crate::prices::PriceSeries;
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

/// Source of documents and aligned price data.
///
/// Implementations are independent of the on-disk representation.
pub trait CorpusStore {
    /// All documents in the store.
    fn documents(&self) -> Result<Vec<Document>>;

    /// Price series for an entity, or `None` if the store has none.
    fn price_series(&self, entity: &str) -> Result<Option<PriceSeries>>;

    /// Benchmark (market index) price series.
    fn benchmark(&self) -> Result<PriceSeries>;
}

/// Fully loaded, immutable corpus for one pipeline run.
#[derive(Debug, Clone)]
pub struct Corpus {
    documents: Vec<Document>,
    prices: HashMap<String, PriceSeries>,
    benchmark: PriceSeries,
}

impl Corpus {
    /// Build a corpus from already-loaded parts.
    ///
    /// Documents are sorted by id.
    ///
    /// # Errors
    /// Returns [`DataError::CorpusLoad`] if there are no documents, the
    /// benchmark is empty, or document ids are not unique.
    pub fn new(
        mut documents: Vec<Document>,
        prices: HashMap<String, PriceSeries>,
        benchmark: PriceSeries,
    ) -> Result<Self> {
        if documents.is_empty() {
            return Err(DataError::CorpusLoad("corpus contains no documents".to_string()));
        }
        if benchmark.is_empty() {
            return Err(DataError::CorpusLoad(format!(
                "benchmark series {} is empty",
                benchmark.entity()
            )));
        }

        documents.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(dup) = documents.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(DataError::CorpusLoad(format!(
                "duplicate document id {}",
                dup[0].id
            )));
        }

        Ok(Self {
            documents,
            prices,
            benchmark,
        })
    }

    /// Load everything a run needs from a store.
    ///
    /// A benchmark that cannot be read, or an empty document set, is fatal.
    /// An entity without a readable price series is logged and left out; its
    /// documents are excluded later.
    pub fn load(store: &dyn CorpusStore) -> Result<Self> {
        let documents = store
            .documents()
            .map_err(|e| DataError::CorpusLoad(format!("documents: {}", e)))?;
        let benchmark = store
            .benchmark()
            .map_err(|e| DataError::CorpusLoad(format!("benchmark: {}", e)))?;

        let entities: BTreeSet<&str> = documents.iter().map(|d| d.entity.as_str()).collect();
        let mut prices = HashMap::with_capacity(entities.len());
        for entity in entities {
            match store.price_series(entity) {
                Ok(Some(series)) => {
                    prices.insert(entity.to_string(), series);
                }
                Ok(None) => warn!(entity, "no price series for entity"),
                Err(e) => warn!(entity, error = %e, "failed to load price series"),
            }
        }

        let corpus = Self::new(documents, prices, benchmark)?;
        info!(
            documents = corpus.documents.len(),
            entities = corpus.prices.len(),
            benchmark = corpus.benchmark.entity(),
            "corpus loaded"
        );
        Ok(corpus)
    }

    /// Documents ordered by id.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Entity price series keyed by entity.
    pub const fn prices(&self) -> &HashMap<String, PriceSeries> {
        &self.prices
    }

    /// Benchmark series.
    pub const fn benchmark(&self) -> &PriceSeries {
        &self.benchmark
    }

    /// Whether an entity has price data.
    pub fn has_prices(&self, entity: &str) -> bool {
        self.prices.contains_key(entity)
    }
}
