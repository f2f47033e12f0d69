//! Directory-backed corpus.
//!
//! Layout:
//!
//! ```text
//! <root>/documents.csv        id,entity,date,path   (or id,entity,date,text)
//! <root>/texts/<id>.txt       extracted risk-factor sections referenced by `path`
//! <root>/prices/<ENTITY>.csv  date,close
//! <root>/prices/<BENCH>.csv   date,close
//! ```

use super::CorpusStore;
use crate::document::Document;
use crate::error::{DataError, Result};
use crate::prices::PriceSeries;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Name of the document manifest inside the corpus directory.
pub const DOCUMENTS_FILE: &str = "documents.csv";

/// Directory holding one price CSV per entity.
pub const PRICES_DIR: &str = "prices";

/// Default benchmark symbol.
pub const DEFAULT_BENCHMARK: &str = "SPY";

#[derive(Debug, Deserialize)]
struct DocumentRow {
    id: String,
    entity: String,
    date: NaiveDate,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Corpus stored as CSV manifests, text files and price CSVs.
#[derive(Debug, Clone)]
pub struct FileCorpus {
    root: PathBuf,
    benchmark: String,
}

impl FileCorpus {
    /// Open a corpus directory using the default benchmark symbol.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self::with_benchmark(root, DEFAULT_BENCHMARK)
    }

    /// Open a corpus directory with a custom benchmark symbol.
    pub fn with_benchmark<P: AsRef<Path>>(root: P, benchmark: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            benchmark: benchmark.into(),
        }
    }

    /// Corpus root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Benchmark symbol.
    pub fn benchmark_symbol(&self) -> &str {
        &self.benchmark
    }

    fn price_path(&self, entity: &str) -> PathBuf {
        self.root.join(PRICES_DIR).join(format!("{}.csv", entity))
    }

    fn read_prices(&self, entity: &str, path: &Path) -> Result<PriceSeries> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;
        PriceSeries::from_frame(entity, &df)
    }

    /// Resolve a manifest row's text. Unreadable files yield empty text so the
    /// document is filtered later rather than aborting the load.
    fn resolve_text(&self, row: &DocumentRow) -> String {
        if let Some(text) = &row.text {
            return text.clone();
        }
        let Some(rel) = &row.path else {
            warn!(document = %row.id, "manifest row has neither text nor path");
            return String::new();
        };
        match std::fs::read_to_string(self.root.join(rel)) {
            Ok(text) => text,
            Err(e) => {
                warn!(document = %row.id, path = %rel, error = %e, "unreadable document text");
                String::new()
            }
        }
    }
}

impl CorpusStore for FileCorpus {
    fn documents(&self) -> Result<Vec<Document>> {
        let path = self.root.join(DOCUMENTS_FILE);
        if !path.exists() {
            return Err(DataError::CorpusLoad(format!(
                "{} not found",
                path.display()
            )));
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut documents = Vec::new();
        for row in reader.deserialize::<DocumentRow>() {
            let row = row?;
            let text = self.resolve_text(&row);
            documents.push(Document::new(row.id, row.entity, row.date, text));
        }
        Ok(documents)
    }

    fn price_series(&self, entity: &str) -> Result<Option<PriceSeries>> {
        let path = self.price_path(entity);
        if !path.exists() {
            return Ok(None);
        }
        self.read_prices(entity, &path).map(Some)
    }

    fn benchmark(&self) -> Result<PriceSeries> {
        let path = self.price_path(&self.benchmark);
        if !path.exists() {
            return Err(DataError::CorpusLoad(format!(
                "benchmark prices {} not found",
                path.display()
            )));
        }
        self.read_prices(&self.benchmark, &path)
    }
}
