//! Corpus location given on the command line.

use super::store_manager;
use riskalpha::data::{CorpusStore, DataError, FileCorpus};
use std::path::{Path, PathBuf};

/// Error type for corpus resolution.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CorpusSourceError {
    /// Path does not exist.
    #[error("Corpus not found: {0}")]
    NotFound(String),
    /// Store could not be opened.
    #[error("Corpus store error: {0}")]
    Store(#[from] DataError),
}

/// Where documents and prices are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CorpusSource {
    /// A directory with `documents.csv` and `prices/`
    Directory(PathBuf),
    /// A SQLite database built by `riskalpha ingest`
    Database(PathBuf),
}

impl CorpusSource {
    /// Classify a path: directories are file corpora, files are databases.
    pub(crate) fn detect(path: &Path) -> Result<Self, CorpusSourceError> {
        if path.is_dir() {
            Ok(Self::Directory(path.to_path_buf()))
        } else if path.is_file() {
            Ok(Self::Database(path.to_path_buf()))
        } else {
            Err(CorpusSourceError::NotFound(path.display().to_string()))
        }
    }

    /// Open the store. `benchmark` applies to directory corpora; a database
    /// records its own benchmark.
    pub(crate) fn open(&self, benchmark: &str) -> Result<Box<dyn CorpusStore>, CorpusSourceError> {
        Ok(match self {
            Self::Directory(dir) => Box::new(FileCorpus::with_benchmark(dir, benchmark)),
            Self::Database(path) => Box::new(store_manager::open_store(path)?),
        })
    }
}
