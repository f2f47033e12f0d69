//! Corpus and store resolution for the CLI.
//!
//! Maps command-line paths onto a [`riskalpha::data::CorpusStore`] and
//! locates the default SQLite store.

pub(crate) mod corpus_source;
pub(crate) mod store_manager;
