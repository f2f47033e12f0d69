#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/riskalpha/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod alpha;
pub mod document;
pub mod error;
pub mod prices;
pub mod store;

pub use alpha::{
    AlphaCalculator, AlphaLabel, LabelExclusion, LabelTable, compute_alpha, forward_return,
    simple_return,
};
pub use document::{Document, DocumentId};
pub use error::{DataError, Result};
pub use prices::{AlignmentRule, PricePoint, PriceSeries};
pub use store::{Corpus, CorpusStore, FileCorpus, SqliteCorpus, StoreStats};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
