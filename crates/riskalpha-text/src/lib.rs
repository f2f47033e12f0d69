#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/riskalpha/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod clean;
pub mod error;
pub mod features;
pub mod vectorizer;
pub mod vocabulary;

pub use clean::{STOP_WORDS, clean, tokenize};
pub use error::{Result, TextError};
pub use features::FeatureMatrix;
pub use vectorizer::{TextOptions, TfidfVectorizer, smoothed_idf};
pub use vocabulary::Vocabulary;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
