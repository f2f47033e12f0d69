#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/riskalpha/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod attribution;
pub mod export;
pub mod report;
pub mod summary;

pub use attribution::{AttributionReport, AttributionRow, Direction, TermImpact, TermScore, impact_table};
pub use export::{ExportError, ExportFormat, Exporter};
pub use report::{CorpusCounts, RunReport, RunReportBuilder};
pub use summary::{HorizonMetrics, HorizonStatus, MetricsSummary};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
