#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/retention/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analysis;

// Re-export main types from sub-crates
pub use retention_cohort as cohort;
pub use retention_data as data;
pub use retention_output as output;

pub use analysis::{AnalysisConfig, AnalysisError, CohortAnalysis, ValueType};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
