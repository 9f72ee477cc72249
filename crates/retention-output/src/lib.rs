#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/retention/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod render;
pub mod report;
pub mod summary;

pub use export::{ClientListExport, ClientQuery, ExportError, ExportFormat, Exporter};
pub use render::{AsciiTable, MatrixTable};
pub use report::{Report, ReportBuilder, ReportError};
pub use summary::{CohortOverview, CohortSize, RankedCohort, RetentionSummary};
