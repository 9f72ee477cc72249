#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/retention/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod activity;
pub mod assign;
pub mod churn;
pub mod context;
pub mod matrix;
pub mod network;
pub mod period;
pub mod queries;

pub use activity::ActivityIndex;
pub use assign::CohortAssignment;
pub use churn::{ChurnRow, ChurnTable, Observed};
pub use context::CohortContext;
pub use matrix::{
    AccumulationMatrix, AccumulationPercentMatrix, CohortMatrix, InflowMatrix, PeriodMatrix,
    build_accumulation_matrix, build_accumulation_percent_matrix, build_cohort_matrix,
    build_inflow_matrix, build_record_count_matrix,
};
pub use network::{
    CategoryActivity, CategoryPresence, NetworkChurnRow, NetworkChurnTable, category_presence,
    network_churn_clients,
};
pub use period::{Period, PeriodKey, PeriodKind, PeriodSequence, normalize_for_compare, parse_period};
pub use queries::ClientSetQueries;
