#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/retention/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod client;
pub mod columns;
pub mod error;
pub mod loader;
pub mod table;

pub use client::{ClientId, normalize_client_code};
pub use columns::{DetectedColumns, detect_columns, detect_columns_in};
pub use error::{DataError, Result};
pub use loader::{LoadConfig, load_csv};
pub use table::{ActivityRow, ActivityTable, CategoryRow, CategoryTable, normalize_period_label};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
