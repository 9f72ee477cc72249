//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading or validating activity tables.
#[derive(Debug, Error)]
pub enum DataError {
    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A named column is not present in the table
    #[error("Column not found: {column}")]
    MissingColumn {
        /// Column that was requested
        column: String,
    },

    /// A named column exists but holds no usable values
    #[error("Column {column} contains no values")]
    EmptyColumn {
        /// Column that was requested
        column: String,
    },

    /// The table has no rows left after dropping null cells
    #[error("Dataset is empty: no rows with both a period and a client")]
    EmptyDataset,

    /// Automatic column detection failed
    #[error("Could not detect the {0} column; pass it explicitly")]
    ColumnNotDetected(String),
}
