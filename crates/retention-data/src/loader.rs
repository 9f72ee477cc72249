//! CSV loading through the polars reader.

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for reading activity files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Field delimiter (default: `,`)
    pub delimiter: u8,
    /// Whether the first line holds column names (default: true)
    pub has_header: bool,
    /// Infer column types from the data (default: false)
    ///
    /// With inference disabled every column is read as a string, which keeps
    /// period labels and client codes exactly as written in the file.
    pub infer_schema: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            infer_schema: false,
        }
    }
}

/// Read a CSV file into a DataFrame.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn load_csv(path: impl AsRef<Path>, config: &LoadConfig) -> Result<DataFrame> {
    let path = path.as_ref();
    let infer_schema_length = if config.infer_schema { Some(100) } else { Some(0) };

    let frame = CsvReadOptions::default()
        .with_has_header(config.has_header)
        .with_infer_schema_length(infer_schema_length)
        .with_parse_options(CsvParseOptions::default().with_separator(config.delimiter))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    tracing::debug!(
        path = %path.display(),
        rows = frame.height(),
        columns = frame.width(),
        "loaded activity file"
    );

    Ok(frame)
}
