//! Report generation for cohort analyses.

use chrono::{DateTime, Utc};
use retention_cohort::PeriodKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A cohort analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Name of the analysed dataset.
    pub dataset: String,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Whether cohorts are months or weeks.
    pub period_kind: PeriodKind,

    /// Report contents (JSON format).
    pub contents: serde_json::Value,
}

impl Report {
    /// Create a new report.
    pub fn new(dataset: String, period_kind: PeriodKind, contents: serde_json::Value) -> Self {
        Self {
            dataset,
            timestamp: Utc::now(),
            period_kind,
            contents,
        }
    }

    /// Convert report to JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the contents cannot be serialized.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to(&self, path: &Path) -> Result<(), ReportError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    dataset: Option<String>,
    period_kind: Option<PeriodKind>,
    contents: Option<serde_json::Value>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dataset name.
    pub fn dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    /// Set the period kind.
    pub const fn period_kind(mut self, kind: PeriodKind) -> Self {
        self.period_kind = Some(kind);
        self
    }

    /// Add one named section to the contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the section cannot be serialized.
    pub fn section<T: Serialize + ?Sized>(
        mut self,
        name: &str,
        value: &T,
    ) -> Result<Self, ReportError> {
        let value = serde_json::to_value(value)?;
        let contents = self
            .contents
            .get_or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        if let serde_json::Value::Object(map) = contents {
            map.insert(name.to_string(), value);
        }
        Ok(self)
    }

    /// Build the report.
    pub fn build(self) -> Result<Report, ReportError> {
        Ok(Report::new(
            self.dataset.unwrap_or_default(),
            self.period_kind.unwrap_or(PeriodKind::Month),
            self.contents.unwrap_or(serde_json::Value::Null),
        ))
    }
}
