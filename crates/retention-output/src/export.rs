//! Export functionality for cohort analysis results.
//!
//! Matrices, churn tables and client lists can be written as CSV or JSON.
//! In CSV the "not observable" marker of the most recent cohort is written
//! as `-`; in JSON it is `null`.

use retention_cohort::{ChurnTable, CohortContext, NetworkChurnTable, Observed, PeriodMatrix};
use retention_data::ClientId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A query that needs a target period was run without one.
    #[error("query '{0}' requires a target period")]
    MissingTarget(ClientQuery),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

fn to_json<T: Serialize + ?Sized>(value: &T, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(value)?),
        _ => Ok(serde_json::to_string(value)?),
    }
}

fn percent_cell(value: Observed<f64>) -> String {
    format!("{value:.2}")
}

#[derive(Serialize)]
struct MatrixJson<'a, T> {
    periods: &'a [String],
    values: Vec<Vec<T>>,
}

impl<T> Exporter for PeriodMatrix<T>
where
    T: Copy + Default + Serialize + fmt::Display,
{
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                let mut header = vec!["cohort".to_string()];
                header.extend(self.periods().iter().cloned());
                wtr.write_record(&header)?;

                for (period, row) in self.periods().iter().zip(self.to_rows()) {
                    let mut record = vec![period.clone()];
                    record.extend(row.iter().map(ToString::to_string));
                    wtr.write_record(&record)?;
                }
                finish(wtr)
            }
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(
                &MatrixJson {
                    periods: self.periods(),
                    values: self.to_rows(),
                },
                format,
            ),
        }
    }
}

impl Exporter for ChurnTable {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                wtr.write_record([
                    "cohort",
                    "size",
                    "cumulative_return",
                    "return_percent",
                    "churn_count",
                    "churn_percent",
                ])?;
                for row in self {
                    wtr.write_record([
                        row.period.clone(),
                        row.size.to_string(),
                        row.cumulative_return.to_string(),
                        percent_cell(row.return_percent),
                        row.churn_count.to_string(),
                        percent_cell(row.churn_percent),
                    ])?;
                }
                finish(wtr)
            }
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(self.rows(), format),
        }
    }
}

impl Exporter for NetworkChurnTable {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                wtr.write_record([
                    "cohort",
                    "size",
                    "churn_count",
                    "present_count",
                    "present_percent",
                    "network_churn",
                    "network_churn_percent",
                ])?;
                for row in self.rows() {
                    wtr.write_record([
                        row.period.clone(),
                        row.size.to_string(),
                        row.churn_count.to_string(),
                        row.present_count.to_string(),
                        percent_cell(row.present_percent),
                        row.network_churn.to_string(),
                        percent_cell(row.network_churn_percent),
                    ])?;
                }
                finish(wtr)
            }
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(self.rows(), format),
        }
    }
}

/// The four client drill-down queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientQuery {
    /// Cohort clients active in the target period.
    Cohort,
    /// Cohort clients returned at any point up to the target period.
    Accumulation,
    /// Cohort clients never seen again.
    Churn,
    /// Cohort clients whose first return was the target period.
    Inflow,
}

impl ClientQuery {
    /// Whether the query takes a target period.
    pub const fn needs_target(&self) -> bool {
        !matches!(self, Self::Churn)
    }
}

impl fmt::Display for ClientQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cohort => "cohort",
            Self::Accumulation => "accumulation",
            Self::Churn => "churn",
            Self::Inflow => "inflow",
        };
        f.write_str(name)
    }
}

/// The result of one client query, ready for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientListExport {
    /// Which query produced the list.
    pub query: ClientQuery,

    /// Cohort period label.
    pub cohort: String,

    /// Target period label, for queries that take one.
    pub target: Option<String>,

    /// Sorted client identifiers.
    pub clients: Vec<ClientId>,
}

impl ClientListExport {
    /// Run a query against a context.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::MissingTarget`] when the query needs a target
    /// period and none was given.
    pub fn from_query(
        context: &CohortContext,
        query: ClientQuery,
        cohort: &str,
        target: Option<&str>,
    ) -> Result<Self, ExportError> {
        let queries = context.queries();
        let clients = match (query, target) {
            (ClientQuery::Churn, _) => queries.churn_clients(cohort),
            (ClientQuery::Cohort, Some(target)) => queries.cohort_clients_in_period(cohort, target),
            (ClientQuery::Accumulation, Some(target)) => {
                queries.accumulation_clients(cohort, target)
            }
            (ClientQuery::Inflow, Some(target)) => queries.inflow_clients(cohort, target),
            (query, None) => return Err(ExportError::MissingTarget(query)),
        };

        Ok(Self {
            query,
            cohort: cohort.trim().to_string(),
            target: target
                .filter(|_| query.needs_target())
                .map(|t| t.trim().to_string()),
            clients,
        })
    }

    /// Number of clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Exporter for ClientListExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                wtr.write_record(["client"])?;
                for client in &self.clients {
                    wtr.write_record([client.as_str()])?;
                }
                finish(wtr)
            }
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(self, format),
        }
    }
}
