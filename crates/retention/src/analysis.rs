//! One-call cohort analysis.

use derive_more::Display;
use retention_cohort::{
    AccumulationMatrix, AccumulationPercentMatrix, CategoryActivity, CategoryPresence, ChurnTable,
    ClientSetQueries, CohortContext, CohortMatrix, InflowMatrix, NetworkChurnTable, PeriodKind,
    build_accumulation_matrix, build_accumulation_percent_matrix, build_cohort_matrix,
    build_inflow_matrix, build_record_count_matrix, category_presence,
};
use retention_data::{ActivityRow, ActivityTable, DataError};
use retention_output::{
    CohortOverview, ExportError, Report, ReportBuilder, ReportError, RetentionSummary,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from running or reporting an analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Input data error.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Export error.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Report error.
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// What the cohort matrix counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Distinct clients.
    #[default]
    #[display("clients")]
    Clients,
    /// Activity rows, on the diagonal only.
    #[display("records")]
    Records,
}

/// Configuration for [`CohortAnalysis`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// What the cohort matrix counts. Accumulation, percentages and churn
    /// always count clients.
    pub value_type: ValueType,
}

/// Every matrix and table of one dataset, computed from a single context.
#[derive(Debug, Clone)]
pub struct CohortAnalysis {
    config: AnalysisConfig,
    context: CohortContext,
    cohort: CohortMatrix,
    client_cohort: CohortMatrix,
    accumulation: AccumulationMatrix,
    percent: AccumulationPercentMatrix,
    inflow: InflowMatrix,
    churn: ChurnTable,
}

impl CohortAnalysis {
    /// Run the analysis over a validated activity table.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::EmptyDataset`] when no row has both a period and
    /// a client, or a data error if the table cannot be read.
    pub fn run(table: &ActivityTable, config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let rows = table.rows()?;
        Self::from_rows(&rows, config)
    }

    /// Run the analysis over normalized rows.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::EmptyDataset`] when `rows` is empty.
    pub fn from_rows(rows: &[ActivityRow], config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let context = CohortContext::from_rows(rows);
        if context.is_empty() {
            return Err(DataError::EmptyDataset.into());
        }
        Ok(Self::from_context(context, config))
    }

    /// Compute every matrix from an existing context.
    pub fn from_context(context: CohortContext, config: &AnalysisConfig) -> Self {
        let client_cohort = build_cohort_matrix(&context);
        let cohort = match config.value_type {
            ValueType::Clients => client_cohort.clone(),
            ValueType::Records => build_record_count_matrix(&context),
        };
        let accumulation = build_accumulation_matrix(&context);
        let percent = build_accumulation_percent_matrix(&accumulation, &client_cohort);
        let inflow = build_inflow_matrix(&percent);
        let churn = ChurnTable::build(&client_cohort, &accumulation);

        tracing::debug!(
            periods = context.period_count(),
            clients = context.assignment().client_count(),
            value_type = %config.value_type,
            "cohort analysis complete"
        );

        Self {
            config: config.clone(),
            context,
            cohort,
            client_cohort,
            accumulation,
            percent,
            inflow,
            churn,
        }
    }

    /// The configuration used.
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// The underlying context.
    pub const fn context(&self) -> &CohortContext {
        &self.context
    }

    /// Ordered period labels.
    pub fn periods(&self) -> &[String] {
        self.cohort.periods()
    }

    /// Whether the periods are months or weeks.
    pub fn period_kind(&self) -> PeriodKind {
        self.context.sequence().kind()
    }

    /// The cohort matrix, counting what the configuration asked for.
    pub const fn cohort_matrix(&self) -> &CohortMatrix {
        &self.cohort
    }

    /// The accumulation matrix.
    pub const fn accumulation_matrix(&self) -> &AccumulationMatrix {
        &self.accumulation
    }

    /// The accumulation percent matrix.
    pub const fn percent_matrix(&self) -> &AccumulationPercentMatrix {
        &self.percent
    }

    /// The inflow matrix.
    pub const fn inflow_matrix(&self) -> &InflowMatrix {
        &self.inflow
    }

    /// The churn table.
    pub const fn churn_table(&self) -> &ChurnTable {
        &self.churn
    }

    /// Client drill-down queries.
    pub const fn queries(&self) -> ClientSetQueries<'_> {
        self.context.queries()
    }

    /// Shape of the dataset, from the client cohort sizes.
    pub fn overview(&self) -> CohortOverview {
        CohortOverview::from_matrix(&self.client_cohort, self.period_kind())
    }

    /// Averages and top-`top` rankings of the churn table.
    pub fn summary(&self, top: usize) -> RetentionSummary {
        RetentionSummary::from_churn_table(&self.churn, top)
    }

    /// Network churn against activity in other categories.
    pub fn network_churn(&self, categories: &CategoryActivity) -> NetworkChurnTable {
        NetworkChurnTable::build(&self.context, categories)
    }

    /// Where one cohort's churned clients appear in other categories.
    pub fn category_presence(
        &self,
        categories: &CategoryActivity,
        cohort: &str,
    ) -> Option<CategoryPresence> {
        category_presence(&self.context, categories, cohort)
    }

    /// A JSON report of every matrix, the churn table, overview and summary.
    ///
    /// # Errors
    ///
    /// Returns an error if a section cannot be serialized.
    pub fn report(&self, dataset: &str, top: usize) -> Result<Report, AnalysisError> {
        let matrix = |m: &CohortMatrix| {
            serde_json::json!({ "periods": m.periods(), "values": m.to_rows() })
        };
        let float_matrix = |m: &AccumulationPercentMatrix| {
            serde_json::json!({ "periods": m.periods(), "values": m.to_rows() })
        };

        let report = ReportBuilder::new()
            .dataset(dataset)
            .period_kind(self.period_kind())
            .section("value_type", &self.config.value_type)?
            .section("overview", &self.overview())?
            .section("cohort_matrix", &matrix(&self.cohort))?
            .section("accumulation_matrix", &matrix(&self.accumulation))?
            .section("accumulation_percent_matrix", &float_matrix(&self.percent))?
            .section("inflow_matrix", &float_matrix(&self.inflow))?
            .section("churn_table", self.churn.rows())?
            .section("summary", &self.summary(top))?
            .build()?;
        Ok(report)
    }
}
