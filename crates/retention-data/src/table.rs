//! Validated activity tables.
//!
//! [`ActivityTable`] pairs a DataFrame with the names of its period and
//! client columns. Construction checks that both columns exist and hold at
//! least one value; [`ActivityTable::rows`] then yields the normalized rows
//! the cohort engine consumes. [`CategoryTable`] does the same for activity
//! recorded in other product categories.

use crate::client::{ClientId, normalize_client_code};
use crate::error::{DataError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One usable row of an activity table: a client active in a period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityRow {
    /// Trimmed period label
    pub period: String,
    /// Normalized client identifier
    pub client: ClientId,
}

impl ActivityRow {
    /// Create a row from raw cells, normalizing both.
    ///
    /// Returns `None` when either cell is blank.
    pub fn from_raw(period: &str, client: &str) -> Option<Self> {
        let period = normalize_period_label(period)?;
        let client = normalize_client_code(client)?;
        Some(Self { period, client })
    }
}

/// One usable row of a category table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryRow {
    /// Category name
    pub category: String,
    /// Trimmed period label, when the table has a period column
    pub period: Option<String>,
    /// Normalized client identifier
    pub client: ClientId,
}

/// Trim a raw period cell; blank cells yield `None`.
pub fn normalize_period_label(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn validate_column(frame: &DataFrame, name: &str) -> Result<()> {
    let column = frame.column(name).map_err(|_| DataError::MissingColumn {
        column: name.to_string(),
    })?;
    if column.len() == 0 || column.null_count() == column.len() {
        return Err(DataError::EmptyColumn {
            column: name.to_string(),
        });
    }
    Ok(())
}

/// Select the named columns cast to strings, in order.
fn string_columns(frame: &DataFrame, names: &[&str]) -> Result<Vec<StringChunked>> {
    let aliases: Vec<String> = (0..names.len()).map(|i| format!("__col{i}")).collect();
    let exprs: Vec<Expr> = names
        .iter()
        .zip(&aliases)
        .map(|(name, alias)| col(*name).cast(DataType::String).alias(alias.as_str()))
        .collect();

    let selected = frame.clone().lazy().select(exprs).collect()?;

    aliases
        .iter()
        .map(|alias| {
            let series = selected.column(alias.as_str())?.as_materialized_series();
            Ok(series.str()?.clone())
        })
        .collect()
}

/// An activity table with its period and client columns identified.
#[derive(Debug, Clone)]
pub struct ActivityTable {
    frame: DataFrame,
    period_col: String,
    client_col: String,
}

impl ActivityTable {
    /// Wrap a DataFrame, validating the period and client columns.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingColumn`] if a column is absent and
    /// [`DataError::EmptyColumn`] if it holds only nulls.
    pub fn new(
        frame: DataFrame,
        period_col: impl Into<String>,
        client_col: impl Into<String>,
    ) -> Result<Self> {
        let period_col = period_col.into();
        let client_col = client_col.into();
        validate_column(&frame, &period_col)?;
        validate_column(&frame, &client_col)?;

        Ok(Self {
            frame,
            period_col,
            client_col,
        })
    }

    /// The underlying DataFrame.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Name of the period column.
    pub fn period_col(&self) -> &str {
        &self.period_col
    }

    /// Name of the client column.
    pub fn client_col(&self) -> &str {
        &self.client_col
    }

    /// Number of raw rows, including rows that will be dropped.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Normalized rows with null or blank cells dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if a column cannot be cast to strings.
    pub fn rows(&self) -> Result<Vec<ActivityRow>> {
        let columns = string_columns(&self.frame, &[&self.period_col, &self.client_col])?;
        let (periods, clients) = (&columns[0], &columns[1]);

        let rows: Vec<ActivityRow> = periods
            .into_iter()
            .zip(clients)
            .filter_map(|(period, client)| ActivityRow::from_raw(period?, client?))
            .collect();

        let dropped = self.frame.height() - rows.len();
        if dropped > 0 {
            tracing::warn!(
                dropped,
                period_col = %self.period_col,
                client_col = %self.client_col,
                "dropped rows with a missing period or client"
            );
        }

        Ok(rows)
    }
}

/// Activity in other categories, used for network churn.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    frame: DataFrame,
    category_col: String,
    period_col: Option<String>,
    client_col: String,
}

impl CategoryTable {
    /// Wrap a DataFrame, validating the category, client and optional period columns.
    ///
    /// # Errors
    ///
    /// Returns an error if a named column is absent or holds only nulls.
    pub fn new(
        frame: DataFrame,
        category_col: impl Into<String>,
        period_col: Option<String>,
        client_col: impl Into<String>,
    ) -> Result<Self> {
        let category_col = category_col.into();
        let client_col = client_col.into();
        validate_column(&frame, &category_col)?;
        validate_column(&frame, &client_col)?;
        if let Some(period_col) = &period_col {
            validate_column(&frame, period_col)?;
        }

        Ok(Self {
            frame,
            category_col,
            period_col,
            client_col,
        })
    }

    /// Whether rows carry a period.
    pub const fn has_periods(&self) -> bool {
        self.period_col.is_some()
    }

    /// Normalized rows with null or blank cells dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if a column cannot be cast to strings.
    pub fn rows(&self) -> Result<Vec<CategoryRow>> {
        let mut names = vec![self.category_col.as_str(), self.client_col.as_str()];
        if let Some(period_col) = &self.period_col {
            names.push(period_col.as_str());
        }
        let columns = string_columns(&self.frame, &names)?;

        let mut rows = Vec::with_capacity(self.frame.height());
        for idx in 0..self.frame.height() {
            let category = columns[0].get(idx).and_then(normalize_period_label);
            let client = columns[1].get(idx).and_then(normalize_client_code);
            let (Some(category), Some(client)) = (category, client) else {
                continue;
            };

            let period = match columns.get(2) {
                Some(periods) => match periods.get(idx).and_then(normalize_period_label) {
                    Some(period) => Some(period),
                    None => continue,
                },
                None => None,
            };

            rows.push(CategoryRow {
                category,
                period,
                client,
            });
        }

        tracing::debug!(rows = rows.len(), "collected category rows");
        Ok(rows)
    }
}
