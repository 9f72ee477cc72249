//! Cohort overview and retention summary.
//!
//! The overview describes the shape of the dataset (how many periods, which
//! cohorts are largest and smallest). The summary condenses the churn table
//! into averages and rankings. Cohorts whose churn is not observable are left
//! out of every average and ranking.

use retention_cohort::{ChurnRow, ChurnTable, CohortMatrix, PeriodKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A cohort and its size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CohortSize {
    /// Cohort period label.
    pub period: String,

    /// Number of clients (or records) in the cohort.
    pub size: usize,
}

/// Shape of a cohort dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CohortOverview {
    /// Number of periods.
    pub period_count: usize,

    /// Earliest period.
    pub first_period: Option<String>,

    /// Latest period.
    pub last_period: Option<String>,

    /// Largest cohort; the earliest one on ties.
    pub largest: Option<CohortSize>,

    /// Smallest cohort; the earliest one on ties.
    pub smallest: Option<CohortSize>,

    /// Mean cohort size.
    pub mean_size: f64,

    /// Sum of all cohort sizes.
    pub total: usize,

    /// Whether periods are months or weeks.
    pub period_kind: PeriodKind,
}

impl CohortOverview {
    /// Describe a cohort matrix.
    ///
    /// Cohort sizes are read from the diagonal.
    pub fn from_matrix(matrix: &CohortMatrix, period_kind: PeriodKind) -> Self {
        let sizes: Vec<CohortSize> = matrix
            .periods()
            .iter()
            .zip(matrix.diagonal())
            .map(|(period, size)| CohortSize {
                period: period.clone(),
                size,
            })
            .collect();

        let mut largest: Option<&CohortSize> = None;
        let mut smallest: Option<&CohortSize> = None;
        for cohort in &sizes {
            if largest.is_none_or(|best| cohort.size > best.size) {
                largest = Some(cohort);
            }
            if smallest.is_none_or(|best| cohort.size < best.size) {
                smallest = Some(cohort);
            }
        }

        let total: usize = sizes.iter().map(|c| c.size).sum();
        let mean_size = if sizes.is_empty() {
            0.0
        } else {
            total as f64 / sizes.len() as f64
        };

        Self {
            period_count: sizes.len(),
            first_period: sizes.first().map(|c| c.period.clone()),
            last_period: sizes.last().map(|c| c.period.clone()),
            largest: largest.cloned(),
            smallest: smallest.cloned(),
            mean_size,
            total,
            period_kind,
        }
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str("\nCohort Overview\n");
        output.push_str(&"=".repeat(60));
        output.push('\n');
        for (label, value) in self.fields() {
            output.push_str(&format!("  {label:<26} {value}\n"));
        }
        output.push_str(&"=".repeat(60));
        output.push('\n');

        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("## Cohort Overview\n\n");
        output.push_str("| Metric | Value |\n");
        output.push_str("|--------|-------|\n");
        for (label, value) in self.fields() {
            output.push_str(&format!("| {label} | {value} |\n"));
        }

        output
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        let describe = |cohort: &Option<CohortSize>| {
            cohort
                .as_ref()
                .map_or_else(|| "-".to_string(), |c| format!("{} ({})", c.size, c.period))
        };

        vec![
            ("Cohorts", self.period_count.to_string()),
            ("Period kind", self.period_kind.to_string()),
            ("First period", self.first_period.clone().unwrap_or_else(|| "-".into())),
            ("Last period", self.last_period.clone().unwrap_or_else(|| "-".into())),
            ("Largest cohort", describe(&self.largest)),
            ("Smallest cohort", describe(&self.smallest)),
            ("Mean cohort size", format!("{:.1}", self.mean_size)),
            ("Total", self.total.to_string()),
        ]
    }
}

impl fmt::Display for CohortOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} cohorts ({} to {})",
            self.period_count,
            self.period_kind,
            self.first_period.as_deref().unwrap_or("-"),
            self.last_period.as_deref().unwrap_or("-"),
        )?;
        if let Some(largest) = &self.largest {
            writeln!(f, "  Largest: {} ({})", largest.period, largest.size)?;
        }
        if let Some(smallest) = &self.smallest {
            writeln!(f, "  Smallest: {} ({})", smallest.period, smallest.size)?;
        }
        Ok(())
    }
}

/// One line of a ranking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedCohort {
    /// Cohort period label.
    pub period: String,

    /// Cohort size.
    pub size: usize,

    /// The value ranked on.
    pub percent: f64,

    /// The count behind the percentage.
    pub count: usize,
}

/// Averages and rankings derived from a churn table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetentionSummary {
    /// Number of cohorts with observable churn.
    pub observed_cohorts: usize,

    /// Mean cumulative return percentage.
    pub mean_return_percent: f64,

    /// Mean churn percentage.
    pub mean_churn_percent: f64,

    /// Largest cohorts, descending.
    pub top_by_size: Vec<CohortSize>,

    /// Best returning cohorts, descending.
    pub top_by_return: Vec<RankedCohort>,

    /// Worst churning cohorts, descending.
    pub top_by_churn: Vec<RankedCohort>,
}

fn rank(
    rows: &[&ChurnRow],
    top: usize,
    value: impl Fn(&ChurnRow) -> Option<(f64, usize)>,
) -> Vec<RankedCohort> {
    let mut ranked: Vec<RankedCohort> = rows
        .iter()
        .filter_map(|row| {
            value(row).map(|(percent, count)| RankedCohort {
                period: row.period.clone(),
                size: row.size,
                percent,
                count,
            })
        })
        .collect();
    ranked.sort_by(|a, b| b.percent.total_cmp(&a.percent));
    ranked.truncate(top);
    ranked
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

impl RetentionSummary {
    /// Summarize a churn table, keeping the `top` entries of each ranking.
    pub fn from_churn_table(table: &ChurnTable, top: usize) -> Self {
        let observed: Vec<&ChurnRow> = table.observed().collect();

        let mut top_by_size: Vec<CohortSize> = table
            .iter()
            .map(|row| CohortSize {
                period: row.period.clone(),
                size: row.size,
            })
            .collect();
        top_by_size.sort_by(|a, b| b.size.cmp(&a.size));
        top_by_size.truncate(top);

        Self {
            observed_cohorts: observed.len(),
            mean_return_percent: mean(observed.iter().filter_map(|r| r.return_percent.value())),
            mean_churn_percent: mean(observed.iter().filter_map(|r| r.churn_percent.value())),
            top_by_size,
            top_by_return: rank(&observed, top, |row| {
                Some((row.return_percent.value()?, row.cumulative_return.value()?))
            }),
            top_by_churn: rank(&observed, top, |row| {
                Some((row.churn_percent.value()?, row.churn_count.value()?))
            }),
        }
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str("\nRetention Summary\n");
        output.push_str(&"=".repeat(60));
        output.push('\n');
        output.push_str(&format!(
            "  Observed cohorts:          {}\n",
            self.observed_cohorts
        ));
        output.push_str(&format!(
            "  Mean return:               {:.1}%\n",
            self.mean_return_percent
        ));
        output.push_str(&format!(
            "  Mean churn:                {:.1}%\n",
            self.mean_churn_percent
        ));

        if !self.top_by_size.is_empty() {
            output.push_str("\nLargest Cohorts:\n");
            output.push_str(&"-".repeat(60));
            output.push('\n');
            output.push_str(&format!("{:<4} {:<20} {:>12}\n", "#", "Cohort", "Size"));
            for (idx, cohort) in self.top_by_size.iter().enumerate() {
                output.push_str(&format!(
                    "{:<4} {:<20} {:>12}\n",
                    idx + 1,
                    cohort.period,
                    cohort.size
                ));
            }
        }

        for (title, ranking, label) in [
            ("Best Return", &self.top_by_return, "Returned"),
            ("Highest Churn", &self.top_by_churn, "Churned"),
        ] {
            if ranking.is_empty() {
                continue;
            }
            output.push_str(&format!("\n{title}:\n"));
            output.push_str(&"-".repeat(60));
            output.push('\n');
            output.push_str(&format!(
                "{:<4} {:<20} {:>10} {:>10} {:>10}\n",
                "#", "Cohort", "%", label, "Size"
            ));
            for (idx, cohort) in ranking.iter().enumerate() {
                output.push_str(&format!(
                    "{:<4} {:<20} {:>9.1}% {:>10} {:>10}\n",
                    idx + 1,
                    cohort.period,
                    cohort.percent,
                    cohort.count,
                    cohort.size
                ));
            }
        }

        output.push_str(&"=".repeat(60));
        output.push('\n');

        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("## Retention Summary\n\n");
        output.push_str(&format!(
            "- **Observed cohorts:** {}\n",
            self.observed_cohorts
        ));
        output.push_str(&format!(
            "- **Mean return:** {:.1}%\n",
            self.mean_return_percent
        ));
        output.push_str(&format!(
            "- **Mean churn:** {:.1}%\n\n",
            self.mean_churn_percent
        ));

        if !self.top_by_size.is_empty() {
            output.push_str("### Largest Cohorts\n\n");
            output.push_str("| # | Cohort | Size |\n");
            output.push_str("|---|--------|------|\n");
            for (idx, cohort) in self.top_by_size.iter().enumerate() {
                output.push_str(&format!("| {} | {} | {} |\n", idx + 1, cohort.period, cohort.size));
            }
            output.push('\n');
        }

        for (title, ranking) in [
            ("Best Return", &self.top_by_return),
            ("Highest Churn", &self.top_by_churn),
        ] {
            if ranking.is_empty() {
                continue;
            }
            output.push_str(&format!("### {title}\n\n"));
            output.push_str("| # | Cohort | % | Clients | Size |\n");
            output.push_str("|---|--------|---|---------|------|\n");
            for (idx, cohort) in ranking.iter().enumerate() {
                output.push_str(&format!(
                    "| {} | {} | {:.1}% | {} | {} |\n",
                    idx + 1,
                    cohort.period,
                    cohort.percent,
                    cohort.count,
                    cohort.size
                ));
            }
            output.push('\n');
        }

        output
    }
}

impl fmt::Display for RetentionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Retention Summary ({} observed cohorts)", self.observed_cohorts)?;
        writeln!(f, "  Mean return: {:.1}%", self.mean_return_percent)?;
        writeln!(f, "  Mean churn: {:.1}%", self.mean_churn_percent)?;
        if let Some(best) = self.top_by_return.first() {
            writeln!(f, "  Best return: {} ({:.1}%)", best.period, best.percent)?;
        }
        if let Some(worst) = self.top_by_churn.first() {
            writeln!(f, "  Highest churn: {} ({:.1}%)", worst.period, worst.percent)?;
        }
        Ok(())
    }
}
