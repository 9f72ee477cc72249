//! Per-cohort churn.

use crate::matrix::{AccumulationMatrix, CohortMatrix, percent_of};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value that is either computed or cannot be observed yet.
///
/// The most recent cohort has no later periods, so whether its clients
/// return is unknown. That is not the same as zero, and this type keeps the
/// two apart. Serializes as the bare value or `null`; displays as the value
/// or `-`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Observed<T> {
    /// A real value.
    Computed(T),
    /// No data to compute the value from.
    NotObservable,
}

impl<T> Observed<T> {
    /// Whether a value is present.
    pub const fn is_computed(&self) -> bool {
        matches!(self, Self::Computed(_))
    }

    /// The value, if computed.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Computed(value) => Some(value),
            Self::NotObservable => None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Observed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Computed(value) => value.fmt(f),
            Self::NotObservable => f.pad("-"),
        }
    }
}

/// Churn figures for one cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnRow {
    /// Cohort period label.
    pub period: String,
    /// Number of clients in the cohort.
    pub size: usize,
    /// Cohort clients seen again in any later period.
    pub cumulative_return: Observed<usize>,
    /// `cumulative_return` as a percentage of `size`.
    pub return_percent: Observed<f64>,
    /// Cohort clients never seen again.
    pub churn_count: Observed<usize>,
    /// `churn_count` as a percentage of `size`.
    pub churn_percent: Observed<f64>,
}

/// One [`ChurnRow`] per period, in sequence order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChurnTable {
    rows: Vec<ChurnRow>,
}

impl ChurnTable {
    /// Derive churn from the cohort and accumulation matrices.
    ///
    /// Cumulative return is the accumulation in the last column. The last
    /// cohort keeps its size but every derived field is
    /// [`Observed::NotObservable`].
    pub fn build(cohort: &CohortMatrix, accumulation: &AccumulationMatrix) -> Self {
        let sizes = cohort.diagonal();
        let last = cohort.len().saturating_sub(1);

        let rows = cohort
            .periods()
            .iter()
            .zip(sizes)
            .enumerate()
            .map(|(idx, (period, size))| {
                if idx == last {
                    return ChurnRow {
                        period: period.clone(),
                        size,
                        cumulative_return: Observed::NotObservable,
                        return_percent: Observed::NotObservable,
                        churn_count: Observed::NotObservable,
                        churn_percent: Observed::NotObservable,
                    };
                }

                let returned = accumulation.get(idx, last).unwrap_or(0).min(size);
                let churned = size - returned;
                ChurnRow {
                    period: period.clone(),
                    size,
                    cumulative_return: Observed::Computed(returned),
                    return_percent: Observed::Computed(percent_of(returned, size)),
                    churn_count: Observed::Computed(churned),
                    churn_percent: Observed::Computed(percent_of(churned, size)),
                }
            })
            .collect();

        Self { rows }
    }

    /// All rows.
    pub fn rows(&self) -> &[ChurnRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row of a cohort.
    pub fn get(&self, period: &str) -> Option<&ChurnRow> {
        let period = period.trim();
        self.rows.iter().find(|row| row.period == period)
    }

    /// Iterate over rows.
    pub fn iter(&self) -> std::slice::Iter<'_, ChurnRow> {
        self.rows.iter()
    }

    /// Rows whose derived fields are computed.
    pub fn observed(&self) -> impl Iterator<Item = &ChurnRow> {
        self.rows.iter().filter(|row| row.churn_count.is_computed())
    }
}

impl<'a> IntoIterator for &'a ChurnTable {
    type Item = &'a ChurnRow;
    type IntoIter = std::slice::Iter<'a, ChurnRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    fn labels() -> Vec<String> {
        vec!["2024-01".into(), "2024-02".into(), "2024-03".into()]
    }

    fn table() -> ChurnTable {
        let cohort =
            CohortMatrix::from_values(labels(), array![[4, 2, 1], [0, 0, 0], [0, 0, 2]]).unwrap();
        let acc =
            AccumulationMatrix::from_values(labels(), array![[4, 2, 3], [0, 0, 0], [0, 0, 2]])
                .unwrap();
        ChurnTable::build(&cohort, &acc)
    }

    #[test]
    fn test_closure_and_percentages() {
        let table = table();
        let row = table.get("2024-01").unwrap();

        assert_eq!(row.size, 4);
        assert_eq!(row.cumulative_return, Observed::Computed(3));
        assert_eq!(row.churn_count, Observed::Computed(1));
        assert_relative_eq!(row.return_percent.value().unwrap(), 75.0);
        assert_relative_eq!(row.churn_percent.value().unwrap(), 25.0);
    }

    #[test]
    fn test_empty_cohort_is_zero_not_error() {
        let table = table();
        let row = table.get("2024-02").unwrap();

        assert_eq!(row.size, 0);
        assert_eq!(row.churn_count, Observed::Computed(0));
        assert_eq!(row.churn_percent, Observed::Computed(0.0));
    }

    #[test]
    fn test_last_cohort_is_not_observable() {
        let table = table();
        let row = table.get("2024-03").unwrap();

        assert_eq!(row.size, 2);
        assert_eq!(row.cumulative_return, Observed::NotObservable);
        assert_ne!(row.churn_count, Observed::Computed(0));
        assert_ne!(row.churn_percent, Observed::Computed(0.0));
        assert_eq!(table.observed().count(), 2);
    }

    #[rstest]
    #[case(Observed::Computed(12), "12")]
    #[case(Observed::NotObservable, "-")]
    fn test_display(#[case] value: Observed<usize>, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn test_display_forwards_precision() {
        assert_eq!(format!("{:.1}", Observed::Computed(33.333)), "33.3");
        assert_eq!(format!("{:>3}", Observed::<f64>::NotObservable), "  -");
    }

    #[test]
    fn test_serializes_sentinel_as_null() {
        let json = serde_json::to_string(&Observed::<usize>::NotObservable).unwrap();
        assert_eq!(json, "null");
        let json = serde_json::to_string(&Observed::Computed(3)).unwrap();
        assert_eq!(json, "3");
    }

    #[test]
    fn test_empty_matrices() {
        let table = ChurnTable::build(&CohortMatrix::zeros(vec![]), &AccumulationMatrix::zeros(vec![]));
        assert!(table.is_empty());
    }
}
