//! Period-indexed square matrices.
//!
//! Rows are cohorts and columns are target periods, both in sequence order.
//! Every builder here is a pure function of a [`CohortContext`] or of a
//! previously built matrix.
//!
//! [`CohortContext`]: crate::CohortContext

mod accumulation;
mod cohort;
mod inflow;
mod percent;

pub use accumulation::build_accumulation_matrix;
pub use cohort::{build_cohort_matrix, build_record_count_matrix};
pub use inflow::build_inflow_matrix;
pub use percent::build_accumulation_percent_matrix;
pub(crate) use percent::percent_of;

use ndarray::{Array2, ArrayView1};

/// A square matrix whose rows and columns are both labelled by periods.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodMatrix<T> {
    periods: Vec<String>,
    values: Array2<T>,
}

/// Distinct cohort clients (or record counts) active per period.
pub type CohortMatrix = PeriodMatrix<usize>;

/// Running union of returning cohort clients.
pub type AccumulationMatrix = PeriodMatrix<usize>;

/// Accumulation as a percentage of cohort size.
pub type AccumulationPercentMatrix = PeriodMatrix<f64>;

/// Period-over-period increase of the accumulation percentage.
pub type InflowMatrix = PeriodMatrix<f64>;

impl<T: Copy + Default> PeriodMatrix<T> {
    /// A matrix of default values (zero for numbers).
    pub fn zeros(periods: Vec<String>) -> Self {
        let n = periods.len();
        Self {
            periods,
            values: Array2::default((n, n)),
        }
    }

    /// Wrap existing values.
    ///
    /// Returns `None` unless `values` is square with one row per period.
    pub fn from_values(periods: Vec<String>, values: Array2<T>) -> Option<Self> {
        let n = periods.len();
        (values.dim() == (n, n)).then_some(Self { periods, values })
    }

    /// Row and column labels.
    pub fn periods(&self) -> &[String] {
        &self.periods
    }

    /// The underlying values.
    pub const fn values(&self) -> &Array2<T> {
        &self.values
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, value: T) {
        self.values[[row, col]] = value;
    }

    /// Number of periods.
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Whether the matrix has no periods.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Position of a period label.
    pub fn position(&self, label: &str) -> Option<usize> {
        let label = label.trim();
        self.periods.iter().position(|p| p == label)
    }

    /// Value at a `(cohort, target)` position.
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        self.values.get((row, col)).copied()
    }

    /// Value at a `(cohort, target)` pair of labels.
    pub fn cell(&self, cohort: &str, target: &str) -> Option<T> {
        self.get(self.position(cohort)?, self.position(target)?)
    }

    /// One cohort row.
    pub fn row(&self, row: usize) -> Option<ArrayView1<'_, T>> {
        (row < self.len()).then(|| self.values.row(row))
    }

    /// The diagonal, one value per cohort.
    pub fn diagonal(&self) -> Vec<T> {
        self.values.diag().to_vec()
    }

    /// Values as nested rows, for serialization.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.values.outer_iter().map(|row| row.to_vec()).collect()
    }
}
