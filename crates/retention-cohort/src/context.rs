//! The immutable state of one computation run.

use crate::activity::ActivityIndex;
use crate::assign::CohortAssignment;
use crate::period::PeriodSequence;
use crate::queries::ClientSetQueries;
use retention_data::{ActivityRow, ActivityTable};

/// Period ordering, activity sets and cohort assignment for one dataset.
///
/// Built once from a snapshot of the activity rows and passed by reference to
/// every matrix builder and query. Nothing in it changes after construction,
/// so rebuilding from the same rows always yields the same context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CohortContext {
    sequence: PeriodSequence,
    activity: ActivityIndex,
    assignment: CohortAssignment,
}

impl CohortContext {
    /// Build a context from normalized rows.
    pub fn from_rows(rows: &[ActivityRow]) -> Self {
        let sequence = PeriodSequence::from_labels(rows.iter().map(|row| row.period.as_str()));
        let activity = ActivityIndex::build(&sequence, rows);
        let assignment = CohortAssignment::assign(&activity);

        Self {
            sequence,
            activity,
            assignment,
        }
    }

    /// Build a context from a validated activity table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table's columns cannot be read as strings.
    pub fn from_table(table: &ActivityTable) -> retention_data::Result<Self> {
        let rows = table.rows()?;
        Ok(Self::from_rows(&rows))
    }

    /// The canonical period ordering.
    pub const fn sequence(&self) -> &PeriodSequence {
        &self.sequence
    }

    /// Per-period activity sets.
    pub const fn activity(&self) -> &ActivityIndex {
        &self.activity
    }

    /// Client to cohort assignment.
    pub const fn assignment(&self) -> &CohortAssignment {
        &self.assignment
    }

    /// Number of periods.
    pub fn period_count(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the dataset had no usable rows.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Drill-down queries over this context.
    pub const fn queries(&self) -> ClientSetQueries<'_> {
        ClientSetQueries::new(self)
    }
}
