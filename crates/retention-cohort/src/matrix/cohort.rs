use super::CohortMatrix;
use crate::context::CohortContext;

/// Count, for every cohort and every later period, the cohort clients active
/// in that period.
///
/// The diagonal is the cohort size. Cells before the diagonal stay zero since
/// no client is active before its own cohort period.
pub fn build_cohort_matrix(context: &CohortContext) -> CohortMatrix {
    let mut matrix = CohortMatrix::zeros(context.sequence().labels());
    let queries = context.queries();

    for cohort in 0..matrix.len() {
        matrix.set(cohort, cohort, context.assignment().size(cohort));
        for target in (cohort + 1)..matrix.len() {
            matrix.set(cohort, target, queries.returned_at(cohort, target).len());
        }
    }

    tracing::debug!(periods = matrix.len(), "built cohort matrix");
    matrix
}

/// Row counts per period on the diagonal, zero elsewhere.
///
/// Duplicate rows for the same client are counted.
pub fn build_record_count_matrix(context: &CohortContext) -> CohortMatrix {
    let mut matrix = CohortMatrix::zeros(context.sequence().labels());
    for period in 0..matrix.len() {
        matrix.set(period, period, context.activity().record_count(period));
    }
    matrix
}
