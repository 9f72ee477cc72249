use super::AccumulationMatrix;
use crate::context::CohortContext;
use std::collections::BTreeSet;

/// Running union of returning cohort clients, left to right.
///
/// The diagonal is the cohort size; each later cell counts the cohort clients
/// seen in any period after the cohort up to that column, so a row never
/// decreases.
pub fn build_accumulation_matrix(context: &CohortContext) -> AccumulationMatrix {
    let mut matrix = AccumulationMatrix::zeros(context.sequence().labels());
    let queries = context.queries();

    for cohort in 0..matrix.len() {
        matrix.set(cohort, cohort, context.assignment().size(cohort));

        let mut returned = BTreeSet::new();
        for target in (cohort + 1)..matrix.len() {
            returned.extend(queries.returned_at(cohort, target));
            matrix.set(cohort, target, returned.len());
        }
    }

    tracing::debug!(periods = matrix.len(), "built accumulation matrix");
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use retention_data::ActivityRow;

    #[test]
    fn test_accumulation_is_a_union_not_a_sum() {
        let rows: Vec<ActivityRow> = [
            ("2024-01", "A"),
            ("2024-01", "B"),
            ("2024-02", "A"),
            ("2024-03", "A"),
            ("2024-04", "B"),
        ]
        .iter()
        .filter_map(|(p, c)| ActivityRow::from_raw(p, c))
        .collect();
        let matrix = build_accumulation_matrix(&CohortContext::from_rows(&rows));

        let first = matrix.row(0).unwrap().to_vec();
        assert_eq!(first, vec![2, 1, 1, 2]);
        assert!(first[1..].windows(2).all(|w| w[0] <= w[1]));
    }
}
