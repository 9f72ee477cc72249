use super::{AccumulationMatrix, AccumulationPercentMatrix, CohortMatrix};

/// Accumulation as a percentage of the cohort size.
///
/// The divisor is the diagonal of the cohort matrix. Rows of empty cohorts
/// are all zero.
pub fn build_accumulation_percent_matrix(
    accumulation: &AccumulationMatrix,
    cohort: &CohortMatrix,
) -> AccumulationPercentMatrix {
    let sizes = cohort.diagonal();
    let mut matrix = AccumulationPercentMatrix::zeros(accumulation.periods().to_vec());

    for (row, &size) in sizes.iter().enumerate().take(matrix.len()) {
        if size == 0 {
            continue;
        }
        for col in 0..matrix.len() {
            let count = accumulation.get(row, col).unwrap_or(0);
            matrix.set(row, col, percent_of(count, size));
        }
    }

    matrix
}

/// `part / whole * 100`, zero when `whole` is zero.
pub(crate) const fn percent_of(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
