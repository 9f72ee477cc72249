use super::{AccumulationPercentMatrix, InflowMatrix};

/// First difference of each percent row after the diagonal.
///
/// The cell right after the diagonal equals the percent value there; later
/// cells are the increase over the previous column. The diagonal and
/// everything before it are zero, so summing a row gives the row's last
/// percent value.
pub fn build_inflow_matrix(percent: &AccumulationPercentMatrix) -> InflowMatrix {
    let mut matrix = InflowMatrix::zeros(percent.periods().to_vec());

    for cohort in 0..matrix.len() {
        for target in (cohort + 1)..matrix.len() {
            let current = percent.get(cohort, target).unwrap_or(0.0);
            let value = if target == cohort + 1 {
                current
            } else {
                current - percent.get(cohort, target - 1).unwrap_or(0.0)
            };
            matrix.set(cohort, target, value);
        }
    }

    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_inflow_telescopes() {
        let labels: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let percent = AccumulationPercentMatrix::from_values(
            labels,
            array![
                [100.0, 10.0, 25.0, 40.0],
                [0.0, 100.0, 50.0, 50.0],
                [0.0, 0.0, 100.0, 0.0],
                [0.0, 0.0, 0.0, 100.0],
            ],
        )
        .unwrap();
        let inflow = build_inflow_matrix(&percent);

        assert_eq!(inflow.row(0).unwrap().to_vec(), vec![0.0, 10.0, 15.0, 15.0]);
        assert_eq!(inflow.row(1).unwrap().to_vec(), vec![0.0, 0.0, 50.0, 0.0]);
        assert_eq!(inflow.diagonal(), vec![0.0; 4]);
        let sum: f64 = inflow.row(0).unwrap().sum();
        assert_relative_eq!(sum, 40.0);
    }
}
