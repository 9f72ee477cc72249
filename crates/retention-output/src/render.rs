//! Plain-text tables for terminal output.

use retention_cohort::{CategoryPresence, ChurnTable, NetworkChurnTable, PeriodMatrix};
use std::fmt::Display;

/// Render as a fixed-width text table.
pub trait AsciiTable {
    /// Format as ASCII table for terminal display.
    fn to_ascii_table(&self) -> String;
}

fn column_width<'a>(cells: impl Iterator<Item = &'a String>, min: usize) -> usize {
    cells.map(|c| c.chars().count()).max().unwrap_or(0).max(min)
}

fn pad_left(cell: &str, width: usize) -> String {
    format!("{cell:>width$}")
}

fn pad_right(cell: &str, width: usize) -> String {
    format!("{cell:<width$}")
}

/// Lay out a header and rows; the first column is left aligned, the rest right.
fn layout(header: &[String], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = (0..header.len())
        .map(|col| {
            column_width(
                std::iter::once(&header[col]).chain(rows.iter().filter_map(|r| r.get(col))),
                1,
            )
        })
        .collect();

    let render = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(idx, (cell, &width))| {
                if idx == 0 {
                    pad_right(cell, width)
                } else {
                    pad_left(cell, width)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    let mut output = String::new();
    output.push_str(&render(header));
    output.push('\n');
    output.push_str(&"-".repeat(total));
    output.push('\n');
    for row in rows {
        output.push_str(&render(row));
        output.push('\n');
    }
    output
}

/// Matrix cells formatted with a fixed number of decimals.
#[derive(Debug, Clone, Copy)]
pub struct MatrixTable<'a, T> {
    matrix: &'a PeriodMatrix<T>,
    precision: usize,
}

impl<'a, T> MatrixTable<'a, T> {
    /// Render `matrix` with `precision` decimals.
    pub const fn new(matrix: &'a PeriodMatrix<T>, precision: usize) -> Self {
        Self { matrix, precision }
    }
}

impl<T: Copy + Default + Display> AsciiTable for MatrixTable<'_, T> {
    fn to_ascii_table(&self) -> String {
        let periods = self.matrix.periods();
        let mut header = vec!["cohort".to_string()];
        header.extend(periods.iter().cloned());

        let precision = self.precision;
        let rows: Vec<Vec<String>> = periods
            .iter()
            .zip(self.matrix.to_rows())
            .enumerate()
            .map(|(idx, (period, values))| {
                let mut row = vec![period.clone()];
                row.extend(values.iter().enumerate().map(|(col, value)| {
                    if col < idx {
                        String::new()
                    } else {
                        format!("{value:.precision$}")
                    }
                }));
                row
            })
            .collect();

        layout(&header, &rows)
    }
}

impl AsciiTable for PeriodMatrix<usize> {
    fn to_ascii_table(&self) -> String {
        MatrixTable::new(self, 0).to_ascii_table()
    }
}

impl AsciiTable for PeriodMatrix<f64> {
    fn to_ascii_table(&self) -> String {
        MatrixTable::new(self, 2).to_ascii_table()
    }
}

impl AsciiTable for ChurnTable {
    fn to_ascii_table(&self) -> String {
        let header: Vec<String> = ["cohort", "size", "returned", "return %", "churn", "churn %"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows: Vec<Vec<String>> = self
            .iter()
            .map(|row| {
                vec![
                    row.period.clone(),
                    row.size.to_string(),
                    row.cumulative_return.to_string(),
                    format!("{:.1}", row.return_percent),
                    row.churn_count.to_string(),
                    format!("{:.1}", row.churn_percent),
                ]
            })
            .collect();
        layout(&header, &rows)
    }
}

impl AsciiTable for NetworkChurnTable {
    fn to_ascii_table(&self) -> String {
        let header: Vec<String> = [
            "cohort",
            "size",
            "churn",
            "elsewhere",
            "elsewhere %",
            "network churn",
            "network %",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let rows: Vec<Vec<String>> = self
            .rows()
            .iter()
            .map(|row| {
                vec![
                    row.period.clone(),
                    row.size.to_string(),
                    row.churn_count.to_string(),
                    row.present_count.to_string(),
                    format!("{:.1}", row.present_percent),
                    row.network_churn.to_string(),
                    format!("{:.1}", row.network_churn_percent),
                ]
            })
            .collect();
        layout(&header, &rows)
    }
}

impl AsciiTable for CategoryPresence {
    fn to_ascii_table(&self) -> String {
        let mut header = vec!["category".to_string()];
        header.extend(self.periods.iter().cloned());
        header.push("total".to_string());

        let mut rows: Vec<Vec<String>> = self
            .categories
            .iter()
            .zip(&self.counts)
            .zip(&self.category_totals)
            .map(|((category, counts), total)| {
                let mut row = vec![category.clone()];
                row.extend(counts.iter().map(ToString::to_string));
                row.push(total.to_string());
                row
            })
            .collect();

        let mut totals = vec!["total".to_string()];
        totals.extend(self.period_totals.iter().map(ToString::to_string));
        totals.push(self.total.to_string());
        rows.push(totals);

        format!("Cohort {}\n{}", self.cohort, layout(&header, &rows))
    }
}
