//! Canonical period ordering.
//!
//! The sequence is computed once per run and its indices are the only notion
//! of "before" and "after" used by the rest of the engine.

use super::{Period, PeriodKind};
use std::collections::{HashMap, HashSet};

/// Distinct periods of a dataset in canonical ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodSequence {
    periods: Vec<Period>,
    positions: HashMap<String, usize>,
}

impl PeriodSequence {
    /// Order the distinct labels of a dataset.
    ///
    /// Parsed periods are sorted by key; periods sharing a key keep the order
    /// in which they first appear. Unparsable labels follow, sorted
    /// lexically. Duplicates and surrounding whitespace are ignored.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut distinct = Vec::new();
        for label in labels {
            let period = Period::parse(label.as_ref());
            if !period.label.is_empty() && seen.insert(period.label.clone()) {
                distinct.push(period);
            }
        }

        let (mut valid, mut invalid): (Vec<Period>, Vec<Period>) =
            distinct.into_iter().partition(Period::is_parsed);

        valid.sort_by_key(|period| period.key);
        invalid.sort_by(|a, b| a.label.cmp(&b.label));

        if !invalid.is_empty() {
            let sample: Vec<&str> = invalid.iter().take(5).map(|p| p.label.as_str()).collect();
            tracing::warn!(
                count = invalid.len(),
                ?sample,
                "unparsable period labels placed at the end of the ordering"
            );
        }

        valid.extend(invalid);
        Self::from_ordered(valid)
    }

    fn from_ordered(periods: Vec<Period>) -> Self {
        let positions = periods
            .iter()
            .enumerate()
            .map(|(idx, period)| (period.label.clone(), idx))
            .collect();
        Self { periods, positions }
    }

    /// Number of periods.
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Whether the sequence has no periods.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Period at a position.
    pub fn get(&self, idx: usize) -> Option<&Period> {
        self.periods.get(idx)
    }

    /// Label at a position.
    pub fn label(&self, idx: usize) -> Option<&str> {
        self.periods.get(idx).map(|period| period.label.as_str())
    }

    /// Position of a label in the ordering.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.positions.get(label.trim()).copied()
    }

    /// Whether the label is one of the periods.
    pub fn contains(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    /// All periods in order.
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// All labels in order.
    pub fn labels(&self) -> Vec<String> {
        self.periods.iter().map(|p| p.label.clone()).collect()
    }

    /// Iterate over the periods in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Period> {
        self.periods.iter()
    }

    /// The earliest period.
    pub fn first(&self) -> Option<&Period> {
        self.periods.first()
    }

    /// The latest period.
    pub fn last(&self) -> Option<&Period> {
        self.periods.last()
    }

    /// Position of the latest period.
    pub fn last_index(&self) -> Option<usize> {
        self.periods.len().checked_sub(1)
    }

    /// Periods strictly after a position.
    pub fn after(&self, idx: usize) -> &[Period] {
        self.periods.get(idx + 1..).unwrap_or(&[])
    }

    /// Granularity of the dataset, judged by its first period.
    ///
    /// Defaults to months when the sequence is empty or the first label is
    /// unparsable.
    pub fn kind(&self) -> PeriodKind {
        self.first()
            .and_then(Period::kind)
            .unwrap_or(PeriodKind::Month)
    }
}

impl<'a> IntoIterator for &'a PeriodSequence {
    type Item = &'a Period;
    type IntoIter = std::slice::Iter<'a, Period>;

    fn into_iter(self) -> Self::IntoIter {
        self.periods.iter()
    }
}
