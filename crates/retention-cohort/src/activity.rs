//! Per-period activity sets.

use crate::period::PeriodSequence;
use retention_data::{ActivityRow, ClientId};
use std::collections::{BTreeSet, HashMap};

static EMPTY: BTreeSet<ClientId> = BTreeSet::new();

/// Which clients were active in each period.
///
/// Indexed by position in the [`PeriodSequence`]; every period has an entry,
/// empty when no row matched it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityIndex {
    sets: Vec<BTreeSet<ClientId>>,
    records: Vec<usize>,
}

impl ActivityIndex {
    /// Group rows by period.
    ///
    /// Rows whose period is not in the sequence are ignored.
    pub fn build<'a>(
        sequence: &PeriodSequence,
        rows: impl IntoIterator<Item = &'a ActivityRow>,
    ) -> Self {
        let mut sets = vec![BTreeSet::new(); sequence.len()];
        let mut records = vec![0; sequence.len()];

        for row in rows {
            let Some(idx) = sequence.position(&row.period) else {
                continue;
            };
            sets[idx].insert(row.client.clone());
            records[idx] += 1;
        }

        tracing::debug!(
            periods = sets.len(),
            records = records.iter().sum::<usize>(),
            "built activity index"
        );

        Self { sets, records }
    }

    /// Number of periods covered.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether no periods are covered.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Distinct clients active in a period; empty for an unknown position.
    pub fn clients_in(&self, period: usize) -> &BTreeSet<ClientId> {
        self.sets.get(period).unwrap_or(&EMPTY)
    }

    /// Number of rows recorded for a period, duplicates included.
    pub fn record_count(&self, period: usize) -> usize {
        self.records.get(period).copied().unwrap_or(0)
    }

    /// Positions of the periods each client was active in, ascending.
    pub fn client_periods(&self) -> HashMap<&ClientId, Vec<usize>> {
        let mut view: HashMap<&ClientId, Vec<usize>> = HashMap::new();
        for (idx, clients) in self.sets.iter().enumerate() {
            for client in clients {
                view.entry(client).or_default().push(idx);
            }
        }
        view
    }

    /// Every client active in any period.
    pub fn universe(&self) -> BTreeSet<&ClientId> {
        self.sets.iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(pairs: &[(&str, &str)]) -> Vec<ActivityRow> {
        pairs
            .iter()
            .filter_map(|(p, c)| ActivityRow::from_raw(p, c))
            .collect()
    }

    #[test]
    fn test_build_groups_unique_clients() {
        let rows = rows(&[
            ("2024-01", "A"),
            ("2024-01", "A"),
            ("2024-01", "B"),
            ("2024-03", "A"),
        ]);
        let sequence = PeriodSequence::from_labels(["2024-01", "2024-02", "2024-03"]);
        let index = ActivityIndex::build(&sequence, &rows);

        assert_eq!(index.len(), 3);
        assert_eq!(index.clients_in(0).len(), 2);
        assert_eq!(index.record_count(0), 3);
        assert!(index.clients_in(1).is_empty());
        assert_eq!(index.record_count(1), 0);
        assert!(index.clients_in(2).contains(&ClientId::from("A")));
        assert!(index.clients_in(99).is_empty());
    }

    #[test]
    fn test_client_periods_reverse_view() {
        let rows = rows(&[("2024-02", "A"), ("2024-01", "A"), ("2024-02", "B")]);
        let sequence = PeriodSequence::from_labels(rows.iter().map(|r| r.period.as_str()));
        let index = ActivityIndex::build(&sequence, &rows);

        let view = index.client_periods();
        assert_eq!(view[&ClientId::from("A")], vec![0, 1]);
        assert_eq!(view[&ClientId::from("B")], vec![1]);
        assert_eq!(index.universe().len(), 2);
    }
}
