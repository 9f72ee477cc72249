//! Cohort assignment by first active period.

use crate::activity::ActivityIndex;
use retention_data::ClientId;
use std::collections::{BTreeSet, HashMap};

static EMPTY: BTreeSet<ClientId> = BTreeSet::new();

/// Every client's cohort, and every cohort's clients.
///
/// A client's cohort is the earliest period (by sequence position) in which
/// it was active. Cohorts are pairwise disjoint and together cover every
/// client in the [`ActivityIndex`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CohortAssignment {
    client_cohort: HashMap<ClientId, usize>,
    cohorts: Vec<BTreeSet<ClientId>>,
}

impl CohortAssignment {
    /// Assign each client to its first active period.
    pub fn assign(activity: &ActivityIndex) -> Self {
        let mut cohorts = vec![BTreeSet::new(); activity.len()];
        let mut client_cohort = HashMap::new();

        for (client, periods) in activity.client_periods() {
            let Some(&first) = periods.iter().min() else {
                continue;
            };
            cohorts[first].insert(client.clone());
            client_cohort.insert(client.clone(), first);
        }

        tracing::debug!(
            clients = client_cohort.len(),
            cohorts = cohorts.iter().filter(|c| !c.is_empty()).count(),
            "assigned clients to cohorts"
        );

        Self {
            client_cohort,
            cohorts,
        }
    }

    /// The cohort position of a client.
    pub fn cohort_of(&self, client: &ClientId) -> Option<usize> {
        self.client_cohort.get(client).copied()
    }

    /// Clients whose first period is the given position.
    pub fn members(&self, cohort: usize) -> &BTreeSet<ClientId> {
        self.cohorts.get(cohort).unwrap_or(&EMPTY)
    }

    /// Number of clients in a cohort.
    pub fn size(&self, cohort: usize) -> usize {
        self.members(cohort).len()
    }

    /// Number of cohorts, one per period (possibly empty).
    pub fn len(&self) -> usize {
        self.cohorts.len()
    }

    /// Whether there are no cohorts.
    pub fn is_empty(&self) -> bool {
        self.cohorts.is_empty()
    }

    /// Total number of assigned clients.
    pub fn client_count(&self) -> usize {
        self.client_cohort.len()
    }

    /// Iterate over `(position, members)` pairs in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &BTreeSet<ClientId>)> {
        self.cohorts.iter().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PeriodSequence;
    use retention_data::ActivityRow;

    fn assignment(pairs: &[(&str, &str)]) -> (PeriodSequence, CohortAssignment) {
        let rows: Vec<ActivityRow> = pairs
            .iter()
            .filter_map(|(p, c)| ActivityRow::from_raw(p, c))
            .collect();
        let sequence = PeriodSequence::from_labels(rows.iter().map(|r| r.period.as_str()));
        let activity = ActivityIndex::build(&sequence, &rows);
        (sequence, CohortAssignment::assign(&activity))
    }

    #[test]
    fn test_first_period_wins_regardless_of_row_order() {
        let (sequence, assignment) =
            assignment(&[("2024-03", "A"), ("2024-01", "A"), ("2024-02", "B")]);

        let jan = sequence.position("2024-01").unwrap();
        let feb = sequence.position("2024-02").unwrap();
        assert_eq!(assignment.cohort_of(&ClientId::from("A")), Some(jan));
        assert_eq!(assignment.cohort_of(&ClientId::from("B")), Some(feb));
        assert_eq!(assignment.size(jan), 1);
        assert_eq!(assignment.size(sequence.position("2024-03").unwrap()), 0);
    }

    #[test]
    fn test_partition_covers_universe() {
        let (_, assignment) = assignment(&[
            ("2024-01", "A"),
            ("2024-01", "B"),
            ("2024-02", "A"),
            ("2024-02", "C"),
            ("2024-03", "D"),
            ("2024-03", "B"),
        ]);

        let total: usize = assignment.iter().map(|(_, members)| members.len()).sum();
        assert_eq!(total, 4);
        assert_eq!(assignment.client_count(), 4);

        let mut seen = BTreeSet::new();
        for (_, members) in assignment.iter() {
            for client in members {
                assert!(seen.insert(client.clone()), "{client} in two cohorts");
            }
        }
    }

    #[test]
    fn test_unknown_cohort_is_empty() {
        let (_, assignment) = assignment(&[("2024-01", "A")]);
        assert!(assignment.members(5).is_empty());
        assert_eq!(assignment.cohort_of(&ClientId::from("Z")), None);
    }
}
