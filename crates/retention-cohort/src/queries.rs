//! Client-set drill-down queries.
//!
//! Each query answers "which clients are behind this cell?" for one of the
//! matrices, working directly on the activity sets and cohort assignment.
//! Results are sorted so exports are deterministic. Unknown period labels
//! yield empty results.

use crate::context::CohortContext;
use retention_data::ClientId;
use std::collections::BTreeSet;

/// Read-only client lookups over a [`CohortContext`].
#[derive(Debug, Clone, Copy)]
pub struct ClientSetQueries<'a> {
    context: &'a CohortContext,
}

impl<'a> ClientSetQueries<'a> {
    /// Create queries over a context.
    pub const fn new(context: &'a CohortContext) -> Self {
        Self { context }
    }

    fn position(&self, label: &str) -> Option<usize> {
        self.context.sequence().position(label)
    }

    /// Cohort members active in one period.
    pub(crate) fn returned_at(&self, cohort: usize, target: usize) -> BTreeSet<&'a ClientId> {
        let members = self.context.assignment().members(cohort);
        let active = self.context.activity().clients_in(target);
        members.intersection(active).collect()
    }

    /// Cohort members active in any period after the cohort, up to `target` inclusive.
    pub(crate) fn returned_through(&self, cohort: usize, target: usize) -> BTreeSet<&'a ClientId> {
        ((cohort + 1)..=target)
            .flat_map(|period| self.returned_at(cohort, period))
            .collect()
    }

    /// Cohort members never active after the cohort period.
    pub(crate) fn churned(&self, cohort: usize) -> BTreeSet<&'a ClientId> {
        let members = self.context.assignment().members(cohort);
        let returned = self
            .context
            .sequence()
            .last_index()
            .map(|last| self.returned_through(cohort, last))
            .unwrap_or_default();
        members.iter().filter(|c| !returned.contains(c)).collect()
    }

    /// Clients of `cohort` who were active in `target`.
    ///
    /// `target` may precede the cohort, in which case the result is empty:
    /// no client is active before its own cohort period.
    pub fn cohort_clients_in_period(&self, cohort: &str, target: &str) -> Vec<ClientId> {
        match (self.position(cohort), self.position(target)) {
            (Some(cohort), Some(target)) => collect(self.returned_at(cohort, target)),
            _ => Vec::new(),
        }
    }

    /// Clients of `cohort` who returned in any period after it, up to and
    /// including `target`.
    ///
    /// Empty when `target` is not after `cohort`.
    pub fn accumulation_clients(&self, cohort: &str, target: &str) -> Vec<ClientId> {
        match (self.position(cohort), self.position(target)) {
            (Some(cohort), Some(target)) if target > cohort => {
                collect(self.returned_through(cohort, target))
            }
            _ => Vec::new(),
        }
    }

    /// Clients of `cohort` who never returned after it.
    ///
    /// For the last period there is nothing to return to, so every member is
    /// listed.
    pub fn churn_clients(&self, cohort: &str) -> Vec<ClientId> {
        self.position(cohort)
            .map(|cohort| collect(self.churned(cohort)))
            .unwrap_or_default()
    }

    /// Clients of `cohort` whose first return happened exactly in `target`.
    ///
    /// Over all periods after the cohort these sets are disjoint and their
    /// union is the accumulation through the last period.
    pub fn inflow_clients(&self, cohort: &str, target: &str) -> Vec<ClientId> {
        let (Some(cohort), Some(target)) = (self.position(cohort), self.position(target)) else {
            return Vec::new();
        };
        if target <= cohort {
            return Vec::new();
        }

        let returned = self.returned_at(cohort, target);
        if target == cohort + 1 {
            return collect(returned);
        }

        let earlier = self.returned_through(cohort, target - 1);
        collect(returned.difference(&earlier).copied())
    }
}

fn collect<'a>(clients: impl IntoIterator<Item = &'a ClientId>) -> Vec<ClientId> {
    clients.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use retention_data::ActivityRow;

    /// P1={A,B,C}, P2={A,D}, P3={A,B,D,E}
    fn scenario() -> CohortContext {
        let rows: Vec<ActivityRow> = [
            ("P1", "A"),
            ("P1", "B"),
            ("P1", "C"),
            ("P2", "A"),
            ("P2", "D"),
            ("P3", "A"),
            ("P3", "B"),
            ("P3", "D"),
            ("P3", "E"),
        ]
        .iter()
        .filter_map(|(p, c)| ActivityRow::from_raw(p, c))
        .collect();
        CohortContext::from_rows(&rows)
    }

    fn ids(values: &[&str]) -> Vec<ClientId> {
        values.iter().map(|v| ClientId::from(*v)).collect()
    }

    #[test]
    fn test_cohort_clients_in_period() {
        let context = scenario();
        let queries = context.queries();

        assert_eq!(queries.cohort_clients_in_period("P1", "P1"), ids(&["A", "B", "C"]));
        assert_eq!(queries.cohort_clients_in_period("P1", "P2"), ids(&["A"]));
        assert_eq!(queries.cohort_clients_in_period("P1", "P3"), ids(&["A", "B"]));
        assert!(queries.cohort_clients_in_period("P2", "P1").is_empty());
        assert!(queries.cohort_clients_in_period("P9", "P1").is_empty());
    }

    #[test]
    fn test_accumulation_clients() {
        let context = scenario();
        let queries = context.queries();

        assert_eq!(queries.accumulation_clients("P1", "P2"), ids(&["A"]));
        assert_eq!(queries.accumulation_clients("P1", "P3"), ids(&["A", "B"]));
        assert_eq!(queries.accumulation_clients("P2", "P3"), ids(&["D"]));
        assert!(queries.accumulation_clients("P1", "P1").is_empty());
        assert!(queries.accumulation_clients("P3", "P1").is_empty());
    }

    #[test]
    fn test_churn_clients() {
        let context = scenario();
        let queries = context.queries();

        assert_eq!(queries.churn_clients("P1"), ids(&["C"]));
        assert!(queries.churn_clients("P2").is_empty());
        assert_eq!(queries.churn_clients("P3"), ids(&["E"]));
        assert!(queries.churn_clients("missing").is_empty());
    }

    #[test]
    fn test_inflow_clients() {
        let context = scenario();
        let queries = context.queries();

        assert_eq!(queries.inflow_clients("P1", "P2"), ids(&["A"]));
        assert_eq!(queries.inflow_clients("P1", "P3"), ids(&["B"]));
        assert_eq!(queries.inflow_clients("P2", "P3"), ids(&["D"]));
        assert!(queries.inflow_clients("P2", "P2").is_empty());
        assert!(queries.inflow_clients("P3", "P2").is_empty());
    }

    #[test]
    fn test_inflow_partitions_accumulation() {
        let context = scenario();
        let queries = context.queries();
        let labels = context.sequence().labels();
        let last = labels.last().unwrap();

        for (idx, cohort) in labels.iter().enumerate() {
            let mut union = BTreeSet::new();
            for target in &labels[idx + 1..] {
                for client in queries.inflow_clients(cohort, target) {
                    assert!(union.insert(client), "client counted twice for {cohort}");
                }
            }
            let accumulated: BTreeSet<_> =
                queries.accumulation_clients(cohort, last).into_iter().collect();
            assert_eq!(union, accumulated);
        }
    }
}
