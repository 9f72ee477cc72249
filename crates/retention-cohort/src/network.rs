//! Network churn: cohort churn that is not compensated by activity in other
//! categories.
//!
//! A client that stops buying in the analysed category may still be active
//! elsewhere in the network. Given a second table of `(category, period,
//! client)` rows, this module counts how many churned clients appear in any
//! category after their cohort period, and how many are gone altogether.

use crate::churn::Observed;
use crate::context::CohortContext;
use crate::matrix::percent_of;
use crate::period::normalize_for_compare;
use ndarray::Array2;
use retention_data::{CategoryRow, CategoryTable, ClientId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CategoryClients {
    by_period: HashMap<String, BTreeSet<ClientId>>,
    all: BTreeSet<ClientId>,
}

/// Clients per category, optionally per period.
///
/// Periods are stored in their comparison form so labels written differently
/// in the two files still match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryActivity {
    categories: BTreeMap<String, CategoryClients>,
    has_periods: bool,
}

impl CategoryActivity {
    /// Group normalized rows by category and period.
    ///
    /// Rows with a period make the activity period-aware; without any, every
    /// appearance counts regardless of timing.
    pub fn from_rows(rows: &[CategoryRow]) -> Self {
        let mut categories: BTreeMap<String, CategoryClients> = BTreeMap::new();
        let mut has_periods = false;

        for row in rows {
            let entry = categories.entry(row.category.clone()).or_default();
            entry.all.insert(row.client.clone());
            if let Some(period) = &row.period {
                has_periods = true;
                entry
                    .by_period
                    .entry(normalize_for_compare(period))
                    .or_default()
                    .insert(row.client.clone());
            }
        }

        tracing::debug!(
            categories = categories.len(),
            has_periods,
            "built category activity"
        );

        Self {
            categories,
            has_periods,
        }
    }

    /// Build from a validated category table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table's columns cannot be read as strings.
    pub fn from_table(table: &CategoryTable) -> retention_data::Result<Self> {
        let rows = table.rows()?;
        let mut activity = Self::from_rows(&rows);
        activity.has_periods = table.has_periods();
        Ok(activity)
    }

    /// Category names, sorted.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether there are no categories.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Whether rows are matched by period.
    pub const fn has_periods(&self) -> bool {
        self.has_periods
    }

    fn clients_in(&self, category: &str, period: &str) -> Option<&BTreeSet<ClientId>> {
        let clients = self.categories.get(category)?;
        if self.has_periods {
            clients.by_period.get(&normalize_for_compare(period))
        } else {
            Some(&clients.all)
        }
    }

    /// Clients seen in any category in any of the given periods.
    fn clients_during<'a>(&'a self, periods: &[String]) -> HashSet<&'a ClientId> {
        if !self.has_periods {
            return self.categories.values().flat_map(|c| &c.all).collect();
        }
        let wanted: HashSet<String> = periods.iter().map(|p| normalize_for_compare(p)).collect();
        self.categories
            .values()
            .flat_map(|c| c.by_period.iter())
            .filter(|(period, _)| wanted.contains(*period))
            .flat_map(|(_, clients)| clients)
            .collect()
    }
}

/// Network churn figures for one cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkChurnRow {
    /// Cohort period label.
    pub period: String,
    /// Number of clients in the cohort.
    pub size: usize,
    /// Cohort clients never seen again in the analysed category.
    pub churn_count: Observed<usize>,
    /// Churned clients seen in another category after the cohort period.
    pub present_count: Observed<usize>,
    /// `present_count` as a percentage of `size`.
    pub present_percent: Observed<f64>,
    /// Churned clients not seen anywhere after the cohort period.
    pub network_churn: Observed<usize>,
    /// `network_churn` as a percentage of `size`.
    pub network_churn_percent: Observed<f64>,
}

/// One [`NetworkChurnRow`] per period, in sequence order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkChurnTable {
    rows: Vec<NetworkChurnRow>,
}

impl NetworkChurnTable {
    /// Compute network churn for every cohort.
    ///
    /// The last cohort has no later periods, so its derived fields are
    /// [`Observed::NotObservable`].
    pub fn build(context: &CohortContext, categories: &CategoryActivity) -> Self {
        let sequence = context.sequence();
        let last = sequence.last_index();

        let rows = (0..sequence.len())
            .map(|cohort| {
                let period = sequence.label(cohort).unwrap_or_default().to_string();
                let size = context.assignment().size(cohort);
                if Some(cohort) == last {
                    return NetworkChurnRow {
                        period,
                        size,
                        churn_count: Observed::NotObservable,
                        present_count: Observed::NotObservable,
                        present_percent: Observed::NotObservable,
                        network_churn: Observed::NotObservable,
                        network_churn_percent: Observed::NotObservable,
                    };
                }

                let split = ChurnSplit::compute(context, categories, cohort);
                let churned = split.churned.len();
                let present = split.present.len();
                let network = churned.saturating_sub(present);
                NetworkChurnRow {
                    period,
                    size,
                    churn_count: Observed::Computed(churned),
                    present_count: Observed::Computed(present),
                    present_percent: Observed::Computed(percent_of(present, size)),
                    network_churn: Observed::Computed(network),
                    network_churn_percent: Observed::Computed(percent_of(network, size)),
                }
            })
            .collect();

        Self { rows }
    }

    /// All rows.
    pub fn rows(&self) -> &[NetworkChurnRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row of a cohort.
    pub fn get(&self, period: &str) -> Option<&NetworkChurnRow> {
        let period = period.trim();
        self.rows.iter().find(|row| row.period == period)
    }
}

struct ChurnSplit<'a> {
    churned: BTreeSet<&'a ClientId>,
    present: BTreeSet<&'a ClientId>,
}

impl<'a> ChurnSplit<'a> {
    fn compute(context: &'a CohortContext, categories: &'a CategoryActivity, cohort: usize) -> Self {
        let churned = context.queries().churned(cohort);
        let after: Vec<String> = context
            .sequence()
            .after(cohort)
            .iter()
            .map(|p| p.label.clone())
            .collect();

        let seen = categories.clients_during(&after);
        let present = churned.iter().filter(|c| seen.contains(*c)).copied().collect();

        Self { churned, present }
    }
}

/// Churned clients of a cohort who are not active in any category after it.
///
/// Sorted. Empty for an unknown cohort.
pub fn network_churn_clients(
    context: &CohortContext,
    categories: &CategoryActivity,
    cohort: &str,
) -> Vec<ClientId> {
    let Some(cohort) = context.sequence().position(cohort) else {
        return Vec::new();
    };
    let split = ChurnSplit::compute(context, categories, cohort);
    split
        .churned
        .difference(&split.present)
        .map(|c| (*c).clone())
        .collect()
}

/// Where a cohort's churned clients show up: categories by later periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPresence {
    /// Cohort period label.
    pub cohort: String,
    /// Category names, sorted.
    pub categories: Vec<String>,
    /// Periods after the cohort, in sequence order.
    pub periods: Vec<String>,
    /// One row per category, one column per period: churned clients active
    /// in that category and period.
    pub counts: Vec<Vec<usize>>,
    /// Distinct churned clients per category over all periods.
    pub category_totals: Vec<usize>,
    /// Distinct churned clients per period over all categories.
    pub period_totals: Vec<usize>,
    /// Distinct churned clients present anywhere after the cohort.
    pub total: usize,
}

/// Break down where one cohort's churned clients appear in other categories.
///
/// Returns `None` for an unknown cohort. Without period information every
/// period column shows the same per-category counts.
pub fn category_presence(
    context: &CohortContext,
    categories: &CategoryActivity,
    cohort: &str,
) -> Option<CategoryPresence> {
    let position = context.sequence().position(cohort)?;
    let split = ChurnSplit::compute(context, categories, position);

    let names: Vec<String> = categories.categories().map(str::to_string).collect();
    let periods: Vec<String> = context
        .sequence()
        .after(position)
        .iter()
        .map(|p| p.label.clone())
        .collect();

    let mut counts = Array2::zeros((names.len(), periods.len()));
    let mut by_category = vec![BTreeSet::new(); names.len()];
    let mut by_period = vec![BTreeSet::new(); periods.len()];

    for (row, name) in names.iter().enumerate() {
        for (col, period) in periods.iter().enumerate() {
            let Some(clients) = categories.clients_in(name, period) else {
                continue;
            };
            let hits: Vec<&ClientId> = split
                .churned
                .iter()
                .filter(|c| clients.contains(**c))
                .copied()
                .collect();
            counts[[row, col]] = hits.len();
            by_category[row].extend(hits.iter().copied());
            by_period[col].extend(hits);
        }
    }

    Some(CategoryPresence {
        cohort: context.sequence().label(position)?.to_string(),
        categories: names,
        periods,
        counts: counts.outer_iter().map(|row| row.to_vec()).collect(),
        category_totals: by_category.iter().map(BTreeSet::len).collect(),
        period_totals: by_period.iter().map(BTreeSet::len).collect(),
        total: split.present.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use retention_data::ActivityRow;

    fn context() -> CohortContext {
        let rows: Vec<ActivityRow> = [
            ("2024-01", "A"),
            ("2024-01", "B"),
            ("2024-01", "C"),
            ("2024-01", "D"),
            ("2024-02", "A"),
            ("2024-03", "E"),
        ]
        .iter()
        .filter_map(|(p, c)| ActivityRow::from_raw(p, c))
        .collect();
        CohortContext::from_rows(&rows)
    }

    fn category_row(category: &str, period: Option<&str>, client: &str) -> CategoryRow {
        CategoryRow {
            category: category.to_string(),
            period: period.map(str::to_string),
            client: ClientId::from(client),
        }
    }

    fn categories() -> CategoryActivity {
        CategoryActivity::from_rows(&[
            // B shows up in shoes after the cohort, written in another form
            category_row("shoes", Some("2024-фев"), "B"),
            // C only in the cohort period itself, which does not count
            category_row("bags", Some("2024-01"), "C"),
            category_row("bags", Some("2024-03"), "B"),
            category_row("bags", Some("2024-03"), "Z"),
        ])
    }

    #[test]
    fn test_network_churn_counts() {
        let ctx = context();
        let table = NetworkChurnTable::build(&ctx, &categories());
        let row = table.get("2024-01").unwrap();

        assert_eq!(row.size, 4);
        assert_eq!(row.churn_count, Observed::Computed(3));
        assert_eq!(row.present_count, Observed::Computed(1));
        assert_eq!(row.network_churn, Observed::Computed(2));
        assert_eq!(row.network_churn_percent, Observed::Computed(50.0));
        assert_eq!(row.present_percent, Observed::Computed(25.0));
    }

    #[test]
    fn test_last_cohort_not_observable() {
        let ctx = context();
        let table = NetworkChurnTable::build(&ctx, &categories());
        let row = table.get("2024-03").unwrap();

        assert_eq!(row.size, 1);
        assert_eq!(row.network_churn, Observed::NotObservable);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_network_churn_clients() {
        let ctx = context();
        let clients = network_churn_clients(&ctx, &categories(), "2024-01");
        assert_eq!(clients, vec![ClientId::from("C"), ClientId::from("D")]);
        assert!(network_churn_clients(&ctx, &categories(), "nope").is_empty());
    }

    #[test]
    fn test_without_periods_any_appearance_counts() {
        let ctx = context();
        let categories = CategoryActivity::from_rows(&[
            category_row("bags", None, "C"),
            category_row("bags", None, "Z"),
        ]);
        assert!(!categories.has_periods());

        let table = NetworkChurnTable::build(&ctx, &categories);
        let row = table.get("2024-01").unwrap();
        assert_eq!(row.present_count, Observed::Computed(1));
        assert_eq!(row.network_churn, Observed::Computed(2));
    }

    #[test]
    fn test_category_presence_totals() {
        let ctx = context();
        let presence = category_presence(&ctx, &categories(), "2024-01").unwrap();

        assert_eq!(presence.categories, vec!["bags", "shoes"]);
        assert_eq!(presence.periods, vec!["2024-02", "2024-03"]);
        assert_eq!(presence.counts, vec![vec![0, 1], vec![1, 0]]);
        assert_eq!(presence.category_totals, vec![1, 1]);
        assert_eq!(presence.period_totals, vec![1, 1]);
        assert_eq!(presence.total, 1);
    }

    #[test]
    fn test_category_presence_unknown_cohort() {
        assert!(category_presence(&context(), &categories(), "2030-01").is_none());
    }
}
