//! Periods and their canonical ordering.
//!
//! A period is an opaque label (`2024-янв`, `2024-W05`, ...) plus a sort key
//! derived from it. Labels that cannot be parsed keep their text but carry
//! no key, and sort after every parsed period.

pub mod parser;
pub mod sequence;

pub use parser::{MATCHERS, PeriodMatcher, matched_form, parse_period};
pub use sequence::PeriodSequence;

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Granularity of a period.
///
/// Months order before weeks, so a dataset mixing both within one year
/// lists its months first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    /// Calendar month (ordinal 1-12)
    #[display("month")]
    Month,
    /// Week of the year (ordinal 1-53)
    #[display("week")]
    Week,
}

/// Sort key of a parsed period.
///
/// Field order defines the derived ordering: year, then kind, then ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodKey {
    /// Calendar year
    pub year: i32,
    /// Month or week
    pub kind: PeriodKind,
    /// Month number or week number
    pub ordinal: u32,
}

impl PeriodKey {
    /// Create a new key.
    pub const fn new(year: i32, ordinal: u32, kind: PeriodKind) -> Self {
        Self {
            year,
            kind,
            ordinal,
        }
    }

    /// Canonical label used to match periods across files.
    ///
    /// Weeks render as `YYYY/WW`, months as `YYYY-MM`.
    pub fn canonical_label(&self) -> String {
        match self.kind {
            PeriodKind::Week => format!("{}/{:02}", self.year, self.ordinal),
            PeriodKind::Month => format!("{}-{:02}", self.year, self.ordinal),
        }
    }
}

/// A period label with its parsed key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Label as it appears in the data (trimmed)
    pub label: String,
    /// Sort key, `None` when the label is unparsable
    pub key: Option<PeriodKey>,
}

impl Period {
    /// Parse a label into a period.
    pub fn parse(label: &str) -> Self {
        let label = label.trim().to_string();
        let key = parse_period(&label);
        Self { label, key }
    }

    /// Whether the label was recognized.
    pub const fn is_parsed(&self) -> bool {
        self.key.is_some()
    }

    /// The period kind, if parsed.
    pub fn kind(&self) -> Option<PeriodKind> {
        self.key.map(|key| key.kind)
    }
}

/// Canonical form of a period label for matching across files.
///
/// `2025/1`, `2025/01` and `2025-W01` all become `2025/01`; `2024-янв` and
/// `2024-01` become `2024-01`. Unparsable labels are only trimmed.
pub fn normalize_for_compare(label: &str) -> String {
    parse_period(label).map_or_else(|| label.trim().to_string(), |key| key.canonical_label())
}
