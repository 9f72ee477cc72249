//! Period label parsing.
//!
//! A label is tried against an ordered list of matchers and the first one
//! that recognizes it decides its key. The order matters: `2024-05` is
//! claimed as May by the bare numeric matcher only because no earlier
//! matcher accepted it.
//!
//! Recognized forms, in order:
//!
//! 1. `2024-янв`, `2024_январь`, `2024март` (Russian month name or abbreviation)
//! 2. `2025/01` (year and week separated by a slash)
//! 3. `2024-W01`, `2024w1` (ISO-style week)
//! 4. `2024-нед01`, `2024-н1`, `2024-неделя12` (Russian week forms)
//! 5. `2024-05` (bare number: 1-12 is a month, 13-53 a week)

use super::{PeriodKey, PeriodKind};
use regex::Regex;
use std::sync::LazyLock;

static MONTH_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})[-_]?([а-яА-Я]+)").expect("valid month regex"));
static SLASH_WEEK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})/([0-9]{1,2})$").expect("valid slash week regex"));
static ISO_WEEK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})[-_]?W([0-9]{1,2})").expect("valid ISO week regex"));
static RUSSIAN_WEEK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4})[-_]?(?:неделя|нед|н)([0-9]{1,2})").expect("valid week regex")
});
static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})[-_]([0-9]{1,2})").expect("valid numeric regex"));

/// Russian month names and abbreviations, lowercase.
const MONTHS: &[(&str, u32)] = &[
    ("янв", 1),
    ("январь", 1),
    ("фев", 2),
    ("февраль", 2),
    ("мар", 3),
    ("март", 3),
    ("апр", 4),
    ("апрель", 4),
    ("май", 5),
    ("мая", 5),
    ("июн", 6),
    ("июнь", 6),
    ("июл", 7),
    ("июль", 7),
    ("авг", 8),
    ("август", 8),
    ("сен", 9),
    ("сент", 9),
    ("сентябрь", 9),
    ("окт", 10),
    ("октябрь", 10),
    ("ноя", 11),
    ("нояб", 11),
    ("ноябрь", 11),
    ("дек", 12),
    ("декабрь", 12),
];

/// A named parsing strategy.
#[derive(Debug, Clone, Copy)]
pub struct PeriodMatcher {
    /// Short name of the recognized form
    pub name: &'static str,
    /// Returns the key when the label has this form
    pub parse: fn(&str) -> Option<PeriodKey>,
}

/// The matchers in priority order.
pub const MATCHERS: &[PeriodMatcher] = &[
    PeriodMatcher {
        name: "month_name",
        parse: match_month_name,
    },
    PeriodMatcher {
        name: "slash_week",
        parse: match_slash_week,
    },
    PeriodMatcher {
        name: "iso_week",
        parse: match_iso_week,
    },
    PeriodMatcher {
        name: "russian_week",
        parse: match_russian_week,
    },
    PeriodMatcher {
        name: "numeric",
        parse: match_numeric,
    },
];

fn captures(re: &Regex, label: &str) -> Option<(i32, String)> {
    let caps = re.captures(label)?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    Some((year, caps.get(2)?.as_str().to_string()))
}

fn week(year: i32, number: &str) -> Option<PeriodKey> {
    let week: u32 = number.parse().ok()?;
    (1..=53)
        .contains(&week)
        .then_some(PeriodKey::new(year, week, PeriodKind::Week))
}

fn match_month_name(label: &str) -> Option<PeriodKey> {
    let (year, name) = captures(&MONTH_NAME, &label.to_lowercase())?;
    MONTHS
        .iter()
        .find(|(month, _)| *month == name)
        .map(|&(_, month)| PeriodKey::new(year, month, PeriodKind::Month))
}

fn match_slash_week(label: &str) -> Option<PeriodKey> {
    let (year, number) = captures(&SLASH_WEEK, label)?;
    week(year, &number)
}

fn match_iso_week(label: &str) -> Option<PeriodKey> {
    let (year, number) = captures(&ISO_WEEK, &label.to_uppercase())?;
    week(year, &number)
}

fn match_russian_week(label: &str) -> Option<PeriodKey> {
    let (year, number) = captures(&RUSSIAN_WEEK, &label.to_lowercase())?;
    week(year, &number)
}

fn match_numeric(label: &str) -> Option<PeriodKey> {
    let (year, number) = captures(&NUMERIC, label)?;
    let number: u32 = number.parse().ok()?;
    match number {
        1..=12 => Some(PeriodKey::new(year, number, PeriodKind::Month)),
        13..=53 => Some(PeriodKey::new(year, number, PeriodKind::Week)),
        _ => None,
    }
}

/// Parse a raw period label into its sort key.
///
/// The label is trimmed first. Returns `None` for labels no matcher
/// recognizes; such periods sort after every parsed one.
///
/// # Examples
///
/// ```
/// use retention_cohort::period::{PeriodKind, parse_period};
///
/// let key = parse_period("2024-март").unwrap();
/// assert_eq!((key.year, key.ordinal, key.kind), (2024, 3, PeriodKind::Month));
///
/// let key = parse_period("2024-W07").unwrap();
/// assert_eq!((key.year, key.ordinal, key.kind), (2024, 7, PeriodKind::Week));
///
/// assert!(parse_period("Q1 2024").is_none());
/// ```
pub fn parse_period(label: &str) -> Option<PeriodKey> {
    let label = label.trim();
    MATCHERS.iter().find_map(|matcher| (matcher.parse)(label))
}

/// Name of the matcher that recognizes the label, if any.
pub fn matched_form(label: &str) -> Option<&'static str> {
    let label = label.trim();
    MATCHERS
        .iter()
        .find(|matcher| (matcher.parse)(label).is_some())
        .map(|matcher| matcher.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2024-янв", 2024, 1)]
    #[case("2024-январь", 2024, 1)]
    #[case("2025-март", 2025, 3)]
    #[case("2024_дек", 2024, 12)]
    #[case("2024Май", 2024, 5)]
    #[case("  2023-Сентябрь ", 2023, 9)]
    fn test_month_names(#[case] label: &str, #[case] year: i32, #[case] month: u32) {
        assert_eq!(
            parse_period(label),
            Some(PeriodKey::new(year, month, PeriodKind::Month))
        );
        assert_eq!(matched_form(label), Some("month_name"));
    }

    #[rstest]
    #[case("2025/01", 2025, 1, "slash_week")]
    #[case("2024/52", 2024, 52, "slash_week")]
    #[case("2024/7", 2024, 7, "slash_week")]
    #[case("2024-W01", 2024, 1, "iso_week")]
    #[case("2024-w1", 2024, 1, "iso_week")]
    #[case("2024W53", 2024, 53, "iso_week")]
    #[case("2024-нед01", 2024, 1, "russian_week")]
    #[case("2024-нед1", 2024, 1, "russian_week")]
    #[case("2024-н01", 2024, 1, "russian_week")]
    #[case("2024-неделя12", 2024, 12, "russian_week")]
    #[case("2024-Неделя3", 2024, 3, "russian_week")]
    fn test_week_forms(
        #[case] label: &str,
        #[case] year: i32,
        #[case] week: u32,
        #[case] form: &str,
    ) {
        assert_eq!(
            parse_period(label),
            Some(PeriodKey::new(year, week, PeriodKind::Week))
        );
        assert_eq!(matched_form(label), Some(form));
    }

    #[rstest]
    #[case("2024-01", PeriodKind::Month, 1)]
    #[case("2024-12", PeriodKind::Month, 12)]
    #[case("2024_5", PeriodKind::Month, 5)]
    #[case("2024-13", PeriodKind::Week, 13)]
    #[case("2024-53", PeriodKind::Week, 53)]
    fn test_bare_numeric(#[case] label: &str, #[case] kind: PeriodKind, #[case] ordinal: u32) {
        assert_eq!(parse_period(label), Some(PeriodKey::new(2024, ordinal, kind)));
        assert_eq!(matched_form(label), Some("numeric"));
    }

    #[rstest]
    #[case("")]
    #[case("январь")]
    #[case("2024")]
    #[case("2024-00")]
    #[case("2024-54")]
    #[case("2024/54")]
    #[case("2024/0")]
    #[case("2024-W60")]
    #[case("2024-нед99")]
    #[case("2024-foo")]
    #[case("2024-абв")]
    #[case("202401")]
    #[case("Q1 2024")]
    fn test_unparsable(#[case] label: &str) {
        assert_eq!(parse_period(label), None);
        assert_eq!(matched_form(label), None);
    }

    /// A bare `YYYY-NN` with NN in 1..=12 is always a month, even in a
    /// week-numbered dataset. This is a heuristic kept as-is because
    /// downstream reports rely on it.
    #[test]
    fn test_bare_numeric_low_values_are_months() {
        let key = parse_period("2024-03").unwrap();
        assert_eq!(key.kind, PeriodKind::Month);

        let key = parse_period("2024/03").unwrap();
        assert_eq!(key.kind, PeriodKind::Week);
    }

    #[test]
    fn test_unknown_cyrillic_falls_through_to_week_forms() {
        // "нед" is not a month name, so the month matcher declines.
        assert_eq!(match_month_name("2024-нед05"), None);
        assert_eq!(
            parse_period("2024-нед05"),
            Some(PeriodKey::new(2024, 5, PeriodKind::Week))
        );
    }

    #[test]
    fn test_prefix_matching_ignores_trailing_text() {
        assert_eq!(
            parse_period("2024-W05 (partial)"),
            Some(PeriodKey::new(2024, 5, PeriodKind::Week))
        );
        assert_eq!(
            parse_period("2024-02 extra"),
            Some(PeriodKey::new(2024, 2, PeriodKind::Month))
        );
    }

    #[test]
    fn test_matchers_order() {
        let names: Vec<_> = MATCHERS.iter().map(|m| m.name).collect();
        assert_eq!(
            names,
            ["month_name", "slash_week", "iso_week", "russian_week", "numeric"]
        );
    }
}
