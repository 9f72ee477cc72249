//! Automatic detection of the period, client and category columns.
//!
//! Detection is a header heuristic: the source spreadsheets use Russian
//! headers such as `Год-месяц`, `Год-неделя` and `Код клиента`, and exported
//! datasets often use plain English names. The first matching column wins.

use crate::error::{DataError, Result};
use polars::prelude::DataFrame;

const PERIOD_ALIASES: &[&str] = &["period", "year_month", "year_week", "year-month", "year-week"];
const CLIENT_ALIASES: &[&str] = &["client", "client_id", "customer_id", "customer"];
const CATEGORY_ALIASES: &[&str] = &["category", "group"];

/// Columns found by [`detect_columns`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedColumns {
    /// Period column name, if found
    pub period: Option<String>,
    /// Client identifier column name, if found
    pub client: Option<String>,
    /// Category (group) column name, if found
    pub category: Option<String>,
}

impl DetectedColumns {
    /// The period column, or an error naming what is missing.
    pub fn require_period(&self) -> Result<&str> {
        self.period
            .as_deref()
            .ok_or_else(|| DataError::ColumnNotDetected("period".to_string()))
    }

    /// The client column, or an error naming what is missing.
    pub fn require_client(&self) -> Result<&str> {
        self.client
            .as_deref()
            .ok_or_else(|| DataError::ColumnNotDetected("client".to_string()))
    }

    /// The category column, or an error naming what is missing.
    pub fn require_category(&self) -> Result<&str> {
        self.category
            .as_deref()
            .ok_or_else(|| DataError::ColumnNotDetected("category".to_string()))
    }
}

fn is_period_header(header: &str) -> bool {
    (header.contains("год") && (header.contains("месяц") || header.contains("неделя")))
        || PERIOD_ALIASES.contains(&header)
}

fn is_client_header(header: &str) -> bool {
    (header.contains("код") && header.contains("клиент")) || CLIENT_ALIASES.contains(&header)
}

fn is_category_header(header: &str) -> bool {
    header.contains("категория") || header.contains("группа") || CATEGORY_ALIASES.contains(&header)
}

/// Detect columns from a list of header names.
pub fn detect_columns_in<'a>(headers: impl IntoIterator<Item = &'a str>) -> DetectedColumns {
    let mut detected = DetectedColumns::default();

    for header in headers {
        let lowered = header.trim().to_lowercase();
        if detected.period.is_none() && is_period_header(&lowered) {
            detected.period = Some(header.to_string());
        } else if detected.client.is_none() && is_client_header(&lowered) {
            detected.client = Some(header.to_string());
        } else if detected.category.is_none() && is_category_header(&lowered) {
            detected.category = Some(header.to_string());
        }
    }

    detected
}

/// Detect the period, client and category columns of a DataFrame.
pub fn detect_columns(frame: &DataFrame) -> DetectedColumns {
    let names = frame.get_column_names();
    detect_columns_in(names.iter().map(|name| name.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_russian_headers() {
        let detected = detect_columns_in(["Дата", "Год-месяц", "Код клиента", "Сумма"]);
        assert_eq!(detected.period.as_deref(), Some("Год-месяц"));
        assert_eq!(detected.client.as_deref(), Some("Код клиента"));
        assert_eq!(detected.category, None);
    }

    #[test]
    fn test_detect_week_header() {
        let detected = detect_columns_in(["Год-неделя", "Код клиента", "Категория"]);
        assert_eq!(detected.period.as_deref(), Some("Год-неделя"));
        assert_eq!(detected.category.as_deref(), Some("Категория"));
    }

    #[test]
    fn test_detect_english_aliases() {
        let detected = detect_columns_in(["Period", "Client_ID", "group"]);
        assert_eq!(detected.period.as_deref(), Some("Period"));
        assert_eq!(detected.client.as_deref(), Some("Client_ID"));
        assert_eq!(detected.category.as_deref(), Some("group"));
    }

    #[test]
    fn test_first_match_wins() {
        let detected = detect_columns_in(["period", "Год-месяц", "client"]);
        assert_eq!(detected.period.as_deref(), Some("period"));
    }

    #[test]
    fn test_require_missing() {
        let detected = detect_columns_in(["a", "b"]);
        assert!(matches!(
            detected.require_period(),
            Err(DataError::ColumnNotDetected(name)) if name == "period"
        ));
        assert!(detected.require_client().is_err());
        assert!(detected.require_category().is_err());
    }

    #[test]
    fn test_detect_columns_on_frame() {
        use polars::prelude::*;

        let frame = df!(
            "Год-месяц" => ["2024-янв"],
            "Код клиента" => ["1"],
        )
        .unwrap();
        let detected = detect_columns(&frame);
        assert_eq!(detected.require_period().unwrap(), "Год-месяц");
        assert_eq!(detected.require_client().unwrap(), "Код клиента");
    }
}
