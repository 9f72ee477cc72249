//! Client identifiers and their normalization.
//!
//! Client codes arrive from spreadsheets in many shapes: with stray
//! whitespace, as integers, or as floats that were integers before a round
//! trip through Excel. Two raw values name the same client when they
//! normalize to the same [`ClientId`].

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// A normalized client identifier.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    From,
    Into,
)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize a raw client cell.
///
/// All whitespace is removed, including the non-breaking spaces spreadsheets
/// use to group thousands. A plain decimal keeps its integer part as text,
/// without leading zeros, so `"196107"`, `"196107.0"` and `" 196 107 "` are
/// the same client at any length. Exponent forms go through `f64` and are
/// truncated. Anything else is kept as the cleaned string. Blank cells yield
/// `None`.
///
/// # Examples
///
/// ```
/// use retention_data::normalize_client_code;
///
/// assert_eq!(normalize_client_code("196107.0").unwrap().as_str(), "196107");
/// assert_eq!(normalize_client_code(" ab 12 ").unwrap().as_str(), "ab12");
/// assert!(normalize_client_code("   ").is_none());
/// ```
pub fn normalize_client_code(raw: &str) -> Option<ClientId> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    if let Some(integer) = integer_part(&cleaned) {
        return Some(ClientId(integer));
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value.abs() < i64::MAX as f64 => {
            Some(ClientId(format!("{}", value.trunc() as i64)))
        }
        _ => Some(ClientId(cleaned)),
    }
}

/// Integer part of `[+-]digits[.digits]`, sign kept and leading zeros dropped.
fn integer_part(value: &str) -> Option<String> {
    let (negative, unsigned) = value.strip_prefix('-').map_or_else(
        || (false, value.strip_prefix('+').unwrap_or(value)),
        |rest| (true, rest),
    );
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if integer.is_empty() || !is_digits(integer) || !is_digits(fraction) {
        return None;
    }

    let digits = integer.trim_start_matches('0');
    Some(if digits.is_empty() {
        "0".to_string()
    } else if negative {
        format!("-{digits}")
    } else {
        digits.to_string()
    })
}
