use std::cmp::Ordering;

use chrono::{
    DateTime,
    NaiveDate,
    Utc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SortState<K: Copy> {
    pub key: Option<K>,
    pub direction: SortDirection,
}

impl<K: Copy + PartialEq> SortState<K> {
    pub fn new(key: Option<K>, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Clicking the active column flips direction; clicking another column
    /// selects it ascending.
    pub fn toggle_or_set(&mut self, key: K) {
        match self.key {
            Some(current) if current == key => {
                self.direction = self.direction.reversed();
            }
            _ => {
                self.key = Some(key);
                self.direction = SortDirection::Ascending;
            }
        }
    }
}

impl<K: Copy> Default for SortState<K> {
    fn default() -> Self {
        Self { key: None, direction: SortDirection::Ascending }
    }
}

/// A row's value under one sort key, normalized so absent values order
/// first ascending: missing numbers as 0, missing dates as the epoch.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    Number(f64),
    Instant(i64),
}

impl SortValue {
    pub fn text(value: &str) -> Self {
        SortValue::Text(value.to_lowercase())
    }

    pub fn number(value: Option<f64>) -> Self {
        SortValue::Number(value.unwrap_or(0.0))
    }

    pub fn date(value: Option<&str>) -> Self {
        SortValue::Instant(parse_instant(value.unwrap_or("")))
    }

    pub fn timestamp(value: Option<DateTime<Utc>>) -> Self {
        SortValue::Instant(value.map(|t| t.timestamp_millis()).unwrap_or(0))
    }

    pub fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Text(left), SortValue::Text(right)) => left.cmp(right),
            (SortValue::Number(left), SortValue::Number(right)) => {
                left.partial_cmp(right).unwrap_or(Ordering::Equal)
            }
            (SortValue::Instant(left), SortValue::Instant(right)) => left.cmp(right),
            _ => Ordering::Equal,
        }
    }
}

/// Dates on the wire are either full timestamps (audit fields) or bare
/// `YYYY-MM-DD` strings (form date inputs). Anything else sorts as epoch 0.
pub fn parse_instant(raw: &str) -> i64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0;
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return timestamp.timestamp_millis();
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|at_midnight| at_midnight.and_utc().timestamp_millis())
            .unwrap_or(0);
    }
    0
}

/// Case-insensitive substring search over a row's searchable fields. An
/// empty term passes everything.
pub fn matches_search(term: &str, fields: &[&str]) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    fields.iter().any(|field| field.to_lowercase().contains(&needle))
}

/// The "all"/"All" dropdown sentinel that means "no constraint".
pub fn is_all_sentinel(value: &str) -> bool {
    value.eq_ignore_ascii_case("all")
}
