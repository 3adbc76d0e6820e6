use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::TrendError;

// ---------------------------------------------------------------------------
// Month — calendar month, always pinned to day 1
// ---------------------------------------------------------------------------

/// A calendar month derived by truncating a date to month granularity.
///
/// Ordered by calendar time. Displays and serializes as `YYYY-MM`, which is
/// also the key the `fact_rows` view exposes in its `month` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month(NaiveDate);

impl Month {
    /// Build a month from a year and a 1-based month number.
    pub fn new(year: i32, month: u32) -> Result<Self, TrendError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Month)
            .ok_or_else(|| TrendError::InvalidMonth(format!("{:04}-{:02}", year, month)))
    }

    /// Truncate a date to its month.
    pub fn from_date(date: NaiveDate) -> Self {
        // Day 1 exists in every month
        Month(date.with_day(1).unwrap_or(date))
    }

    /// The `YYYY-MM` key used for SQL parameters.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

impl FromStr for Month {
    type Err = TrendError;

    /// Accepts `YYYY-MM` or a full `YYYY-MM-DD` date (truncated).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let date = match s.len() {
            7 => NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d"),
            _ => NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d"),
        };
        date.map(Month::from_date)
            .map_err(|_| TrendError::InvalidMonth(s.to_string()))
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
