use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Month;

// ---------------------------------------------------------------------------
// FilterSelection — chosen categories and platforms
// ---------------------------------------------------------------------------

/// The categories and platforms the caller has chosen.
///
/// Owned by the interactive layer and passed by value; the core never
/// mutates a selection it was given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub categories: BTreeSet<String>,
    pub platforms: BTreeSet<String>,
}

impl FilterSelection {
    pub fn new<C, P, S, T>(categories: C, platforms: P) -> Self
    where
        C: IntoIterator<Item = S>,
        P: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            platforms: platforms.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() || self.platforms.is_empty()
    }

    pub fn contains(&self, category: &str, platform_id: &str) -> bool {
        self.categories.contains(category) && self.platforms.contains(platform_id)
    }
}

// ---------------------------------------------------------------------------
// GroupKey — (category, platform_id)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub category: String,
    pub platform_id: String,
}

impl GroupKey {
    pub fn new(category: impl Into<String>, platform_id: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            platform_id: platform_id.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// MonthlyAggregate — mean price per (category, platform_id, month)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub category: String,
    pub platform_id: String,
    pub month: Month,
    pub avg_price: f64,
}

impl MonthlyAggregate {
    pub fn key(&self) -> GroupKey {
        GroupKey::new(self.category.clone(), self.platform_id.clone())
    }
}

// ---------------------------------------------------------------------------
// TidyTrendRow — long-form row handed to presentation
// ---------------------------------------------------------------------------

/// One aggregate point annotated with its group's percent change.
///
/// `pct_change` is `None` when the change is undefined for the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TidyTrendRow {
    pub category: String,
    pub platform_id: String,
    pub month: Month,
    pub avg_price: f64,
    pub pct_change: Option<f64>,
}

// ---------------------------------------------------------------------------
// GroupChange — per-group percent change with explicit missing status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    /// Both endpoints present; the change is defined.
    Complete,
    /// No aggregate at the baseline month.
    MissingBaseline,
    /// No aggregate at the end month.
    MissingEnd,
    /// Neither endpoint has an aggregate.
    MissingBoth,
    /// Baseline average is zero, so the ratio is undefined.
    ZeroBaseline,
}

impl ChangeStatus {
    pub fn is_defined(&self) -> bool {
        matches!(self, ChangeStatus::Complete)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupChange {
    pub category: String,
    pub platform_id: String,
    pub start_value: Option<f64>,
    pub end_value: Option<f64>,
    pub pct_change: Option<f64>,
    pub status: ChangeStatus,
}

// ---------------------------------------------------------------------------
// TrendReport — final output of one recompute
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub baseline: Month,
    pub end: Month,
    pub selection: FilterSelection,
    /// Ordered by platform, then month, then category.
    pub rows: Vec<TidyTrendRow>,
    /// One entry per selected group that produced any aggregate.
    pub changes: Vec<GroupChange>,
}

impl TrendReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when there are groups and none has a defined percent change.
    pub fn all_missing(&self) -> bool {
        !self.changes.is_empty() && self.changes.iter().all(|c| !c.status.is_defined())
    }

    pub fn change_for(&self, category: &str, platform_id: &str) -> Option<&GroupChange> {
        self.changes
            .iter()
            .find(|c| c.category == category && c.platform_id == platform_id)
    }
}
