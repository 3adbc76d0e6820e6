//! Pivot, percent change, and unpivot of monthly aggregates.
//!
//! Missing cells are `None` through every stage. A group without a baseline
//! or end aggregate gets `pct_change = None`, never zero.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{
    ChangeStatus, FilterSelection, GroupChange, GroupKey, Month, MonthlyAggregate, TidyTrendRow,
    TrendReport,
};

// ---------------------------------------------------------------------------
// WideTable — one row per group, one column per month
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideRow {
    /// Aligned with [`WideTable::months`].
    pub cells: Vec<Option<f64>>,
    pub pct_change: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WideTable {
    pub months: Vec<Month>,
    pub rows: BTreeMap<GroupKey, WideRow>,
}

impl WideTable {
    fn column(&self, month: Month) -> Option<usize> {
        self.months.binary_search(&month).ok()
    }

    /// Cell value for a group at a month; `None` when absent.
    pub fn cell(&self, key: &GroupKey, month: Month) -> Option<f64> {
        let idx = self.column(month)?;
        self.rows.get(key).and_then(|row| row.cells[idx])
    }

    /// Compute the baseline → end percent change for every row.
    ///
    /// Stores the value on each row and returns the per-group report.
    pub fn attach_percent_change(&mut self, baseline: Month, end: Month) -> Vec<GroupChange> {
        let start_col = self.column(baseline);
        let end_col = self.column(end);

        let mut changes = Vec::with_capacity(self.rows.len());
        for (key, row) in self.rows.iter_mut() {
            let start_value = start_col.and_then(|i| row.cells[i]);
            let end_value = end_col.and_then(|i| row.cells[i]);
            let status = change_status(start_value, end_value);
            let pct = percent_change(start_value, end_value);
            row.pct_change = pct;
            changes.push(GroupChange {
                category: key.category.clone(),
                platform_id: key.platform_id.clone(),
                start_value,
                end_value,
                pct_change: pct,
                status,
            });
        }
        changes
    }
}

/// Percent change from `start` to `end`: `(end - start) / start * 100`.
///
/// `None` if either side is missing or `start` is zero.
pub fn percent_change(start: Option<f64>, end: Option<f64>) -> Option<f64> {
    let (start, end) = (start?, end?);
    if start == 0.0 {
        return None;
    }
    let pct = (end - start) / start * 100.0;
    pct.is_finite().then_some(pct)
}

fn change_status(start: Option<f64>, end: Option<f64>) -> ChangeStatus {
    match (start, end) {
        (None, None) => ChangeStatus::MissingBoth,
        (None, Some(_)) => ChangeStatus::MissingBaseline,
        (Some(_), None) => ChangeStatus::MissingEnd,
        (Some(s), Some(_)) if s == 0.0 => ChangeStatus::ZeroBaseline,
        (Some(_), Some(_)) => ChangeStatus::Complete,
    }
}

/// Pivot aggregates wide: one row per `(category, platform_id)`, one column
/// per distinct month. Duplicate points for the same cell are averaged.
pub fn widen(aggregates: &[MonthlyAggregate]) -> WideTable {
    let months: Vec<Month> = aggregates
        .iter()
        .map(|a| a.month)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut sums: BTreeMap<GroupKey, Vec<(f64, u32)>> = BTreeMap::new();
    for agg in aggregates {
        let idx = match months.binary_search(&agg.month) {
            Ok(idx) => idx,
            Err(_) => continue,
        };
        let slots = sums
            .entry(agg.key())
            .or_insert_with(|| vec![(0.0, 0); months.len()]);
        slots[idx].0 += agg.avg_price;
        slots[idx].1 += 1;
    }

    let rows = sums
        .into_iter()
        .map(|(key, slots)| {
            let cells = slots
                .into_iter()
                .map(|(sum, n)| (n > 0).then(|| sum / n as f64))
                .collect();
            (
                key,
                WideRow {
                    cells,
                    pct_change: None,
                },
            )
        })
        .collect();

    WideTable { months, rows }
}

/// Unpivot back to long form, carrying each group's percent change.
///
/// Missing cells produce no row.
pub fn narrow(wide: &WideTable) -> Vec<TidyTrendRow> {
    let mut out = Vec::new();
    for (key, row) in &wide.rows {
        for (month, cell) in wide.months.iter().zip(&row.cells) {
            if let Some(avg_price) = cell {
                out.push(TidyTrendRow {
                    category: key.category.clone(),
                    platform_id: key.platform_id.clone(),
                    month: *month,
                    avg_price: *avg_price,
                    pct_change: row.pct_change,
                });
            }
        }
    }
    out
}

/// Keep only rows inside the selection, ordered for charting:
/// by platform, then month ascending, then category.
pub fn retain_selection(mut rows: Vec<TidyTrendRow>, selection: &FilterSelection) -> Vec<TidyTrendRow> {
    rows.retain(|r| selection.contains(&r.category, &r.platform_id));
    rows.sort_by(|a, b| {
        (&a.platform_id, a.month, &a.category).cmp(&(&b.platform_id, b.month, &b.category))
    });
    rows
}

/// Widen, attach percent change, narrow, and filter to `selection`.
pub fn build_report(
    aggregates: &[MonthlyAggregate],
    baseline: Month,
    end: Month,
    selection: &FilterSelection,
) -> TrendReport {
    let mut wide = widen(aggregates);
    let mut changes = wide.attach_percent_change(baseline, end);
    changes.retain(|c| selection.contains(&c.category, &c.platform_id));
    changes.sort_by(|a, b| (&a.platform_id, &a.category).cmp(&(&b.platform_id, &b.category)));

    let rows = retain_selection(narrow(&wide), selection);

    TrendReport {
        baseline,
        end,
        selection: selection.clone(),
        rows,
        changes,
    }
}
