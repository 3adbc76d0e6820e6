//! Monthly average price for a cohort over a month range.

use tracing::{debug, info};

use crate::config::{COHORT_TABLE, FACT_VIEW};
use crate::connection::Connection;
use crate::error::{Result, TrendError};
use crate::models::{Cohort, FilterSelection, Month, MonthlyAggregate};
use crate::sql_builder::SqlBuilder;

/// Check the ordering invariant `baseline <= end`.
pub fn validate_range(baseline: Month, end: Month) -> Result<()> {
    if end < baseline {
        return Err(TrendError::InvalidRange { baseline, end });
    }
    Ok(())
}

/// Computes per-(category, platform, month) mean prices for a cohort.
pub struct TrendAggregator<'a> {
    conn: &'a Connection,
}

impl<'a> TrendAggregator<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Mean price for every `(category, platform_id, month)` with
    /// `month` in `[baseline, end]`, restricted to cohort entities and the
    /// selected categories and platforms.
    ///
    /// Rows are ordered by `(category, platform_id, month)`. Months without
    /// data are absent, never zero-filled. An empty cohort or selection
    /// returns no rows without querying.
    pub fn aggregate(
        &self,
        cohort: &Cohort,
        end: Month,
        selection: &FilterSelection,
    ) -> Result<Vec<MonthlyAggregate>> {
        let baseline = cohort.baseline();
        validate_range(baseline, end)?;

        if cohort.is_empty() || selection.is_empty() {
            debug!("empty cohort or selection; skipping aggregation");
            return Ok(Vec::new());
        }

        self.conn.load_cohort(cohort)?;

        let categories: Vec<&str> = selection.categories.iter().map(String::as_str).collect();
        let platforms: Vec<&str> = selection.platforms.iter().map(String::as_str).collect();
        let cohort_filter = format!("entity_id IN (SELECT entity_id FROM {})", COHORT_TABLE);
        let (low, high) = (baseline.key(), end.key());

        let (sql, params) = SqlBuilder::new(FACT_VIEW)
            .select(&[
                "category",
                "platform_id",
                "month",
                "AVG(price) AS avg_price",
            ])
            .where_between("month", &low, &high)
            .where_clause("price IS NOT NULL", &[])
            .where_clause(&cohort_filter, &[])
            .where_in("category", &categories)
            .where_in("platform_id", &platforms)
            .group_by(&["category", "platform_id", "month"])
            .order_by(&["category", "platform_id", "month"])
            .build();

        let rows: Vec<MonthlyAggregate> = self.conn.execute_into(&sql, &params)?;
        info!(
            baseline = %baseline,
            end = %end,
            categories = categories.len(),
            platforms = platforms.len(),
            rows = rows.len(),
            "aggregated monthly averages"
        );
        Ok(rows)
    }
}
