//! Baseline-month cohort snapshots.

use tracing::info;

use crate::config::FACT_VIEW;
use crate::connection::Connection;
use crate::error::Result;
use crate::models::{Cohort, CohortMember, Month};
use crate::sql_builder::SqlBuilder;

/// Snapshots the entities observed at a baseline month.
pub struct CohortBuilder<'a> {
    conn: &'a Connection,
}

impl<'a> CohortBuilder<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Distinct `(entity_id, category, platform_id)` tuples whose month is
    /// exactly `baseline`.
    ///
    /// A month with no rows yields an empty cohort rather than an error.
    pub fn build(&self, baseline: Month) -> Result<Cohort> {
        let key = baseline.key();
        let (sql, params) = SqlBuilder::new(FACT_VIEW)
            .select(&["entity_id", "category", "platform_id"])
            .distinct()
            .where_eq("month", &key)
            .order_by(&["entity_id", "category", "platform_id"])
            .build();

        let members: Vec<CohortMember> = self.conn.execute_into(&sql, &params)?;
        let cohort = Cohort::new(baseline, members);
        info!(baseline = %baseline, members = cohort.len(), "built cohort");
        Ok(cohort)
    }
}
