//! Distinct calendar months present in the fact view.

use serde::Deserialize;
use tracing::debug;

use crate::config::FACT_VIEW;
use crate::connection::Connection;
use crate::error::Result;
use crate::models::Month;
use crate::sql_builder::SqlBuilder;

#[derive(Deserialize)]
struct MonthRow {
    month: Month,
}

/// Enumerates the months available for range selection.
pub struct MonthCatalog<'a> {
    conn: &'a Connection,
}

impl<'a> MonthCatalog<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// All distinct months, ascending. Empty when the source has no rows.
    pub fn list(&self) -> Result<Vec<Month>> {
        let (sql, params) = SqlBuilder::new(FACT_VIEW)
            .select(&["month"])
            .distinct()
            .order_by(&["month ASC"])
            .build();

        let rows: Vec<MonthRow> = self.conn.execute_into(&sql, &params)?;
        let months: Vec<Month> = rows.into_iter().map(|r| r.month).collect();
        debug!(count = months.len(), "listed available months");
        Ok(months)
    }

    /// Default `(baseline, end)` pair for a fresh session.
    ///
    /// The end month is the latest available. The baseline is `preferred`
    /// when the catalog contains it, otherwise the earliest month.
    pub fn default_range(&self, preferred: Option<Month>) -> Result<Option<(Month, Month)>> {
        Ok(default_range_of(&self.list()?, preferred))
    }
}

/// Pick default range endpoints from an ascending month list.
pub fn default_range_of(months: &[Month], preferred: Option<Month>) -> Option<(Month, Month)> {
    let first = *months.first()?;
    let last = *months.last()?;
    let baseline = preferred
        .filter(|m| months.binary_search(m).is_ok())
        .unwrap_or(first);
    Some((baseline, last))
}
