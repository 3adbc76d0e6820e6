//! Query interfaces over the canonical `fact_rows` view.
//!
//! Each module provides a query struct that borrows from a
//! [`Connection`](crate::connection::Connection) and returns typed rows.

pub mod cohorts;
pub mod months;
pub mod trends;

pub use cohorts::CohortBuilder;
pub use months::MonthCatalog;
pub use trends::{validate_range, TrendAggregator};
