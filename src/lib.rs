//! Cohort-based price trend analysis for product listings.
//!
//! Snapshots the listings present at a baseline month, narrows them through
//! cascading category and platform filters, averages their prices per month
//! in-process via DuckDB, and reports the baseline → end percent change per
//! group as a tidy, chart-ready table.
//!
//! # Quick start
//!
//! ```no_run
//! use listing_trends::{DataSource, TrendOutcome, TrendRequest, TrendSdk};
//!
//! let sdk = TrendSdk::builder()
//!     .source(DataSource::Parquet("price_history_enriched.parquet".into()))
//!     .build()
//!     .unwrap();
//!
//! let (baseline, end) = sdk.default_range().unwrap().expect("no data");
//! let request = TrendRequest::new(baseline, end).categories(["Lighting"]);
//!
//! if let TrendOutcome::Ready { report } = sdk.analyze(&request).unwrap() {
//!     println!("{}", listing_trends::chart::render_table(&report.rows));
//! }
//! ```

pub mod chart;
pub mod config;
pub mod connection;
pub mod error;
pub mod filters;
pub mod models;
pub mod queries;
pub mod reshape;
pub mod sql_builder;

pub use chart::{ChartSeries, TrendChart};
pub use config::{DataSource, SourceColumns, TrendConfig};
pub use connection::Connection;
pub use error::{Result, TrendError};
pub use filters::Readiness;
pub use models::{Cohort, FilterSelection, Month, TrendReport};
pub use sql_builder::SqlBuilder;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::info;

// ---------------------------------------------------------------------------
// TrendSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`TrendSdk`] instance.
#[derive(Default)]
pub struct TrendSdkBuilder {
    source: Option<DataSource>,
    columns: SourceColumns,
    preferred_baseline: Option<Month>,
}

impl TrendSdkBuilder {
    /// Set where raw price records are read from. Required.
    pub fn source(mut self, source: DataSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Map raw column names onto the canonical fact columns.
    ///
    /// Defaults to the `price_history_enriched` layout
    /// (`listing_id`, `source_product_area`, `platform_id`, `batch_date`,
    /// `listing_price`).
    pub fn columns(mut self, columns: SourceColumns) -> Self {
        self.columns = columns;
        self
    }

    /// Baseline month [`TrendSdk::default_range`] opens on when available.
    ///
    /// Defaults to [`config::DEFAULT_BASELINE`].
    pub fn preferred_baseline(mut self, month: Month) -> Self {
        self.preferred_baseline = Some(month);
        self
    }

    /// Apply a loaded [`TrendConfig`].
    pub fn config(mut self, config: TrendConfig) -> Self {
        self.source = Some(config.source);
        self.columns = config.columns;
        self.preferred_baseline = config.preferred_baseline;
        self
    }

    /// Open the DuckDB connection and register the fact view.
    pub fn build(self) -> Result<TrendSdk> {
        let source = self.source.ok_or_else(|| {
            TrendError::InvalidArgument("a data source is required".to_string())
        })?;
        let conn = Connection::new(&source, &self.columns)?;
        Ok(TrendSdk::from_connection(conn).with_preferred_baseline(self.preferred_baseline))
    }
}

// ---------------------------------------------------------------------------
// TrendRequest / TrendOutcome
// ---------------------------------------------------------------------------

/// One recompute's worth of user input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendRequest {
    pub baseline: Month,
    pub end: Month,
    pub categories: BTreeSet<String>,
    /// `None` selects every platform available for the chosen categories.
    pub platforms: Option<BTreeSet<String>>,
}

impl TrendRequest {
    pub fn new(baseline: Month, end: Month) -> Self {
        Self {
            baseline,
            end,
            categories: BTreeSet::new(),
            platforms: None,
        }
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms = Some(platforms.into_iter().map(Into::into).collect());
        self
    }
}

/// Result of a successful recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TrendOutcome {
    /// The baseline month has no listings.
    NoData { baseline: Month },
    /// The selection cascade stopped before aggregation.
    AwaitingSelection { readiness: Readiness },
    /// Aggregation ran; the report may still be empty.
    Ready { report: TrendReport },
}

impl TrendOutcome {
    /// Informational message for the non-ready states.
    pub fn message(&self) -> Option<String> {
        match self {
            TrendOutcome::NoData { baseline } => {
                Some(format!("No listings observed in {}.", baseline))
            }
            TrendOutcome::AwaitingSelection { readiness } => {
                readiness.awaiting().map(str::to_string)
            }
            TrendOutcome::Ready { .. } => None,
        }
    }

    pub fn report(&self) -> Option<&TrendReport> {
        match self {
            TrendOutcome::Ready { report } => Some(report),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// TrendSdk
// ---------------------------------------------------------------------------

/// The main entry point.
///
/// Owns the DuckDB [`Connection`] and exposes each pipeline stage as a
/// lightweight borrowing wrapper. Holds no stage results between calls:
/// [`analyze`](TrendSdk::analyze) recomputes everything from its request.
pub struct TrendSdk {
    conn: Connection,
    preferred_baseline: Option<Month>,
}

impl TrendSdk {
    /// Create a new builder for configuring the SDK.
    pub fn builder() -> TrendSdkBuilder {
        TrendSdkBuilder::default()
    }

    /// Wrap a connection whose `fact_rows` view is already registered.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            preferred_baseline: None,
        }
    }

    fn with_preferred_baseline(mut self, month: Option<Month>) -> Self {
        self.preferred_baseline = month;
        self
    }

    // -- Stage accessors ---------------------------------------------------

    /// Access the month catalog.
    pub fn months(&self) -> queries::MonthCatalog<'_> {
        queries::MonthCatalog::new(&self.conn)
    }

    /// Access the cohort builder.
    pub fn cohorts(&self) -> queries::CohortBuilder<'_> {
        queries::CohortBuilder::new(&self.conn)
    }

    /// Access the trend aggregator.
    pub fn trends(&self) -> queries::TrendAggregator<'_> {
        queries::TrendAggregator::new(&self.conn)
    }

    // -- Pipeline ----------------------------------------------------------

    /// Default `(baseline, end)` range; `None` when the source is empty.
    pub fn default_range(&self) -> Result<Option<(Month, Month)>> {
        let preferred = match self.preferred_baseline {
            Some(month) => Some(month),
            None => config::DEFAULT_BASELINE.parse().ok(),
        };
        self.months().default_range(preferred)
    }

    /// Run the full pipeline for one request.
    ///
    /// Returns [`TrendError::InvalidRange`] before touching the database
    /// when `end` precedes `baseline`. Empty domains are reported through
    /// [`TrendOutcome`], not as errors.
    pub fn analyze(&self, request: &TrendRequest) -> Result<TrendOutcome> {
        queries::validate_range(request.baseline, request.end)?;

        let cohort = self.cohorts().build(request.baseline)?;
        if cohort.is_empty() {
            return Ok(TrendOutcome::NoData {
                baseline: request.baseline,
            });
        }

        let readiness =
            Readiness::resolve(&cohort, &request.categories, request.platforms.as_ref());
        let selection = match readiness.selection() {
            Some(selection) => selection.clone(),
            None => {
                info!(reason = readiness.awaiting(), "awaiting selection");
                return Ok(TrendOutcome::AwaitingSelection { readiness });
            }
        };
        info!(
            categories = selection.categories.len(),
            platforms = selection.platforms.len(),
            "selection ready"
        );

        let aggregates = self.trends().aggregate(&cohort, request.end, &selection)?;
        let report = reshape::build_report(&aggregates, request.baseline, request.end, &selection);
        Ok(TrendOutcome::Ready { report })
    }

    /// Return a reference to the underlying [`Connection`].
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl fmt::Display for TrendSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrendSdk(views=[{}])", self.conn.views().join(", "))
    }
}
