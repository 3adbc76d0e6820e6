//! Data source location, column mapping, and JSON-file configuration.

use crate::error::{Result, TrendError};
use crate::models::Month;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Canonical view every query runs against.
pub const FACT_VIEW: &str = "fact_rows";

/// Table holding the current cohort snapshot.
pub const COHORT_TABLE: &str = "trend_cohort";

/// Table the raw NDJSON source is materialized into.
pub const RAW_TABLE: &str = "raw_price_history";

/// Baseline month the original dashboard opened on.
pub const DEFAULT_BASELINE: &str = "2024-09";

/// Where raw price records are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum DataSource {
    /// A parquet file scanned in place.
    Parquet(PathBuf),
    /// A CSV file with a header row.
    Csv(PathBuf),
    /// A newline-delimited JSON file, copied into a DuckDB table.
    Ndjson(PathBuf),
    /// A table or view already present in the connection.
    Table(String),
}

impl DataSource {
    /// Return the `FROM` expression DuckDB should scan.
    pub(crate) fn scan_expr(&self) -> String {
        match self {
            DataSource::Parquet(path) => format!("read_parquet('{}')", sql_path(path)),
            DataSource::Csv(path) => {
                format!("read_csv_auto('{}', header=true)", sql_path(path))
            }
            DataSource::Ndjson(_) => RAW_TABLE.to_string(),
            DataSource::Table(name) => name.clone(),
        }
    }
}

/// Forward slashes for DuckDB, single quotes escaped.
fn sql_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").replace('\'', "''")
}

/// Raw column names mapped onto the canonical fact columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceColumns {
    pub entity_id: String,
    pub category: String,
    pub platform_id: String,
    pub observation_date: String,
    pub price: String,
}

impl Default for SourceColumns {
    fn default() -> Self {
        Self {
            entity_id: "listing_id".to_string(),
            category: "source_product_area".to_string(),
            platform_id: "platform_id".to_string(),
            observation_date: "batch_date".to_string(),
            price: "listing_price".to_string(),
        }
    }
}

impl SourceColumns {
    /// Columns already named like the canonical view.
    pub fn canonical() -> Self {
        Self {
            entity_id: "entity_id".to_string(),
            category: "category".to_string(),
            platform_id: "platform_id".to_string(),
            observation_date: "observation_date".to_string(),
            price: "price".to_string(),
        }
    }

    /// Reject empty names and embedded double quotes before they reach SQL.
    pub fn validate(&self) -> Result<()> {
        for (field, name) in [
            ("entity_id", &self.entity_id),
            ("category", &self.category),
            ("platform_id", &self.platform_id),
            ("observation_date", &self.observation_date),
            ("price", &self.price),
        ] {
            if name.trim().is_empty() || name.contains('"') {
                return Err(TrendError::InvalidArgument(format!(
                    "column mapping for {} is not a valid identifier: {:?}",
                    field, name
                )));
            }
        }
        Ok(())
    }
}

/// File-backed configuration for a [`TrendSdk`](crate::TrendSdk).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendConfig {
    pub source: DataSource,
    #[serde(default)]
    pub columns: SourceColumns,
    #[serde(default)]
    pub preferred_baseline: Option<Month>,
}

impl TrendConfig {
    /// Load configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: TrendConfig = serde_json::from_str(&content)?;
        config.columns.validate()?;
        Ok(config)
    }
}
