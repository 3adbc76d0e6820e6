//! DuckDB connection wrapper with fact-view registration and query execution.
//!
//! Whatever the raw source looks like, queries only ever see the canonical
//! `fact_rows` view:
//! `(entity_id, category, platform_id, observation_date, price, month)`.

use crate::config::{DataSource, SourceColumns, COHORT_TABLE, FACT_VIEW, RAW_TABLE};
use crate::error::Result;
use crate::models::Cohort;
use duckdb::{params, types::ValueRef, Connection as DuckDbConnection};
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Wraps an in-memory DuckDB connection and the views registered on it.
pub struct Connection {
    conn: DuckDbConnection,
    registered_views: RefCell<HashSet<String>>,
}

impl Connection {
    /// Open an in-memory DuckDB database with nothing registered.
    pub fn open_in_memory() -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        Ok(Self {
            conn,
            registered_views: RefCell::new(HashSet::new()),
        })
    }

    /// Open a connection and register the fact view over `source`.
    pub fn new(source: &DataSource, columns: &SourceColumns) -> Result<Self> {
        let conn = Self::open_in_memory()?;
        if let DataSource::Ndjson(path) = source {
            conn.register_table_from_ndjson(RAW_TABLE, &path.to_string_lossy())?;
        }
        conn.register_fact_view(source, columns)?;
        Ok(conn)
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Each row is represented as a `HashMap<String, serde_json::Value>`.
    pub fn execute(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        debug!(sql, ?params, "executing query");
        let mut stmt = self.conn.prepare(sql)?;

        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();

        let mut rows_result = stmt.query(param_values.as_slice())?;

        // Column metadata is only available once the statement has run
        let column_names: Vec<String> = match rows_result.as_ref() {
            Some(executed) => executed
                .column_names()
                .into_iter()
                .map(|s| s.to_string())
                .collect(),
            None => Vec::new(),
        };

        let mut out: Vec<HashMap<String, serde_json::Value>> = Vec::new();

        while let Some(row) = rows_result.next()? {
            let mut map = HashMap::with_capacity(column_names.len());
            for (i, col_name) in column_names.iter().enumerate() {
                let value = convert_value_ref(row.get_ref(i)?);
                map.insert(col_name.clone(), value);
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and deserialize each row into type `T`.
    pub fn execute_into<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<T>> {
        let rows = self.execute(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(
                row.into_iter().collect::<serde_json::Map<String, serde_json::Value>>(),
            );
            let item: T = serde_json::from_value(value)?;
            results.push(item);
        }
        Ok(results)
    }

    /// Create a DuckDB table from a newline-delimited JSON file.
    ///
    /// Data is streamed from disk by DuckDB, so the file may be removed
    /// once this returns.
    pub fn register_table_from_ndjson(&self, table_name: &str, ndjson_path: &str) -> Result<()> {
        let path_fwd = ndjson_path.replace('\\', "/").replace('\'', "''");
        self.conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {}; \
             CREATE TABLE {} AS SELECT * FROM read_json_auto('{}', format='newline_delimited')",
            table_name, table_name, path_fwd
        ))?;
        self.registered_views.borrow_mut().insert(table_name.to_string());
        debug!(table = table_name, path = %path_fwd, "registered ndjson table");
        Ok(())
    }

    /// Register the canonical `fact_rows` view over a raw source.
    ///
    /// Casts every column to its canonical type, derives the `YYYY-MM`
    /// month key, and drops rows missing any grouping attribute.
    pub fn register_fact_view(&self, source: &DataSource, columns: &SourceColumns) -> Result<()> {
        columns.validate()?;
        let scan = source.scan_expr();

        self.conn.execute_batch(&format!(
            "CREATE OR REPLACE VIEW {view} AS \
             SELECT entity_id, category, platform_id, observation_date, price, \
                    strftime(observation_date, '%Y-%m') AS month \
             FROM (\
               SELECT CAST(\"{entity}\" AS VARCHAR) AS entity_id, \
                      CAST(\"{category}\" AS VARCHAR) AS category, \
                      CAST(\"{platform}\" AS VARCHAR) AS platform_id, \
                      CAST(\"{date}\" AS DATE) AS observation_date, \
                      CAST(\"{price}\" AS DOUBLE) AS price \
               FROM {scan}\
             ) \
             WHERE entity_id IS NOT NULL \
               AND category IS NOT NULL \
               AND platform_id IS NOT NULL \
               AND observation_date IS NOT NULL",
            view = FACT_VIEW,
            entity = columns.entity_id,
            category = columns.category,
            platform = columns.platform_id,
            date = columns.observation_date,
            price = columns.price,
            scan = scan,
        ))?;
        self.registered_views.borrow_mut().insert(FACT_VIEW.to_string());
        info!(view = FACT_VIEW, source = %scan, "registered fact view");

        Ok(())
    }

    /// Replace the `trend_cohort` table with the members of `cohort`.
    ///
    /// Aggregation joins against this table instead of binding one
    /// parameter per entity.
    pub fn load_cohort(&self, cohort: &Cohort) -> Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE OR REPLACE TABLE {} (\
               entity_id VARCHAR, category VARCHAR, platform_id VARCHAR)",
            COHORT_TABLE
        ))?;

        let mut appender = self.conn.appender(COHORT_TABLE)?;
        for member in cohort.members() {
            appender.append_row(params![
                member.entity_id.as_str(),
                member.category.as_str(),
                member.platform_id.as_str()
            ])?;
        }
        appender.flush()?;
        drop(appender);

        self.registered_views.borrow_mut().insert(COHORT_TABLE.to_string());
        debug!(
            baseline = %cohort.baseline(),
            members = cohort.len(),
            "loaded cohort snapshot"
        );
        Ok(())
    }

    /// Check whether a view or table has been registered.
    pub fn has_view(&self, name: &str) -> bool {
        self.registered_views.borrow().contains(name)
    }

    /// Return a list of all registered view and table names.
    pub fn views(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registered_views.borrow().iter().cloned().collect();
        names.sort();
        names
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => {
            if let Ok(i) = i64::try_from(n) {
                serde_json::Value::Number(i.into())
            } else {
                serde_json::Value::String(n.to_string())
            }
        }
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).to_string())
        }
        // Canonical queries cast dates and decimals before returning them
        _ => serde_json::Value::Null,
    }
}
