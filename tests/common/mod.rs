//! Shared test fixtures for the listing-trends integration tests.
//!
//! Provides `setup_sample_db()` which creates an in-memory DuckDB connection
//! whose `fact_rows` view sits over a small price history loaded from an
//! NDJSON temp file in the raw `price_history_enriched` layout.
//!
//! Sample listings:
//!
//! | listing | area     | platform | 2024-01 | 2024-02 | 2024-03 |
//! |---------|----------|----------|---------|---------|---------|
//! | L1      | Lighting | P1       | 10      | 12      | 15      |
//! | L2      | Lighting | P1       | 30      |         | 33      |
//! | L3      | Lighting | P2       | 50      | 40      |         |
//! | L4      | Audio    | P2       | 100     |         | 120     |
//! | L5      | Audio    | P2       |         | 8       | 9       |
//! | L6      | Garden   | P4       | 5       |         |         |
//!
//! plus one January row with a NULL area that the fact view drops.

#![allow(dead_code)]

use listing_trends::config::{DataSource, SourceColumns, RAW_TABLE};
use listing_trends::{Connection, TrendSdk};
use std::io::Write;
use tempfile::NamedTempFile;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("listing_trends=debug")
        .with_test_writer()
        .try_init();
}

/// Connection with the sample history registered as `fact_rows`.
pub fn setup_sample_db() -> Connection {
    init_tracing();
    let conn = Connection::open_in_memory().unwrap();
    write_ndjson_and_register(&conn, RAW_TABLE, &sample_rows());
    conn.register_fact_view(&DataSource::Table(RAW_TABLE.to_string()), &SourceColumns::default())
        .unwrap();
    conn
}

/// SDK over the sample history.
pub fn setup_sample_sdk() -> TrendSdk {
    TrendSdk::from_connection(setup_sample_db())
}

/// Connection whose raw table exists but holds no rows.
pub fn setup_empty_db() -> Connection {
    init_tracing();
    let conn = Connection::open_in_memory().unwrap();
    conn.raw()
        .execute_batch(
            "CREATE TABLE empty_prices (\
               listing_id VARCHAR, source_product_area VARCHAR, platform_id VARCHAR, \
               batch_date DATE, listing_price DOUBLE)",
        )
        .unwrap();
    conn.register_fact_view(
        &DataSource::Table("empty_prices".to_string()),
        &SourceColumns::default(),
    )
    .unwrap();
    conn
}

pub fn sample_rows() -> Vec<serde_json::Value> {
    let obs = |listing: &str, area: Option<&str>, platform: &str, date: &str, price: f64| {
        serde_json::json!({
            "listing_id": listing,
            "source_product_area": area,
            "platform_id": platform,
            "batch_date": date,
            "listing_price": price,
        })
    };

    vec![
        obs("L1", Some("Lighting"), "P1", "2024-01-05", 10.0),
        obs("L1", Some("Lighting"), "P1", "2024-02-05", 12.0),
        obs("L1", Some("Lighting"), "P1", "2024-03-05", 15.0),
        obs("L2", Some("Lighting"), "P1", "2024-01-20", 30.0),
        obs("L2", Some("Lighting"), "P1", "2024-03-20", 33.0),
        obs("L3", Some("Lighting"), "P2", "2024-01-11", 50.0),
        obs("L3", Some("Lighting"), "P2", "2024-02-11", 40.0),
        obs("L4", Some("Audio"), "P2", "2024-01-02", 100.0),
        obs("L4", Some("Audio"), "P2", "2024-03-02", 120.0),
        obs("L5", Some("Audio"), "P2", "2024-02-14", 8.0),
        obs("L5", Some("Audio"), "P2", "2024-03-14", 9.0),
        obs("L6", Some("Garden"), "P4", "2024-01-28", 5.0),
        obs("L7", None, "P1", "2024-01-09", 1.0),
    ]
}

/// Write rows as NDJSON to a temp file and return it.
///
/// The caller must keep the file alive until DuckDB has read it.
pub fn write_ndjson(rows: &[serde_json::Value]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for row in rows {
        writeln!(file, "{}", serde_json::to_string(row).unwrap()).unwrap();
    }
    file.flush().unwrap();
    file
}

/// Write rows as NDJSON and register them as a DuckDB table.
pub fn write_ndjson_and_register(conn: &Connection, table_name: &str, rows: &[serde_json::Value]) {
    let file = write_ndjson(rows);
    let path = file.path().to_str().unwrap();
    conn.register_table_from_ndjson(table_name, path).unwrap();
    // DuckDB has copied the rows into an in-memory table; the file can go
}

pub fn month(s: &str) -> listing_trends::Month {
    s.parse().unwrap()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
