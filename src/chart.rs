//! Chart-ready series and a plain-text table view of a [`TrendReport`].
//!
//! Nothing here draws. A renderer takes a [`TrendChart`] and plots one line
//! per series; [`render_table`] is the flat inspection view.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::models::{Month, TidyTrendRow, TrendReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub month: Month,
    pub avg_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub platform_id: String,
    /// Set when the chart splits a platform by category.
    pub category: Option<String>,
    pub label: String,
    pub pct_change: Option<f64>,
    /// Strictly increasing by month.
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<ChartSeries>,
}

impl TrendChart {
    /// One series per platform, or per (platform, category) when the
    /// selection spans several categories so every line stays monotonic.
    pub fn from_report(report: &TrendReport) -> Self {
        let split_by_category = report.selection.categories.len() > 1;
        let mut buckets: BTreeMap<(String, Option<String>), (Option<f64>, Vec<ChartPoint>)> =
            BTreeMap::new();

        for row in &report.rows {
            let category = split_by_category.then(|| row.category.clone());
            let (_, points) = buckets
                .entry((row.platform_id.clone(), category))
                .or_insert_with(|| (row.pct_change, Vec::new()));
            points.push(ChartPoint {
                month: row.month,
                avg_price: row.avg_price,
            });
        }

        let series = buckets
            .into_iter()
            .map(|((platform_id, category), (pct_change, mut points))| {
                points.sort_by_key(|p| p.month);
                let name = match &category {
                    Some(c) => format!("{} / {}", platform_id, c),
                    None => platform_id.clone(),
                };
                ChartSeries {
                    label: format!("{} ({})", name, format_pct(pct_change)),
                    platform_id,
                    category,
                    pct_change,
                    points,
                }
            })
            .collect();

        Self {
            title: format!("Avg Price Trend ({} → {})", report.baseline, report.end),
            x_label: "Month".to_string(),
            y_label: "Avg Price".to_string(),
            series,
        }
    }
}

/// Signed one-decimal percentage, or `n/a` when undefined.
pub fn format_pct(pct: Option<f64>) -> String {
    match pct {
        Some(v) => format!("{:+.1}%", v),
        None => "n/a".to_string(),
    }
}

/// Render rows as an aligned text table.
pub fn render_table(rows: &[TidyTrendRow]) -> String {
    let header = ["category", "platform_id", "month", "avg_price", "pct_change"];
    let body: Vec<[String; 5]> = rows
        .iter()
        .map(|r| {
            [
                r.category.clone(),
                r.platform_id.clone(),
                r.month.to_string(),
                format!("{:.2}", r.avg_price),
                format_pct(r.pct_change),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for line in &body {
        for (w, cell) in widths.iter_mut().zip(line) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_line = |cells: &[&str]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(c, w)| format!("{:<width$}", c, width = w))
            .collect();
        let _ = writeln!(out, "{}", padded.join("  ").trim_end());
    };

    push_line(&header);
    for line in &body {
        let cells: Vec<&str> = line.iter().map(String::as_str).collect();
        push_line(&cells);
    }
    out
}
