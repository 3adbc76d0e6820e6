//! Pivot / percent change / unpivot tests. Pure functions, no database.

mod common;

use listing_trends::models::{
    ChangeStatus, FilterSelection, GroupKey, MonthlyAggregate, TidyTrendRow,
};
use listing_trends::reshape::{build_report, narrow, percent_change, widen};
use listing_trends::TrendChart;

fn agg(category: &str, platform: &str, month: &str, avg_price: f64) -> MonthlyAggregate {
    MonthlyAggregate {
        category: category.to_string(),
        platform_id: platform.to_string(),
        month: common::month(month),
        avg_price,
    }
}

fn sample_aggregates() -> Vec<MonthlyAggregate> {
    vec![
        agg("Audio", "P2", "2024-01", 100.0),
        agg("Audio", "P2", "2024-03", 120.0),
        agg("Lighting", "P1", "2024-01", 20.0),
        agg("Lighting", "P1", "2024-02", 12.0),
        agg("Lighting", "P1", "2024-03", 24.0),
        agg("Lighting", "P2", "2024-01", 50.0),
        agg("Lighting", "P2", "2024-02", 40.0),
    ]
}

// ---------------------------------------------------------------------------
// percent_change
// ---------------------------------------------------------------------------

#[test]
fn percent_change_formula() {
    common::assert_close(percent_change(Some(100.0), Some(120.0)).unwrap(), 20.0);
    common::assert_close(percent_change(Some(50.0), Some(40.0)).unwrap(), -20.0);
    common::assert_close(percent_change(Some(10.0), Some(15.0)).unwrap(), 50.0);
}

#[test]
fn percent_change_missing_when_either_side_missing() {
    assert_eq!(percent_change(None, Some(120.0)), None);
    assert_eq!(percent_change(Some(100.0), None), None);
    assert_eq!(percent_change(None, None), None);
}

#[test]
fn percent_change_undefined_for_zero_baseline() {
    assert_eq!(percent_change(Some(0.0), Some(5.0)), None);
}

// ---------------------------------------------------------------------------
// widen / narrow
// ---------------------------------------------------------------------------

#[test]
fn widen_creates_month_columns_with_missing_cells() {
    let wide = widen(&sample_aggregates());
    let keys: Vec<String> = wide.months.iter().map(|m| m.key()).collect();
    assert_eq!(keys, vec!["2024-01", "2024-02", "2024-03"]);
    assert_eq!(wide.rows.len(), 3);

    let audio = GroupKey::new("Audio", "P2");
    assert_eq!(wide.cell(&audio, common::month("2024-01")), Some(100.0));
    assert_eq!(wide.cell(&audio, common::month("2024-02")), None);
    assert_eq!(wide.rows[&audio].cells, vec![Some(100.0), None, Some(120.0)]);
}

#[test]
fn widen_then_narrow_reproduces_aggregates() {
    let original = sample_aggregates();
    let mut back: Vec<(String, String, String, f64)> = narrow(&widen(&original))
        .into_iter()
        .map(|r| (r.category, r.platform_id, r.month.key(), r.avg_price))
        .collect();
    let mut expected: Vec<(String, String, String, f64)> = original
        .into_iter()
        .map(|a| (a.category, a.platform_id, a.month.key(), a.avg_price))
        .collect();

    back.sort_by(|a, b| a.partial_cmp(b).unwrap());
    expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(back, expected);
}

#[test]
fn attach_percent_change_reports_status_per_group() {
    let mut wide = widen(&sample_aggregates());
    let changes = wide.attach_percent_change(common::month("2024-01"), common::month("2024-03"));

    let status: Vec<(&str, &str, ChangeStatus)> = changes
        .iter()
        .map(|c| (c.category.as_str(), c.platform_id.as_str(), c.status))
        .collect();
    assert_eq!(
        status,
        vec![
            ("Audio", "P2", ChangeStatus::Complete),
            ("Lighting", "P1", ChangeStatus::Complete),
            ("Lighting", "P2", ChangeStatus::MissingEnd),
        ]
    );

    let lighting_p2 = &wide.rows[&GroupKey::new("Lighting", "P2")];
    assert_eq!(lighting_p2.pct_change, None);
}

#[test]
fn missing_baseline_is_not_zero_or_end_value() {
    let aggregates = vec![agg("Audio", "P3", "2024-03", 9.0)];
    let mut wide = widen(&aggregates);
    let changes = wide.attach_percent_change(common::month("2024-01"), common::month("2024-03"));

    assert_eq!(changes[0].status, ChangeStatus::MissingBaseline);
    assert_eq!(changes[0].pct_change, None);
    assert_eq!(changes[0].end_value, Some(9.0));

    let rows = narrow(&wide);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].pct_change, None);
}

// ---------------------------------------------------------------------------
// build_report
// ---------------------------------------------------------------------------

#[test]
fn report_rows_grouped_by_platform_then_month() {
    let selection = FilterSelection::new(["Audio", "Lighting"], ["P1", "P2"]);
    let report = build_report(
        &sample_aggregates(),
        common::month("2024-01"),
        common::month("2024-03"),
        &selection,
    );

    let order: Vec<(String, String, String)> = report
        .rows
        .iter()
        .map(|r| (r.platform_id.clone(), r.category.clone(), r.month.key()))
        .collect();
    let expected: Vec<(String, String, String)> = [
        ("P1", "Lighting", "2024-01"),
        ("P1", "Lighting", "2024-02"),
        ("P1", "Lighting", "2024-03"),
        ("P2", "Audio", "2024-01"),
        ("P2", "Lighting", "2024-01"),
        ("P2", "Lighting", "2024-02"),
        ("P2", "Audio", "2024-03"),
    ]
    .iter()
    .map(|(p, c, m)| (p.to_string(), c.to_string(), m.to_string()))
    .collect();
    assert_eq!(order, expected);

    let p1: Vec<&TidyTrendRow> = report.rows.iter().filter(|r| r.platform_id == "P1").collect();
    assert!(p1.iter().all(|r| r.pct_change == p1[0].pct_change));
    common::assert_close(p1[0].pct_change.unwrap(), 20.0);
}

#[test]
fn report_filters_to_current_selection() {
    let selection = FilterSelection::new(["Lighting"], ["P2"]);
    let report = build_report(
        &sample_aggregates(),
        common::month("2024-01"),
        common::month("2024-02"),
        &selection,
    );

    assert_eq!(report.rows.len(), 2);
    assert!(report
        .rows
        .iter()
        .all(|r| r.category == "Lighting" && r.platform_id == "P2"));
    assert_eq!(report.changes.len(), 1);
    common::assert_close(report.changes[0].pct_change.unwrap(), -20.0);
}

#[test]
fn same_baseline_and_end_gives_zero_change() {
    let selection = FilterSelection::new(["Audio", "Lighting"], ["P1", "P2"]);
    let jan = common::month("2024-01");
    let january_only: Vec<MonthlyAggregate> = sample_aggregates()
        .into_iter()
        .filter(|a| a.month == jan)
        .collect();
    let report = build_report(&january_only, jan, jan, &selection);

    assert_eq!(report.changes.len(), 3);
    for change in &report.changes {
        assert_eq!(change.status, ChangeStatus::Complete);
        assert_eq!(change.pct_change, Some(0.0));
    }
}

#[test]
fn report_flags_when_every_change_is_missing() {
    let selection = FilterSelection::new(["Lighting"], ["P2"]);
    let report = build_report(
        &sample_aggregates(),
        common::month("2024-01"),
        common::month("2024-03"),
        &selection,
    );
    assert!(!report.is_empty());
    assert!(report.all_missing());
    assert_eq!(
        report.change_for("Lighting", "P2").unwrap().status,
        ChangeStatus::MissingEnd
    );
}

#[test]
fn empty_aggregates_give_empty_report() {
    let selection = FilterSelection::new(["Lighting"], ["P1"]);
    let report = build_report(&[], common::month("2024-01"), common::month("2024-03"), &selection);
    assert!(report.is_empty());
    assert!(report.changes.is_empty());
    assert!(!report.all_missing());
}

#[test]
fn months_ascend_within_platform_across_categories() {
    let aggregates = vec![
        agg("A", "P1", "2024-01", 10.0),
        agg("A", "P1", "2024-02", 11.0),
        agg("B", "P1", "2024-01", 20.0),
        agg("B", "P1", "2024-02", 22.0),
    ];
    let selection = FilterSelection::new(["A", "B"], ["P1"]);
    let report = build_report(
        &aggregates,
        common::month("2024-01"),
        common::month("2024-02"),
        &selection,
    );

    let months: Vec<String> = report.rows.iter().map(|r| r.month.key()).collect();
    assert_eq!(months, vec!["2024-01", "2024-01", "2024-02", "2024-02"]);
    assert!(report.rows.windows(2).all(|w| w[0].month <= w[1].month));

    let chart = TrendChart::from_report(&report);
    let labels: Vec<&str> = chart.series.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["P1 / A (+10.0%)", "P1 / B (+10.0%)"]);
    for series in &chart.series {
        assert_eq!(series.points.len(), 2);
        assert!(series.points.windows(2).all(|w| w[0].month < w[1].month));
    }
}
