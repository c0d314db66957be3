//! Text and JSON reports for the command-line front end.
//!
//! A [`Report`] collects everything one invocation prints: the loaded span,
//! the requested series, per-entity totals, metrics and the distribution
//! summary. [`render_text`] lays it out as aligned columns; the same struct
//! serialises straight to JSON.

use std::fmt::Write as _;

use chrono::NaiveDate;
use energy_core::error::Result;
use energy_core::formatting::{format_currency, format_number, month_label, percentage};
use energy_core::models::{DatasetKind, SampleSize, Scope, View};
use energy_data::metrics::MetricsRecord;
use energy_data::resampler::DistributionSet;
use energy_data::store::Dataset;
use energy_runtime::monitor::EnergyMonitor;
use serde::Serialize;

/// Column width for period labels.
const PERIOD_WIDTH: usize = 12;
/// Column width for values.
const VALUE_WIDTH: usize = 14;

// ── Public types ──────────────────────────────────────────────────────────────

/// What the caller asked to see.
#[derive(Debug, Clone, Copy)]
pub struct ReportRequest {
    pub view: View,
    pub scope: Scope,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub sample_size: SampleSize,
}

/// One period of the requested series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub date: NaiveDate,
    /// `"2016-01-05"` for daily rows, `"Jan 2016"` for monthly rows.
    pub period: String,
    /// One value per entity, in [`Report::entities`] order.
    pub values: Vec<f64>,
    pub total: f64,
}

/// One entity's total over the range and its share of the whole.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityTotal {
    pub entity: String,
    pub total: f64,
    pub share_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub dataset: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub view: View,
    pub scope: Scope,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub entities: Vec<String>,
    pub rows: Vec<ReportRow>,
    pub totals: Vec<EntityTotal>,
    pub metrics: Vec<MetricsRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributions: Option<DistributionSet>,
}

// ── Building ──────────────────────────────────────────────────────────────────

/// Gather a report from the loaded state. Range and availability errors from
/// the monitor are passed through unchanged.
pub fn build_report(monitor: &EnergyMonitor, request: &ReportRequest) -> Result<Report> {
    let (first_date, last_date) = monitor.span(None, None)?;
    let (start, end) = monitor.span(request.start, request.end)?;

    let entity_keys = monitor.entities(request.view)?.to_vec();
    let records = monitor.series(request.view, request.scope, Some(start), Some(end))?;

    let rows = records
        .iter()
        .map(|(date, series)| ReportRow {
            date: *date,
            period: period_label(*date, request.scope),
            values: entity_keys
                .iter()
                .map(|k| series.get(k).unwrap_or(0.0))
                .collect(),
            total: series.total(),
        })
        .collect();

    let sums = monitor.totals(request.view, Some(start), Some(end))?;
    let grand: f64 = sums.iter().map(|(_, v)| v).sum();
    let totals = sums
        .into_iter()
        .map(|(key, total)| EntityTotal {
            entity: key.to_string(),
            total,
            share_percent: percentage(total, grand, 1),
        })
        .collect();

    let dataset = monitor.dataset().map(describe).unwrap_or_default();

    Ok(Report {
        dataset,
        first_date,
        last_date,
        view: request.view,
        scope: request.scope,
        start,
        end,
        entities: entity_keys.iter().map(|k| k.to_string()).collect(),
        rows,
        totals,
        metrics: monitor.metrics().to_vec(),
        distributions: monitor.distributions(request.sample_size),
    })
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Render `report` as plain text.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let value = |v: f64| match report.view {
        View::Usage => format_number(v, 2),
        View::Costs => format_currency(v),
    };

    let _ = writeln!(out, "Energy Monitor");
    let _ = writeln!(
        out,
        "Data: {} from {} to {}",
        report.dataset, report.first_date, report.last_date
    );
    let _ = writeln!(
        out,
        "Showing {} {} from {} to {}",
        report.scope, report.view, report.start, report.end
    );
    out.push('\n');

    // Series table
    let _ = write!(out, "{:<width$}", "Period", width = PERIOD_WIDTH);
    for name in &report.entities {
        let _ = write!(out, "{:>width$}", name, width = VALUE_WIDTH);
    }
    let _ = writeln!(out, "{:>width$}", "Total", width = VALUE_WIDTH);
    if report.rows.is_empty() {
        let _ = writeln!(out, "(no {} records in range)", report.scope);
    }
    for row in &report.rows {
        let _ = write!(out, "{:<width$}", row.period, width = PERIOD_WIDTH);
        for v in &row.values {
            let _ = write!(out, "{:>width$}", value(*v), width = VALUE_WIDTH);
        }
        let _ = writeln!(out, "{:>width$}", value(row.total), width = VALUE_WIDTH);
    }
    out.push('\n');

    let _ = writeln!(out, "Totals");
    for t in &report.totals {
        let _ = writeln!(
            out,
            "  {:<width$}{:>vw$}  ({:.1}%)",
            t.entity,
            value(t.total),
            t.share_percent,
            width = PERIOD_WIDTH,
            vw = VALUE_WIDTH
        );
    }
    out.push('\n');

    let _ = writeln!(out, "Usage metrics");
    for record in &report.metrics {
        render_metrics(&mut out, record);
    }

    if let Some(set) = &report.distributions {
        out.push('\n');
        let _ = writeln!(
            out,
            "Distribution: {} points, {} bins of {} from {}",
            format_number(set.size as f64, 0),
            set.layout.bin_count(),
            set.layout.width,
            set.layout.start
        );
        for dist in &set.series {
            let peak = dist
                .probabilities
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| set.layout.start + i as f64 * set.layout.width);
            let _ = write!(
                out,
                "  {:<width$}{} points, {} to {}",
                dist.key.to_string(),
                format_number(dist.points as f64, 0),
                format_number(dist.min, 2),
                format_number(dist.max, 2),
                width = PERIOD_WIDTH
            );
            match peak {
                Some(p) => {
                    let _ = writeln!(out, ", most common bin starts at {}", format_number(p, 2));
                }
                None => out.push('\n'),
            }
        }
    }

    out
}

fn render_metrics(out: &mut String, record: &MetricsRecord) {
    let s = &record.summary;
    let _ = writeln!(
        out,
        "  {:<width$}mean {}  median {}  IQR {} ({} to {})  std {}  skew {}  kurtosis {}",
        record.key.to_string(),
        s.mean,
        s.median,
        s.interquartile_range,
        s.lower_quartile,
        s.upper_quartile,
        s.std_dev,
        s.skewness,
        s.kurtosis,
        width = PERIOD_WIDTH
    );
    let owner = |e: &Option<energy_core::models::EntityKey>| {
        e.as_ref().map(|k| format!(" ({})", k)).unwrap_or_default()
    };
    let _ = writeln!(
        out,
        "  {:<width$}min {} on {}{}  max {} on {}{}",
        "",
        record.min.value,
        record.min.date,
        owner(&record.min.entity),
        record.max.value,
        record.max.date,
        owner(&record.max.entity),
        width = PERIOD_WIDTH
    );
    if let (Some(lo), Some(hi)) = (&record.monthly_min, &record.monthly_max) {
        let _ = writeln!(
            out,
            "  {:<width$}lowest month {} ({})  highest month {} ({})",
            "",
            lo.label,
            lo.value,
            hi.label,
            hi.value,
            width = PERIOD_WIDTH
        );
    }
}

fn period_label(date: NaiveDate, scope: Scope) -> String {
    match scope {
        Scope::Daily => date.format("%Y-%m-%d").to_string(),
        Scope::Monthly => month_label(date),
    }
}

fn describe(dataset: &Dataset) -> String {
    let houses = dataset.house_ids().join(", ");
    match &dataset.kind {
        DatasetKind::SingleHouse { .. } => format!("electricity and gas for {}", houses),
        DatasetKind::MultiHouse { fuel } => format!("{} for {}", fuel, houses),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
