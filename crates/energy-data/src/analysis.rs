//! Analysis pipeline for Energy Monitor.
//!
//! Turns a validated [`Dataset`] into its monthly rollup and metrics in one
//! pass, returning an [`AnalysisResult`] ready for querying and reporting.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use crate::aggregator::UsageAggregator;
use crate::metrics::{MetricsEngine, MetricsRecord};
use crate::store::{Dataset, DatedSeries};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub days: usize,
    pub months: usize,
    pub entities: usize,
    /// Wall-clock seconds spent on the rollup and metrics.
    pub compute_time_seconds: f64,
}

/// The complete output of [`analyze_dataset`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub monthly: DatedSeries,
    pub metrics: Vec<MetricsRecord>,
    pub metadata: AnalysisMetadata,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full analysis pipeline.
///
/// 1. Roll the daily store up into months.
/// 2. Generate per-entity metrics (plus the pooled record for multi-house data).
///
/// Returns `None` for a dataset with no dates.
pub fn analyze_dataset(dataset: &Dataset) -> Option<AnalysisResult> {
    let first_date = dataset.daily.first_date()?;
    let last_date = dataset.daily.last_date()?;

    let started = std::time::Instant::now();
    let monthly = UsageAggregator::monthly_rollup(&dataset.daily);
    let metrics = MetricsEngine::generate(dataset, &monthly);
    let compute_time = started.elapsed().as_secs_f64();

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        first_date,
        last_date,
        days: dataset.days(),
        months: monthly.len(),
        entities: dataset.entities.len(),
        compute_time_seconds: compute_time,
    };

    debug!(
        days = metadata.days,
        months = metadata.months,
        records = metrics.len(),
        "analysis complete"
    );

    Some(AnalysisResult {
        monthly,
        metrics,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
