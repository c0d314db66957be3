//! Per-entity metrics: summary statistics, daily and monthly extremes, and
//! the raw samples the resampler expands.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use energy_core::formatting::{month_label, round_to};
use energy_core::models::{DatasetKind, EntityKey};
use energy_core::stats::{SummaryStatistics, DISPLAY_PRECISION};
use energy_core::time_utils::month_start;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::store::{Dataset, DatedSeries};

// ── Types ─────────────────────────────────────────────────────────────────────

/// Which series a [`MetricsRecord`] describes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKey {
    Entity(EntityKey),
    /// Every house of a multi-house file pooled together.
    All,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Entity(key) => write!(f, "{}", key),
            RecordKey::All => write!(f, "all"),
        }
    }
}

impl Serialize for RecordKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A daily minimum or maximum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extreme {
    pub value: f64,
    pub date: NaiveDate,
    /// Owning entity; only set on the pooled `all` record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityKey>,
}

/// A monthly minimum or maximum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyExtreme {
    pub value: f64,
    pub month: NaiveDate,
    /// `"Jan 2016"`.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRecord {
    pub key: RecordKey,
    pub summary: SummaryStatistics,
    pub min: Extreme,
    pub max: Extreme,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_min: Option<MonthlyExtreme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_max: Option<MonthlyExtreme>,
    /// Statistics for each calendar month, keyed by month start.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub per_month: BTreeMap<NaiveDate, SummaryStatistics>,
    /// Unrounded daily values in date order.
    #[serde(skip)]
    pub samples: Vec<f64>,
}

// ── Extremes scan ─────────────────────────────────────────────────────────────

/// Running minimum and maximum. A later equal value never replaces the
/// recorded extreme.
#[derive(Debug, Default)]
struct ExtremeTracker {
    min: Option<Extreme>,
    max: Option<Extreme>,
}

impl ExtremeTracker {
    fn observe(&mut self, value: f64, date: NaiveDate, entity: Option<&EntityKey>) {
        let make = || Extreme {
            value: round_to(value, DISPLAY_PRECISION),
            date,
            entity: entity.cloned(),
        };
        if self.min.as_ref().map_or(true, |m| value < m.value) {
            self.min = Some(make());
        }
        if self.max.as_ref().map_or(true, |m| value > m.value) {
            self.max = Some(make());
        }
    }

    fn finish(self) -> Option<(Extreme, Extreme)> {
        Some((self.min?, self.max?))
    }
}

// ── MetricsEngine ─────────────────────────────────────────────────────────────

/// Stateless helper that builds [`MetricsRecord`]s.
pub struct MetricsEngine;

impl MetricsEngine {
    /// One record per entity in header order, then the pooled `all` record
    /// for a multi-house file.
    pub fn generate(dataset: &Dataset, monthly: &DatedSeries) -> Vec<MetricsRecord> {
        let mut records = Vec::with_capacity(dataset.entities.len() + 1);
        let mut pooled = ExtremeTracker::default();
        let mut pooled_samples = Vec::new();

        for entity in &dataset.entities {
            let mut tracker = ExtremeTracker::default();
            let mut samples = Vec::with_capacity(dataset.days());
            let mut by_month: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();

            for (date, day) in dataset.daily.iter() {
                let Some(value) = day.get(entity) else {
                    continue;
                };
                tracker.observe(value, date, None);
                pooled.observe(value, date, Some(entity));
                samples.push(value);
                by_month.entry(month_start(date)).or_default().push(value);
            }

            let Some(summary) = SummaryStatistics::from_samples(&samples) else {
                continue;
            };
            let Some((min, max)) = tracker.finish() else {
                continue;
            };
            let (monthly_min, monthly_max) = Self::monthly_extremes(monthly, entity);
            let per_month = by_month
                .iter()
                .filter_map(|(m, v)| SummaryStatistics::from_samples(v).map(|s| (*m, s)))
                .collect();

            pooled_samples.extend_from_slice(&samples);
            records.push(MetricsRecord {
                key: RecordKey::Entity(entity.clone()),
                summary,
                min,
                max,
                monthly_min,
                monthly_max,
                per_month,
                samples,
            });
        }

        if matches!(dataset.kind, DatasetKind::MultiHouse { .. }) {
            if let (Some(summary), Some((min, max))) = (
                SummaryStatistics::from_samples(&pooled_samples),
                pooled.finish(),
            ) {
                records.push(MetricsRecord {
                    key: RecordKey::All,
                    summary,
                    min,
                    max,
                    monthly_min: None,
                    monthly_max: None,
                    per_month: BTreeMap::new(),
                    samples: pooled_samples,
                });
            }
        }

        debug!(records = records.len(), "generated metrics");
        records
    }

    /// Smallest and largest monthly totals for `entity`, first-seen on ties.
    fn monthly_extremes(
        monthly: &DatedSeries,
        entity: &EntityKey,
    ) -> (Option<MonthlyExtreme>, Option<MonthlyExtreme>) {
        let mut min: Option<MonthlyExtreme> = None;
        let mut max: Option<MonthlyExtreme> = None;
        for (month, totals) in monthly.iter() {
            let Some(value) = totals.get(entity) else {
                continue;
            };
            let make = || MonthlyExtreme {
                value: round_to(value, DISPLAY_PRECISION),
                month,
                label: month_label(month),
            };
            if min.as_ref().map_or(true, |m| value < m.value) {
                min = Some(make());
            }
            if max.as_ref().map_or(true, |m| value > m.value) {
                max = Some(make());
            }
        }
        (min, max)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
