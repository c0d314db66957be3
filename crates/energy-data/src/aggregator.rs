//! Monthly rollups, cost series, moving averages and range totals.

use chrono::NaiveDate;
use energy_core::formatting::round_to;
use energy_core::models::{DatasetKind, EntityKey, FuelType, Series};
use energy_core::tariffs::TariffTable;
use energy_core::time_utils::month_start;
use serde::Serialize;
use tracing::debug;

use crate::store::{Dataset, DatedSeries};

/// Decimal places each running monthly usage total is rounded to.
pub const MONTHLY_PRECISION: u32 = 7;

/// Days in the trailing moving-average window.
pub const MOVING_AVERAGE_DAYS: usize = 30;

// ── CostSeries ────────────────────────────────────────────────────────────────

/// Daily and monthly costs in pounds, keyed like the usage they were
/// computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSeries {
    /// Entities that have both usage and a tariff.
    pub entities: Vec<EntityKey>,
    pub daily: DatedSeries,
    /// Month-start keyed; each bucket exists from the month's first dated
    /// entry and grows with every later date in that month.
    pub monthly: DatedSeries,
}

// ── UsageAggregator ───────────────────────────────────────────────────────────

/// Stateless helper that derives rollups from a daily store.
pub struct UsageAggregator;

impl UsageAggregator {
    /// Sum daily values into month-start keyed totals.
    ///
    /// The accumulator restarts at the first entry of each month (normally the
    /// 1st) and every running total is rounded to [`MONTHLY_PRECISION`]
    /// places. A month is committed when the next entry falls in a different
    /// month or the data ends, so a trailing partial month is kept.
    pub fn monthly_rollup(daily: &DatedSeries) -> DatedSeries {
        let mut monthly = DatedSeries::new();
        let mut current: Option<(NaiveDate, Series)> = None;

        for (date, day) in daily.iter() {
            let month = month_start(date);
            current = Some(match current.take() {
                Some((open, total)) if open == month => {
                    let summed =
                        add_series(&total, day, |v| round_to(v, MONTHLY_PRECISION));
                    (open, summed)
                }
                Some((open, total)) => {
                    monthly.set(open, total);
                    (month, day.clone())
                }
                None => (month, day.clone()),
            });
        }
        if let Some((open, total)) = current {
            monthly.set(open, total);
        }

        debug!(days = daily.len(), months = monthly.len(), "built monthly rollup");
        monthly
    }

    /// Cost series for `dataset` under `tariffs`, or `None` when no entity
    /// has both usage and a tariff.
    ///
    /// A single-house file is costed per fuel with that house's tariff. A
    /// multi-house file is costed per house with each house's rates for the
    /// loaded fuel.
    pub fn costs(dataset: &Dataset, tariffs: &TariffTable) -> Option<CostSeries> {
        let (entities, daily) = match &dataset.kind {
            DatasetKind::SingleHouse { house_id } => {
                let tariff = tariffs.get(house_id)?;
                let daily = map_daily(&dataset.daily, |key, usage| {
                    key.as_fuel().map(|fuel| tariff.rates_for(fuel).cost(usage))
                });
                (dataset.entities.clone(), daily)
            }
            DatasetKind::MultiHouse { fuel } => {
                let houses: Vec<EntityKey> = dataset
                    .entities
                    .iter()
                    .filter(|e| matches!(e, EntityKey::Named(name) if tariffs.contains(name)))
                    .cloned()
                    .collect();
                if houses.is_empty() {
                    return None;
                }
                let daily = map_daily(&dataset.daily, |key, usage| match key {
                    EntityKey::Named(name) => tariffs
                        .get(name)
                        .map(|t| t.rates_for(*fuel).cost(usage)),
                    EntityKey::Fuel(_) => None,
                });
                (houses, daily)
            }
        };

        let monthly = Self::monthly_costs(&daily);
        debug!(
            entities = entities.len(),
            days = daily.len(),
            months = monthly.len(),
            "calculated costs"
        );
        Some(CostSeries {
            entities,
            daily,
            monthly,
        })
    }

    /// Eager per-date accumulation of daily costs into month buckets.
    pub fn monthly_costs(daily: &DatedSeries) -> DatedSeries {
        let mut monthly = DatedSeries::new();
        for (date, day) in daily.iter() {
            let month = month_start(date);
            match monthly.get_mut(month) {
                Some(bucket) => *bucket = add_series(bucket, day, |v| v),
                None => monthly.set(month, day.clone()),
            }
        }
        monthly
    }

    /// Per-entity sums over `start..=end`, in the order of `entities`.
    pub fn range_totals(
        series: &DatedSeries,
        entities: &[EntityKey],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<(EntityKey, f64)> {
        entities
            .iter()
            .map(|key| {
                let total = series
                    .range(start, end)
                    .filter_map(|(_, s)| s.get(key))
                    .sum();
                (key.clone(), total)
            })
            .collect()
    }

    /// Sum across all entities for each date in `start..=end`, e.g. combined
    /// gas and electricity for one house.
    pub fn combined_totals(
        series: &DatedSeries,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<(NaiveDate, f64)> {
        series.range(start, end).map(|(d, s)| (d, s.total())).collect()
    }
}

/// Trailing moving average over `window` points.
///
/// The first `window - 1` points average everything seen so far.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(values.len());
    let mut running = 0.0;
    for (i, &v) in values.iter().enumerate() {
        running += v;
        if i >= window {
            running -= values[i - window];
        }
        let n = (i + 1).min(window);
        out.push(running / n as f64);
    }
    out
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Add two records of the same shape key by key, passing each sum through
/// `finish`.
fn add_series(total: &Series, day: &Series, finish: impl Fn(f64) -> f64) -> Series {
    total.map_values(|key, acc| finish(acc + day.get(key).unwrap_or(0.0)))
}

/// Build a new store by transforming each value; keys for which `f` yields
/// `None` are dropped.
fn map_daily(
    daily: &DatedSeries,
    f: impl Fn(&EntityKey, f64) -> Option<f64>,
) -> DatedSeries {
    let mut out = DatedSeries::new();
    for (date, day) in daily.iter() {
        let series = match day {
            Series::Fixed { electricity, gas } => Series::Fixed {
                electricity: f(&FuelType::Electricity.into(), *electricity).unwrap_or(0.0),
                gas: f(&FuelType::Gas.into(), *gas).unwrap_or(0.0),
            },
            Series::Named(values) => Series::Named(
                values
                    .iter()
                    .filter_map(|(name, &v)| {
                        f(&EntityKey::Named(name.clone()), v).map(|c| (name.clone(), c))
                    })
                    .collect(),
            ),
        };
        out.set(date, series);
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
