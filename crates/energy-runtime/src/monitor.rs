//! The owning context for loaded energy data.
//!
//! [`EnergyMonitor`] holds at most one usage dataset and one tariff table,
//! keeps every derived structure (monthly rollup, metrics, costs) in step with
//! them, and answers range-checked, read-only queries. A file is parsed and
//! validated in full before anything is replaced, so a rejected load leaves
//! the previous state untouched.

use std::path::Path;

use chrono::NaiveDate;
use energy_data::aggregator::{moving_average, CostSeries, UsageAggregator, MOVING_AVERAGE_DAYS};
use energy_data::analysis::{analyze_dataset, AnalysisResult};
use energy_data::core::error::{EnergyError, Result};
use energy_data::core::models::{EntityKey, SampleSize, Scope, Series, View};
use energy_data::core::tariffs::TariffTable;
use energy_data::metrics::MetricsRecord;
use energy_data::reader::{load_file, LoadedFile};
use energy_data::resampler::{build_distributions, DistributionSet};
use energy_data::store::{Dataset, DatedSeries};

// ── EnergyMonitor ─────────────────────────────────────────────────────────────

/// Single owner of the loaded usage data, tariffs and everything derived
/// from them.
///
/// # Example
/// ```no_run
/// use energy_runtime::monitor::EnergyMonitor;
/// use std::path::Path;
///
/// let mut monitor = EnergyMonitor::new();
/// monitor.load_file(Path::new("gas_daily.csv")).unwrap();
/// for record in monitor.metrics() {
///     println!("{}: mean {}", record.key, record.summary.mean);
/// }
/// ```
#[derive(Debug, Default)]
pub struct EnergyMonitor {
    dataset: Option<Dataset>,
    /// Monthly rollup and metrics for `dataset`.
    analysis: Option<AnalysisResult>,
    tariffs: Option<TariffTable>,
    /// Present only when `dataset` and `tariffs` share at least one entity.
    costs: Option<CostSeries>,
    /// Human-readable description of the last rejected load.
    last_error: Option<String>,
}

impl EnergyMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Loading ───────────────────────────────────────────────────────────

    /// Load, validate and commit one file.
    ///
    /// On failure nothing already loaded is changed and the error is kept
    /// for [`last_error`](Self::last_error) as well as returned.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        match load_file(path) {
            Ok(LoadedFile::Usage(dataset)) => {
                tracing::info!(
                    path = %path.display(),
                    days = dataset.days(),
                    entities = dataset.entities.len(),
                    "loaded usage file"
                );
                self.commit_dataset(dataset);
                Ok(())
            }
            Ok(LoadedFile::Tariffs(table)) => {
                tracing::info!(
                    path = %path.display(),
                    entities = table.len(),
                    "loaded tariff file"
                );
                self.commit_tariffs(table);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "load rejected; keeping previous data");
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Replace the usage dataset and rebuild everything derived from it.
    pub fn commit_dataset(&mut self, dataset: Dataset) {
        self.analysis = analyze_dataset(&dataset);
        self.dataset = Some(dataset);
        self.last_error = None;
        self.recompute_costs();
    }

    /// Replace the tariff table and rebuild the cost series.
    pub fn commit_tariffs(&mut self, table: TariffTable) {
        self.tariffs = Some(table);
        self.last_error = None;
        self.recompute_costs();
    }

    fn recompute_costs(&mut self) {
        self.costs = match (self.dataset.as_ref(), self.tariffs.as_ref()) {
            (Some(dataset), Some(tariffs)) => UsageAggregator::costs(dataset, tariffs),
            _ => None,
        };
        match &self.costs {
            Some(costs) => tracing::debug!(
                entities = costs.entities.len(),
                months = costs.monthly.len(),
                "cost series rebuilt"
            ),
            None if self.dataset.is_some() && self.tariffs.is_some() => {
                tracing::warn!("no loaded house has both usage and a tariff")
            }
            None => {}
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn tariffs(&self) -> Option<&TariffTable> {
        self.tariffs.as_ref()
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn costs(&self) -> Option<&CostSeries> {
        self.costs.as_ref()
    }

    /// Metrics records, empty when no usage is loaded.
    pub fn metrics(&self) -> &[MetricsRecord] {
        self.analysis
            .as_ref()
            .map(|a| a.metrics.as_slice())
            .unwrap_or_default()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Resolve optional bounds against the loaded daily span.
    pub fn span(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(NaiveDate, NaiveDate)> {
        self.daily()?.check_range(start, end)
    }

    /// Entities answered by `view`: every usage column, or the costed subset.
    pub fn entities(&self, view: View) -> Result<&[EntityKey]> {
        match view {
            View::Usage => Ok(self.loaded()?.entities.as_slice()),
            View::Costs => Ok(self.cost_series()?.entities.as_slice()),
        }
    }

    /// Records of `view` at `scope` between the validated bounds.
    ///
    /// Monthly records are keyed by month start and included when that key
    /// lies inside the range.
    pub fn series(
        &self,
        view: View,
        scope: Scope,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<(NaiveDate, Series)>> {
        let (start, end) = self.span(start, end)?;
        let store = self.store(view, scope)?;
        Ok(store
            .range(start, end)
            .map(|(date, series)| (date, series.clone()))
            .collect())
    }

    /// Sum across entities for each record in range, e.g. gas plus
    /// electricity for a single house.
    pub fn combined(
        &self,
        view: View,
        scope: Scope,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<(NaiveDate, f64)>> {
        let (start, end) = self.span(start, end)?;
        Ok(UsageAggregator::combined_totals(
            self.store(view, scope)?,
            start,
            end,
        ))
    }

    /// Per-entity totals of daily values over the validated range.
    pub fn totals(
        &self,
        view: View,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<(EntityKey, f64)>> {
        let (start, end) = self.span(start, end)?;
        let store = self.store(view, Scope::Daily)?;
        Ok(UsageAggregator::range_totals(
            store,
            self.entities(view)?,
            start,
            end,
        ))
    }

    /// Trailing [`MOVING_AVERAGE_DAYS`]-day average of one entity's daily
    /// values within the validated range.
    pub fn moving_average(
        &self,
        view: View,
        key: &EntityKey,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<(NaiveDate, f64)>> {
        let (start, end) = self.span(start, end)?;
        let points = self.store(view, Scope::Daily)?.points_for(key, start, end);
        if points.is_empty() {
            return Err(EnergyError::range(format!("No values for '{}'", key)));
        }
        let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
        let averaged = moving_average(&values, MOVING_AVERAGE_DAYS);
        Ok(points.into_iter().map(|(d, _)| d).zip(averaged).collect())
    }

    /// Expanded samples and histogram for every usage entity.
    pub fn distributions(&self, size: SampleSize) -> Option<DistributionSet> {
        build_distributions(self.metrics(), size)
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn loaded(&self) -> Result<&Dataset> {
        self.dataset
            .as_ref()
            .ok_or_else(|| EnergyError::range("No usage data loaded"))
    }

    fn daily(&self) -> Result<&DatedSeries> {
        Ok(&self.loaded()?.daily)
    }

    fn cost_series(&self) -> Result<&CostSeries> {
        self.costs.as_ref().ok_or_else(|| {
            EnergyError::range("No cost data: load usage and a suppliers file covering the same houses")
        })
    }

    fn store(&self, view: View, scope: Scope) -> Result<&DatedSeries> {
        match (view, scope) {
            (View::Usage, Scope::Daily) => self.daily(),
            (View::Usage, Scope::Monthly) => self
                .analysis
                .as_ref()
                .map(|a| &a.monthly)
                .ok_or_else(|| EnergyError::range("No usage data loaded")),
            (View::Costs, Scope::Daily) => Ok(&self.cost_series()?.daily),
            (View::Costs, Scope::Monthly) => Ok(&self.cost_series()?.monthly),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
