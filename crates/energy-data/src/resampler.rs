//! Distribution resampling and histogram layout.
//!
//! Small samples are expanded by repeatedly inserting midpoints between
//! neighbouring sorted values until a target size is reached, which keeps the
//! shape and support of the data while smoothing histograms drawn with many
//! bins.

use energy_core::formatting::round_1sf;
use energy_core::models::SampleSize;
use energy_core::stats::merge_sort;
use serde::Serialize;
use tracing::debug;

use crate::metrics::{MetricsRecord, RecordKey};

/// Expand `samples` to at least `target` points.
///
/// Each pass merge-sorts the current values and appends the midpoint of
/// every adjacent pair. A single value is repeated; an empty input stays
/// empty.
pub fn expand_samples(samples: &[f64], target: usize) -> Vec<f64> {
    match samples.len() {
        0 => return Vec::new(),
        1 => return vec![samples[0]; target.max(1)],
        _ => {}
    }

    let mut data = samples.to_vec();
    while data.len() < target {
        data = merge_sort(&data);
        let n = data.len();
        data.reserve(n - 1);
        for i in 0..n - 1 {
            let mid = (data[i] + data[i + 1]) / 2.0;
            data.push(mid);
        }
    }
    data
}

// ── HistogramLayout ───────────────────────────────────────────────────────────

/// Bin origin, upper edge and width shared by every series on one chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramLayout {
    pub start: f64,
    pub end: f64,
    pub width: f64,
}

impl HistogramLayout {
    /// Lay out `bins` bins over `min..=max`.
    ///
    /// The origin snaps to zero when `max / min > 5`, otherwise to `min`
    /// rounded to one significant figure, never above `min`. The width is
    /// `(max - start) / bins` rounded to one significant figure. A range
    /// with no spread gets a width of `start / bins` (or 1 at zero) so the
    /// single bin still holds every value.
    pub fn for_range(min: f64, max: f64, bins: usize) -> Self {
        let bins = bins.max(1) as f64;
        let start = if min != 0.0 && max / min <= 5.0 {
            round_1sf(min).min(min)
        } else {
            0.0
        };
        let mut width = round_1sf((max - start) / bins);
        if width <= 0.0 {
            width = if start != 0.0 {
                round_1sf(start.abs() / bins)
            } else {
                1.0
            };
        }
        Self {
            start,
            end: max,
            width,
        }
    }

    /// Number of bins needed to reach `end` at this width.
    pub fn bin_count(&self) -> usize {
        if self.width > 0.0 && self.end > self.start {
            ((self.end - self.start) / self.width).ceil().max(1.0) as usize
        } else {
            1
        }
    }

    /// Fraction of `data` falling in each bin. Values outside
    /// `start..=end` count towards the total but land in no bin.
    pub fn probabilities(&self, data: &[f64]) -> Vec<f64> {
        let bins = self.bin_count();
        let mut counts = vec![0usize; bins];
        for &v in data {
            if v < self.start || v > self.end {
                continue;
            }
            let idx = if self.width > 0.0 {
                ((v - self.start) / self.width).floor() as usize
            } else {
                0
            };
            counts[idx.min(bins - 1)] += 1;
        }
        let total = data.len().max(1) as f64;
        counts.into_iter().map(|c| c as f64 / total).collect()
    }
}

// ── Distributions ─────────────────────────────────────────────────────────────

/// One expanded series, reduced to its histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub key: RecordKey,
    /// Size of the expanded sample.
    pub points: usize,
    pub min: f64,
    pub max: f64,
    pub probabilities: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSet {
    pub size: usize,
    pub layout: HistogramLayout,
    pub series: Vec<Distribution>,
}

/// Expand every per-entity record to `size` and bin it on a common layout.
///
/// The range comes from the pooled `all` record when there is one, otherwise
/// from the extremes across all records. Returns `None` when there are no
/// records.
pub fn build_distributions(records: &[MetricsRecord], size: SampleSize) -> Option<DistributionSet> {
    let (min, max) = match records.iter().find(|r| r.key == RecordKey::All) {
        Some(all) => (all.min.value, all.max.value),
        None => {
            let min = records.iter().map(|r| r.min.value).reduce(f64::min)?;
            let max = records.iter().map(|r| r.max.value).reduce(f64::max)?;
            (min, max)
        }
    };
    let layout = HistogramLayout::for_range(min, max, size.bins());

    let series: Vec<Distribution> = records
        .iter()
        .filter(|r| r.key != RecordKey::All)
        .map(|r| {
            let expanded = expand_samples(&r.samples, size.points());
            let lo = expanded.iter().copied().reduce(f64::min).unwrap_or(0.0);
            let hi = expanded.iter().copied().reduce(f64::max).unwrap_or(0.0);
            Distribution {
                key: r.key.clone(),
                points: expanded.len(),
                min: lo,
                max: hi,
                probabilities: layout.probabilities(&expanded),
            }
        })
        .collect();

    debug!(
        size = size.points(),
        bins = layout.bin_count(),
        series = series.len(),
        "built distributions"
    );
    Some(DistributionSet {
        size: size.points(),
        layout,
        series,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
