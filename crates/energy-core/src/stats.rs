use serde::Serialize;

use crate::formatting::round_to;

/// Decimal places kept on every displayed statistic.
pub const DISPLAY_PRECISION: u32 = 5;

// ── Sorting ───────────────────────────────────────────────────────────────────

/// Stable top-down merge sort.
///
/// Splits at `len / 2` and, when merging, takes from the left half while its
/// head is less than or equal to the right head.
pub fn merge_sort(data: &[f64]) -> Vec<f64> {
    if data.len() <= 1 {
        return data.to_vec();
    }
    let (left, right) = data.split_at(data.len() / 2);
    merge(&merge_sort(left), &merge_sort(right))
}

fn merge(left: &[f64], right: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if left[i] <= right[j] {
            out.push(left[i]);
            i += 1;
        } else {
            out.push(right[j]);
            j += 1;
        }
    }
    out.extend_from_slice(&left[i..]);
    out.extend_from_slice(&right[j..]);
    out
}

// ── Moments ───────────────────────────────────────────────────────────────────

/// Arithmetic mean. Returns `0.0` for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation (divides by `n`, not `n - 1`).
pub fn std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let avg = mean(data);
    let total: f64 = data.iter().map(|x| (x - avg).powi(2)).sum();
    (total / data.len() as f64).sqrt()
}

/// Sum of standardised deviations raised to `power`, or `None` when the
/// spread is zero.
fn standardised_moment_sum(data: &[f64], power: i32) -> Option<f64> {
    let std = std_dev(data);
    if std == 0.0 {
        return None;
    }
    let avg = mean(data);
    Some(data.iter().map(|x| ((x - avg) / std).powi(power)).sum())
}

/// Adjusted third standardised moment, `n / ((n-1)(n-2)) * Σz³`.
///
/// Defined as `0.0` for `n <= 2` and for constant data.
pub fn skewness(data: &[f64]) -> f64 {
    let n = data.len() as f64;
    if data.len() <= 2 {
        return 0.0;
    }
    match standardised_moment_sum(data, 3) {
        Some(total) => total * n / (n - 1.0) / (n - 2.0),
        None => 0.0,
    }
}

/// Excess kurtosis,
/// `n(n+1)/((n-1)(n-2)(n-3)) * Σz⁴ − 3(n-1)²/((n-2)(n-3))`.
///
/// Defined as `0.0` for `n <= 3` and for constant data.
pub fn kurtosis(data: &[f64]) -> f64 {
    let n = data.len() as f64;
    if data.len() <= 3 {
        return 0.0;
    }
    match standardised_moment_sum(data, 4) {
        Some(total) => {
            let scaled = total * n * (n + 1.0) / (n - 1.0) / (n - 2.0) / (n - 3.0);
            scaled - 3.0 * (n - 1.0) * (n - 1.0) / (n - 2.0) / (n - 3.0)
        }
        None => 0.0,
    }
}

// ── Quartiles ─────────────────────────────────────────────────────────────────

/// Lower quartile, median and upper quartile of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub lower: f64,
    pub median: f64,
    pub upper: f64,
}

impl Quartiles {
    pub fn interquartile_range(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Interpolate a fractional zero-based index into a **sorted** slice of at
/// least two elements.
///
/// The base index is truncated towards zero and clamped to `len - 2`, so the
/// fractional part may fall outside `[0, 1)` at the extremes of tiny samples.
fn interpolate(sorted: &[f64], index: f64) -> f64 {
    let base = (index.trunc().max(0.0) as usize).min(sorted.len() - 2);
    let frac = index - base as f64;
    sorted[base] + frac * (sorted[base + 1] - sorted[base])
}

/// Quartiles by linear interpolation at zero-based indices `(n-3)/4`,
/// `(n-1)/2` and `(3n-1)/4` of the merge-sorted sample.
///
/// Returns `None` for fewer than two samples.
pub fn quartiles(data: &[f64]) -> Option<Quartiles> {
    if data.len() < 2 {
        return None;
    }
    let sorted = merge_sort(data);
    let n = sorted.len() as f64;
    Some(Quartiles {
        lower: interpolate(&sorted, (n - 3.0) / 4.0),
        median: interpolate(&sorted, (n - 1.0) / 2.0),
        upper: interpolate(&sorted, (3.0 * n - 1.0) / 4.0),
    })
}

// ── SummaryStatistics ─────────────────────────────────────────────────────────

/// Descriptive statistics for one sample, rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub count: usize,
    pub mean: f64,
    pub lower_quartile: f64,
    pub median: f64,
    pub upper_quartile: f64,
    pub interquartile_range: f64,
    pub std_dev: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl SummaryStatistics {
    /// Compute all statistics for `data`. Returns `None` for an empty sample.
    ///
    /// A single sample reports that value for every quartile.
    pub fn from_samples(data: &[f64]) -> Option<Self> {
        let first = *data.first()?;
        let qs = quartiles(data).unwrap_or(Quartiles {
            lower: first,
            median: first,
            upper: first,
        });
        let r = |v: f64| round_to(v, DISPLAY_PRECISION);
        Some(Self {
            count: data.len(),
            mean: r(mean(data)),
            lower_quartile: r(qs.lower),
            median: r(qs.median),
            upper_quartile: r(qs.upper),
            interquartile_range: r(qs.interquartile_range()),
            std_dev: r(std_dev(data)),
            skewness: r(skewness(data)),
            kurtosis: r(kurtosis(data)),
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
