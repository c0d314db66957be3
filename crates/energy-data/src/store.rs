//! Date-keyed series storage.
//!
//! [`DatedSeries`] backs the daily store, the monthly rollup and both cost
//! series: an ordered map from a calendar date to one [`Series`] record.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use energy_core::error::{EnergyError, Result};
use energy_core::models::{DatasetKind, EntityKey, Series};
use serde::Serialize;

// ── DatedSeries ───────────────────────────────────────────────────────────────

/// Ordered `date → record` mapping. Iteration is always chronological.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DatedSeries {
    entries: BTreeMap<NaiveDate, Series>,
}

impl DatedSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record that must come strictly after every existing date.
    ///
    /// Duplicate or out-of-order dates are a format error.
    pub fn push(&mut self, date: NaiveDate, series: Series) -> Result<()> {
        if let Some(last) = self.last_date() {
            if date <= last {
                return Err(EnergyError::format(format!(
                    "Date {} is not after the previous date {}",
                    date, last
                )));
            }
        }
        self.entries.insert(date, series);
        Ok(())
    }

    /// Insert or overwrite the record for `date`.
    pub fn set(&mut self, date: NaiveDate, series: Series) {
        self.entries.insert(date, series);
    }

    pub fn get(&self, date: NaiveDate) -> Option<&Series> {
        self.entries.get(&date)
    }

    pub fn get_mut(&mut self, date: NaiveDate) -> Option<&mut Series> {
        self.entries.get_mut(&date)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.entries.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &Series)> {
        self.entries.iter().map(|(d, s)| (*d, s))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.entries.keys().copied()
    }

    /// Records with `start <= date <= end`.
    pub fn range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = (NaiveDate, &Series)> {
        // BTreeMap::range panics on an inverted range.
        let hi = end.max(start);
        self.entries
            .range(start..=hi)
            .filter(move |(d, _)| **d <= end)
            .map(|(d, s)| (*d, s))
    }

    /// `(date, value)` pairs for `key` within `start..=end`.
    pub fn points_for(
        &self,
        key: &EntityKey,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<(NaiveDate, f64)> {
        self.range(start, end)
            .filter_map(|(d, s)| s.get(key).map(|v| (d, v)))
            .collect()
    }

    /// Check a requested span against the stored dates.
    ///
    /// Missing bounds default to the first and last stored date. Fails with a
    /// range error when the start precedes the data, the end follows it, or
    /// the end comes before the start.
    pub fn check_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(NaiveDate, NaiveDate)> {
        let (Some(first), Some(last)) = (self.first_date(), self.last_date()) else {
            return Err(EnergyError::range("No data loaded"));
        };

        let start = start.unwrap_or(first);
        let end = end.unwrap_or(last);

        if start < first {
            return Err(EnergyError::range(format!(
                "Start date {} is before the start of the data set ({})",
                start, first
            )));
        }
        if end > last {
            return Err(EnergyError::range(format!(
                "End date {} is after the end of the data set ({})",
                end, last
            )));
        }
        if end < start {
            return Err(EnergyError::range(format!(
                "End date {} is before start date {}",
                end, start
            )));
        }
        Ok((start, end))
    }
}

// ── Dataset ───────────────────────────────────────────────────────────────────

/// A validated usage file: its shape, its entities in header order, and the
/// daily store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub kind: DatasetKind,
    /// Fuels for a single-house file, house names for a multi-house file.
    pub entities: Vec<EntityKey>,
    pub daily: DatedSeries,
}

impl Dataset {
    pub fn new(kind: DatasetKind, entities: Vec<EntityKey>, daily: DatedSeries) -> Self {
        Self {
            kind,
            entities,
            daily,
        }
    }

    /// House ids covered by this dataset, in header order.
    pub fn house_ids(&self) -> Vec<String> {
        match &self.kind {
            DatasetKind::SingleHouse { house_id } => vec![house_id.clone()],
            DatasetKind::MultiHouse { .. } => self
                .entities
                .iter()
                .filter_map(|e| match e {
                    EntityKey::Named(name) => Some(name.clone()),
                    EntityKey::Fuel(_) => None,
                })
                .collect(),
        }
    }

    /// Number of daily records.
    pub fn days(&self) -> usize {
        self.daily.len()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use energy_core::error::ErrorKind;
    use energy_core::models::FuelType;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn fixed(e: f64, g: f64) -> Series {
        Series::Fixed {
            electricity: e,
            gas: g,
        }
    }

    fn three_days() -> DatedSeries {
        let mut s = DatedSeries::new();
        s.push(d(2016, 1, 1), fixed(1.0, 10.0)).unwrap();
        s.push(d(2016, 1, 2), fixed(2.0, 20.0)).unwrap();
        s.push(d(2016, 1, 3), fixed(3.0, 30.0)).unwrap();
        s
    }

    // ── push ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_push_keeps_chronological_order() {
        let s = three_days();
        let dates: Vec<_> = s.dates().collect();
        assert_eq!(dates, vec![d(2016, 1, 1), d(2016, 1, 2), d(2016, 1, 3)]);
        assert_eq!(s.first_date(), Some(d(2016, 1, 1)));
        assert_eq!(s.last_date(), Some(d(2016, 1, 3)));
    }

    #[test]
    fn test_push_rejects_duplicate_date() {
        let mut s = three_days();
        let err = s.push(d(2016, 1, 3), fixed(0.0, 0.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(s.get(d(2016, 1, 3)), Some(&fixed(3.0, 30.0)));
    }

    #[test]
    fn test_push_rejects_out_of_order_date() {
        let mut s = three_days();
        let err = s.push(d(2015, 12, 31), fixed(0.0, 0.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(s.len(), 3);
    }

    // ── queries ──────────────────────────────────────────────────────────────

    #[test]
    fn test_range_inclusive() {
        let s = three_days();
        let got: Vec<_> = s.range(d(2016, 1, 2), d(2016, 1, 3)).map(|(d, _)| d).collect();
        assert_eq!(got, vec![d(2016, 1, 2), d(2016, 1, 3)]);
        assert_eq!(s.range(d(2016, 1, 3), d(2016, 1, 1)).count(), 0);
    }

    #[test]
    fn test_points_for() {
        let s = three_days();
        let pts = s.points_for(&FuelType::Electricity.into(), d(2016, 1, 1), d(2016, 1, 2));
        assert_eq!(pts, vec![(d(2016, 1, 1), 1.0), (d(2016, 1, 2), 2.0)]);
    }

    // ── check_range ──────────────────────────────────────────────────────────

    #[test]
    fn test_check_range_defaults_to_full_span() {
        let s = three_days();
        assert_eq!(
            s.check_range(None, None).unwrap(),
            (d(2016, 1, 1), d(2016, 1, 3))
        );
    }

    #[test]
    fn test_check_range_start_before_data() {
        let s = three_days();
        let err = s.check_range(Some(d(2015, 12, 31)), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn test_check_range_end_after_data() {
        let s = three_days();
        let err = s.check_range(None, Some(d(2016, 1, 4))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn test_check_range_end_before_start() {
        let s = three_days();
        let err = s
            .check_range(Some(d(2016, 1, 3)), Some(d(2016, 1, 2)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
        assert!(err.to_string().contains("before start date"));
    }

    #[test]
    fn test_check_range_empty_store() {
        let err = DatedSeries::new().check_range(None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    // ── Dataset ──────────────────────────────────────────────────────────────

    #[test]
    fn test_dataset_house_ids() {
        let single = Dataset::new(
            DatasetKind::SingleHouse {
                house_id: "house_1".into(),
            },
            vec![FuelType::Electricity.into(), FuelType::Gas.into()],
            three_days(),
        );
        assert_eq!(single.house_ids(), vec!["house_1".to_string()]);
        assert_eq!(single.days(), 3);

        let multi = Dataset::new(
            DatasetKind::MultiHouse {
                fuel: FuelType::Gas,
            },
            vec![EntityKey::named("house_b"), EntityKey::named("house_a")],
            DatedSeries::new(),
        );
        assert_eq!(multi.house_ids(), vec!["house_b", "house_a"]);
    }
}
