use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::EnergyError;

/// The two fuels a household file can report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Electricity,
    Gas,
}

impl FuelType {
    /// Both fuels, in file column order.
    pub const ALL: [FuelType; 2] = [FuelType::Electricity, FuelType::Gas];

    /// Lowercase tag as used in headers and filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Electricity => "electricity",
            FuelType::Gas => "gas",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FuelType {
    type Err = EnergyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "electricity" => Ok(FuelType::Electricity),
            "gas" => Ok(FuelType::Gas),
            other => Err(EnergyError::format(format!("Unknown fuel type: {other}"))),
        }
    }
}

/// Identity of one column of daily values.
///
/// Single-house files are keyed by fuel; multi-house files by the house
/// names taken from the header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum EntityKey {
    Fuel(FuelType),
    Named(String),
}

impl EntityKey {
    pub fn named(name: impl Into<String>) -> Self {
        EntityKey::Named(name.into())
    }

    pub fn as_fuel(&self) -> Option<FuelType> {
        match self {
            EntityKey::Fuel(fuel) => Some(*fuel),
            EntityKey::Named(_) => None,
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Fuel(fuel) => write!(f, "{fuel}"),
            EntityKey::Named(name) => f.write_str(name),
        }
    }
}

impl From<FuelType> for EntityKey {
    fn from(fuel: FuelType) -> Self {
        EntityKey::Fuel(fuel)
    }
}

/// The values recorded for one date (or one month).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Series {
    /// One house, both fuels.
    Fixed { electricity: f64, gas: f64 },
    /// One fuel, any number of named houses.
    Named(BTreeMap<String, f64>),
}

impl Series {
    /// Value for `key`, or `None` when the key does not belong to this shape.
    pub fn get(&self, key: &EntityKey) -> Option<f64> {
        match (self, key) {
            (Series::Fixed { electricity, .. }, EntityKey::Fuel(FuelType::Electricity)) => {
                Some(*electricity)
            }
            (Series::Fixed { gas, .. }, EntityKey::Fuel(FuelType::Gas)) => Some(*gas),
            (Series::Named(values), EntityKey::Named(name)) => values.get(name).copied(),
            _ => None,
        }
    }

    /// Number of entities in this record.
    pub fn len(&self) -> usize {
        match self {
            Series::Fixed { .. } => 2,
            Series::Named(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum across all entities, e.g. the combined gas + electricity figure.
    pub fn total(&self) -> f64 {
        match self {
            Series::Fixed { electricity, gas } => electricity + gas,
            Series::Named(values) => values.values().sum(),
        }
    }

    /// Build a record of the same shape with every value transformed.
    pub fn map_values(&self, mut f: impl FnMut(&EntityKey, f64) -> f64) -> Series {
        match self {
            Series::Fixed { electricity, gas } => Series::Fixed {
                electricity: f(&FuelType::Electricity.into(), *electricity),
                gas: f(&FuelType::Gas.into(), *gas),
            },
            Series::Named(values) => Series::Named(
                values
                    .iter()
                    .map(|(name, &v)| {
                        let key = EntityKey::Named(name.clone());
                        let mapped = f(&key, v);
                        (name.clone(), mapped)
                    })
                    .collect(),
            ),
        }
    }
}

/// Which of the two usage-file shapes a dataset was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DatasetKind {
    /// `{house}_both_daily.csv`: one house, both fuels.
    SingleHouse { house_id: String },
    /// `{fuel}_daily.csv`: one fuel, several houses.
    MultiHouse { fuel: FuelType },
}

impl DatasetKind {
    /// Build a record of this kind's shape from per-entity values.
    ///
    /// Keys that do not belong to the shape are ignored; missing fuels of a
    /// single-house record read as zero.
    pub fn series_from(&self, values: &BTreeMap<EntityKey, f64>) -> Series {
        match self {
            DatasetKind::SingleHouse { .. } => Series::Fixed {
                electricity: values
                    .get(&FuelType::Electricity.into())
                    .copied()
                    .unwrap_or(0.0),
                gas: values.get(&FuelType::Gas.into()).copied().unwrap_or(0.0),
            },
            DatasetKind::MultiHouse { .. } => Series::Named(
                values
                    .iter()
                    .filter_map(|(key, &v)| match key {
                        EntityKey::Named(name) => Some((name.clone(), v)),
                        EntityKey::Fuel(_) => None,
                    })
                    .collect(),
            ),
        }
    }
}

/// What a file's name says it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    Usage(DatasetKind),
    Tariffs,
}

/// Whether a query returns consumption or money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Usage,
    Costs,
}

impl FromStr for View {
    type Err = EnergyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "usage" => Ok(View::Usage),
            "costs" => Ok(View::Costs),
            other => Err(EnergyError::Config(format!("Unknown view: {other}"))),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            View::Usage => "usage",
            View::Costs => "costs",
        })
    }
}

/// Daily records or monthly rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Daily,
    Monthly,
}

impl FromStr for Scope {
    type Err = EnergyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Scope::Daily),
            "monthly" => Ok(Scope::Monthly),
            other => Err(EnergyError::Config(format!("Unknown scope: {other}"))),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Daily => "daily",
            Scope::Monthly => "monthly",
        })
    }
}

/// The fixed menu of distribution sample sizes, each paired with the number
/// of histogram bins it is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SampleSize {
    Thousand,
    #[default]
    TenThousand,
    FiftyThousand,
    HundredThousand,
    TwoHundredThousand,
    FiveHundredThousand,
    Million,
}

impl SampleSize {
    pub const ALL: [SampleSize; 7] = [
        SampleSize::Thousand,
        SampleSize::TenThousand,
        SampleSize::FiftyThousand,
        SampleSize::HundredThousand,
        SampleSize::TwoHundredThousand,
        SampleSize::FiveHundredThousand,
        SampleSize::Million,
    ];

    /// Target number of points after expansion.
    pub fn points(&self) -> usize {
        match self {
            SampleSize::Thousand => 1_000,
            SampleSize::TenThousand => 10_000,
            SampleSize::FiftyThousand => 50_000,
            SampleSize::HundredThousand => 100_000,
            SampleSize::TwoHundredThousand => 200_000,
            SampleSize::FiveHundredThousand => 500_000,
            SampleSize::Million => 1_000_000,
        }
    }

    /// Histogram bin count used at this size.
    pub fn bins(&self) -> usize {
        match self {
            SampleSize::Thousand => 50,
            SampleSize::TenThousand => 100,
            SampleSize::FiftyThousand => 200,
            SampleSize::HundredThousand => 300,
            SampleSize::TwoHundredThousand => 400,
            SampleSize::FiveHundredThousand => 500,
            SampleSize::Million => 600,
        }
    }
}

impl FromStr for SampleSize {
    type Err = EnergyError;

    /// Accepts plain or comma-grouped point counts: `"10000"`, `"10,000"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.chars().filter(|c| *c != ',' && *c != '_').collect();
        let points: usize = digits
            .trim()
            .parse()
            .map_err(|_| EnergyError::Config(format!("Invalid sample size: {s}")))?;
        SampleSize::ALL
            .into_iter()
            .find(|size| size.points() == points)
            .ok_or_else(|| EnergyError::Config(format!("Unsupported sample size: {s}")))
    }
}

impl fmt::Display for SampleSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.points())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(pairs: &[(&str, f64)]) -> Series {
        Series::Named(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect())
    }

    // ── FuelType ──────────────────────────────────────────────────────────────

    #[test]
    fn test_fuel_type_parse_case_insensitive() {
        assert_eq!("Electricity".parse::<FuelType>().unwrap(), FuelType::Electricity);
        assert_eq!("GAS".parse::<FuelType>().unwrap(), FuelType::Gas);
        assert!("oil".parse::<FuelType>().is_err());
    }

    #[test]
    fn test_fuel_type_labels() {
        assert_eq!(FuelType::Gas.as_str(), "gas");
        assert_eq!(FuelType::Electricity.to_string(), "electricity");
    }

    // ── Series ────────────────────────────────────────────────────────────────

    #[test]
    fn test_series_fixed_get() {
        let s = Series::Fixed {
            electricity: 20.93194302,
            gas: 4.063200168,
        };
        assert_eq!(s.get(&FuelType::Electricity.into()), Some(20.93194302));
        assert_eq!(s.get(&FuelType::Gas.into()), Some(4.063200168));
        assert_eq!(s.get(&EntityKey::named("house_a")), None);
    }

    #[test]
    fn test_series_named_get() {
        let s = named(&[("house_a", 5.5), ("house_b", 9.8)]);
        assert_eq!(s.get(&EntityKey::named("house_b")), Some(9.8));
        assert_eq!(s.get(&FuelType::Gas.into()), None);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_series_total() {
        let fixed = Series::Fixed {
            electricity: 2.5,
            gas: 1.5,
        };
        assert!((fixed.total() - 4.0).abs() < 1e-9);
        let multi = named(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        assert!((multi.total() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_series_map_values_keeps_shape() {
        let s = named(&[("a", 1.0), ("b", 2.0)]);
        let doubled = s.map_values(|_, v| v * 2.0);
        assert_eq!(doubled, named(&[("a", 2.0), ("b", 4.0)]));

        let fixed = Series::Fixed {
            electricity: 1.0,
            gas: 3.0,
        };
        let keyed = fixed.map_values(|key, v| match key.as_fuel() {
            Some(FuelType::Gas) => v + 10.0,
            _ => v,
        });
        assert_eq!(
            keyed,
            Series::Fixed {
                electricity: 1.0,
                gas: 13.0
            }
        );
    }

    #[test]
    fn test_series_serializes_as_flat_object() {
        let fixed = Series::Fixed {
            electricity: 1.0,
            gas: 2.0,
        };
        let json = serde_json::to_value(&fixed).unwrap();
        assert_eq!(json, serde_json::json!({"electricity": 1.0, "gas": 2.0}));
    }

    // ── DatasetKind ───────────────────────────────────────────────────────────

    #[test]
    fn test_series_from_single_house() {
        let kind = DatasetKind::SingleHouse {
            house_id: "test1".to_string(),
        };
        let mut values = BTreeMap::new();
        values.insert(EntityKey::Fuel(FuelType::Gas), 7.0);
        assert_eq!(
            kind.series_from(&values),
            Series::Fixed {
                electricity: 0.0,
                gas: 7.0
            }
        );
    }

    #[test]
    fn test_series_from_multi_house_drops_fuel_keys() {
        let kind = DatasetKind::MultiHouse {
            fuel: FuelType::Electricity,
        };
        let mut values = BTreeMap::new();
        values.insert(EntityKey::named("house_a"), 1.0);
        values.insert(EntityKey::Fuel(FuelType::Gas), 9.0);
        assert_eq!(kind.series_from(&values), named(&[("house_a", 1.0)]));
    }

    // ── SampleSize ────────────────────────────────────────────────────────────

    #[test]
    fn test_sample_size_parse() {
        assert_eq!("10,000".parse::<SampleSize>().unwrap(), SampleSize::TenThousand);
        assert_eq!("1000000".parse::<SampleSize>().unwrap(), SampleSize::Million);
        assert!("12345".parse::<SampleSize>().is_err());
        assert!("lots".parse::<SampleSize>().is_err());
    }

    #[test]
    fn test_sample_size_bins() {
        let bins: Vec<usize> = SampleSize::ALL.iter().map(|s| s.bins()).collect();
        assert_eq!(bins, vec![50, 100, 200, 300, 400, 500, 600]);
    }
}
