use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{EnergyError, Result};
use crate::models::FuelType;

/// Row labels the cost calculation reads from a tariff file.
pub const ELECTRICITY_STANDING_CHARGE: &str = "Electricity Standing Charge";
pub const ELECTRICITY_USAGE_RATE: &str = "Electricity Usage Rate";
pub const GAS_STANDING_CHARGE: &str = "Gas Standing Charge";
pub const GAS_USAGE_RATE: &str = "Gas Usage Rate";

/// Data rows a tariff file must contain below its header.
pub const TARIFF_ROWS: usize = 5;

/// Standing charge and unit rate for one fuel, both in pence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FuelRates {
    pub standing_charge: f64,
    pub usage_rate: f64,
}

impl FuelRates {
    /// Cost in pounds of `usage` units for one day.
    ///
    /// The pence figure is rounded to a whole penny (ties to even) before
    /// conversion, so `10 × 30.55 + 500 = 805.5p` costs £8.06.
    pub fn cost(&self, usage: f64) -> f64 {
        (usage * self.usage_rate + self.standing_charge).round_ties_even() / 100.0
    }
}

/// One entity's column of a tariff file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tariff {
    /// First data row: free text such as the supplier name, keyed by its label.
    pub details: BTreeMap<String, String>,
    /// Every numeric row, keyed by its label as written in the file.
    pub rates: BTreeMap<String, f64>,
    pub electricity: FuelRates,
    pub gas: FuelRates,
}

impl Tariff {
    /// Build a tariff from one text row and the numeric rows below it.
    ///
    /// Fails with a format error when any of the four rate labels is missing.
    pub fn from_rows(
        entity: &str,
        details: BTreeMap<String, String>,
        rates: BTreeMap<String, f64>,
    ) -> Result<Self> {
        let lookup = |label: &str| -> Result<f64> {
            find_rate(&rates, label).ok_or_else(|| {
                EnergyError::format(format!("Tariff for '{}' has no '{}' row", entity, label))
            })
        };

        let electricity = FuelRates {
            standing_charge: lookup(ELECTRICITY_STANDING_CHARGE)?,
            usage_rate: lookup(ELECTRICITY_USAGE_RATE)?,
        };
        let gas = FuelRates {
            standing_charge: lookup(GAS_STANDING_CHARGE)?,
            usage_rate: lookup(GAS_USAGE_RATE)?,
        };

        Ok(Self {
            details,
            rates,
            electricity,
            gas,
        })
    }

    /// Rates for one fuel.
    pub fn rates_for(&self, fuel: FuelType) -> FuelRates {
        match fuel {
            FuelType::Electricity => self.electricity,
            FuelType::Gas => self.gas,
        }
    }

    /// Any numeric row by label, ignoring case.
    pub fn rate(&self, label: &str) -> Option<f64> {
        find_rate(&self.rates, label)
    }
}

fn find_rate(rates: &BTreeMap<String, f64>, label: &str) -> Option<f64> {
    rates
        .iter()
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(label))
        .map(|(_, &v)| v)
}

/// Tariffs keyed by entity id, in the column order of the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TariffTable {
    order: Vec<String>,
    tariffs: BTreeMap<String, Tariff>,
}

impl TariffTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the tariff for `entity`.
    pub fn insert(&mut self, entity: impl Into<String>, tariff: Tariff) {
        let entity = entity.into();
        if !self.tariffs.contains_key(&entity) {
            self.order.push(entity.clone());
        }
        self.tariffs.insert(entity, tariff);
    }

    pub fn get(&self, entity: &str) -> Option<&Tariff> {
        self.tariffs.get(entity)
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.tariffs.contains_key(entity)
    }

    /// Entity ids in file order.
    pub fn entity_ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.tariffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tariffs.is_empty()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
