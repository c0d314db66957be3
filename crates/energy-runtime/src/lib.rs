//! Runtime layer for Energy Monitor.
//!
//! Owns the loaded usage and tariff data and keeps the derived monthly,
//! metrics and cost state consistent across loads.

pub mod monitor;

pub use energy_core as core;
pub use energy_data as data;
