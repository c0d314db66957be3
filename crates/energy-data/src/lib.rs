//! Data layer for Energy Monitor.
//!
//! Detects and validates CSV usage and tariff files, stores daily series by
//! date, derives monthly rollups and cost series, computes per-entity metrics
//! and expands samples for distribution histograms.

pub mod aggregator;
pub mod analysis;
pub mod metrics;
pub mod reader;
pub mod resampler;
pub mod store;

pub use energy_core as core;
