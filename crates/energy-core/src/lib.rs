//! Core types for Energy Monitor.
//!
//! Domain model (fuels, entities, per-date series), the error taxonomy,
//! statistics primitives, tariffs and the cost formula, calendar helpers,
//! number formatting and CLI settings.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod stats;
pub mod tariffs;
pub mod time_utils;

pub use error::{EnergyError, ErrorKind, Result};
