use chrono::{Datelike, NaiveDate};

use crate::error::{EnergyError, Result};

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse a `YYYYMMDD` date cell from a data file.
///
/// A token that is not exactly eight ASCII digits is a format error; eight
/// digits that do not name a calendar day (`20170229`) are a parse error.
pub fn parse_date_token(token: &str) -> Result<NaiveDate> {
    let token = token.trim();
    if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EnergyError::format(format!(
            "Date '{}' is not in YYYYMMDD form",
            token
        )));
    }

    // All eight bytes are ASCII digits, so the slices and parses cannot fail.
    let year: i32 = token[0..4].parse().unwrap_or_default();
    let month: u32 = token[4..6].parse().unwrap_or_default();
    let day: u32 = token[6..8].parse().unwrap_or_default();

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| EnergyError::parse(format!("Date '{}' is not a calendar date", token)))
}

/// Build a date from its components, rejecting impossible days such as
/// 31 April or 29 February in a common year.
pub fn date_from_parts(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        EnergyError::range(format!(
            "{:04}-{:02}-{:02} is not a valid date",
            year, month, day
        ))
    })
}

/// Parse a `YYYY-MM-DD` query date.
pub fn parse_query_date(s: &str) -> Result<NaiveDate> {
    let parts: Vec<&str> = s.trim().split('-').collect();
    if parts.len() != 3 {
        return Err(EnergyError::range(format!(
            "Date '{}' is not in YYYY-MM-DD form",
            s
        )));
    }
    let bad = || EnergyError::range(format!("Date '{}' is not in YYYY-MM-DD form", s));
    let year: i32 = parts[0].parse().map_err(|_| bad())?;
    let month: u32 = parts[1].parse().map_err(|_| bad())?;
    let day: u32 = parts[2].parse().map_err(|_| bad())?;
    date_from_parts(year, month, day)
}

// ── Month arithmetic ──────────────────────────────────────────────────────────

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
