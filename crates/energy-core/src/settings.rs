use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{SampleSize, Scope, View};
use crate::time_utils::parse_query_date;

/// Directory under the home directory that holds persisted state and logs.
pub const APP_DIR: &str = ".energy-monitor";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Daily energy usage analysis: monthly rollups, tariff costs and statistics
#[derive(Parser, Debug, Clone)]
#[command(
    name = "energy-monitor",
    about = "Daily energy usage analysis: monthly rollups, tariff costs and statistics",
    version
)]
pub struct Settings {
    /// Usage and/or suppliers CSV files, loaded in order
    #[arg(required_unless_present = "clear")]
    pub files: Vec<PathBuf>,

    /// Report usage or costs
    #[arg(long, default_value = "usage", value_parser = ["usage", "costs"])]
    pub view: String,

    /// Report daily or monthly figures
    #[arg(long, default_value = "daily", value_parser = ["daily", "monthly"])]
    pub scope: String,

    /// First date to report (YYYY-MM-DD, defaults to the first loaded date)
    #[arg(long)]
    pub start: Option<String>,

    /// Last date to report (YYYY-MM-DD, defaults to the last loaded date)
    #[arg(long)]
    pub end: Option<String>,

    /// Number of points in the resampled distribution
    #[arg(
        long,
        default_value = "10000",
        value_parser = ["1000", "10000", "50000", "100000", "200000", "500000", "1000000"]
    )]
    pub sample_size: String,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.energy-monitor/last_used.json`.
///
/// Files and dates are tied to one dataset and are never persisted.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<String>,
}

impl LastUsedParams {
    /// Default path: `~/.energy-monitor/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(APP_DIR).join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, fill unset options from the last run, and persist
    /// the result for next time.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit args and config path.
    pub fn load_with_last_used_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        // Raw matches tell us which values came from the command line.
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!(error = %e, "could not clear saved configuration");
            }
            return settings.apply_debug_flag();
        }

        let last = LastUsedParams::load_from(config_path);

        // NOTE: clap stores the arg id using the field name (underscores).
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "scope") {
            if let Some(v) = last.scope {
                settings.scope = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "sample_size") {
            if let Some(v) = last.sample_size {
                settings.sample_size = v;
            }
        }

        settings = settings.apply_debug_flag();

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::warn!(error = %e, "could not persist last-used parameters");
        }

        settings
    }

    /// `--debug` overrides the log level.
    fn apply_debug_flag(mut self) -> Self {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }

    // ── Typed accessors ──────────────────────────────────────────────────────

    pub fn view_mode(&self) -> Result<View> {
        self.view.parse()
    }

    pub fn scope_mode(&self) -> Result<Scope> {
        self.scope.parse()
    }

    pub fn sample_size_choice(&self) -> Result<SampleSize> {
        self.sample_size.parse()
    }

    /// The requested `(start, end)` dates; `None` means "loaded span edge".
    pub fn date_bounds(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
        let start = self.start.as_deref().map(parse_query_date).transpose()?;
        let end = self.end.as_deref().map(parse_query_date).transpose()?;
        Ok((start, end))
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            view: Some(s.view.clone()),
            scope: Some(s.scope.clone()),
            sample_size: Some(s.sample_size.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
