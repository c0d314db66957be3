mod bootstrap;
mod report;

use anyhow::{bail, Result};
use energy_core::settings::Settings;
use energy_runtime::monitor::EnergyMonitor;

use crate::report::{build_report, render_text, ReportRequest};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    if settings.clear && settings.files.is_empty() {
        println!("Saved settings cleared");
        return Ok(());
    }

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Energy Monitor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        view = %settings.view,
        scope = %settings.scope,
        sample_size = %settings.sample_size,
        files = settings.files.len(),
        "settings resolved"
    );

    let (start, end) = settings.date_bounds()?;
    let request = ReportRequest {
        view: settings.view_mode()?,
        scope: settings.scope_mode()?,
        start,
        end,
        sample_size: settings.sample_size_choice()?,
    };

    // A rejected file leaves earlier loads in place; keep going and report
    // the failures at the end.
    let mut monitor = EnergyMonitor::new();
    let mut failed = 0usize;
    for path in &settings.files {
        if let Err(e) = monitor.load_file(path) {
            eprintln!("{}: {}", path.display(), e);
            failed += 1;
        }
    }

    if monitor.dataset().is_none() {
        bail!("No usage data loaded; pass a *_daily.csv or *_both_daily.csv file");
    }

    let report = build_report(&monitor, &request)?;
    if settings.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }

    if failed > 0 {
        bail!("{} of {} files could not be loaded", failed, settings.files.len());
    }
    Ok(())
}
