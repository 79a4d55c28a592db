use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use innsync_core::csv::{
    export_csv, export_filename, export_month_csv, month_export_filename,
};
use innsync_core::service::BookingService;
use owo_colors::OwoColorize;

/// Export bookings as CSV: the whole working set, or one month's worth.
pub fn run(
    service: &BookingService,
    month_first: Option<NaiveDate>,
    output: Option<PathBuf>,
) -> Result<()> {
    let bookings = service.store().snapshot();
    let now = Local::now().naive_local();

    let (csv, default_name) = match month_first {
        Some(first) => (
            export_month_csv(&bookings, first),
            month_export_filename(first, now),
        ),
        None => (export_csv(&bookings), export_filename(now)),
    };

    let path = output.unwrap_or_else(|| PathBuf::from(default_name));
    std::fs::write(&path, &csv)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    // Row count excludes the header
    let rows = csv.matches("\r\n").count();
    println!(
        "{} Exported {} booking{} to {}",
        "\u{2713}".green(),
        rows,
        if rows == 1 { "" } else { "s" },
        path.display()
    );
    Ok(())
}
