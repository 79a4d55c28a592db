pub mod backup;
pub mod export;
pub mod mutate;
pub mod rooms;
pub mod status;

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use innsync_core::backup::{BackupBridge, DirBackup};
use innsync_core::cache::FileCache;
use innsync_core::service::{BookingService, MutationOutcome};
use owo_colors::OwoColorize;

use crate::config::GlobalConfig;

/// Open the booking service against the configured data directory,
/// seeded from the local cache. The CLI runs without a remote store;
/// the engine treats that as offline and keeps everything local.
pub fn open_service(config: &GlobalConfig) -> Result<BookingService> {
    let data_dir = config.data_dir()?;
    let cache = Arc::new(FileCache::new(data_dir.join("cache")));
    let backup = BackupBridge::new(Some(Arc::new(DirBackup::new(data_dir.join("backups")))));

    let mut service = BookingService::new(cache, !config.read_only).with_backup(backup);
    service.seed_from_cache();
    Ok(service)
}

/// Parse `YYYY-MM-DD`.
pub fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid date '{}'. Expected YYYY-MM-DD", s))
}

/// Parse `YYYY-MM` into the first day of that month.
pub fn parse_month(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid month '{}'. Expected YYYY-MM", s))
}

/// Print a settled mutation result, surfacing any sync warning.
pub fn report_outcome(action: &str, outcome: &MutationOutcome) {
    match outcome {
        MutationOutcome::Confirmed { id } => {
            println!("{} {} ({})", "\u{2713}".green(), action, id.dimmed());
        }
        MutationOutcome::LocalOnly { id, warning } => {
            println!("{} {} ({})", "\u{2713}".green(), action, id.dimmed());
            if let Some(warning) = warning {
                println!("  {}", warning.yellow());
            }
        }
    }
}

/// Flush the debounced backup before the one-shot process exits.
/// Best-effort, like any scheduled backup.
pub async fn flush_backup(service: &mut BookingService) {
    if let Err(err) = service.backup_now().await {
        tracing::debug!(error = %err, "backup flush failed");
    }
}
