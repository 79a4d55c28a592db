use anyhow::Result;
use innsync_core::error::BookingError;
use innsync_core::service::BookingService;
use owo_colors::OwoColorize;

/// Write a backup now. Explicit backups surface their errors, unlike
/// the scheduled ones.
pub async fn backup(service: &mut BookingService) -> Result<()> {
    let count = service.store().len();
    service.backup_now().await?;
    println!(
        "{} Backed up {} booking{}",
        "\u{2713}".green(),
        count,
        if count == 1 { "" } else { "s" }
    );
    Ok(())
}

/// Replace everything from the backup blob. Destructive; gated behind
/// `--yes`.
pub async fn restore(service: &mut BookingService, yes: bool) -> Result<()> {
    if !yes {
        anyhow::bail!(
            "Restore replaces all bookings with the backup contents.\n\
            Re-run with --yes to confirm."
        );
    }

    match service.restore_from_backup().await {
        Ok(count) => {
            println!(
                "{} Restored {} booking{} from backup",
                "\u{2713}".green(),
                count,
                if count == 1 { "" } else { "s" }
            );
            Ok(())
        }
        Err(BookingError::NoBackupFound) => {
            println!("No backup found");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
