use anyhow::Result;
use innsync_core::booking::day_format;
use innsync_core::error::BookingError;
use innsync_core::service::{BookingDraft, BookingService};

use super::{flush_backup, parse_day, report_outcome};

pub struct EditArgs {
    pub start: Option<String>,
    pub end: Option<String>,
    pub guest: Option<String>,
    pub note: Option<String>,
}

/// Add a booking to a room.
pub async fn add(
    service: &mut BookingService,
    room: &str,
    start: &str,
    end: &str,
    guest: &str,
    note: &str,
) -> Result<()> {
    let draft = BookingDraft {
        room_id: room.to_string(),
        start: parse_day(start)?,
        end: parse_day(end)?,
        guest: guest.to_string(),
        note: note.to_string(),
    };

    let outcome = service.create_booking(draft).await?;
    report_outcome("Booking added", &outcome);
    flush_backup(service).await;
    Ok(())
}

/// Edit a booking in place; omitted fields keep their current value.
pub async fn edit(service: &mut BookingService, id: &str, args: EditArgs) -> Result<()> {
    let current = service
        .store()
        .get(id)
        .ok_or(BookingError::BookingNotFound(id.to_string()))?
        .clone();

    let draft = BookingDraft {
        room_id: current.room_id.clone(),
        start: match &args.start {
            Some(s) => parse_day(s)?,
            None => current.start,
        },
        end: match &args.end {
            Some(s) => parse_day(s)?,
            None => current.end,
        },
        guest: args.guest.unwrap_or(current.guest),
        note: args.note.unwrap_or(current.note),
    };

    let outcome = service.update_booking(id, draft).await?;
    report_outcome("Booking updated", &outcome);
    flush_backup(service).await;
    Ok(())
}

/// Cancel (delete) a booking.
pub async fn cancel(service: &mut BookingService, id: &str) -> Result<()> {
    let booking = service
        .store()
        .get(id)
        .ok_or(BookingError::BookingNotFound(id.to_string()))?
        .clone();

    let outcome = service.cancel_booking(id).await?;
    report_outcome(
        &format!(
            "Cancelled {} \u{2192} {} for {}",
            day_format(booking.start),
            day_format(booking.end),
            booking.guest
        ),
        &outcome,
    );
    flush_backup(service).await;
    Ok(())
}
