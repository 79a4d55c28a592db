//! Terminal rendering for the month grid.
//!
//! The presentation counterpart of the engine: one Monday-first grid
//! per room, free days green, booked days red, out-of-month cells
//! blank. All free/busy decisions come from `Booking::occupies_day`.

use chrono::{Datelike, NaiveDate};
use innsync_core::booking::{day_format, Booking};
use innsync_core::csv::next_month;
use innsync_core::room::Room;
use owo_colors::OwoColorize;

/// Month heading, e.g. "June 2024".
pub fn month_title(first: NaiveDate) -> String {
    first.format("%B %Y").to_string()
}

/// Render one room's month grid plus its bookings for that month.
pub fn room_month(room: &Room, first: NaiveDate, bookings: &[Booking]) -> String {
    let mut lines = Vec::new();
    lines.push(room.name.bold().to_string());
    lines.push("Mo Tu We Th Fr Sa Su".dimmed().to_string());

    let days_in_month = (next_month(first) - first).num_days();
    let offset = first.weekday().num_days_from_monday() as i64;

    let mut row = vec!["  ".to_string(); offset as usize];
    for day_of_month in 1..=days_in_month {
        let day = first + chrono::Duration::days(day_of_month - 1);
        let cell = format!("{:>2}", day_of_month);
        let booked = bookings
            .iter()
            .any(|b| b.room_id == room.id && b.occupies_day(day));
        row.push(if booked {
            cell.red().to_string()
        } else {
            cell.green().to_string()
        });
        if row.len() == 7 {
            lines.push(row.join(" "));
            row = Vec::new();
        }
    }
    if !row.is_empty() {
        lines.push(row.join(" "));
    }

    lines.join("\n")
}

/// One line per booking: range, nights, guest, id.
pub fn booking_line(booking: &Booking) -> String {
    let range = format!(
        "{} \u{2192} {}",
        day_format(booking.start),
        day_format(booking.end)
    );
    let nights = format!("{}n", booking.nights());
    let mut line = format!(
        "{}  {:>3}  {}",
        range,
        nights.dimmed(),
        booking.guest
    );
    if !booking.note.is_empty() {
        line.push_str(&format!("  ({})", booking.note.dimmed()));
    }
    line.push_str(&format!("  [{}]", booking.id.dimmed()));
    line
}

/// Legend shown above the grids.
pub fn legend() -> String {
    format!("{} available   {} booked", "\u{25cf}".green(), "\u{25cf}".red())
}
