use anyhow::Result;
use chrono::NaiveDate;
use innsync_core::csv::in_month;
use innsync_core::room::ROOMS;
use innsync_core::service::BookingService;
use owo_colors::OwoColorize;

use crate::render;

/// Show the month grid for every room, with that month's bookings
/// underneath.
pub fn run(service: &BookingService, month_first: NaiveDate) -> Result<()> {
    println!("{}", render::month_title(month_first).bold());
    println!("{}", render::legend());
    if !service.is_privileged() {
        println!("{}", "Read only".dimmed());
    }
    println!();

    for (i, room) in ROOMS.iter().enumerate() {
        let bookings = service.store().for_room(room.id);
        println!("{}", render::room_month(room, month_first, &bookings));

        let visible: Vec<_> = bookings
            .iter()
            .filter(|b| in_month(b, month_first))
            .collect();
        for booking in visible {
            println!("  {}", render::booking_line(booking));
        }

        if i < ROOMS.len() - 1 {
            println!();
        }
    }

    Ok(())
}
