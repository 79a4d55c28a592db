//! The overlap guard: decides whether a candidate interval may be
//! committed to a room.
//!
//! Two half-open ranges `[s, e)` and `[s2, e2)` conflict iff
//! `s < e2 && e > s2`. A shared boundary day is not a conflict:
//! checkout day equals the next guest's checkin day.

use chrono::NaiveDate;

use crate::booking::Booking;

/// True iff a booking with the candidate range may be committed to
/// `room_id` given the existing bookings.
///
/// `ignore_id` excludes one booking from the check so an in-place edit
/// does not conflict with its own prior interval. A `false` result
/// must short-circuit the mutation pipeline before any optimistic
/// write.
pub fn may_commit(
    room_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    existing: &[Booking],
    ignore_id: Option<&str>,
) -> bool {
    !existing.iter().any(|b| {
        b.room_id == room_id
            && ignore_id != Some(b.id.as_str())
            && start < b.end
            && end > b.start
    })
}
