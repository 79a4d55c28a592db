//! The booking entity and its interval math.
//!
//! A booking occupies a half-open range of whole days `[start, end)`:
//! the checkout day is free again, so a booking ending on a given day
//! and another starting on that same day do not collide.
//!
//! Dates are `chrono::NaiveDate` throughout. Day formatting derives
//! from calendar fields, never from a UTC-normalized instant, so a
//! booking never shifts by a day depending on the host timezone.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix marking a client-generated provisional id, i.e. a booking the
/// remote store has not confirmed yet.
pub const LOCAL_ID_PREFIX: &str = "local_";

/// Guest name used when none was entered.
pub const DEFAULT_GUEST: &str = "Guest";

/// A room booking.
///
/// `id` lives in one of two identity spaces: provisional (client-made,
/// `local_`-prefixed) or remote (assigned by the store on create
/// confirmation). A booking moves from the first to the second exactly
/// once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub room_id: String,
    pub guest: String,
    #[serde(default)]
    pub note: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Booking {
    /// Build a new provisional booking, applying the guest placeholder.
    pub fn provisional(
        room_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        guest: &str,
        note: &str,
    ) -> Booking {
        Booking {
            id: provisional_id(),
            room_id: room_id.to_string(),
            guest: display_guest(guest),
            note: note.to_string(),
            start,
            end,
        }
    }

    /// True iff this booking's id has not been confirmed by the remote
    /// store.
    pub fn is_provisional(&self) -> bool {
        is_provisional_id(&self.id)
    }

    /// True iff `day` falls inside `[start, end)`.
    pub fn occupies_day(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }

    /// Number of nights, clamped to zero for malformed ranges that may
    /// arrive from external data.
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days().max(0)
    }
}

/// Generate a fresh provisional id.
pub fn provisional_id() -> String {
    format!("{}{}", LOCAL_ID_PREFIX, Uuid::new_v4().simple())
}

/// True iff `id` is in the provisional identity space.
pub fn is_provisional_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

/// Canonical `YYYY-MM-DD` form used for display, CSV, and cache data.
pub fn day_format(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Guest name with the placeholder applied for empty input.
pub fn display_guest(guest: &str) -> String {
    let trimmed = guest.trim();
    if trimmed.is_empty() {
        DEFAULT_GUEST.to_string()
    } else {
        trimmed.to_string()
    }
}
