//! Core engine for the innsync room-booking calendar.
//!
//! This crate holds everything with real invariants:
//! - `booking` / `room`: the booking entity, half-open day intervals,
//!   and the fixed room registry
//! - `overlap`: the guard that keeps a room's bookings disjoint
//! - `store`: the working set and its remote-snapshot merge policy
//! - `service`: the optimistic mutation pipeline
//! - `backup`: the debounced backup bridge and restore path
//! - `cache` / `remote`: the local-cache and remote-store seams
//! - `csv`: the contractual export format
//!
//! The CLI in the root crate is presentation glue over this.

pub mod backup;
pub mod booking;
pub mod cache;
pub mod csv;
pub mod error;
pub mod overlap;
pub mod remote;
pub mod room;
pub mod service;
pub mod store;

pub use booking::Booking;
pub use error::{BookingError, BookingResult};
pub use service::{BookingDraft, BookingService, MutationOutcome};
pub use store::BookingStore;
