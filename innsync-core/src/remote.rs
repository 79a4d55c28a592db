//! The remote store seam.
//!
//! The authoritative store pushes full snapshots of the booking
//! collection on every change (not diffs) and offers create, update,
//! and delete round-trips that can each fail independently of the
//! subscription stream. innsync only consumes this contract; concrete
//! implementations (and their authentication) live with the embedder.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::booking::Booking;
use crate::error::BookingResult;

/// An authoritative remote document store for bookings.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Subscribe to snapshot pushes. Dropping the receiver (or the
    /// `RemoteSubscription` wrapping it) unsubscribes.
    async fn subscribe(&self) -> BookingResult<mpsc::Receiver<Vec<Booking>>>;

    /// Create a booking remotely, returning the server-assigned id.
    async fn create_booking(&self, booking: &Booking) -> BookingResult<String>;

    /// Replace the fields of an existing booking.
    async fn update_booking(&self, id: &str, booking: &Booking) -> BookingResult<()>;

    /// Delete a booking by id.
    async fn delete_booking(&self, id: &str) -> BookingResult<()>;
}

/// A live snapshot subscription.
///
/// Snapshots arrive in arbitrary order with no sequence numbers; the
/// working set applies them last-arrival-wins. Drop the subscription
/// when the consuming view goes away so the working set stops being
/// updated for nobody.
pub struct RemoteSubscription {
    rx: mpsc::Receiver<Vec<Booking>>,
}

impl RemoteSubscription {
    pub fn new(rx: mpsc::Receiver<Vec<Booking>>) -> RemoteSubscription {
        RemoteSubscription { rx }
    }

    /// Wait for the next snapshot; `None` once the remote side closed.
    pub async fn next_snapshot(&mut self) -> Option<Vec<Booking>> {
        self.rx.recv().await
    }

    /// Tear the subscription down explicitly.
    pub fn unsubscribe(self) {}
}
