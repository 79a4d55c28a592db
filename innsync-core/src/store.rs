//! The working set: the canonical in-memory collection of bookings.
//!
//! `BookingStore` is an explicitly owned object injected into whatever
//! reads or mutates bookings; there is no module-level singleton.
//! Observers (the backup bridge, a UI) subscribe through a watch
//! channel and see every settled change as a full snapshot.
//!
//! The merge policy is per-id, by source priority: a remote snapshot
//! always supersedes the same id locally (it reflects the latest
//! confirmed server state), but never removes a purely-local record
//! the remote does not know about yet — that is how unsynced writes
//! survive reconciliation.

use std::collections::HashMap;

use tokio::sync::watch;

use crate::booking::Booking;

/// The working set of bookings, keyed by id.
#[derive(Debug)]
pub struct BookingStore {
    entries: HashMap<String, Booking>,
    changed: watch::Sender<Vec<Booking>>,
}

impl Default for BookingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingStore {
    pub fn new() -> BookingStore {
        let (changed, _) = watch::channel(Vec::new());
        BookingStore {
            entries: HashMap::new(),
            changed,
        }
    }

    /// Subscribe to settled working-set changes. Each notification
    /// carries the full current snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Booking>> {
        self.changed.subscribe()
    }

    /// Replace the working set wholesale. Used at startup (the cache is
    /// authoritative until the remote arrives) and on backup restore.
    pub fn seed(&mut self, bookings: Vec<Booking>) {
        self.entries = bookings.into_iter().map(|b| (b.id.clone(), b)).collect();
        self.notify();
    }

    /// Fold a remote snapshot into the working set.
    ///
    /// Every incoming record is inserted or overwritten by id; records
    /// present only locally are left untouched. Duplicate ids within a
    /// single snapshot resolve to the last one in iteration order.
    /// Snapshots carry no sequence numbers, so a stale snapshot
    /// arriving late can transiently revert a record; that is accepted
    /// and not corrected here.
    pub fn reconcile(&mut self, remote_snapshot: Vec<Booking>) {
        if remote_snapshot.is_empty() {
            return;
        }
        for record in remote_snapshot {
            self.entries.insert(record.id.clone(), record);
        }
        self.notify();
    }

    /// Insert or replace a single booking.
    pub fn upsert(&mut self, booking: Booking) {
        self.entries.insert(booking.id.clone(), booking);
        self.notify();
    }

    /// Remove a booking by id, returning it if present.
    pub fn remove(&mut self, id: &str) -> Option<Booking> {
        let removed = self.entries.remove(id);
        if removed.is_some() {
            self.notify();
        }
        removed
    }

    /// Rename a booking from a provisional id to its server-assigned id,
    /// preserving every other field. Returns false if `old_id` is gone
    /// (e.g. cancelled while the create round-trip was in flight).
    pub fn rebind(&mut self, old_id: &str, new_id: &str) -> bool {
        match self.entries.remove(old_id) {
            Some(mut booking) => {
                booking.id = new_id.to_string();
                self.entries.insert(booking.id.clone(), booking);
                self.notify();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Booking> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full snapshot, sorted by room, start day, then id for stable
    /// output.
    pub fn snapshot(&self) -> Vec<Booking> {
        let mut all: Vec<Booking> = self.entries.values().cloned().collect();
        all.sort_by(|a, b| {
            (a.room_id.as_str(), a.start, a.id.as_str())
                .cmp(&(b.room_id.as_str(), b.start, b.id.as_str()))
        });
        all
    }

    /// Bookings for one room, sorted by start day.
    pub fn for_room(&self, room_id: &str) -> Vec<Booking> {
        let mut room: Vec<Booking> = self
            .entries
            .values()
            .filter(|b| b.room_id == room_id)
            .cloned()
            .collect();
        room.sort_by_key(|b| b.start);
        room
    }

    fn notify(&self) {
        // No receivers is fine; the send result only signals that.
        let _ = self.changed.send(self.snapshot());
    }
}
