//! The fixed room registry.
//!
//! A small property has a static set of rooms; they are compiled in and
//! never change at runtime. Bookings reference rooms by id (`r1`..`r7`).

/// A bookable room (or other unit, like the sauna).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Room {
    pub id: &'static str,
    pub name: &'static str,
}

/// All bookable units, in display order.
pub const ROOMS: [Room; 7] = [
    Room { id: "r1", name: "Double Room" },
    Room { id: "r2", name: "Double or Twin Room" },
    Room { id: "r3", name: "Standard Double Room" },
    Room { id: "r4", name: "Deluxe Double Room" },
    Room { id: "r5", name: "Family Room with Balcony" },
    Room { id: "r6", name: "Cottage in the Garden" },
    Room { id: "r7", name: "Sauna" },
];

/// Look up a room by id.
pub fn room_by_id(id: &str) -> Option<&'static Room> {
    ROOMS.iter().find(|r| r.id == id)
}

/// Display name for a room id, or `""` for an unknown id.
///
/// Unknown ids can appear in data written by newer versions; exports
/// must not fail on them.
pub fn room_name(id: &str) -> &'static str {
    room_by_id(id).map(|r| r.name).unwrap_or("")
}
