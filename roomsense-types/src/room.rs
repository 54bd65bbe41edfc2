//! Room identifiers.

use core::fmt;

/// A monitored room.
///
/// The set of rooms is closed: every inbound report must name one of these
/// variants, and a report for any other room is rejected at decode time
/// rather than silently accepted under a free-form string key.
///
/// On the wire rooms use their snake_case names (`"living_room"`,
/// `"kitchen"`, `"bedroom"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Room {
    LivingRoom,
    Kitchen,
    Bedroom,
}

impl Room {
    /// All known rooms, in wire order.
    pub const ALL: [Room; 3] = [Room::LivingRoom, Room::Kitchen, Room::Bedroom];

    /// The wire name of this room.
    pub fn name(&self) -> &'static str {
        match self {
            Room::LivingRoom => "living_room",
            Room::Kitchen => "kitchen",
            Room::Bedroom => "bedroom",
        }
    }

    /// Look up a room by its wire name.
    ///
    /// Returns `None` for unknown names; the caller decides whether that is
    /// a recoverable rejection (the decoder) or a programming error.
    pub fn from_name(name: &str) -> Option<Room> {
        match name {
            "living_room" => Some(Room::LivingRoom),
            "kitchen" => Some(Room::Kitchen),
            "bedroom" => Some(Room::Bedroom),
            _ => None,
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
