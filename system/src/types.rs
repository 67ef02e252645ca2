use serde::{Deserialize, Serialize};

/// Opaque per-connection token. Generated by the server only.
pub type SessionId = String;

/// `#RRGGBB` hex color string.
pub type Color = String;

/// Logical name of a shared CRDT document.
pub type DocumentName = String;

/// Canvas-local pixel coordinates unless stated otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset_by(&self, origin: &Point) -> Point {
        Point::new(origin.x + self.x, origin.y + self.y)
    }
}

/// Leading `len` characters of a session id, used for labels.
pub fn short_id(id: &str, len: usize) -> String {
    id.chars().take(len).collect()
}

/// Label used for a session that never announced a display name.
pub fn default_label(id: &str) -> String {
    format!("User {}", short_id(id, 4))
}
