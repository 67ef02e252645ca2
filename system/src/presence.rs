use serde::{Deserialize, Serialize};

use crate::types::{default_label, Color, Point, SessionId};

/// Relay-side state of a single session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Point>,
}

/// Fields to merge into a presence record. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresencePatch {
    pub name: Option<String>,
    pub color: Option<Color>,
    pub cursor: Option<Point>,
}

impl PresenceRecord {
    pub fn new(id: SessionId, color: Color) -> Self {
        Self {
            id,
            name: None,
            color,
            cursor: None,
        }
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| default_label(&self.id))
    }

    pub fn apply(&mut self, patch: PresencePatch) {
        if let Some(name) = patch.name {
            self.name = Some(name);
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(cursor) = patch.cursor {
            self.cursor = Some(cursor);
        }
    }
}
