use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::presence::{PresencePatch, PresenceRecord};
use crate::types::{Color, Point, SessionId};

/// Control messages are carried in WebSocket text frames as JSON objects
/// tagged by `type`. Binary frames belong to the document sync stream and
/// never reach these decoders.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("malformed control message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Client to relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    Cursor {
        cursor: Point,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<Color>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    UserJoined {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<Color>,
    },
}

/// Relay to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    Init {
        #[serde(rename = "userId")]
        user_id: SessionId,
        color: Color,
    },
    Cursor {
        #[serde(rename = "userId")]
        user_id: SessionId,
        cursor: Point,
        color: Color,
        name: String,
    },
    UserJoined {
        user: PresenceRecord,
    },
    UserLeft {
        #[serde(rename = "userId")]
        user_id: SessionId,
    },
    ExistingUsers {
        users: Vec<PresenceRecord>,
    },
}

impl ClientMessage {
    pub fn from_text(text: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_text(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Registry fields this message asks to change. A cursor's `name` only
    /// labels the broadcast and is never stored.
    pub fn to_patch(&self) -> PresencePatch {
        match self {
            ClientMessage::Cursor { cursor, color, .. } => PresencePatch {
                name: None,
                color: color.clone(),
                cursor: Some(*cursor),
            },
            ClientMessage::UserJoined { name, color } => PresencePatch {
                name: name.clone(),
                color: color.clone(),
                cursor: None,
            },
        }
    }
}

impl ServerMessage {
    pub fn from_text(text: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_text(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Whether the receiving client should send its whole document state.
    /// Both ends of a join do: the newcomer when it gets the roster, every
    /// peer when it hears about the newcomer. Replicas merge idempotently,
    /// so a redundant push costs only bandwidth.
    pub fn calls_for_state_push(&self) -> bool {
        matches!(
            self,
            ServerMessage::UserJoined { .. } | ServerMessage::ExistingUsers { .. }
        )
    }
}
