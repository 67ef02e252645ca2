use std::collections::HashMap;

use system::{Color, PresencePatch, PresenceRecord, SessionId};
use uuid::Uuid;

use crate::registry::PresenceRegistry;

pub struct ConnectionState {
    pub color: Color,
}

pub struct ServerState {
    pub connections: HashMap<SessionId, ConnectionState>,
    pub registry: PresenceRegistry,
}

#[derive(Debug, PartialEq)]
pub enum ServerError {
    DuplicateSessionId,
    UnknownSessionId,
}

/// 32 hex digits drawn from a UUID v4, i.e. 122 random bits.
pub fn new_session_id() -> SessionId {
    Uuid::new_v4().simple().to_string()
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            registry: PresenceRegistry::new(),
        }
    }

    pub fn create_connection(
        &mut self,
        session_id: &SessionId,
        color: Color,
    ) -> Result<(), ServerError> {
        if self.connections.contains_key(session_id) {
            return Err(ServerError::DuplicateSessionId);
        }
        self.connections
            .insert(session_id.clone(), ConnectionState { color });
        log::info!("Connection {} opened", session_id);
        Ok(())
    }

    /// Upserts the presence record of a live connection. Records created here
    /// inherit the color announced in `init` unless the patch names one.
    pub fn upsert_presence(
        &mut self,
        session_id: &SessionId,
        mut patch: PresencePatch,
    ) -> Result<PresenceRecord, ServerError> {
        let connection = self
            .connections
            .get(session_id)
            .ok_or(ServerError::UnknownSessionId)?;
        if patch.color.is_none() && !self.registry.contains(session_id) {
            patch.color = Some(connection.color.clone());
        }
        Ok(self.registry.upsert(session_id, patch).clone())
    }

    pub fn disconnect(&mut self, session_id: &SessionId) -> Option<PresenceRecord> {
        self.connections.remove(session_id);
        let removed = self.registry.remove(session_id);
        log::info!("Connection {} closed", session_id);
        removed
    }
}
