use std::collections::HashMap;

use actix_web::web::Bytes;
use system::{DocumentName, SessionId};

/// A binary sync frame addressed to one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncDelivery {
    pub to: SessionId,
    pub frame: Bytes,
}

/// Document synchronization behind the relay. Frames are opaque to the
/// relay; the engine decides who receives what.
pub trait SyncEngine: Send + 'static {
    fn attach(&mut self, document: &str, session_id: &SessionId);

    fn receive(&mut self, document: &str, from: &SessionId, frame: Bytes) -> Vec<SyncDelivery>;

    fn detach(&mut self, document: &str, session_id: &SessionId);
}

/// Forwards every frame to the other connections of the same document.
///
/// Merging is left to the clients' CRDT replicas, so a document only lives as
/// long as at least one client holds it.
#[derive(Default)]
pub struct RelaySyncEngine {
    documents: HashMap<DocumentName, Vec<SessionId>>,
}

impl RelaySyncEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn participants(&self, document: &str) -> &[SessionId] {
        self.documents
            .get(document)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

impl SyncEngine for RelaySyncEngine {
    fn attach(&mut self, document: &str, session_id: &SessionId) {
        let participants = self.documents.entry(document.to_string()).or_default();
        if !participants.contains(session_id) {
            participants.push(session_id.clone());
        }
    }

    fn receive(&mut self, document: &str, from: &SessionId, frame: Bytes) -> Vec<SyncDelivery> {
        let participants = self.participants(document);
        if !participants.contains(from) {
            log::warn!("Sync frame from {} which isn't attached to {}", from, document);
            return Vec::new();
        }
        participants
            .iter()
            .filter(|id| *id != from)
            .map(|id| SyncDelivery {
                to: id.clone(),
                frame: frame.clone(),
            })
            .collect()
    }

    fn detach(&mut self, document: &str, session_id: &SessionId) {
        if let Some(participants) = self.documents.get_mut(document) {
            participants.retain(|e| e != session_id);
            if participants.is_empty() {
                self.documents.remove(document);
            }
        }
    }
}
