use std::collections::HashMap;

use system::SessionId;
use tokio::sync::mpsc::error::TrySendError;

use crate::connection::ConnectionEvent;

pub type ConnectionTx = tokio::sync::mpsc::Sender<ConnectionEvent>;

/// What happened to an event handed to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// Buffer full; the event was ephemeral and is lost.
    Dropped,
    /// Buffer full with an event the connection must not miss. The caller
    /// has to disconnect it.
    Lagging,
    /// Unknown or already closing.
    Gone,
}

/// Outbound channels of live connections.
///
/// Sends never wait, so a stalled client can't hold up the relay.
pub struct ConnectionTxStorage {
    connection_txs: HashMap<SessionId, ConnectionTx>,
}

impl ConnectionTxStorage {
    pub fn new() -> Self {
        Self {
            connection_txs: HashMap::new(),
        }
    }

    pub fn insert(&mut self, session_id: SessionId, tx: ConnectionTx) {
        self.connection_txs.insert(session_id, tx);
    }

    /// Dropping the returned sender ends the connection's egress.
    pub fn remove(&mut self, session_id: &SessionId) -> Option<ConnectionTx> {
        self.connection_txs.remove(session_id)
    }

    pub fn len(&self) -> usize {
        self.connection_txs.len()
    }

    pub fn send(&self, to: &SessionId, event: ConnectionEvent) -> Delivery {
        let Some(tx) = self.connection_txs.get(to) else {
            log::warn!("Tried to send to unknown connection {}", to);
            return Delivery::Gone;
        };
        let ephemeral = event.is_ephemeral();
        match tx.try_send(event) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) if ephemeral => {
                log::debug!("Outbound buffer of {} is full, dropping cursor", to);
                Delivery::Dropped
            }
            Err(TrySendError::Full(_)) => {
                log::warn!("Outbound buffer of {} is full", to);
                Delivery::Lagging
            }
            Err(TrySendError::Closed(_)) => {
                log::debug!("Connection {} is already closing", to);
                Delivery::Gone
            }
        }
    }

    /// Sends `event` to every connection except `without` and returns the
    /// ones that are lagging.
    pub fn broadcast(
        &self,
        event: ConnectionEvent,
        without: Option<&SessionId>,
    ) -> Vec<SessionId> {
        self.connection_txs
            .keys()
            .filter(|session_id| without != Some(*session_id))
            .filter(|session_id| self.send(session_id, event.clone()) == Delivery::Lagging)
            .cloned()
            .collect()
    }
}
