use actix_web::web::Bytes;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use system::{
    default_label, ClientMessage, DocumentName, PresencePatch, PresenceRecord, ServerMessage,
    SessionId,
};

use crate::connection::ConnectionEvent;
use crate::connection_tx_storage::{ConnectionTx, ConnectionTxStorage, Delivery};
use crate::palette::pick_color;
use crate::server_state::{ServerError, ServerState};
use crate::sync_engine::SyncEngine;

pub type ServerTx = UnboundedSender<ServerCommand>;

#[derive(Debug)]
pub enum ServerCommand {
    Connect {
        session_id: SessionId,
        tx: ConnectionTx,
    },
    Disconnect {
        from: SessionId,
    },
    /// Text frame; expected to hold a control message.
    Control {
        from: SessionId,
        text: String,
    },
    /// Binary frame of the document sync stream.
    Sync {
        from: SessionId,
        frame: Bytes,
    },
}

/// The relay. Owns every piece of shared state and handles one command at a
/// time.
pub struct Server<E: SyncEngine> {
    document: DocumentName,
    server_state: ServerState,
    connections: ConnectionTxStorage,
    sync_engine: E,
}

impl<E: SyncEngine> Server<E> {
    pub fn new(document: DocumentName, sync_engine: E) -> Self {
        Self {
            document,
            server_state: ServerState::new(),
            connections: ConnectionTxStorage::new(),
            sync_engine,
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn presence_count(&self) -> usize {
        self.server_state.registry.len()
    }

    pub fn handle_command(&mut self, command: ServerCommand) {
        match command {
            ServerCommand::Connect { session_id, tx } => self.connect(session_id, tx),
            ServerCommand::Disconnect { from } => self.disconnect(&from),
            ServerCommand::Control { from, text } => match ClientMessage::from_text(&text) {
                Ok(message) => self.handle_client_message(&from, message),
                Err(err) => log::debug!("Ignoring text frame from {}: {}", from, err),
            },
            ServerCommand::Sync { from, frame } => {
                if !self.is_connected(&from) {
                    return;
                }
                log::debug!("Sync frame from {} ({} bytes)", from, frame.len());
                for delivery in self.sync_engine.receive(&self.document, &from, frame) {
                    self.deliver(&delivery.to, ConnectionEvent::Binary(delivery.frame));
                }
            }
        }
    }

    fn connect(&mut self, session_id: SessionId, tx: ConnectionTx) {
        let color = pick_color();
        if let Err(err) = self.server_state.create_connection(&session_id, color.clone()) {
            log::warn!("Refusing connection {}: {:?}", session_id, err);
            let _ = tx.try_send(ConnectionEvent::Disconnected);
            return;
        }
        self.connections.insert(session_id.clone(), tx);
        self.sync_engine.attach(&self.document, &session_id);
        // Nothing else has been queued for this connection yet, so `init`
        // is the first thing it sees.
        self.send(
            &session_id,
            &ServerMessage::Init {
                user_id: session_id.clone(),
                color,
            },
        );
    }

    fn handle_client_message(&mut self, from: &SessionId, message: ClientMessage) {
        log::debug!("Control from {}: {:?}", from, message);
        let patch = message.to_patch();
        match message {
            ClientMessage::Cursor { cursor, name, .. } => {
                let record = match self.upsert_presence(from, patch) {
                    Ok(record) => record,
                    Err(_) => return,
                };
                let message = ServerMessage::Cursor {
                    user_id: from.clone(),
                    cursor,
                    color: record.color.clone(),
                    name: name.unwrap_or_else(|| record.display_name()),
                };
                if let Some(text) = encode(&message) {
                    self.broadcast_event(ConnectionEvent::Ephemeral(text), Some(from));
                }
            }
            ClientMessage::UserJoined { .. } => {
                let patch = PresencePatch {
                    name: patch.name.or_else(|| Some(default_label(from))),
                    ..patch
                };
                let record = match self.upsert_presence(from, patch) {
                    Ok(record) => record,
                    Err(_) => return,
                };
                let users = self
                    .server_state
                    .registry
                    .all()
                    .into_iter()
                    .filter(|user| &user.id != from)
                    .collect();
                self.send(from, &ServerMessage::ExistingUsers { users });
                if !self.is_connected(from) {
                    return;
                }
                self.broadcast(&ServerMessage::UserJoined { user: record }, Some(from));
            }
        }
    }

    fn upsert_presence(
        &mut self,
        from: &SessionId,
        patch: PresencePatch,
    ) -> Result<PresenceRecord, ServerError> {
        self.server_state
            .upsert_presence(from, patch)
            .map_err(|err| {
                log::warn!("Presence update from {} rejected: {:?}", from, err);
                err
            })
    }

    fn disconnect(&mut self, session_id: &SessionId) {
        // Dropping the sender lets the connection drain and close itself.
        if self.connections.remove(session_id).is_none() {
            return;
        }
        self.server_state.disconnect(session_id);
        self.sync_engine.detach(&self.document, session_id);
        self.broadcast(
            &ServerMessage::UserLeft {
                user_id: session_id.clone(),
            },
            None,
        );
    }

    fn is_connected(&self, session_id: &SessionId) -> bool {
        self.server_state.connections.contains_key(session_id)
    }

    fn send(&mut self, to: &SessionId, message: &ServerMessage) {
        if let Some(text) = encode(message) {
            self.deliver(to, ConnectionEvent::Text(text));
        }
    }

    fn broadcast(&mut self, message: &ServerMessage, without: Option<&SessionId>) {
        if let Some(text) = encode(message) {
            self.broadcast_event(ConnectionEvent::Text(text), without);
        }
    }

    fn deliver(&mut self, to: &SessionId, event: ConnectionEvent) {
        if self.connections.send(to, event) == Delivery::Lagging {
            self.evict(to);
        }
    }

    fn broadcast_event(&mut self, event: ConnectionEvent, without: Option<&SessionId>) {
        for lagging in self.connections.broadcast(event, without) {
            self.evict(&lagging);
        }
    }

    /// A connection that missed a control message or sync frame can't be
    /// patched up; it is dropped and resyncs when the client reconnects.
    fn evict(&mut self, session_id: &SessionId) {
        log::warn!("Disconnecting {}: it can't keep up", session_id);
        self.disconnect(session_id);
    }
}

fn encode(message: &ServerMessage) -> Option<String> {
    message
        .to_text()
        .map_err(|err| log::error!("Failed to encode {:?}: {}", message, err))
        .ok()
}

pub fn spawn_server<E: SyncEngine>(document: DocumentName, sync_engine: E) -> ServerTx {
    let (srv_tx, mut srv_rx) = unbounded_channel::<ServerCommand>();

    tokio::spawn(async move {
        let mut server = Server::new(document, sync_engine);
        log::info!("Relay started for document {}", server.document);

        while let Some(command) = srv_rx.recv().await {
            server.handle_command(command);
        }
        log::info!("Relay terminated");
    });

    srv_tx
}
