use actix::{Actor, ActorContext, AsyncContext, Handler, Message, Running, StreamHandler};
use actix_web::web::Bytes;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use actix_web_actors::ws::{CloseCode, CloseReason};

use system::SessionId;

use crate::server::{ServerCommand, ServerTx};
use crate::server_state::new_session_id;

/// What the relay asks a connection to do.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// Control message, already encoded.
    Text(String),
    /// Control message superseded by the next one of its kind (cursor
    /// moves). Dropped rather than queued when the connection lags.
    Ephemeral(String),
    /// Document sync frame.
    Binary(Bytes),
    /// The relay has already forgotten this connection.
    Disconnected,
}

impl ConnectionEvent {
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, ConnectionEvent::Ephemeral(_))
    }
}

/// Shared by every websocket handler.
#[derive(Clone)]
pub struct Gateway {
    srv_tx: ServerTx,
    outbound_buffer: usize,
}

impl Gateway {
    pub fn new(srv_tx: ServerTx, outbound_buffer: usize) -> Self {
        Self {
            srv_tx,
            outbound_buffer: outbound_buffer.max(1),
        }
    }
}

#[derive(Message)]
#[rtype(result = "()")]
struct ConnectionActorMessage(ConnectionEvent);

struct ConnectionActor {
    session_id: SessionId,
    srv_tx: ServerTx,
    outbound_buffer: usize,
    released: bool,
}

impl ConnectionActor {
    fn forward(&self, command: ServerCommand) {
        if self.srv_tx.send(command).is_err() {
            log::warn!("Relay is gone, dropping frame from {}", self.session_id);
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.forward(ServerCommand::Disconnect {
                from: self.session_id.clone(),
            });
        }
    }
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<ConnectionEvent>(self.outbound_buffer);

        self.forward(ServerCommand::Connect {
            session_id: self.session_id.clone(),
            tx,
        });

        let addr = ctx.address().recipient();
        let session_id = self.session_id.clone();

        actix::spawn(async move {
            log::debug!("egress for {} - started", session_id);
            while let Some(event) = rx.recv().await {
                addr.do_send(ConnectionActorMessage(event));
            }
            // The relay dropped its sender, so it no longer knows this
            // connection.
            addr.do_send(ConnectionActorMessage(ConnectionEvent::Disconnected));
            log::debug!("egress for {} - terminated", session_id);
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.release();
        Running::Stop
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Pong(_)) => (),
            Ok(ws::Message::Text(text)) => {
                log::debug!("Ingress text from {}: {}", self.session_id, text);
                self.forward(ServerCommand::Control {
                    from: self.session_id.clone(),
                    text: text.to_string(),
                });
            }
            Ok(ws::Message::Binary(frame)) => {
                log::debug!("Ingress size from {}: {}", self.session_id, frame.len());
                self.forward(ServerCommand::Sync {
                    from: self.session_id.clone(),
                    frame,
                });
            }
            Ok(ws::Message::Close(reason)) => {
                self.release();
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) => {
                // Fragmented frames are neither control messages nor sync
                // frames we can forward as a unit.
                ctx.close(Some(CloseReason {
                    code: CloseCode::Unsupported,
                    description: None,
                }));
                ctx.stop();
            }
            Ok(ws::Message::Nop) => (),
            Err(err) => {
                log::warn!("Protocol error on {}: {}", self.session_id, err);
                ctx.stop();
            }
        }
    }
}

/// Egress
impl Handler<ConnectionActorMessage> for ConnectionActor {
    type Result = ();

    fn handle(
        &mut self,
        msg: ConnectionActorMessage,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> Self::Result {
        match msg.0 {
            ConnectionEvent::Text(text) | ConnectionEvent::Ephemeral(text) => ctx.text(text),
            ConnectionEvent::Binary(frame) => ctx.binary(frame),
            ConnectionEvent::Disconnected => {
                self.released = true;
                ctx.close(Some(CloseReason {
                    code: CloseCode::Policy,
                    description: None,
                }));
                ctx.stop();
            }
        }
    }
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    gateway: web::Data<Gateway>,
) -> Result<HttpResponse, Error> {
    let session_id = new_session_id();
    log::info!("New connection: {}", session_id);
    ws::start(
        ConnectionActor {
            session_id,
            srv_tx: gateway.srv_tx.clone(),
            outbound_buffer: gateway.outbound_buffer,
            released: false,
        },
        &req,
        stream,
    )
}
