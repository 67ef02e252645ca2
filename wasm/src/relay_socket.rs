use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use js_sys::{ArrayBuffer, Uint8Array};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{BinaryType, CloseEvent, Event, MessageEvent, WebSocket};

/// Fixed pause between reconnect attempts. It never grows and attempts never
/// stop.
pub const RECONNECT_DELAY_MS: u32 = 2000;

pub trait RelayListener {
    fn opened(&self, socket: &WebSocket);
    /// Text frame, i.e. a control message.
    fn text(&self, text: String);
    /// Binary frame of the document sync stream.
    fn binary(&self, frame: Vec<u8>);
    fn closed(&self);
}

#[allow(dead_code)]
struct WsHandlers {
    onopen: Closure<dyn FnMut(Event)>,
    onmessage: Closure<dyn FnMut(MessageEvent)>,
    onclose: Closure<dyn FnMut(CloseEvent)>,
}

struct SocketInner {
    url: String,
    ws: RefCell<Option<WebSocket>>,
    handlers: RefCell<Option<WsHandlers>>,
    listener: Box<dyn RelayListener>,
}

/// The client's single connection to the relay.
pub struct RelaySocket {
    inner: Rc<SocketInner>,
}

impl RelaySocket {
    pub fn connect(url: &str, listener: Box<dyn RelayListener>) -> Self {
        let inner = Rc::new(SocketInner {
            url: url.to_string(),
            ws: RefCell::new(None),
            handlers: RefCell::new(None),
            listener,
        });
        open(&inner);
        Self { inner }
    }

    pub fn is_open(&self) -> bool {
        self.inner
            .ws
            .borrow()
            .as_ref()
            .map_or(false, |ws| ws.ready_state() == WebSocket::OPEN)
    }

    pub fn send_text(&self, text: &str) {
        if let Some(ws) = self.open_socket() {
            if ws.send_with_str(text).is_err() {
                log::warn!("failed to send control message");
            }
        }
    }

    pub fn send_binary(&self, frame: &[u8]) {
        if let Some(ws) = self.open_socket() {
            if ws.send_with_u8_array(frame).is_err() {
                log::warn!("failed to send sync frame");
            }
        }
    }

    fn open_socket(&self) -> Option<WebSocket> {
        self.inner
            .ws
            .borrow()
            .as_ref()
            .filter(|ws| ws.ready_state() == WebSocket::OPEN)
            .cloned()
    }
}

fn open(inner: &Rc<SocketInner>) {
    let ws = match WebSocket::new(&inner.url) {
        Ok(ws) => ws,
        Err(err) => {
            log::warn!("failed to open websocket {}: {:?}", inner.url, err);
            schedule_reconnect(Rc::downgrade(inner));
            return;
        }
    };
    ws.set_binary_type(BinaryType::Arraybuffer);

    let onopen = {
        let weak = Rc::downgrade(inner);
        let ws = ws.clone();
        Closure::wrap(Box::new(move |_event: Event| {
            if let Some(inner) = weak.upgrade() {
                log::info!("websocket connected");
                inner.listener.opened(&ws);
            }
        }) as Box<dyn FnMut(Event)>)
    };
    let onmessage = {
        let weak = Rc::downgrade(inner);
        Closure::wrap(Box::new(move |event: MessageEvent| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let data = event.data();
            if let Some(text) = data.as_string() {
                inner.listener.text(text);
            } else if let Ok(buffer) = data.dyn_into::<ArrayBuffer>() {
                inner.listener.binary(Uint8Array::new(&buffer).to_vec());
            }
        }) as Box<dyn FnMut(MessageEvent)>)
    };
    let onclose = {
        let weak = Rc::downgrade(inner);
        Closure::wrap(Box::new(move |event: CloseEvent| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            log::info!("websocket disconnected ({})", event.code());
            inner.ws.borrow_mut().take();
            inner.listener.closed();
            // Handlers of the dead socket are replaced on the next `open`.
            schedule_reconnect(weak.clone());
        }) as Box<dyn FnMut(CloseEvent)>)
    };

    ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
    ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

    *inner.ws.borrow_mut() = Some(ws);
    *inner.handlers.borrow_mut() = Some(WsHandlers {
        onopen,
        onmessage,
        onclose,
    });
}

fn schedule_reconnect(weak: Weak<SocketInner>) {
    Timeout::new(RECONNECT_DELAY_MS, move || {
        if let Some(inner) = weak.upgrade() {
            open(&inner);
        }
    })
    .forget();
}
