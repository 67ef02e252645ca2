mod canvas;
mod presence_layer;
mod relay_socket;
mod utils;

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Function, Uint8Array};
use system::{
    preview_geometry, ClientMessage, Point, ServerMessage, Shape, ShapeKind, ShapeStyle,
    UnknownShapeKind,
};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, WebSocket};

use crate::canvas::CanvasRenderer;
use crate::presence_layer::PresenceLayer;
use crate::relay_socket::{RelayListener, RelaySocket};

struct Board {
    layer: RefCell<PresenceLayer>,
    renderer: CanvasRenderer,
    /// Receives every sync frame from the relay as a `Uint8Array`.
    on_sync: Function,
    /// Called whenever this client or a peer joins, so the host can push its
    /// whole document state. Covers edits made while disconnected.
    on_push_state: Function,
}

struct BoardListener {
    board: Rc<Board>,
}

impl RelayListener for BoardListener {
    fn opened(&self, socket: &WebSocket) {
        let joined = ClientMessage::UserJoined {
            name: Some(format!("User {}", utils::random_suffix())),
            color: None,
        };
        match joined.to_text() {
            Ok(text) => {
                if socket.send_with_str(&text).is_err() {
                    log::warn!("failed to announce join");
                }
            }
            Err(err) => log::warn!("{}", err),
        }
        self.board.layer.borrow().set_status("Connected");
    }

    fn text(&self, text: String) {
        let message = match ServerMessage::from_text(&text) {
            Ok(message) => message,
            Err(err) => {
                log::warn!("{}", err);
                return;
            }
        };
        let push_state = message.calls_for_state_push();
        let origin = self.board.renderer.origin();
        if let Err(err) = self.board.layer.borrow_mut().handle(message, origin) {
            log::warn!("failed to render presence: {:?}", err);
        }
        if push_state {
            if let Err(err) = self.board.on_push_state.call0(&JsValue::NULL) {
                log::warn!("state push callback failed: {:?}", err);
            }
        }
    }

    fn binary(&self, frame: Vec<u8>) {
        let update = Uint8Array::from(frame.as_slice());
        if let Err(err) = self.board.on_sync.call1(&JsValue::NULL, &update) {
            log::warn!("sync callback failed: {:?}", err);
        }
    }

    fn closed(&self) {
        let mut layer = self.board.layer.borrow_mut();
        if let Err(err) = layer.disconnected() {
            log::warn!("failed to clear presence: {:?}", err);
        }
        layer.set_status("Disconnected - Reconnecting...");
    }
}

struct Drag {
    kind: ShapeKind,
    start: Point,
}

#[wasm_bindgen]
pub struct DrawingBoard {
    board: Rc<Board>,
    socket: RelaySocket,
    shapes: Vec<Shape>,
    style: ShapeStyle,
    /// `None` while the select tool is active.
    tool: Option<ShapeKind>,
    drag: Option<Drag>,
}

#[wasm_bindgen]
impl DrawingBoard {
    #[wasm_bindgen(constructor)]
    pub fn new(
        url: &str,
        canvas_id: &str,
        on_sync: Function,
        on_push_state: Function,
    ) -> Result<DrawingBoard, JsValue> {
        utils::set_panic_hook();
        utils::init_logging();

        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str("missing canvas element"))?
            .dyn_into::<HtmlCanvasElement>()?;

        let board = Rc::new(Board {
            layer: RefCell::new(PresenceLayer::new(document)?),
            renderer: CanvasRenderer::new(canvas)?,
            on_sync,
            on_push_state,
        });
        let socket = RelaySocket::connect(
            url,
            Box::new(BoardListener {
                board: board.clone(),
            }),
        );

        Ok(DrawingBoard {
            board,
            socket,
            shapes: Vec::new(),
            style: ShapeStyle {
                fill_color: "#4ECDC4".into(),
                stroke_color: "#333333".into(),
                stroke_width: 2,
            },
            tool: None,
            drag: None,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.socket.is_open()
    }

    pub fn local_id(&self) -> Option<String> {
        self.board.layer.borrow().local_id()
    }

    /// Reports the local pointer. Coordinates are page coordinates and are
    /// sent relative to the canvas.
    pub fn send_cursor(&self, client_x: f64, client_y: f64) {
        let message = ClientMessage::Cursor {
            cursor: self.board.renderer.to_canvas(client_x, client_y),
            color: self.board.layer.borrow().local_color(),
            name: None,
        };
        match message.to_text() {
            Ok(text) => self.socket.send_text(&text),
            Err(err) => log::warn!("{}", err),
        }
    }

    /// Forwards a document update to the other participants.
    pub fn send_sync(&self, update: &[u8]) {
        self.socket.send_binary(update);
    }

    pub fn set_tool(&mut self, tool: &str) -> Result<(), JsValue> {
        self.tool = match tool {
            "select" => None,
            kind => Some(
                kind.parse()
                    .map_err(|err: UnknownShapeKind| JsValue::from_str(&err.to_string()))?,
            ),
        };
        self.set_status(&format!("Tool: {}", tool));
        Ok(())
    }

    pub fn set_status(&self, status: &str) {
        self.board.layer.borrow().set_status(status);
    }

    pub fn set_style(&mut self, fill_color: String, stroke_color: String, stroke_width: u32) {
        self.style = ShapeStyle {
            fill_color,
            stroke_color,
            stroke_width,
        };
    }

    /// Replaces the drawn shapes with the document's current list, given as
    /// JSON.
    pub fn redraw(&mut self, shapes_json: &str) -> Result<(), JsValue> {
        self.shapes = Shape::list_from_json(shapes_json)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        self.board.renderer.redraw(&self.shapes)
    }

    pub fn begin_drag(&mut self, client_x: f64, client_y: f64) {
        self.drag = self.tool.map(|kind| Drag {
            kind,
            start: self.board.renderer.to_canvas(client_x, client_y),
        });
    }

    pub fn drag_to(&self, client_x: f64, client_y: f64) -> Result<(), JsValue> {
        let Some(drag) = &self.drag else {
            return Ok(());
        };
        let current = self.board.renderer.to_canvas(client_x, client_y);
        self.board.renderer.redraw(&self.shapes)?;
        self.board
            .renderer
            .draw_preview(preview_geometry(drag.kind, drag.start, current), &self.style)
    }

    /// Finishes the drag and returns the new shape as JSON, ready to be
    /// appended to the shared document. Returns `undefined` for drags too
    /// small to keep.
    pub fn end_drag(&mut self, client_x: f64, client_y: f64) -> Result<Option<String>, JsValue> {
        let Some(drag) = self.drag.take() else {
            return Ok(None);
        };
        let end = self.board.renderer.to_canvas(client_x, client_y);
        let id = js_sys::Date::now() + js_sys::Math::random();
        let shape = Shape::from_drag(
            id,
            drag.kind,
            drag.start,
            end,
            self.style.clone(),
            self.local_id(),
        );
        self.board.renderer.redraw(&self.shapes)?;
        shape
            .map(|shape| system::serde_json::to_string(&shape))
            .transpose()
            .map_err(|err| JsValue::from_str(&err.to_string()))
    }

    pub fn cancel_drag(&mut self) -> Result<(), JsValue> {
        self.drag = None;
        self.board.renderer.redraw(&self.shapes)
    }
}
