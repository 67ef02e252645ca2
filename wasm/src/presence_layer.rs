use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

use system::{short_id, Point, PresenceView, ServerMessage, ViewChange};

/// Renders remote cursors and the participant count into the page.
///
/// Expects `#cursorsLayer`; `#activeUsers`, `#userId` and `#statusText` are
/// optional.
pub struct PresenceLayer {
    view: PresenceView,
    document: Document,
    cursors_layer: Element,
}

impl PresenceLayer {
    pub fn new(document: Document) -> Result<Self, JsValue> {
        let cursors_layer = document
            .get_element_by_id("cursorsLayer")
            .ok_or_else(|| JsValue::from_str("missing #cursorsLayer"))?;
        Ok(Self {
            view: PresenceView::new(),
            document,
            cursors_layer,
        })
    }

    pub fn local_id(&self) -> Option<String> {
        self.view.local_id().map(str::to_string)
    }

    pub fn local_color(&self) -> Option<String> {
        self.view.local_color().map(str::to_string)
    }

    pub fn handle(&mut self, message: ServerMessage, canvas_origin: Point) -> Result<(), JsValue> {
        for change in self.view.apply(message, canvas_origin) {
            self.render(change)?;
        }
        Ok(())
    }

    pub fn disconnected(&mut self) -> Result<(), JsValue> {
        for change in self.view.disconnected() {
            self.render(change)?;
        }
        Ok(())
    }

    pub fn set_status(&self, status: &str) {
        self.set_text("statusText", status);
    }

    fn render(&self, change: ViewChange) -> Result<(), JsValue> {
        match change {
            ViewChange::Identified { id, .. } => {
                self.set_text("userId", &format!("You: {}", short_id(&id, 8)));
                self.set_status("Connected");
            }
            ViewChange::IndicatorCreated { id, label, color } => {
                let cursor = self.document.create_element("div")?;
                cursor.set_id(&cursor_element_id(&id));
                cursor.set_class_name("cursor");
                cursor
                    .dyn_ref::<HtmlElement>()
                    .ok_or_else(|| JsValue::from_str("cursor is not an html element"))?
                    .style()
                    .set_property("color", &color)?;

                let pointer = self.document.create_element("div")?;
                pointer.set_class_name("cursor-pointer");
                let name = self.document.create_element("div")?;
                name.set_class_name("cursor-label");
                name.set_text_content(Some(&label));

                cursor.append_child(&pointer)?;
                cursor.append_child(&name)?;
                self.cursors_layer.append_child(&cursor)?;
            }
            ViewChange::IndicatorMoved { id, position } => {
                if let Some(cursor) = self
                    .document
                    .get_element_by_id(&cursor_element_id(&id))
                    .and_then(|e| e.dyn_into::<HtmlElement>().ok())
                {
                    let style = cursor.style();
                    style.set_property("left", &format!("{}px", position.x))?;
                    style.set_property("top", &format!("{}px", position.y))?;
                }
            }
            ViewChange::IndicatorRemoved { id } => {
                if let Some(cursor) = self.document.get_element_by_id(&cursor_element_id(&id)) {
                    cursor.remove();
                }
            }
            ViewChange::ActiveUsersChanged(count) => {
                self.set_text("activeUsers", &format!("Users: {}", count));
            }
        }
        Ok(())
    }

    fn set_text(&self, element_id: &str, text: &str) {
        if let Some(element) = self.document.get_element_by_id(element_id) {
            element.set_text_content(Some(text));
        }
    }
}

fn cursor_element_id(id: &str) -> String {
    format!("cursor-{}", id)
}
