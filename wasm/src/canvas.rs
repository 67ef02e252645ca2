use std::f64::consts::PI;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use system::{Geometry, Point, Shape, ShapeStyle};

const PREVIEW_ALPHA: f64 = 0.5;

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    /// Canvas top-left corner in page coordinates.
    pub fn origin(&self) -> Point {
        canvas_origin(&self.canvas)
    }

    pub fn to_canvas(&self, client_x: f64, client_y: f64) -> Point {
        let origin = self.origin();
        Point::new(client_x - origin.x, client_y - origin.y)
    }

    pub fn redraw(&self, shapes: &[Shape]) -> Result<(), JsValue> {
        self.ctx.clear_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );
        for shape in shapes {
            self.apply_style(&shape.fill_color, &shape.stroke_color, shape.stroke_width);
            self.draw(shape.geometry())?;
        }
        Ok(())
    }

    pub fn draw_preview(&self, geometry: Geometry, style: &ShapeStyle) -> Result<(), JsValue> {
        self.apply_style(&style.fill_color, &style.stroke_color, style.stroke_width);
        self.ctx.set_global_alpha(PREVIEW_ALPHA);
        let result = self.draw(geometry);
        self.ctx.set_global_alpha(1.0);
        result
    }

    fn apply_style(&self, fill_color: &str, stroke_color: &str, stroke_width: u32) {
        self.ctx.set_fill_style_str(fill_color);
        self.ctx.set_stroke_style_str(stroke_color);
        self.ctx.set_line_width(stroke_width as f64);
    }

    fn draw(&self, geometry: Geometry) -> Result<(), JsValue> {
        match geometry {
            Geometry::Rect {
                x,
                y,
                width,
                height,
            } => {
                self.ctx.fill_rect(x, y, width, height);
                self.ctx.stroke_rect(x, y, width, height);
            }
            Geometry::Ellipse {
                center,
                radius_x,
                radius_y,
            } => {
                self.ctx.begin_path();
                self.ctx
                    .ellipse(center.x, center.y, radius_x, radius_y, 0.0, 0.0, 2.0 * PI)?;
                self.ctx.fill();
                self.ctx.stroke();
            }
        }
        Ok(())
    }
}

pub fn canvas_origin(canvas: &HtmlCanvasElement) -> Point {
    let rect = canvas.get_bounding_client_rect();
    Point::new(rect.left(), rect.top())
}
