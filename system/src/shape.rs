use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::types::{Color, Point, SessionId};

/// Drags shorter than this along either axis don't produce a shape.
pub const MIN_DRAG_EXTENT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Square,
    Circle,
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown shape kind: {0}")]
pub struct UnknownShapeKind(pub String);

impl FromStr for ShapeKind {
    type Err = UnknownShapeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rectangle" => Ok(ShapeKind::Rectangle),
            "square" => Ok(ShapeKind::Square),
            "circle" => Ok(ShapeKind::Circle),
            other => Err(UnknownShapeKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeStyle {
    pub fill_color: Color,
    pub stroke_color: Color,
    pub stroke_width: u32,
}

/// A shape as stored in the shared document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub id: f64,
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill_color: Color,
    pub stroke_color: Color,
    pub stroke_width: u32,
    pub user_id: Option<SessionId>,
}

/// Drawing primitive. Rect extents may be negative while previewing a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Ellipse {
        center: Point,
        radius_x: f64,
        radius_y: f64,
    },
}

impl Shape {
    /// Builds a normalized shape from a drag gesture, or `None` when the drag
    /// is too small.
    pub fn from_drag(
        id: f64,
        kind: ShapeKind,
        start: Point,
        end: Point,
        style: ShapeStyle,
        user_id: Option<SessionId>,
    ) -> Option<Shape> {
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        if dx.abs() < MIN_DRAG_EXTENT || dy.abs() < MIN_DRAG_EXTENT {
            return None;
        }

        let (mut width, mut height) = (dx.abs(), dy.abs());
        if kind == ShapeKind::Square {
            let size = width.min(height);
            width = size;
            height = size;
        }

        Some(Shape {
            id,
            kind,
            x: start.x.min(end.x),
            y: start.y.min(end.y),
            width,
            height,
            fill_color: style.fill_color,
            stroke_color: style.stroke_color,
            stroke_width: style.stroke_width.max(1),
            user_id,
        })
    }

    pub fn geometry(&self) -> Geometry {
        match self.kind {
            ShapeKind::Rectangle | ShapeKind::Square => Geometry::Rect {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
            },
            ShapeKind::Circle => {
                let radius_x = self.width / 2.0;
                let radius_y = self.height / 2.0;
                Geometry::Ellipse {
                    center: Point::new(self.x + radius_x, self.y + radius_y),
                    radius_x,
                    radius_y,
                }
            }
        }
    }

    pub fn list_from_json(json: &str) -> serde_json::Result<Vec<Shape>> {
        serde_json::from_str(json)
    }
}

/// Geometry of an in-progress drag, anchored at `start`.
pub fn preview_geometry(kind: ShapeKind, start: Point, current: Point) -> Geometry {
    let dx = current.x - start.x;
    let dy = current.y - start.y;
    match kind {
        ShapeKind::Rectangle => Geometry::Rect {
            x: start.x,
            y: start.y,
            width: dx,
            height: dy,
        },
        ShapeKind::Square => {
            let size = dx.abs().min(dy.abs());
            Geometry::Rect {
                x: start.x,
                y: start.y,
                width: size.copysign(dx),
                height: size.copysign(dy),
            }
        }
        ShapeKind::Circle => Geometry::Ellipse {
            center: Point::new(start.x + dx / 2.0, start.y + dy / 2.0),
            radius_x: dx.abs() / 2.0,
            radius_y: dy.abs() / 2.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> ShapeStyle {
        ShapeStyle {
            fill_color: "#ffffff".into(),
            stroke_color: "#000000".into(),
            stroke_width: 2,
        }
    }

    #[test]
    fn it_normalizes_reversed_drag() {
        let shape = Shape::from_drag(
            1.0,
            ShapeKind::Rectangle,
            Point::new(50.0, 80.0),
            Point::new(10.0, 20.0),
            style(),
            Some("abc123".into()),
        )
        .expect("");
        assert_eq!((shape.x, shape.y), (10.0, 20.0));
        assert_eq!((shape.width, shape.height), (40.0, 60.0));
    }

    #[test]
    fn it_makes_square_sides_equal() {
        let shape = Shape::from_drag(
            1.0,
            ShapeKind::Square,
            Point::new(0.0, 0.0),
            Point::new(30.0, -10.0),
            style(),
            None,
        )
        .expect("");
        assert_eq!(shape.width, 10.0);
        assert_eq!(shape.height, 10.0);
        assert_eq!(shape.y, -10.0);
    }

    #[test]
    fn it_ignores_tiny_drags() {
        let shape = Shape::from_drag(
            1.0,
            ShapeKind::Circle,
            Point::new(0.0, 0.0),
            Point::new(1.5, 40.0),
            style(),
            None,
        );
        assert!(shape.is_none());
    }

    #[test]
    fn it_inscribes_circle_in_its_box() {
        let shape = Shape::from_drag(
            1.0,
            ShapeKind::Circle,
            Point::new(10.0, 10.0),
            Point::new(30.0, 50.0),
            style(),
            None,
        )
        .expect("");
        assert_eq!(
            shape.geometry(),
            Geometry::Ellipse {
                center: Point::new(20.0, 30.0),
                radius_x: 10.0,
                radius_y: 20.0,
            }
        );
    }

    #[test]
    fn it_keeps_drag_direction_in_square_preview() {
        let geometry =
            preview_geometry(ShapeKind::Square, Point::new(100.0, 100.0), Point::new(70.0, 140.0));
        assert_eq!(
            geometry,
            Geometry::Rect {
                x: 100.0,
                y: 100.0,
                width: -30.0,
                height: 30.0,
            }
        );
    }

    #[test]
    fn it_reads_document_shapes() {
        let shapes = Shape::list_from_json(
            r##"[{"id":1700000000000.25,"type":"square","x":1,"y":2,"width":3,"height":3,
                 "fillColor":"#fff","strokeColor":"#000","strokeWidth":1,"userId":null}]"##,
        )
        .expect("");
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].kind, ShapeKind::Square);
        assert!(shapes[0].user_id.is_none());
    }

    #[test]
    fn it_parses_tool_names() {
        assert_eq!("circle".parse::<ShapeKind>(), Ok(ShapeKind::Circle));
        assert!("select".parse::<ShapeKind>().is_err());
    }
}
