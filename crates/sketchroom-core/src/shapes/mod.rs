//! Shape definitions for the scene document.

mod ellipse;
mod image;
mod rectangle;
mod text;

pub use ellipse::Ellipse;
pub use image::Image;
pub use rectangle::Rectangle;
pub use text::Text;

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Serializable fill color (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// Parse a `#rgb`, `#rrggbb` or `#rrggbbaa` hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?.trim();
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
                Some(Self::new(r, g, b, 255))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::new(r, g, b, 255))
            }
            8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
                Some(Self::new(r, g, b, a))
            }
            _ => None,
        }
    }
}

/// Kind-specific geometry and style for each shape variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Text(Text),
    Image(Image),
}

impl ShapeKind {
    /// Stable label used for default names and layer-panel display.
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle(_) => "rectangle",
            ShapeKind::Ellipse(_) => "ellipse",
            ShapeKind::Text(_) => "text",
            ShapeKind::Image(_) => "image",
        }
    }

    /// Unscaled size of the shape's bounding box.
    pub fn base_size(&self) -> Size {
        match self {
            ShapeKind::Rectangle(r) => r.base_size(),
            ShapeKind::Ellipse(e) => e.base_size(),
            ShapeKind::Text(t) => t.base_size(),
            ShapeKind::Image(i) => i.base_size(),
        }
    }
}

/// One placed element: common identity and transform plus a kind payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Stable identifier, assigned at creation and never reused.
    /// Snapshots produced outside this engine may omit it; the layer
    /// index repairs nil ids with fresh ones.
    #[serde(default)]
    pub id: ShapeId,
    /// User-facing label, independent of `id`.
    #[serde(default)]
    pub name: String,
    /// Dense position in rendering order (0 = back-most).
    #[serde(default)]
    pub z_index: usize,
    /// Top-left anchor in canvas coordinates.
    pub position: Point,
    /// Per-axis scale factor applied by the renderer.
    pub scale: Vec2,
    /// Rotation in radians around the shape center.
    #[serde(default)]
    pub rotation: f64,
    /// Kind-specific payload.
    pub kind: ShapeKind,
}

impl Shape {
    /// Create a shape at the given position with identity transform.
    pub fn new(position: Point, kind: ShapeKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            z_index: 0,
            position,
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
            kind,
        }
    }

    /// Create a shape with an explicit scale (images start scaled down).
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Axis-aligned bounding box in canvas coordinates.
    ///
    /// Rotation does not inflate the box; snapping and layer logic work on
    /// the unrotated extent.
    pub fn bounds(&self) -> Rect {
        let base = self.kind.base_size();
        Rect::from_origin_size(
            self.position,
            Size::new(base.width * self.scale.x, base.height * self.scale.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_from_hex() {
        assert_eq!(Rgba::from_hex("#000"), Some(Rgba::black()));
        assert_eq!(Rgba::from_hex("#ffffff"), Some(Rgba::white()));
        assert_eq!(Rgba::from_hex("#D84D42"), Some(Rgba::new(216, 77, 66, 255)));
        assert_eq!(Rgba::from_hex("#00000080"), Some(Rgba::new(0, 0, 0, 128)));
        assert_eq!(Rgba::from_hex("red"), None);
        assert_eq!(Rgba::from_hex("#12345"), None);
    }

    #[test]
    fn test_shape_bounds_scaled() {
        let shape = Shape::new(
            Point::new(10.0, 20.0),
            ShapeKind::Rectangle(Rectangle::new(100.0, 60.0)),
        )
        .with_scale(Vec2::new(2.0, 0.5));
        let bounds = shape.bounds();
        assert!((bounds.x0 - 10.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 20.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 210.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shape_serde_roundtrip_keeps_identity() {
        let shape = Shape::new(
            Point::new(50.0, 100.0),
            ShapeKind::Ellipse(Ellipse::circle(50.0)),
        );
        let json = serde_json::to_string(&shape).unwrap();
        assert!(json.contains("\"type\":\"ellipse\""));
        let back: Shape = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, shape.id);
        assert_eq!(back, shape);
    }

    #[test]
    fn test_shape_deserialize_without_id() {
        // Foreign snapshots may omit identity fields entirely.
        let json = r#"{
            "position": {"x": 0.0, "y": 0.0},
            "scale": {"x": 1.0, "y": 1.0},
            "kind": {"type": "rectangle", "width": 10.0, "height": 10.0, "fill": {"r":0,"g":0,"b":0,"a":255}}
        }"#;
        let shape: Shape = serde_json::from_str(json).unwrap();
        assert!(shape.id.is_nil());
        assert!(shape.name.is_empty());
        assert_eq!(shape.z_index, 0);
    }
}
