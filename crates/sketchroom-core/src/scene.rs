//! Scene document: the serializable model of one editable canvas.

use crate::layers::{LayerDirection, LayerEntry};
use crate::shapes::{Rgba, Shape, ShapeId, ShapeKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Canvas dimension limits in pixels.
pub const CANVAS_MIN_SIZE: f64 = 100.0;
pub const CANVAS_MAX_SIZE: f64 = 2000.0;

/// Default canvas size for new documents.
const DEFAULT_CANVAS_SIZE: f64 = 500.0;

/// Errors from document-level commands.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unknown shape: {0}")]
    UnknownShape(ShapeId),
    #[error("field {field:?} is not legal for a {kind} shape")]
    IllegalField {
        kind: &'static str,
        field: ShapeField,
    },
    #[error("wrong value type for field {field:?}")]
    ValueType { field: ShapeField },
    #[error("malformed snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// A mutable shape field addressed by a property-update command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeField {
    // Common to every shape.
    PositionX,
    PositionY,
    ScaleX,
    ScaleY,
    Rotation,
    Name,
    // Rectangle.
    Width,
    Height,
    CornerRadius,
    // Ellipse.
    RadiusX,
    RadiusY,
    // Text (shares Width).
    Content,
    FontSize,
    // Image.
    Source,
    // Rectangle, ellipse, text.
    Fill,
}

/// A value carried by a property-update command.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Number(f64),
    Text(String),
    Color(Rgba),
}

impl PropertyValue {
    fn number(self, field: ShapeField) -> Result<f64, DocumentError> {
        match self {
            PropertyValue::Number(n) => Ok(n),
            _ => Err(DocumentError::ValueType { field }),
        }
    }

    fn text(self, field: ShapeField) -> Result<String, DocumentError> {
        match self {
            PropertyValue::Text(s) => Ok(s),
            _ => Err(DocumentError::ValueType { field }),
        }
    }

    fn color(self, field: ShapeField) -> Result<Rgba, DocumentError> {
        match self {
            PropertyValue::Color(c) => Ok(c),
            _ => Err(DocumentError::ValueType { field }),
        }
    }
}

/// Ordered collection of shapes composing one editable canvas.
///
/// The list order IS the rendering order (back to front); `z_index` on each
/// shape mirrors its list position and is kept dense by
/// [`recompute_z_indices`](Self::recompute_z_indices). Every observable
/// state is a complete, serializable document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Shapes in rendering order (back to front).
    pub shapes: Vec<Shape>,
    /// Background color.
    pub background: Rgba,
    /// Canvas width in pixels.
    pub width: f64,
    /// Canvas height in pixels.
    pub height: f64,
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneDocument {
    /// Create an empty document with a white background.
    pub fn new() -> Self {
        Self {
            shapes: Vec::new(),
            background: Rgba::white(),
            width: DEFAULT_CANVAS_SIZE,
            height: DEFAULT_CANVAS_SIZE,
        }
    }

    /// Append a shape at the top of the rendering order.
    ///
    /// The shape gets `z_index = n` and, when unnamed, a default
    /// `<kind>_<index>` name. Returns the shape's id.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id;
        self.shapes.push(shape);
        self.recompute_z_indices();
        id
    }

    /// Remove a shape. Absent ids are a no-op, not an error.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        let index = self.shapes.iter().position(|s| s.id == id)?;
        let removed = self.shapes.remove(index);
        self.recompute_z_indices();
        Some(removed)
    }

    /// Swap a shape with its immediate neighbor in rendering order.
    ///
    /// Clamped at both boundaries. Returns whether anything moved.
    pub fn reorder(&mut self, id: ShapeId, direction: LayerDirection) -> bool {
        let Some(index) = self.shapes.iter().position(|s| s.id == id) else {
            return false;
        };
        let target = match direction {
            LayerDirection::Up => {
                if index + 1 >= self.shapes.len() {
                    return false;
                }
                index + 1
            }
            LayerDirection::Down => {
                if index == 0 {
                    return false;
                }
                index - 1
            }
        };
        self.shapes.swap(index, target);
        self.recompute_z_indices();
        true
    }

    /// Restore the layer-index invariant after a structural mutation.
    ///
    /// Assigns each shape `z_index = list position`, replaces nil ids with
    /// fresh ones (shapes arriving from foreign snapshots may lack them)
    /// and fills empty names with `<kind>_<index>`.
    pub fn recompute_z_indices(&mut self) {
        for (index, shape) in self.shapes.iter_mut().enumerate() {
            if shape.id.is_nil() {
                shape.id = Uuid::new_v4();
            }
            shape.z_index = index;
            if shape.name.is_empty() {
                shape.name = format!("{}_{}", shape.kind.label(), index);
            }
        }
    }

    /// Layer-panel listing, top-most first. Read-only.
    pub fn list_layers(&self) -> Vec<LayerEntry> {
        self.shapes
            .iter()
            .rev()
            .map(|shape| LayerEntry {
                id: shape.id,
                name: shape.name.clone(),
                kind: shape.kind.label(),
                z_index: shape.z_index,
            })
            .collect()
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    /// Rename a shape. The empty string reverts to the default name on the
    /// next layer pass.
    pub fn rename(&mut self, id: ShapeId, name: impl Into<String>) -> Result<(), DocumentError> {
        let shape = self.get_mut(id).ok_or(DocumentError::UnknownShape(id))?;
        shape.name = name.into();
        Ok(())
    }

    /// Set the canvas width, clamped to the allowed range.
    pub fn set_width(&mut self, width: f64) {
        self.width = width.clamp(CANVAS_MIN_SIZE, CANVAS_MAX_SIZE);
    }

    /// Set the canvas height, clamped to the allowed range.
    pub fn set_height(&mut self, height: f64) {
        self.height = height.clamp(CANVAS_MIN_SIZE, CANVAS_MAX_SIZE);
    }

    /// Update one shape field, validated against the variant's legal set.
    ///
    /// Illegal field/variant combinations and value-type mismatches fail
    /// without mutating anything.
    pub fn update_property(
        &mut self,
        id: ShapeId,
        field: ShapeField,
        value: PropertyValue,
    ) -> Result<(), DocumentError> {
        let shape = self.get_mut(id).ok_or(DocumentError::UnknownShape(id))?;
        match field {
            ShapeField::PositionX => shape.position.x = value.number(field)?,
            ShapeField::PositionY => shape.position.y = value.number(field)?,
            ShapeField::ScaleX => shape.scale.x = value.number(field)?,
            ShapeField::ScaleY => shape.scale.y = value.number(field)?,
            ShapeField::Rotation => shape.rotation = value.number(field)?,
            ShapeField::Name => shape.name = value.text(field)?,
            _ => match (&mut shape.kind, field) {
                (ShapeKind::Rectangle(r), ShapeField::Width) => r.width = value.number(field)?,
                (ShapeKind::Rectangle(r), ShapeField::Height) => r.height = value.number(field)?,
                (ShapeKind::Rectangle(r), ShapeField::CornerRadius) => {
                    r.corner_radius = value.number(field)?
                }
                (ShapeKind::Rectangle(r), ShapeField::Fill) => r.fill = value.color(field)?,
                (ShapeKind::Ellipse(e), ShapeField::RadiusX) => e.radius_x = value.number(field)?,
                (ShapeKind::Ellipse(e), ShapeField::RadiusY) => e.radius_y = value.number(field)?,
                (ShapeKind::Ellipse(e), ShapeField::Fill) => e.fill = value.color(field)?,
                (ShapeKind::Text(t), ShapeField::Content) => t.content = value.text(field)?,
                (ShapeKind::Text(t), ShapeField::Width) => t.width = value.number(field)?,
                (ShapeKind::Text(t), ShapeField::FontSize) => t.font_size = value.number(field)?,
                (ShapeKind::Text(t), ShapeField::Fill) => t.fill = value.color(field)?,
                (ShapeKind::Image(i), ShapeField::Source) => i.source = value.text(field)?,
                (kind, field) => {
                    return Err(DocumentError::IllegalField {
                        kind: kind.label(),
                        field,
                    });
                }
            },
        }
        Ok(())
    }

    /// Serialize to a full, self-contained snapshot string.
    pub fn to_snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a snapshot, repairing identity fields defensively.
    pub fn from_snapshot(snapshot: &str) -> Result<Self, DocumentError> {
        let mut document: Self = serde_json::from_str(snapshot)?;
        document.recompute_z_indices();
        Ok(document)
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Ellipse, Rectangle, Text};
    use kurbo::Point;

    fn rect_at(x: f64, y: f64) -> Shape {
        Shape::new(Point::new(x, y), ShapeKind::Rectangle(Rectangle::default()))
    }

    fn assert_dense_z(doc: &SceneDocument) {
        let mut seen: Vec<usize> = doc.shapes.iter().map(|s| s.z_index).collect();
        seen.sort_unstable();
        let expected: Vec<usize> = (0..doc.len()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_add_assigns_dense_z_and_default_names() {
        let mut doc = SceneDocument::new();
        doc.add_shape(rect_at(0.0, 0.0));
        doc.add_shape(Shape::new(
            Point::new(10.0, 10.0),
            ShapeKind::Ellipse(Ellipse::default()),
        ));
        assert_dense_z(&doc);
        assert_eq!(doc.shapes[0].name, "rectangle_0");
        assert_eq!(doc.shapes[1].name, "ellipse_1");
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut doc = SceneDocument::new();
        doc.add_shape(rect_at(0.0, 0.0));
        assert!(doc.remove_shape(Uuid::new_v4()).is_none());
        assert_eq!(doc.len(), 1);
        assert_dense_z(&doc);
    }

    #[test]
    fn test_reorder_swaps_neighbors_and_clamps() {
        let mut doc = SceneDocument::new();
        let bottom = doc.add_shape(rect_at(0.0, 0.0));
        let top = doc.add_shape(rect_at(10.0, 10.0));

        // Already at the top: clamped no-op.
        assert!(!doc.reorder(top, LayerDirection::Up));
        assert!(doc.reorder(bottom, LayerDirection::Up));
        assert_eq!(doc.get(bottom).unwrap().z_index, 1);
        assert_eq!(doc.get(top).unwrap().z_index, 0);
        assert_dense_z(&doc);

        // Unknown id: no-op.
        assert!(!doc.reorder(Uuid::new_v4(), LayerDirection::Down));
    }

    #[test]
    fn test_list_layers_topmost_first() {
        let mut doc = SceneDocument::new();
        let bottom = doc.add_shape(rect_at(0.0, 0.0));
        let top = doc.add_shape(rect_at(10.0, 10.0));
        let layers = doc.list_layers();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].id, top);
        assert_eq!(layers[1].id, bottom);
        assert_eq!(layers[0].kind, "rectangle");
    }

    #[test]
    fn test_recompute_repairs_nil_ids() {
        let mut doc = SceneDocument::new();
        let mut shape = rect_at(0.0, 0.0);
        shape.id = Uuid::nil();
        doc.shapes.push(shape);
        doc.recompute_z_indices();
        assert!(!doc.shapes[0].id.is_nil());
    }

    #[test]
    fn test_update_property_common_fields() {
        let mut doc = SceneDocument::new();
        let id = doc.add_shape(rect_at(0.0, 0.0));
        doc.update_property(id, ShapeField::PositionX, PropertyValue::Number(42.0))
            .unwrap();
        doc.update_property(id, ShapeField::Rotation, PropertyValue::Number(0.5))
            .unwrap();
        let shape = doc.get(id).unwrap();
        assert!((shape.position.x - 42.0).abs() < f64::EPSILON);
        assert!((shape.rotation - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_update_property_rejects_illegal_field() {
        let mut doc = SceneDocument::new();
        let id = doc.add_shape(rect_at(0.0, 0.0));
        let before = doc.clone();
        let err = doc
            .update_property(id, ShapeField::RadiusX, PropertyValue::Number(5.0))
            .unwrap_err();
        assert!(matches!(err, DocumentError::IllegalField { kind: "rectangle", .. }));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_update_property_rejects_wrong_value_type() {
        let mut doc = SceneDocument::new();
        let id = doc.add_shape(rect_at(0.0, 0.0));
        let err = doc
            .update_property(id, ShapeField::Width, PropertyValue::Text("wide".into()))
            .unwrap_err();
        assert!(matches!(err, DocumentError::ValueType { .. }));
    }

    #[test]
    fn test_update_property_text_content() {
        let mut doc = SceneDocument::new();
        let id = doc.add_shape(Shape::new(
            Point::new(50.0, 150.0),
            ShapeKind::Text(Text::default()),
        ));
        doc.update_property(id, ShapeField::Content, PropertyValue::Text("edited".into()))
            .unwrap();
        match &doc.get(id).unwrap().kind {
            ShapeKind::Text(t) => assert_eq!(t.content, "edited"),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_dimension_clamping() {
        let mut doc = SceneDocument::new();
        doc.set_width(50.0);
        assert!((doc.width - CANVAS_MIN_SIZE).abs() < f64::EPSILON);
        doc.set_height(9999.0);
        assert!((doc.height - CANVAS_MAX_SIZE).abs() < f64::EPSILON);
        doc.set_width(800.0);
        assert!((doc.width - 800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut doc = SceneDocument::new();
        doc.add_shape(rect_at(5.0, 6.0));
        doc.add_shape(Shape::new(
            Point::new(1.0, 2.0),
            ShapeKind::Ellipse(Ellipse::default()),
        ));
        let snapshot = doc.to_snapshot().unwrap();
        let restored = SceneDocument::from_snapshot(&snapshot).unwrap();
        assert_eq!(restored, doc);
    }

    #[test]
    fn test_from_snapshot_rejects_garbage() {
        assert!(matches!(
            SceneDocument::from_snapshot("not json"),
            Err(DocumentError::Snapshot(_))
        ));
    }
}
