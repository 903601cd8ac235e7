//! Layer-panel view of the scene document.

use crate::shapes::ShapeId;

/// Direction for single-step layer reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerDirection {
    /// Toward higher z-index (front).
    Up,
    /// Toward lower z-index (back).
    Down,
}

/// One row in the layer panel listing (top-most first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerEntry {
    pub id: ShapeId,
    pub name: String,
    /// Kind label, e.g. `"rectangle"`.
    pub kind: &'static str,
    pub z_index: usize,
}
