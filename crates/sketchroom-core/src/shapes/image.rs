//! Image shape referencing an external bitmap.

use kurbo::Size;
use serde::{Deserialize, Serialize};

/// An image placed on the canvas.
///
/// The bitmap itself lives with the renderer; the document stores only the
/// source reference and the source pixel dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Source bitmap reference (URL or asset path).
    pub source: String,
    /// Source width in pixels.
    pub source_width: u32,
    /// Source height in pixels.
    pub source_height: u32,
}

impl Image {
    /// Newly placed images start at a quarter of their source size.
    pub const DEFAULT_SCALE: f64 = 0.25;

    pub fn new(source: impl Into<String>, source_width: u32, source_height: u32) -> Self {
        Self {
            source: source.into(),
            source_width,
            source_height,
        }
    }

    pub(crate) fn base_size(&self) -> Size {
        Size::new(self.source_width as f64, self.source_height as f64)
    }
}
