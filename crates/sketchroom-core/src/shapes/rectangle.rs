//! Rectangle shape.

use super::Rgba;
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// A rectangle with optional rounded corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    /// Width of the rectangle.
    pub width: f64,
    /// Height of the rectangle.
    pub height: f64,
    /// Corner radius (0 = sharp corners).
    #[serde(default)]
    pub corner_radius: f64,
    /// Fill color.
    pub fill: Rgba,
}

impl Rectangle {
    /// Default creation size.
    pub const DEFAULT_WIDTH: f64 = 100.0;
    pub const DEFAULT_HEIGHT: f64 = 60.0;
    /// Default fill for newly placed rectangles.
    pub const DEFAULT_FILL: &'static str = "#D84D42";

    /// Create a new rectangle with the default fill.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            corner_radius: 0.0,
            fill: Rgba::from_hex(Self::DEFAULT_FILL).unwrap_or_else(Rgba::black),
        }
    }

    pub(crate) fn base_size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl Default for Rectangle {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT)
    }
}
