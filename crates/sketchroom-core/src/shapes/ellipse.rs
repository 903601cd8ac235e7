//! Ellipse shape.

use super::Rgba;
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// An ellipse, anchored at the top-left of its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    /// Horizontal radius.
    pub radius_x: f64,
    /// Vertical radius.
    pub radius_y: f64,
    /// Fill color.
    pub fill: Rgba,
}

impl Ellipse {
    /// Default creation radius.
    pub const DEFAULT_RADIUS: f64 = 50.0;
    /// Default fill for newly placed ellipses.
    pub const DEFAULT_FILL: &'static str = "#4287f5";

    /// Create a new ellipse with the default fill.
    pub fn new(radius_x: f64, radius_y: f64) -> Self {
        Self {
            radius_x,
            radius_y,
            fill: Rgba::from_hex(Self::DEFAULT_FILL).unwrap_or_else(Rgba::black),
        }
    }

    /// Create a circle.
    pub fn circle(radius: f64) -> Self {
        Self::new(radius, radius)
    }

    pub(crate) fn base_size(&self) -> Size {
        Size::new(self.radius_x * 2.0, self.radius_y * 2.0)
    }
}

impl Default for Ellipse {
    fn default() -> Self {
        Self::circle(Self::DEFAULT_RADIUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_is_symmetric() {
        let circle = Ellipse::circle(25.0);
        assert!((circle.radius_x - circle.radius_y).abs() < f64::EPSILON);
    }

    #[test]
    fn test_base_size_is_diameter() {
        let ellipse = Ellipse::new(30.0, 20.0);
        let size = ellipse.base_size();
        assert!((size.width - 60.0).abs() < f64::EPSILON);
        assert!((size.height - 40.0).abs() < f64::EPSILON);
    }
}
