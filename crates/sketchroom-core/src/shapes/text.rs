//! Text-box shape.

use super::Rgba;
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Line height as a multiple of the font size.
const LINE_HEIGHT: f64 = 1.16;

/// A text box with fixed width and wrapping left to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    /// Text content; may span multiple lines.
    pub content: String,
    /// Box width.
    pub width: f64,
    /// Font size in canvas units.
    pub font_size: f64,
    /// Fill color.
    pub fill: Rgba,
}

impl Text {
    /// Default content for newly placed text boxes.
    pub const DEFAULT_CONTENT: &'static str = "New Text";
    pub const DEFAULT_WIDTH: f64 = 200.0;
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;

    /// Create a new text box with black fill.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            width: Self::DEFAULT_WIDTH,
            font_size: Self::DEFAULT_FONT_SIZE,
            fill: Rgba::black(),
        }
    }

    /// Unscaled size: fixed width, height from the explicit line count.
    pub(crate) fn base_size(&self) -> Size {
        let lines = self.content.lines().count().max(1);
        Size::new(self.width, self.font_size * LINE_HEIGHT * lines as f64)
    }
}

impl Default for Text {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CONTENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_defaults() {
        let text = Text::default();
        assert_eq!(text.content, "New Text");
        assert!((text.width - 200.0).abs() < f64::EPSILON);
        assert!((text.font_size - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_base_size_grows_with_lines() {
        let one = Text::new("hello").base_size();
        let three = Text::new("a\nb\nc").base_size();
        assert!((three.height - one.height * 3.0).abs() < 1e-9);
        assert!((one.width - three.width).abs() < f64::EPSILON);
    }
}
