//! Alignment-guide snapping for interactive drags.
//!
//! Pure geometry: one call per pointer-drag frame compares the moving
//! shape's bounds against every sibling and yields a position correction
//! plus at most one guide per axis. Guides are owned by the drag gesture;
//! they never enter the scene document.

use kurbo::{Rect, Vec2};

/// Maximum distance at which a dragged edge/center is pulled into
/// alignment with a sibling's corresponding edge/center.
pub const SNAP_THRESHOLD: f64 = 8.0;

/// Axis of an alignment guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// Transient alignment hint shown while a drag is in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Guideline {
    pub axis: Axis,
    /// The aligned coordinate (x for vertical guides, y for horizontal).
    pub position: f64,
    /// Extent covered along the other axis, as `(start, end)`.
    pub span: (f64, f64),
}

/// Result of snapping a moving shape against its siblings.
#[derive(Debug, Clone)]
pub struct SnapResult {
    /// Translation to add to the moving shape's position.
    pub correction: Vec2,
    pub snapped_x: bool,
    pub snapped_y: bool,
    /// Guides to display, at most one per axis.
    pub guides: Vec<Guideline>,
}

impl SnapResult {
    fn none() -> Self {
        Self {
            correction: Vec2::ZERO,
            snapped_x: false,
            snapped_y: false,
            guides: Vec::new(),
        }
    }

    /// Check if either axis snapped.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

struct Candidate {
    offset: f64,
    line: f64,
    span: (f64, f64),
}

/// Snap a moving shape's bounds against its siblings.
///
/// Per axis, each of the shape's edge/center coordinates is compared with
/// the sibling's corresponding coordinate (left with left, center with
/// center, and so on). The smallest absolute offset within `threshold`
/// wins; the strict comparison keeps the first sibling on exact ties.
pub fn snap_bounds(moving: Rect, siblings: &[Rect], threshold: f64) -> SnapResult {
    let mut result = SnapResult::none();

    // Vertical axis: left / center / right.
    let moving_xs = [moving.x0, (moving.x0 + moving.x1) / 2.0, moving.x1];
    let mut best: Option<Candidate> = None;
    for sibling in siblings {
        let sibling_xs = [sibling.x0, (sibling.x0 + sibling.x1) / 2.0, sibling.x1];
        for (m, s) in moving_xs.iter().zip(sibling_xs) {
            let offset = s - m;
            if offset.abs() <= threshold
                && best.as_ref().is_none_or(|b| offset.abs() < b.offset.abs())
            {
                best = Some(Candidate {
                    offset,
                    line: s,
                    span: (moving.y0.min(sibling.y0), moving.y1.max(sibling.y1)),
                });
            }
        }
    }
    if let Some(candidate) = best {
        result.correction.x = candidate.offset;
        result.snapped_x = true;
        result.guides.push(Guideline {
            axis: Axis::Vertical,
            position: candidate.line,
            span: candidate.span,
        });
    }

    // Horizontal axis: top / center / bottom.
    let moving_ys = [moving.y0, (moving.y0 + moving.y1) / 2.0, moving.y1];
    let mut best: Option<Candidate> = None;
    for sibling in siblings {
        let sibling_ys = [sibling.y0, (sibling.y0 + sibling.y1) / 2.0, sibling.y1];
        for (m, s) in moving_ys.iter().zip(sibling_ys) {
            let offset = s - m;
            if offset.abs() <= threshold
                && best.as_ref().is_none_or(|b| offset.abs() < b.offset.abs())
            {
                best = Some(Candidate {
                    offset,
                    line: s,
                    span: (moving.x0.min(sibling.x0), moving.x1.max(sibling.x1)),
                });
            }
        }
    }
    if let Some(candidate) = best {
        result.correction.y = candidate.offset;
        result.snapped_y = true;
        result.guides.push(Guideline {
            axis: Axis::Horizontal,
            position: candidate.line,
            span: candidate.span,
        });
    }

    result
}
