//! ROI (Region of Interest) selection tracking
//!
//! Turns a pointer drag into a canonical rectangle in native pixel space.
//! Drags may move in any of the four directions; the tracker always reports
//! a rectangle anchored at its top-left corner with non-negative size.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Axis-aligned selection rectangle in native pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectionRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SelectionRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Canonical rectangle spanned by an anchor and the current pointer.
    pub fn from_drag(anchor: Point, current: Point) -> Self {
        let dx = current.x - anchor.x;
        let dy = current.y - anchor.y;
        Self {
            x: if dx < 0.0 { current.x } else { anchor.x },
            y: if dy < 0.0 { current.y } else { anchor.y },
            width: dx.abs(),
            height: dy.abs(),
        }
    }

    /// Build from an integer pixel rectangle.
    pub fn from_pixels(rect: PixelRect) -> Self {
        Self::new(
            rect.x as f64,
            rect.y as f64,
            rect.width as f64,
            rect.height as f64,
        )
    }

    /// Top-left corner.
    pub fn min_corner(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Bottom-right corner.
    pub fn max_corner(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    /// True when either side has zero length; downstream treats this as "no selection".
    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Whole-pixel rectangle covering this selection, intersected with an
    /// image of `image_width` x `image_height`.
    ///
    /// The min corner is floored and the max corner ceiled before clamping,
    /// so any pixel the selection touches is included.
    pub fn to_pixel_rect(&self, image_width: u32, image_height: u32) -> PixelRect {
        let clamp = |v: f64, max: u32| -> u32 { v.max(0.0).min(max as f64) as u32 };

        let x0 = clamp(self.x.floor(), image_width);
        let y0 = clamp(self.y.floor(), image_height);
        let x1 = clamp((self.x + self.width).ceil(), image_width);
        let y1 = clamp((self.y + self.height).ceil(), image_height);

        PixelRect {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }
}

/// Integer pixel rectangle (x, y, width, height).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Selection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SelectionState {
    /// No selection exists
    #[default]
    Idle,
    /// A drag is in progress
    Dragging { anchor: Point, rect: SelectionRect },
    /// The drag ended; the rectangle is frozen
    Committed(SelectionRect),
}

/// Owns the in-progress and committed selection.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    state: SelectionState,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Start a new selection at `point`.
    ///
    /// Starting while a selection is committed discards it and begins a fresh drag.
    pub fn start(&mut self, point: Point) {
        log::debug!("selection started at ({:.1}, {:.1})", point.x, point.y);
        self.state = SelectionState::Dragging {
            anchor: point,
            rect: SelectionRect::new(point.x, point.y, 0.0, 0.0),
        };
    }

    /// Update the selection as the pointer moves. Ignored unless dragging.
    pub fn update(&mut self, point: Point) {
        if let SelectionState::Dragging { anchor, rect } = &mut self.state {
            *rect = SelectionRect::from_drag(*anchor, point);
        }
    }

    /// Freeze the current selection. Ignored unless dragging.
    pub fn finish(&mut self) {
        if let SelectionState::Dragging { rect, .. } = self.state {
            log::debug!(
                "selection committed: x={:.1} y={:.1} w={:.1} h={:.1}",
                rect.x,
                rect.y,
                rect.width,
                rect.height
            );
            self.state = SelectionState::Committed(rect);
        }
    }

    /// Discard any selection (cancel, reset or new image load).
    pub fn clear(&mut self) {
        self.state = SelectionState::Idle;
    }

    /// The rectangle currently being dragged or committed.
    pub fn current(&self) -> Option<SelectionRect> {
        match self.state {
            SelectionState::Idle => None,
            SelectionState::Dragging { rect, .. } => Some(rect),
            SelectionState::Committed(rect) => Some(rect),
        }
    }

    /// The committed rectangle, if the last drag has ended.
    pub fn committed(&self) -> Option<SelectionRect> {
        match self.state {
            SelectionState::Committed(rect) => Some(rect),
            _ => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, SelectionState::Dragging { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn drag(from: (f64, f64), to: (f64, f64)) -> SelectionRect {
        let mut tracker = SelectionTracker::new();
        tracker.start(Point::new(from.0, from.1));
        tracker.update(Point::new(to.0, to.1));
        tracker.finish();
        tracker.committed().unwrap()
    }

    // ========================================================================
    // State transitions
    // ========================================================================

    #[test]
    fn test_start_creates_zero_sized_selection() {
        let mut tracker = SelectionTracker::new();
        assert!(tracker.current().is_none());

        tracker.start(Point::new(5.0, 7.0));
        assert!(tracker.is_dragging());
        assert_eq!(tracker.current(), Some(SelectionRect::new(5.0, 7.0, 0.0, 0.0)));
        assert!(tracker.committed().is_none());
    }

    #[test]
    fn test_finish_without_move_commits_empty_rect() {
        let mut tracker = SelectionTracker::new();
        tracker.start(Point::new(5.0, 7.0));
        tracker.finish();

        let rect = tracker.committed().unwrap();
        assert!(rect.is_empty());
    }

    #[test]
    fn test_moves_outside_drag_are_ignored() {
        let mut tracker = SelectionTracker::new();
        tracker.update(Point::new(10.0, 10.0));
        tracker.finish();
        assert_eq!(*tracker.state(), SelectionState::Idle);

        tracker.start(Point::new(0.0, 0.0));
        tracker.update(Point::new(10.0, 10.0));
        tracker.finish();
        tracker.update(Point::new(50.0, 50.0));
        assert_eq!(
            tracker.committed(),
            Some(SelectionRect::new(0.0, 0.0, 10.0, 10.0))
        );
    }

    #[test]
    fn test_clear_returns_to_idle() {
        let mut tracker = SelectionTracker::new();
        tracker.start(Point::new(0.0, 0.0));
        tracker.update(Point::new(10.0, 10.0));
        tracker.finish();
        tracker.clear();
        assert!(tracker.current().is_none());
    }

    #[test]
    fn test_restart_replaces_committed_selection() {
        let mut tracker = SelectionTracker::new();
        tracker.start(Point::new(0.0, 0.0));
        tracker.update(Point::new(10.0, 10.0));
        tracker.finish();

        tracker.start(Point::new(30.0, 30.0));
        assert!(tracker.is_dragging());
        assert_eq!(tracker.current(), Some(SelectionRect::new(30.0, 30.0, 0.0, 0.0)));
    }

    // ========================================================================
    // Quadrant normalization
    // ========================================================================

    #[test]
    fn test_drag_down_right() {
        assert_eq!(drag((10.0, 20.0), (40.0, 60.0)), SelectionRect::new(10.0, 20.0, 30.0, 40.0));
    }

    #[test]
    fn test_drag_up_left() {
        assert_eq!(drag((200.0, 200.0), (100.0, 100.0)), SelectionRect::new(100.0, 100.0, 100.0, 100.0));
    }

    #[test]
    fn test_drag_up_right() {
        assert_eq!(drag((10.0, 60.0), (40.0, 20.0)), SelectionRect::new(10.0, 20.0, 30.0, 40.0));
    }

    #[test]
    fn test_drag_down_left() {
        assert_eq!(drag((40.0, 20.0), (10.0, 60.0)), SelectionRect::new(10.0, 20.0, 30.0, 40.0));
    }

    #[test]
    fn test_direction_reversal_mid_drag() {
        let mut tracker = SelectionTracker::new();
        tracker.start(Point::new(50.0, 50.0));
        tracker.update(Point::new(80.0, 90.0));
        tracker.update(Point::new(20.0, 10.0));
        tracker.finish();
        assert_eq!(
            tracker.committed(),
            Some(SelectionRect::new(20.0, 10.0, 30.0, 40.0))
        );
    }

    proptest! {
        #[test]
        fn prop_committed_rect_spans_endpoints(
            ax in -500.0f64..2000.0, ay in -500.0f64..2000.0,
            bx in -500.0f64..2000.0, by in -500.0f64..2000.0,
        ) {
            let rect = drag((ax, ay), (bx, by));
            prop_assert!(rect.width >= 0.0);
            prop_assert!(rect.height >= 0.0);
            prop_assert_eq!(rect.min_corner(), Point::new(ax.min(bx), ay.min(by)));

            let max = rect.max_corner();
            prop_assert!((max.x - ax.max(bx)).abs() < 1e-9);
            prop_assert!((max.y - ay.max(by)).abs() < 1e-9);
        }
    }

    // ========================================================================
    // Pixel conversion
    // ========================================================================

    #[test]
    fn test_pixel_rect_inside_image() {
        let rect = SelectionRect::new(100.0, 100.0, 100.0, 100.0);
        assert_eq!(rect.to_pixel_rect(800, 600), PixelRect::new(100, 100, 100, 100));
    }

    #[test]
    fn test_pixel_rect_covers_fractional_edges() {
        let rect = SelectionRect::new(1.5, 2.5, 2.0, 1.0);
        assert_eq!(rect.to_pixel_rect(10, 10), PixelRect::new(1, 2, 3, 2));
    }

    #[test]
    fn test_pixel_rect_clamped_to_image() {
        let rect = SelectionRect::new(-20.0, 550.0, 100.0, 100.0);
        assert_eq!(rect.to_pixel_rect(800, 600), PixelRect::new(0, 550, 80, 50));
    }

    #[test]
    fn test_pixel_rect_outside_image_is_empty() {
        let rect = SelectionRect::new(900.0, 10.0, 50.0, 50.0);
        assert!(rect.to_pixel_rect(800, 600).is_empty());
    }
}
