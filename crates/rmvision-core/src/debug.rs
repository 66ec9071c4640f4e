//! Visualization seam for debug overlays.
//!
//! Detectors hold a painter by value and only call it when debugging is
//! enabled in their configuration. Painters never feed anything back.

use crate::geometry::{Point, RotatedRect};

/// BGR color of an overlay primitive.
pub type OverlayColor = [u8; 3];

/// Sink for overlay draw calls.
pub trait DebugPainter {
    /// Mark a single point.
    fn draw_point(&mut self, point: Point, color: OverlayColor);
    /// Draw a segment.
    fn draw_line(&mut self, from: Point, to: Point, color: OverlayColor);
    /// Draw a closed polyline.
    fn draw_contour(&mut self, points: &[Point], color: OverlayColor);
    /// Draw the outline of a rotated rectangle.
    fn draw_rotated_rect(&mut self, rect: &RotatedRect, color: OverlayColor);
}

/// A painter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPainter;

impl DebugPainter for NullPainter {
    fn draw_point(&mut self, _point: Point, _color: OverlayColor) {}
    fn draw_line(&mut self, _from: Point, _to: Point, _color: OverlayColor) {}
    fn draw_contour(&mut self, _points: &[Point], _color: OverlayColor) {}
    fn draw_rotated_rect(&mut self, _rect: &RotatedRect, _color: OverlayColor) {}
}

/// One recorded overlay primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    /// See [`DebugPainter::draw_point`].
    Point(Point, OverlayColor),
    /// See [`DebugPainter::draw_line`].
    Line(Point, Point, OverlayColor),
    /// See [`DebugPainter::draw_contour`].
    Contour(Vec<Point>, OverlayColor),
    /// See [`DebugPainter::draw_rotated_rect`].
    RotatedRect(RotatedRect, OverlayColor),
}

/// A painter that records calls for later rendering.
#[derive(Debug, Clone, Default)]
pub struct RecordingPainter {
    /// Calls in emission order.
    pub calls: Vec<DrawCall>,
}

impl RecordingPainter {
    /// Drop all recorded calls.
    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl DebugPainter for RecordingPainter {
    fn draw_point(&mut self, point: Point, color: OverlayColor) {
        self.calls.push(DrawCall::Point(point, color));
    }

    fn draw_line(&mut self, from: Point, to: Point, color: OverlayColor) {
        self.calls.push(DrawCall::Line(from, to, color));
    }

    fn draw_contour(&mut self, points: &[Point], color: OverlayColor) {
        self.calls.push(DrawCall::Contour(points.to_vec(), color));
    }

    fn draw_rotated_rect(&mut self, rect: &RotatedRect, color: OverlayColor) {
        self.calls.push(DrawCall::RotatedRect(*rect, color));
    }
}

impl<P: DebugPainter + ?Sized> DebugPainter for &mut P {
    fn draw_point(&mut self, point: Point, color: OverlayColor) {
        (**self).draw_point(point, color);
    }

    fn draw_line(&mut self, from: Point, to: Point, color: OverlayColor) {
        (**self).draw_line(from, to, color);
    }

    fn draw_contour(&mut self, points: &[Point], color: OverlayColor) {
        (**self).draw_contour(points, color);
    }

    fn draw_rotated_rect(&mut self, rect: &RotatedRect, color: OverlayColor) {
        (**self).draw_rotated_rect(rect, color);
    }
}
