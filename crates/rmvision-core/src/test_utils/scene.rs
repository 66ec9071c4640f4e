#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

use crate::geometry::Point;

/// A rune blade rotating around a fixed center mark.
///
/// All lengths are in pixels and measured from the rotation center along the
/// blade axis. The blade at angle `theta` points along `(cos theta, sin theta)`
/// in image coordinates, so increasing `theta` turns it clockwise on screen.
#[derive(Debug, Clone)]
pub struct RuneScene {
    width: usize,
    height: usize,
    center: (f64, f64),
    blade_start: f64,
    blade_end: f64,
    blade_width: f64,
    window_distance: f64,
    window_length: f64,
    window_width: f64,
    mark_half_size: f64,
}

impl RuneScene {
    /// A 400 x 400 scene rotating around (200, 200).
    pub fn new() -> Self {
        Self {
            width: 400,
            height: 400,
            center: (200.0, 200.0),
            blade_start: 30.0,
            blade_end: 150.0,
            blade_width: 60.0,
            window_distance: 125.0,
            window_length: 30.0,
            window_width: 40.0,
            mark_half_size: 8.0,
        }
    }

    /// Move the rotation center.
    pub fn with_center(mut self, x: f64, y: f64) -> Self {
        self.center = (x, y);
        self
    }

    /// Change the canvas size.
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Canvas width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Canvas height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Rotation center R.
    pub fn center_r(&self) -> Point {
        Point::new(self.center.0 as f32, self.center.1 as f32)
    }

    /// Armor window center P for a blade at `theta` radians.
    pub fn center_p(&self, theta: f64) -> Point {
        let (s, c) = theta.sin_cos();
        Point::new(
            (self.center.0 + self.window_distance * c) as f32,
            (self.center.1 + self.window_distance * s) as f32,
        )
    }

    /// Render the binary mask for a blade at `theta` radians.
    pub fn render(&self, theta: f64) -> Vec<u8> {
        let (s, c) = theta.sin_cos();
        let half_blade = self.blade_width / 2.0;
        let half_window = (self.window_length / 2.0, self.window_width / 2.0);
        let mut mask = vec![0u8; self.width * self.height];

        for y in 0..self.height {
            for x in 0..self.width {
                let dx = x as f64 - self.center.0;
                let dy = y as f64 - self.center.1;
                let along = dx * c + dy * s;
                let across = -dx * s + dy * c;

                let in_blade = along >= self.blade_start
                    && along <= self.blade_end
                    && across.abs() <= half_blade;
                let in_window = (along - self.window_distance).abs() <= half_window.0
                    && across.abs() <= half_window.1;
                let in_mark = dx.abs() <= self.mark_half_size && dy.abs() <= self.mark_half_size;

                if (in_blade && !in_window) || in_mark {
                    mask[y * self.width + x] = 255;
                }
            }
        }
        mask
    }
}

impl Default for RuneScene {
    fn default() -> Self {
        Self::new()
    }
}
