#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

/// Rotating rune scenes for multi-frame tests.
pub mod scene;

use crate::armor::PlateModel;
use crate::camera::CameraModel;
use crate::color::Color;
use crate::geometry::Point;
use crate::pose::Pose;
use nalgebra::Vector3;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Width of [`reference_rune_mask`].
pub const REFERENCE_WIDTH: usize = 320;
/// Height of [`reference_rune_mask`].
pub const REFERENCE_HEIGHT: usize = 240;

/// Set every pixel of the inclusive rectangle `[x0, x1] x [y0, y1]` to `value`.
pub fn fill_rect(mask: &mut [u8], width: usize, x0: usize, y0: usize, x1: usize, y1: usize, value: u8) {
    for y in y0..=y1 {
        mask[y * width + x0..=y * width + x1].fill(value);
    }
}

/// A static rune with the blade pointing right.
///
/// The blade spans x 100..=259, y 120..=179 with the armor window at
/// x 210..=239, y 125..=174 cut out of it; the center mark R is the
/// 16 x 16 square at x 40..=55, y 142..=157. Under the default
/// configuration the detector finds P at (224.5, 149.5) and R at (47.5, 149.5).
#[must_use]
pub fn reference_rune_mask() -> Vec<u8> {
    let w = REFERENCE_WIDTH;
    let mut mask = vec![0u8; w * REFERENCE_HEIGHT];
    fill_rect(&mut mask, w, 100, 120, 259, 179, 255);
    fill_rect(&mut mask, w, 210, 125, 239, 174, 0);
    fill_rect(&mut mask, w, 40, 142, 55, 157, 255);
    mask
}

/// Paint a binary mask as a BGR frame lit in `color`.
///
/// Foreground pixels get a strong target channel and a weak complementary
/// one; background is dark gray. `noise_sigma > 0` adds Gaussian noise to
/// every channel.
pub fn colorize<R: Rng>(mask: &[u8], color: Color, noise_sigma: f64, rng: &mut R) -> Vec<u8> {
    let lit = match color {
        Color::Red => [40u8, 90, 220],
        Color::Blue => [220u8, 90, 40],
    };
    let dark = [30u8, 30, 30];
    let mut bgr = Vec::with_capacity(mask.len() * 3);
    for &m in mask {
        bgr.extend_from_slice(if m != 0 { &lit } else { &dark });
    }

    if noise_sigma > 0.0 {
        if let Ok(normal) = Normal::new(0.0, noise_sigma) {
            for v in &mut bgr {
                let noise = normal.sample(rng) as i32;
                *v = (i32::from(*v) + noise).clamp(0, 255) as u8;
            }
        }
    }
    bgr
}

/// Copy dense rows of `row_len` bytes into a buffer with `stride` bytes per row.
///
/// Padding bytes are filled with `pad` so tests can tell them apart from pixels.
#[must_use]
pub fn with_stride(data: &[u8], row_len: usize, stride: usize, pad: u8) -> Vec<u8> {
    let rows = data.len() / row_len;
    let mut out = vec![pad; rows * stride];
    for (src, dst) in data.chunks_exact(row_len).zip(out.chunks_exact_mut(stride)) {
        dst[..row_len].copy_from_slice(src);
    }
    out
}

/// Project a plate model through a camera at a known pose.
///
/// Corners come back in the model's order as image points.
#[must_use]
pub fn project_plate(camera: &CameraModel, pose: &Pose, model: PlateModel) -> [Point; 4] {
    model.object_points().map(|[x, y]| {
        let [u, v] = pose.project(&Vector3::new(x, y, 0.0), camera);
        Point::new(u as f32, v as f32)
    })
}

/// Largest corner distance between two quadrilaterals.
#[must_use]
pub fn max_corner_error(a: &[Point; 4], b: &[Point; 4]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(p, q)| (*p - *q).norm())
        .fold(0.0, f32::max)
}
