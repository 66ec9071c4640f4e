//! Geometric search for the rune's armor center P, rotation center R and
//! blade centroid G on a contour hierarchy.

use crate::config::RuneConfig;
use crate::contour::ContourTree;
use crate::geometry::{min_area_rect, polygon_area, Point, RotatedRect, Size};

/// A required point was not found in the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DetectionMiss {
    /// No blade contour with an armor window passed the filters.
    #[error("no blade contour with a nested armor window")]
    NoArmorCenter,
    /// No contour in the frame looks like the center mark.
    #[error("no center mark candidates in the frame")]
    NoCenterCandidates,
    /// Center mark candidates exist but none lies in the search window.
    #[error("no center mark candidate inside the search window")]
    NoCenterInWindow,
}

/// The accepted blade and its armor window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanMatch {
    /// Minimum-area rectangle of the blade's outer contour.
    pub fan_rect: RotatedRect,
    /// Contour index of the blade.
    pub fan_index: usize,
    /// Minimum-area rectangle of the armor window.
    pub armor_rect: RotatedRect,
    /// Contour index of the armor window.
    pub armor_index: usize,
}

impl FanMatch {
    /// Armor center P.
    #[must_use]
    pub fn armor_center(&self) -> Point {
        self.armor_rect.center
    }
}

#[inline]
fn strictly_within(value: f64, min: f64, max: f64) -> bool {
    min < value && value < max
}

fn ratio_within(rect: &RotatedRect, min: f64, max: f64) -> bool {
    rect.short_long_ratio()
        .is_some_and(|ratio| strictly_within(ratio, min, max))
}

/// Find the first top-level blade whose nested armor window passes the filters.
///
/// Blades need a rectangle area of at least `min_bounding_box_area`, a
/// short/long side ratio and a contour area inside their bounds; windows need
/// rectangle area and side ratio inside theirs. Blades are tried in sibling
/// order (latest discovered first) and the first child passing ends the
/// search.
///
/// # Errors
/// Returns [`DetectionMiss::NoArmorCenter`] when no pair qualifies.
pub fn find_armor_center(tree: &ContourTree, config: &RuneConfig) -> Result<FanMatch, DetectionMiss> {
    for fan_index in tree.roots() {
        let contour = tree.contour(fan_index);
        let fan_rect = min_area_rect(contour);

        if f64::from(fan_rect.area()) < config.min_bounding_box_area {
            continue;
        }
        if !ratio_within(
            &fan_rect,
            config.min_bounding_box_wh_ratio,
            config.max_bounding_box_wh_ratio,
        ) {
            continue;
        }
        if !strictly_within(polygon_area(contour), config.min_contour_area, config.max_contour_area) {
            continue;
        }

        for armor_index in tree.children(fan_index) {
            let armor_rect = min_area_rect(tree.contour(armor_index));
            if strictly_within(
                f64::from(armor_rect.area()),
                config.min_armor_area,
                config.max_armor_area,
            ) && ratio_within(&armor_rect, config.min_armor_wh_ratio, config.max_armor_wh_ratio)
            {
                return Ok(FanMatch {
                    fan_rect,
                    fan_index,
                    armor_rect,
                    armor_index,
                });
            }
        }
    }

    tracing::error!("No P point found");
    Err(DetectionMiss::NoArmorCenter)
}

/// Collect the rectangle centers of all contours shaped like the center mark.
///
/// Every contour of the tree is considered, in discovery order. `out` is
/// cleared first.
pub fn collect_center_candidates(tree: &ContourTree, config: &RuneConfig, out: &mut Vec<Point>) {
    out.clear();
    for contour in tree.iter() {
        let rect = min_area_rect(contour);
        let deviation = f64::from((rect.size.width - rect.size.height).abs());
        if strictly_within(
            f64::from(rect.area()),
            config.min_r_bounding_box_area,
            config.max_r_bounding_box_area,
        ) && deviation < config.max_encircle_r_rect_wh_deviation
        {
            out.push(rect.center);
        }
    }
}

/// Region where the center mark is expected for a given blade.
///
/// The window keeps the blade's orientation, is shifted from the blade
/// center by `search_offset_ratio` of the long side away from the armor, and
/// has its larger side divided by `search_shrink_divisor`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn center_search_window(fan_rect: &RotatedRect, armor_center: Point, config: &RuneConfig) -> RotatedRect {
    let pts = fan_rect.points();
    let side_a = pts[0] - pts[1];
    let side_b = pts[1] - pts[2];

    let mut direction = if side_a.norm() > side_b.norm() { side_a } else { side_b };
    if (fan_rect.center - armor_center).dot(direction) <= 0.0 {
        direction = -direction;
    }
    let center = fan_rect.center + direction * config.search_offset_ratio;

    let w = fan_rect.size.width as i32;
    let h = fan_rect.size.height as i32;
    let divisor = config.search_shrink_divisor.max(1);
    let (w, h) = if fan_rect.size.width > fan_rect.size.height {
        (w / divisor, h)
    } else {
        (w, h / divisor)
    };

    RotatedRect::new(center, Size::new(w as f32, h as f32), fan_rect.angle)
}

/// Incremental mean whose result depends on insertion order under rounding.
///
/// `mean_n = x_n / n + mean_{n-1} * (n - 1) / n`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OnlineMean {
    mean: Point,
    count: u32,
}

impl OnlineMean {
    /// Fold in one sample.
    #[allow(clippy::cast_precision_loss)]
    pub fn push(&mut self, sample: Point) {
        self.count += 1;
        let n = self.count as f32;
        self.mean = sample / n + self.mean * ((n - 1.0) / n);
    }

    /// Current mean, `None` before the first sample.
    #[must_use]
    pub fn mean(&self) -> Option<Point> {
        (self.count > 0).then_some(self.mean)
    }

    /// Number of samples folded in.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Forget all samples.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Average the candidates inside the window's bounding box, in order,
/// after subtracting `offset` from each.
///
/// # Errors
/// [`DetectionMiss::NoCenterCandidates`] for an empty candidate list and
/// [`DetectionMiss::NoCenterInWindow`] when none falls inside the window.
pub fn find_center_r(candidates: &[Point], window: &RotatedRect, offset: Point) -> Result<Point, DetectionMiss> {
    if candidates.is_empty() {
        tracing::warn!("No center R candidates");
        return Err(DetectionMiss::NoCenterCandidates);
    }

    let bounds = window.bounding_rect();
    let mut mean = OnlineMean::default();
    for &c in candidates.iter().filter(|c| bounds.contains(**c)) {
        mean.push(c - offset);
    }

    mean.mean().ok_or_else(|| {
        tracing::warn!(candidates = candidates.len(), "No center R candidate in search window");
        DetectionMiss::NoCenterInWindow
    })
}

/// Blade centroid G as a fixed blend of armor center, rotation center and
/// blade rectangle center.
#[must_use]
pub fn fan_center_g(fan: &FanMatch, center_r: Point) -> Point {
    fan.armor_rect.center * 0.25 + center_r * 0.25 + fan.fan_rect.center * 0.5
}
