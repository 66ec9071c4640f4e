//! Planar geometry shared by the contour filters and the plate pose code.

use crate::simd;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A point (or vector) in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Column coordinate in pixels.
    pub x: f32,
    /// Row coordinate in pixels.
    pub y: f32,
}

impl Point {
    /// The image origin, used as the "not found" value.
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    /// Construct a point.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Dot product.
    #[inline]
    #[must_use]
    pub fn dot(self, other: Point) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product `self.x * other.y - self.y * other.x`, widened to f64.
    #[inline]
    #[must_use]
    pub fn cross(self, other: Point) -> f64 {
        f64::from(self.x) * f64::from(other.y) - f64::from(self.y) * f64::from(other.x)
    }

    /// Euclidean length.
    #[inline]
    #[must_use]
    pub fn norm(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// True for the exact origin.
    #[inline]
    #[must_use]
    pub fn is_origin(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;
    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Point {
    type Output = Point;
    fn div(self, rhs: f32) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// Width and height of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    /// Extent along the rectangle's own x axis.
    pub width: f32,
    /// Extent along the rectangle's own y axis.
    pub height: f32,
}

impl Size {
    /// Construct a size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// `width * height`.
    #[must_use]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// An axis-aligned integer rectangle; contains `x <= px < x + width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntRect {
    /// Left column.
    pub x: i32,
    /// Top row.
    pub y: i32,
    /// Number of columns.
    pub width: i32,
    /// Number of rows.
    pub height: i32,
}

impl IntRect {
    /// Half-open containment test.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        #[allow(clippy::cast_precision_loss)]
        let (x0, y0, x1, y1) = (
            self.x as f32,
            self.y as f32,
            (self.x + self.width) as f32,
            (self.y + self.height) as f32,
        );
        x0 <= p.x && p.x < x1 && y0 <= p.y && p.y < y1
    }
}

/// A rectangle at arbitrary orientation.
///
/// `width` runs along the direction `angle` (degrees, image axes) and `height`
/// along its perpendicular.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotatedRect {
    /// Center of the rectangle.
    pub center: Point,
    /// Side lengths.
    pub size: Size,
    /// Rotation of the width side, in degrees.
    pub angle: f32,
}

impl RotatedRect {
    /// Construct a rotated rectangle.
    #[must_use]
    pub const fn new(center: Point, size: Size, angle: f32) -> Self {
        Self {
            center,
            size,
            angle,
        }
    }

    /// Area of the rectangle.
    #[must_use]
    pub fn area(&self) -> f32 {
        self.size.area()
    }

    /// The four corners, in the order bottom-left, top-left, top-right,
    /// bottom-right of the unrotated rectangle.
    #[must_use]
    pub fn points(&self) -> [Point; 4] {
        let theta = self.angle.to_radians();
        let b = theta.cos() * 0.5;
        let a = theta.sin() * 0.5;
        let (w, h) = (self.size.width, self.size.height);
        let c = self.center;

        let p0 = Point::new(c.x - a * h - b * w, c.y + b * h - a * w);
        let p1 = Point::new(c.x + a * h - b * w, c.y - b * h - a * w);
        let p2 = Point::new(2.0 * c.x - p0.x, 2.0 * c.y - p0.y);
        let p3 = Point::new(2.0 * c.x - p1.x, 2.0 * c.y - p1.y);
        [p0, p1, p2, p3]
    }

    /// Smallest integer rectangle covering all four corners.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn bounding_rect(&self) -> IntRect {
        let pts = self.points();
        let mut min = pts[0];
        let mut max = pts[0];
        for p in &pts[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        let x = min.x.floor() as i32;
        let y = min.y.floor() as i32;
        IntRect {
            x,
            y,
            width: max.x.ceil() as i32 - x + 1,
            height: max.y.ceil() as i32 - y + 1,
        }
    }

    /// Side lengths truncated to whole pixels, ordered `(short, long)`.
    ///
    /// Returns `None` when the long side truncates to zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn short_long_ratio(&self) -> Option<f64> {
        let mut w = self.size.width as i32;
        let mut h = self.size.height as i32;
        if w > h {
            std::mem::swap(&mut w, &mut h);
        }
        if h <= 0 {
            return None;
        }
        Some(f64::from(w) / f64::from(h))
    }
}

/// Convex hull (Andrew's monotone chain), counter-clockwise in a y-up frame.
///
/// Collinear points are dropped. Fewer than three distinct points are
/// returned as-is (deduplicated).
#[must_use]
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts: Vec<Point> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<Point> = Vec::with_capacity(pts.len() * 2);
    for &p in &pts {
        while hull.len() >= 2 && (hull[hull.len() - 1] - hull[hull.len() - 2]).cross(p - hull[hull.len() - 2]) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && (hull[hull.len() - 1] - hull[hull.len() - 2]).cross(p - hull[hull.len() - 2]) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Minimum-area enclosing rectangle of a point set (rotating calipers over the hull).
///
/// Empty input yields a zero rectangle at the origin; a single point or a
/// segment yields a zero-height rectangle.
#[must_use]
pub fn min_area_rect(points: &[Point]) -> RotatedRect {
    let hull = convex_hull(points);
    match hull.len() {
        0 => RotatedRect::default(),
        1 => RotatedRect::new(hull[0], Size::default(), 0.0),
        2 => {
            let d = hull[1] - hull[0];
            RotatedRect::new(
                (hull[0] + hull[1]) * 0.5,
                Size::new(d.norm(), 0.0),
                simd::atan2(d.y, d.x).to_degrees(),
            )
        },
        n => {
            let mut best = RotatedRect::default();
            let mut best_area = f32::INFINITY;
            for i in 0..n {
                let edge = hull[(i + 1) % n] - hull[i];
                let len = edge.norm();
                if len == 0.0 {
                    continue;
                }
                let u = edge / len;
                let v = Point::new(-u.y, u.x);

                let (mut min_u, mut max_u) = (f32::INFINITY, f32::NEG_INFINITY);
                let (mut min_v, mut max_v) = (f32::INFINITY, f32::NEG_INFINITY);
                for &p in &hull {
                    let pu = p.dot(u);
                    let pv = p.dot(v);
                    min_u = min_u.min(pu);
                    max_u = max_u.max(pu);
                    min_v = min_v.min(pv);
                    max_v = max_v.max(pv);
                }

                let area = (max_u - min_u) * (max_v - min_v);
                if area < best_area {
                    best_area = area;
                    let center = u * ((min_u + max_u) * 0.5) + v * ((min_v + max_v) * 0.5);
                    best = RotatedRect::new(
                        center,
                        Size::new(max_u - min_u, max_v - min_v),
                        simd::atan2(u.y, u.x).to_degrees(),
                    );
                }
            }
            best
        },
    }
}

/// Polygon area via the shoelace formula over the closed point cycle.
///
/// Always non-negative and independent of the starting point.
#[must_use]
pub fn polygon_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0f64;
    for i in 0..n {
        twice += points[i].cross(points[(i + 1) % n]);
    }
    (twice * 0.5).abs()
}

/// Arithmetic mean of the points (origin for an empty slice).
#[must_use]
pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::ORIGIN;
    }
    let sum = points.iter().fold(Point::ORIGIN, |acc, &p| acc + p);
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f32;
    sum / n
}

/// Unsigned angle between two vectors, in degrees.
///
/// Zero-length inputs yield `NaN`.
#[must_use]
pub fn vector_angle(a: Point, b: Point) -> f32 {
    let cos = a.dot(b) * simd::rsqrt(a.dot(a)) * simd::rsqrt(b.dot(b));
    cos.clamp(-1.0, 1.0).acos().to_degrees()
}
