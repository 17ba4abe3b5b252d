//! Geometry kernel: stateless planar math shared by the pattern library,
//! the matcher, and the object tracker downstream.
//!
//! Everything here works on anything that implements [`Planar`], so both
//! template points ([`Point`]) and live contacts ([`crate::TouchPoint`])
//! can be fed in without copying.

use std::f64::consts::PI;

// ════════════════════════════════════════════════════════════════════════════
// Point / Planar
// ════════════════════════════════════════════════════════════════════════════

/// A position on the touch surface, in surface units (pixels on the
/// touch panel).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point { x, y }
    }
}

/// Anything with a planar position.
pub trait Planar {
    fn x(&self) -> f64;
    fn y(&self) -> f64;

    fn point(&self) -> Point {
        Point::new(self.x(), self.y())
    }
}

impl Planar for Point {
    fn x(&self) -> f64 { self.x }
    fn y(&self) -> f64 { self.y }
}

impl<P: Planar + ?Sized> Planar for &P {
    fn x(&self) -> f64 { (**self).x() }
    fn y(&self) -> f64 { (**self).y() }
}

// ════════════════════════════════════════════════════════════════════════════
// Distances and centroids
// ════════════════════════════════════════════════════════════════════════════

/// Euclidean distance between two positions.
pub fn distance<A: Planar, B: Planar>(a: &A, b: &B) -> f64 {
    (a.x() - b.x()).hypot(a.y() - b.y())
}

/// Squared distance; used where only the ordering matters.
pub fn distance_sq<A: Planar, B: Planar>(a: &A, b: &B) -> f64 {
    let dx = a.x() - b.x();
    let dy = a.y() - b.y();
    dx * dx + dy * dy
}

/// Arithmetic mean of the coordinates.  An empty slice yields the origin.
pub fn centroid<P: Planar>(points: &[P]) -> Point {
    if points.is_empty() {
        return Point::default();
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x(), sy + p.y()));
    Point::new(sx / n, sy / n)
}

/// Shoelace-style accumulator over consecutive (cyclic) pairs:
/// `Σ (x2 - x1) * (y2 + y1)`.
///
/// Only the sign is meaningful to callers: mirroring a point set across any
/// axis negates it, which is what makes it a chirality discriminant.
pub fn signed_area<P: Planar>(ordered: &[P]) -> f64 {
    let n = ordered.len();
    (0..n)
        .map(|i| {
            let p1 = &ordered[i];
            let p2 = &ordered[(i + 1) % n];
            (p2.x() - p1.x()) * (p2.y() + p1.y())
        })
        .sum()
}

// ════════════════════════════════════════════════════════════════════════════
// Angles and interpolation
// ════════════════════════════════════════════════════════════════════════════

/// Map any radian value onto `(-π, π]`.
pub fn normalize_angle(a: f64) -> f64 {
    let tau = 2.0 * PI;
    let r = a % tau;
    if r > PI {
        r - tau
    } else if r <= -PI {
        r + tau
    } else {
        r
    }
}

/// `(1 - t) * a + t * b`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    (1.0 - t) * a + t * b
}

/// Interpolate along the shortest arc from `a` towards `b`.
///
/// The result is `a + d * t` with `d = normalize_angle(b - a)`, so moving
/// from just below π to just above -π takes the short way round instead of
/// spinning through zero.
pub fn lerp_angle(a: f64, b: f64, t: f64) -> f64 {
    a + normalize_angle(b - a) * t
}

/// Clamp to `[0, 1]`.  NaN collapses to 0.
pub fn clamp01(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
