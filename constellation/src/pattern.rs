//! Pattern library: named stamp templates and their shape fingerprints.
//!
//! A template is reduced at registration time to three things:
//!
//! * a **signature**: every pairwise distance, sorted ascending, which is
//!   invariant under rotation and translation;
//! * a **chirality**: the sign of the signed area of the points taken in
//!   canonical order (see [`canonical_order`]), which tells a shape apart
//!   from its mirror image;
//! * a **category**: whether the stamp is a track or an effect.
//!
//! Registration is append-only.  Recognition lives in [`crate::matcher`].

use std::cmp::Ordering;
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::geometry::{centroid, distance, signed_area, Planar, Point};

// ════════════════════════════════════════════════════════════════════════════
// Category
// ════════════════════════════════════════════════════════════════════════════

/// What a stamp controls once it is placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// A source channel; exposes one control axis.
    Track,
    /// A processing hub; joins the chronological effect chain.
    Effect,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::Track  => "TRACK",
            Category::Effect => "EFFECT",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACK"  => Ok(Category::Track),
            "EFFECT" => Ok(Category::Effect),
            other    => Err(PatternError::UnknownCategory(other.to_string())),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Chirality
// ════════════════════════════════════════════════════════════════════════════

/// Handedness of a canonically ordered point set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Chirality {
    Positive,
    Negative,
    /// Signed area exactly zero (collinear points).
    Degenerate,
}

impl Chirality {
    pub fn from_area(area: f64) -> Self {
        if area > 0.0 {
            Chirality::Positive
        } else if area < 0.0 {
            Chirality::Negative
        } else {
            Chirality::Degenerate
        }
    }

    /// Chirality of an arbitrary point set.
    pub fn of<P: Planar>(points: &[P]) -> Self {
        let ordered = canonical_order(points);
        Chirality::from_area(signed_area(&ordered))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

/// Reasons a template cannot be registered.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum PatternError {
    #[error("pattern '{0}' is already registered")]
    DuplicateName(String),
    #[error("pattern '{name}' has {count} points; at least 3 are required")]
    TooFewPoints { name: String, count: usize },
    #[error("pattern '{name}' contains a non-finite coordinate")]
    NonFinite { name: String },
    #[error("unknown category '{0}' (expected TRACK or EFFECT)")]
    UnknownCategory(String),
}

// ════════════════════════════════════════════════════════════════════════════
// Shape helpers
// ════════════════════════════════════════════════════════════════════════════

/// Fewest contacts a stamp can have.
pub const MIN_POINTS: usize = 3;

/// Sorted list of all pairwise distances.
pub fn signature<P: Planar>(points: &[P]) -> Vec<f64> {
    let n = points.len();
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in i + 1..n {
            out.push(distance(&points[i], &points[j]));
        }
    }
    out.sort_by(f64::total_cmp);
    out
}

/// Slack used when two contacts are treated as equally far from the
/// centroid (as a fraction of the shape's radius) or as lying on the same
/// spoke from it (in radians).
pub const SHAPE_EPSILON: f64 = 0.05;

/// A repeatable walk around the centroid.
///
/// Contacts are grouped into spokes (same direction from the centroid) and
/// the spokes are visited in angular order.  Every starting spoke and both
/// directions are tried; the walk kept is the one whose sequence of radii
/// and angular gaps is smallest, so it starts on the contact nearest the
/// centroid and is the same for any input order or rotation.  A mirror
/// image walks the other way round, which is what gives
/// [`signed_area`] its sign.  When both directions read the same (the shape
/// is its own mirror image) the counter-clockwise one wins.
///
/// Contacts sitting on the centroid carry no direction and go last.
pub fn canonical_order<P: Planar>(points: &[P]) -> Vec<Point> {
    let pts: Vec<Point> = points.iter().map(Planar::point).collect();
    let c = centroid(&pts);
    let radius: Vec<f64> = pts.iter().map(|p| distance(p, &c)).collect();
    let scale = radius.iter().copied().fold(0.0, f64::max);
    if scale == 0.0 {
        return pts;
    }
    let eps = SHAPE_EPSILON * scale;

    let (mut ring, hub): (Vec<usize>, Vec<usize>) =
        (0..pts.len()).partition(|&i| radius[i] > eps);
    let angle: Vec<f64> = pts.iter().map(|p| (p.y - c.y).atan2(p.x - c.x)).collect();
    ring.sort_by(|&a, &b| angle[a].total_cmp(&angle[b]));

    let spokes = group_spokes(&ring, &angle, &radius);
    let mut best: Option<(Vec<f64>, Vec<usize>)> = None;
    for forward in [true, false] {
        for start in 0..spokes.len() {
            let (key, walk) = walk_spokes(&spokes, &radius, scale, start, forward);
            let better = match &best {
                Some((best_key, _)) => compare_keys(&key, best_key, eps) == Ordering::Less,
                None => true,
            };
            if better {
                best = Some((key, walk));
            }
        }
    }

    let walk = best.map(|(_, walk)| walk).unwrap_or_default();
    walk.into_iter().chain(hub).map(|i| pts[i]).collect()
}

/// Contacts in one direction from the centroid, nearest first.
struct Spoke {
    members: Vec<usize>,
    angle:   f64,
}

/// `ring` must be sorted by angle.
fn group_spokes(ring: &[usize], angle: &[f64], radius: &[f64]) -> Vec<Spoke> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut prev: Option<usize> = None;
    for &i in ring {
        match (prev, groups.last_mut()) {
            (Some(p), Some(g)) if angle[i] - angle[p] <= SHAPE_EPSILON => g.push(i),
            _ => groups.push(vec![i]),
        }
        prev = Some(i);
    }
    // The first and last spokes may be one spoke split across ±π.
    if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
        if groups.len() > 1 && angle[first] + TAU - angle[last] <= SHAPE_EPSILON {
            if let Some(mut tail) = groups.pop() {
                tail.append(&mut groups[0]);
                groups[0] = tail;
            }
        }
    }

    groups
        .into_iter()
        .map(|mut members| {
            members.sort_by(|&a, &b| radius[a].total_cmp(&radius[b]));
            let angle = angle[members[0]];
            Spoke { members, angle }
        })
        .collect()
}

/// Visit every spoke once from `start`.  The key holds, per spoke, its
/// nearest radius, its size, its other radii and the gap to the next spoke
/// (as arc length, so one epsilon fits every entry).
fn walk_spokes(
    spokes: &[Spoke],
    radius: &[f64],
    scale: f64,
    start: usize,
    forward: bool,
) -> (Vec<f64>, Vec<usize>) {
    let m = spokes.len();
    let step = |k: usize| if forward { (start + k) % m } else { (start + m - k % m) % m };

    let mut key = Vec::new();
    let mut walk = Vec::new();
    for k in 0..m {
        let here = &spokes[step(k)];
        let next = &spokes[step(k + 1)];
        let gap = if m == 1 {
            TAU
        } else if forward {
            (next.angle - here.angle).rem_euclid(TAU)
        } else {
            (here.angle - next.angle).rem_euclid(TAU)
        };
        key.push(radius[here.members[0]]);
        key.push(here.members.len() as f64 * scale);
        key.extend(here.members[1..].iter().map(|&i| radius[i]));
        key.push(gap * scale);
        walk.extend_from_slice(&here.members);
    }
    (key, walk)
}

/// Lexicographic, with entries closer than `eps` counted as equal.
fn compare_keys(a: &[f64], b: &[f64], eps: f64) -> Ordering {
    a.iter()
        .zip(b)
        .find(|(x, y)| (*x - *y).abs() > eps)
        .map_or(Ordering::Equal, |(x, y)| x.total_cmp(y))
}

/// Element-wise comparison; every pair must differ by at most `tolerance`.
pub fn signatures_match(template: &[f64], candidate: &[f64], tolerance: f64) -> bool {
    template.len() == candidate.len()
        && template
            .iter()
            .zip(candidate)
            .all(|(a, b)| (a - b).abs() <= tolerance)
}

// ════════════════════════════════════════════════════════════════════════════
// PatternTemplate
// ════════════════════════════════════════════════════════════════════════════

/// An immutable, registered stamp shape.
#[derive(Clone, Debug, PartialEq)]
pub struct PatternTemplate {
    pub name:        String,
    pub point_count: usize,
    /// Sorted ascending; length C(point_count, 2).
    pub signature:   Vec<f64>,
    pub chirality:   Chirality,
    pub category:    Category,
}

impl PatternTemplate {
    fn build(name: &str, points: &[Point], category: Category) -> Result<Self, PatternError> {
        if points.len() < MIN_POINTS {
            return Err(PatternError::TooFewPoints {
                name:  name.to_string(),
                count: points.len(),
            });
        }
        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(PatternError::NonFinite { name: name.to_string() });
        }
        Ok(PatternTemplate {
            name:        name.to_string(),
            point_count: points.len(),
            signature:   signature(points),
            chirality:   Chirality::of(points),
            category,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MatcherConfig / PatternLibrary
// ════════════════════════════════════════════════════════════════════════════

/// Recognition tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatcherConfig {
    /// Largest allowed per-distance deviation from a template signature,
    /// in surface units.
    pub tolerance: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        MatcherConfig { tolerance: 30.0 }
    }
}

/// The set of registered templates, in registration order.
#[derive(Clone, Debug, Default)]
pub struct PatternLibrary {
    pub(crate) templates: Vec<PatternTemplate>,
    pub(crate) config:    MatcherConfig,
}

impl PatternLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MatcherConfig) -> Self {
        PatternLibrary { templates: Vec::new(), config }
    }

    /// Register a template from its relative point layout.
    ///
    /// No tolerance is applied here; the raw distances become the signature.
    pub fn register(
        &mut self,
        name: &str,
        relative_points: &[Point],
        category: Category,
    ) -> Result<&PatternTemplate, PatternError> {
        if self.get(name).is_some() {
            return Err(PatternError::DuplicateName(name.to_string()));
        }
        let template = PatternTemplate::build(name, relative_points, category)?;
        debug!(
            pattern   = name,
            points    = template.point_count,
            chirality = ?template.chirality,
            %category,
            "registered pattern"
        );
        self.templates.push(template);
        Ok(&self.templates[self.templates.len() - 1])
    }

    pub fn get(&self, name: &str) -> Option<&PatternTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn templates(&self) -> &[PatternTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize { self.templates.len() }
    pub fn is_empty(&self) -> bool { self.templates.is_empty() }

    pub fn config(&self) -> &MatcherConfig { &self.config }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.config.tolerance = tolerance;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn tri() -> Vec<Point> {
        vec![Point::new(0.0, 0.0), Point::new(60.0, 0.0), Point::new(0.0, 100.0)]
    }

    #[test]
    fn signature_sorted_and_sized() {
        let sig = signature(&tri());
        assert_eq!(sig.len(), 3);
        assert!(sig.windows(2).all(|w| w[0] <= w[1]));
        assert!((sig[0] - 60.0).abs() < 1e-9);
        assert!((sig[1] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn signature_ignores_input_order() {
        let mut rev = tri();
        rev.reverse();
        assert_eq!(signature(&tri()), signature(&rev));
    }

    #[test]
    fn canonical_order_starts_nearest() {
        let pts = [Point::new(100.0, 0.0), Point::new(1.0, 1.0), Point::new(-2.0, -1.0)];
        let ordered = canonical_order(&pts);
        assert_eq!(ordered.len(), 3);
        assert_eq!(ordered[0], Point::new(1.0, 1.0));
        assert!(pts.iter().all(|p| ordered.contains(p)));
    }

    /// Corners of a 2 × 2 square with one bottom corner pulled to the
    /// middle: two pairs of contacts are equally far from the centroid.
    fn notched() -> Vec<Point> {
        vec![
            Point::new(64.0, 0.0),
            Point::new(128.0, 0.0),
            Point::new(128.0, 128.0),
            Point::new(0.0, 128.0),
        ]
    }

    fn turned(pts: &[Point], theta: f64) -> Vec<Point> {
        let (s, co) = theta.sin_cos();
        pts.iter().map(|p| Point::new(p.x * co - p.y * s + 7.0, p.x * s + p.y * co - 3.0)).collect()
    }

    #[test]
    fn equidistant_contacts_keep_their_handedness() {
        let base = Chirality::of(&notched());
        assert_ne!(base, Chirality::Degenerate);
        for step in 0..72 {
            let theta = step as f64 * TAU / 72.0;
            let mut pts = turned(&notched(), theta);
            assert_eq!(Chirality::of(&pts), base, "step {step}");
            pts.rotate_left(step % 4);
            assert_eq!(Chirality::of(&pts), base, "step {step}, shuffled");
        }
    }

    #[test]
    fn canonical_start_follows_the_shape() {
        let first = canonical_order(&notched())[0];
        assert_eq!(first, Point::new(64.0, 0.0));
        for step in 0..24 {
            let theta = step as f64 * TAU / 24.0;
            let mut pts = turned(&notched(), theta);
            pts.reverse();
            let expected = turned(&[first], theta)[0];
            let got = canonical_order(&pts)[0];
            assert!((got.x - expected.x).abs() < 1e-9 && (got.y - expected.y).abs() < 1e-9);
        }
    }

    #[test]
    fn symmetric_shape_matches_its_mirror() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(128.0, 0.0),
            Point::new(128.0, 128.0),
            Point::new(0.0, 128.0),
        ];
        let mirrored: Vec<Point> = square.iter().map(|p| Point::new(-p.x, p.y)).collect();
        assert_eq!(Chirality::of(&square), Chirality::of(&mirrored));
        assert_eq!(Chirality::of(&square), Chirality::of(&turned(&square, 0.4)));
    }

    #[test]
    fn contact_on_the_centroid_goes_last() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(64.0, 64.0),
            Point::new(128.0, 0.0),
            Point::new(128.0, 128.0),
            Point::new(0.0, 128.0),
        ];
        let ordered = canonical_order(&pts);
        assert_eq!(ordered[4], Point::new(64.0, 64.0));
    }

    #[test]
    fn mirrored_notch_flips_chirality() {
        let mirrored: Vec<Point> = notched().iter().map(|p| Point::new(-p.x, p.y)).collect();
        assert_ne!(Chirality::of(&notched()), Chirality::of(&mirrored));
        assert_ne!(Chirality::of(&mirrored), Chirality::Degenerate);
    }

    #[test]
    fn mirrored_template_has_opposite_chirality() {
        let mirrored: Vec<Point> = tri().iter().map(|p| Point::new(-p.x, p.y)).collect();
        let a = Chirality::of(&tri());
        let b = Chirality::of(&mirrored);
        assert_ne!(a, Chirality::Degenerate);
        assert_ne!(a, b);
    }

    #[test]
    fn register_and_lookup() {
        let mut lib = PatternLibrary::new();
        let t = lib.register("TRI", &tri(), Category::Effect).unwrap();
        assert_eq!(t.point_count, 3);
        assert_eq!(t.category, Category::Effect);
        assert!(lib.get("TRI").is_some());
        assert_eq!(lib.len(), 1);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut lib = PatternLibrary::new();
        lib.register("TRI", &tri(), Category::Track).unwrap();
        let err = lib.register("TRI", &tri(), Category::Track).unwrap_err();
        assert_eq!(err, PatternError::DuplicateName("TRI".into()));
        assert_eq!(lib.len(), 1);
    }

    #[test]
    fn too_few_points_rejected() {
        let mut lib = PatternLibrary::new();
        let err = lib
            .register("PAIR", &[Point::new(0.0, 0.0), Point::new(1.0, 0.0)], Category::Track)
            .unwrap_err();
        assert!(matches!(err, PatternError::TooFewPoints { count: 2, .. }));
    }

    #[test]
    fn non_finite_rejected() {
        let mut lib = PatternLibrary::new();
        let pts = [Point::new(0.0, 0.0), Point::new(f64::NAN, 0.0), Point::new(0.0, 1.0)];
        assert!(matches!(
            lib.register("BAD", &pts, Category::Track),
            Err(PatternError::NonFinite { .. })
        ));
    }

    #[test]
    fn tolerance_is_inclusive() {
        let t = [10.0, 20.0, 30.0];
        assert!(signatures_match(&t, &[40.0, 20.0, 30.0], 30.0));
        assert!(!signatures_match(&t, &[40.000001, 20.0, 30.0], 30.0));
        assert!(!signatures_match(&t, &[10.0, 20.0], 30.0));
    }

    #[test]
    fn category_round_trips_through_str() {
        assert_eq!("track".parse::<Category>().unwrap(), Category::Track);
        assert_eq!("EFFECT".parse::<Category>().unwrap(), Category::Effect);
        assert!("knob".parse::<Category>().is_err());
        assert_eq!(Category::Effect.to_string(), "EFFECT");
    }
}
