//! The standard stamp set: four track stamps and nine effect stamps laid
//! out on a square stud grid.
//!
//! `s` is the stud spacing.  Track stamps use four studs on the corners and
//! edge midpoints of a 2s × 2s square; effect stamps use five, several with
//! a stud nudged 0.3s or 0.33s off the grid.  The nudges do not make every
//! signature unique.  `DRUMS`/`BASS`, `LOWBOOST`/`CRUSH`, `HIBOOST`/`GATE`
//! and `DELAY`/`FLANGER` are mirror images with identical signatures and
//! are only told apart by chirality.  `REVERB` lies within the default
//! tolerance of `DELAY` and `FLANGER` and has `FLANGER`'s handedness, so at
//! that tolerance the earlier-registered `REVERB` claims `FLANGER` stamps
//! too; a tolerance under 21.5 units (at the default spacing) separates
//! all thirteen.

use crate::geometry::Point;
use crate::pattern::{Category, MatcherConfig, PatternError, PatternLibrary};

/// Stud spacing of the physical stamps, in surface units.
pub const DEFAULT_STUD_SPACING: f64 = 64.0;

/// `(name, category, layout in stud units)`.
type Preset = (&'static str, Category, &'static [(f64, f64)]);

const PRESETS: &[Preset] = &[
    // ── tracks ────────────────────────────────────────────────────────────
    ("DRUMS",       Category::Track, &[(1.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]),
    ("BASS",        Category::Track, &[(0.0, 0.0), (1.0, 0.0), (2.0, 2.0), (0.0, 2.0)]),
    ("INSTRUMENTS", Category::Track, &[(0.0, 0.0), (1.0, 0.0), (1.0, 2.0), (2.0, 2.0)]),
    ("VOCALS",      Category::Track, &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]),
    // ── effects ───────────────────────────────────────────────────────────
    ("LOWPASS",  Category::Effect, &[(0.0, 0.0), (2.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.0, 2.0)]),
    ("HIPASS",   Category::Effect, &[(0.0, 0.0), (1.0, -0.3), (2.0, 0.0), (0.0, 2.0), (2.0, 2.0)]),
    ("LOWBOOST", Category::Effect, &[(0.0, 0.0), (1.0, -0.3), (1.0, 1.0), (1.0, 2.3), (2.0, 2.0)]),
    ("HIBOOST",  Category::Effect, &[(0.0, 0.0), (1.0, -0.3), (2.0, 0.0), (2.0, 2.0), (1.0, 2.3)]),
    ("GATE",     Category::Effect, &[(0.0, 0.0), (1.0, -0.3), (2.0, 0.0), (1.0, 2.3), (0.0, 2.0)]),
    ("DELAY",    Category::Effect, &[(0.0, 0.0), (1.0, -0.33), (2.0, 0.0), (1.0, 1.0), (2.0, 2.0)]),
    ("REVERB",   Category::Effect, &[(1.0, -0.33), (2.0, 0.0), (1.0, 1.0), (0.0, 1.0), (1.0, 2.33)]),
    ("FLANGER",  Category::Effect, &[(0.0, 0.0), (1.0, -0.33), (2.0, 0.0), (1.0, 1.0), (0.0, 2.0)]),
    ("CRUSH",    Category::Effect, &[(1.0, -0.3), (2.0, 0.0), (1.0, 1.0), (1.0, 2.3), (0.0, 2.0)]),
];

/// Names of the standard stamps, in registration order.
pub fn standard_names() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|(name, _, _)| *name)
}

/// Layout of a standard stamp scaled to `spacing`, if `name` is one.
pub fn standard_layout(name: &str, spacing: f64) -> Option<Vec<Point>> {
    PRESETS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, _, pts)| scale(pts, spacing))
}

/// A library holding every standard stamp at the given stud spacing.
pub fn standard_library(
    spacing: f64,
    config: MatcherConfig,
) -> Result<PatternLibrary, PatternError> {
    let mut lib = PatternLibrary::with_config(config);
    for (name, category, pts) in PRESETS {
        lib.register(name, &scale(pts, spacing), *category)?;
    }
    Ok(lib)
}

fn scale(pts: &[(f64, f64)], spacing: f64) -> Vec<Point> {
    pts.iter().map(|&(x, y)| Point::new(x * spacing, y * spacing)).collect()
}
