//! # constellation
//!
//! Recognise physical stamps on a multi-touch surface from the layout of
//! their contact points.
//!
//! A stamp is a rigid object with three or more conductive studs.  Each one
//! is registered once as a [`PatternTemplate`]; every frame the current
//! touches are fed to [`PatternLibrary::recognize`], which returns one
//! [`RecognizedConstellation`] per stamp found, with its centre and
//! rotation.  Matching is invariant to translation and rotation but rejects
//! mirror images.
//!
//! ## Quick start
//!
//! ```rust
//! use constellation::{Category, PatternLibrary, Point, TouchPoint};
//!
//! let mut lib = PatternLibrary::new();
//! lib.register(
//!     "WEDGE",
//!     &[Point::new(0.0, 0.0), Point::new(90.0, 0.0), Point::new(20.0, 140.0)],
//!     Category::Effect,
//! ).unwrap();
//!
//! let touches = [
//!     TouchPoint::new(7, 500.0, 300.0),
//!     TouchPoint::new(8, 590.0, 300.0),
//!     TouchPoint::new(9, 520.0, 440.0),
//! ];
//! let found = lib.recognize(&touches);
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].template_name, "WEDGE");
//! ```

pub mod combinations;
pub mod geometry;
pub mod matcher;
pub mod pattern;
pub mod presets;

pub use combinations::Combinations;
pub use geometry::{
    centroid, clamp01, distance, distance_sq, lerp, lerp_angle, normalize_angle, signed_area,
    Planar, Point,
};
pub use matcher::{RecognizedConstellation, TouchPoint};
pub use pattern::{
    canonical_order, signature, signatures_match, Category, Chirality, MatcherConfig,
    PatternError, PatternLibrary, PatternTemplate, MIN_POINTS, SHAPE_EPSILON,
};
pub use presets::{standard_layout, standard_library, standard_names, DEFAULT_STUD_SPACING};
