//! Constellation matcher: turns one frame of raw touches into the set of
//! stamps currently lying on the surface.
//!
//! # Algorithm
//!
//! * Templates are tried largest first (ties keep registration order), so a
//!   five-point stamp claims its contacts before any three- or four-point
//!   subset of it can be mistaken for a smaller stamp.
//! * Every size-k combination of touches is a candidate.  A candidate is
//!   skipped outright if any of its touches is already consumed.
//! * Its sorted distance signature must lie within the tolerance of the
//!   template's, element by element.
//! * Its canonical-order chirality must equal the template's exactly; a
//!   reflected layout has an identical signature and is rejected here.
//! * On a match its touches are consumed and a [`RecognizedConstellation`]
//!   is emitted, anchored on the first contact of its canonical order (the
//!   nearest one that is not sitting on the centroid).
//!
//! A finger cannot belong to two stamps at once, hence the consumption set.

use std::collections::HashSet;

use tracing::trace;

use crate::combinations::Combinations;
use crate::geometry::{centroid, signed_area, Planar, Point};
use crate::pattern::{
    canonical_order, signature, signatures_match, Category, Chirality, PatternLibrary,
    PatternTemplate, MIN_POINTS,
};

// ════════════════════════════════════════════════════════════════════════════
// TouchPoint
// ════════════════════════════════════════════════════════════════════════════

/// One contact in a frame snapshot.  `id` is stable for the lifetime of the
/// physical contact but carries no meaning across frames here.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub x:  f64,
    pub y:  f64,
}

impl TouchPoint {
    pub const fn new(id: u64, x: f64, y: f64) -> Self {
        TouchPoint { id, x, y }
    }
}

impl Planar for TouchPoint {
    fn x(&self) -> f64 { self.x }
    fn y(&self) -> f64 { self.y }
}

// ════════════════════════════════════════════════════════════════════════════
// RecognizedConstellation
// ════════════════════════════════════════════════════════════════════════════

/// A template match in the current frame.  Never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognizedConstellation {
    pub template_name: String,
    pub category:      Category,
    /// The matched touches, in enumeration order.
    pub members:       Vec<TouchPoint>,
    pub center:        Point,
    /// Angle (radians, `(-π, π]`) from `center` to the anchor contact.
    pub rotation:      f64,
}

// ════════════════════════════════════════════════════════════════════════════
// Recognition
// ════════════════════════════════════════════════════════════════════════════

impl PatternLibrary {
    /// Match one frame of touches against every registered template.
    ///
    /// Fewer than three touches can never form a stamp and yield an empty
    /// result immediately.
    pub fn recognize(&self, touches: &[TouchPoint]) -> Vec<RecognizedConstellation> {
        let mut found = Vec::new();
        if touches.len() < MIN_POINTS {
            return found;
        }

        let mut order: Vec<&PatternTemplate> = self.templates.iter().collect();
        order.sort_by(|a, b| b.point_count.cmp(&a.point_count));

        let mut consumed: HashSet<u64> = HashSet::new();

        for template in order {
            let free = touches.iter().filter(|t| !consumed.contains(&t.id)).count();
            if free < template.point_count {
                continue;
            }

            for combo in Combinations::new(touches.len(), template.point_count) {
                if combo.iter().any(|&i| consumed.contains(&touches[i].id)) {
                    continue;
                }
                let members: Vec<TouchPoint> = combo.iter().map(|&i| touches[i]).collect();
                let Some(hit) = self.try_match(template, members) else {
                    continue;
                };
                consumed.extend(hit.members.iter().map(|m| m.id));
                trace!(
                    pattern = %hit.template_name,
                    x = hit.center.x,
                    y = hit.center.y,
                    "constellation"
                );
                found.push(hit);

                // Every remaining combination would overlap a consumed touch.
                let free = touches.iter().filter(|t| !consumed.contains(&t.id)).count();
                if free < template.point_count {
                    break;
                }
            }
        }

        found
    }

    fn try_match(
        &self,
        template: &PatternTemplate,
        members: Vec<TouchPoint>,
    ) -> Option<RecognizedConstellation> {
        let sig = signature(&members);
        if !signatures_match(&template.signature, &sig, self.config.tolerance) {
            return None;
        }

        let canonical = canonical_order(&members);
        if Chirality::from_area(signed_area(&canonical)) != template.chirality {
            return None;
        }

        let center = centroid(&members);
        let anchor = canonical[0];
        let rotation = (anchor.y - center.y).atan2(anchor.x - center.x);

        Some(RecognizedConstellation {
            template_name: template.name.clone(),
            category:      template.category,
            members,
            center,
            rotation,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
