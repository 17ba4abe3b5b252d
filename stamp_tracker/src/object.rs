//! Stamped objects: what remains on the table after a stamp is lifted.

use std::f64::consts::PI;
use std::fmt;

use constellation::{
    clamp01, distance, lerp, lerp_angle, normalize_angle, Category, Planar, Point,
    RecognizedConstellation,
};

/// Process-unique identity of a stamped object.  Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Control value every fresh object starts at, on both axes.
pub const NEUTRAL_PARAMETER: f64 = 0.5;

/// A persisted stamp.
///
/// Created only by a successful add capture and destroyed only by a
/// successful remove capture.  While the physical stamp is on the surface
/// its pose follows it; once lifted the object stays where it was last seen.
#[derive(Clone, Debug, PartialEq)]
pub struct VirtualObject {
    pub uuid:             ObjectId,
    /// Name of the template this object was stamped from.
    pub name:             String,
    pub category:         Category,
    pub x:                f64,
    pub y:                f64,
    pub rotation:         f64,
    /// Rotation at the moment of stamping; `parameter_x` is relative to it.
    pub initial_rotation: f64,
    pub parameter_x:      f64,
    pub parameter_y:      f64,
    pub is_tracking:      bool,
    pub last_sent_x:      f64,
    pub last_sent_y:      f64,
    /// Monotonic; the only ordering key the topology uses.
    pub creation_order:   u64,
}

impl VirtualObject {
    pub(crate) fn stamp(
        uuid: ObjectId,
        creation_order: u64,
        from: &RecognizedConstellation,
    ) -> Self {
        VirtualObject {
            uuid,
            name:             from.template_name.clone(),
            category:         from.category,
            x:                from.center.x,
            y:                from.center.y,
            rotation:         from.rotation,
            initial_rotation: from.rotation,
            parameter_x:      NEUTRAL_PARAMETER,
            parameter_y:      NEUTRAL_PARAMETER,
            is_tracking:      true,
            last_sent_x:      NEUTRAL_PARAMETER,
            last_sent_y:      NEUTRAL_PARAMETER,
            creation_order,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Effects are hubs in the signal chain; tracks are sources.
    pub fn is_hub(&self) -> bool {
        match self.category {
            Category::Effect => true,
            Category::Track  => false,
        }
    }

    /// Ease towards a live sighting of the same stamp and refresh
    /// `parameter_x` from the rotation accumulated since stamping.
    pub(crate) fn follow(&mut self, live: &RecognizedConstellation, smoothing: f64) {
        self.x = lerp(self.x, live.center.x, smoothing);
        self.y = lerp(self.y, live.center.y, smoothing);
        self.rotation = lerp_angle(self.rotation, live.rotation, smoothing);
        self.parameter_x = rotation_parameter(self.rotation, self.initial_rotation);
        self.is_tracking = true;
    }

    pub(crate) fn distance_to(&self, live: &RecognizedConstellation) -> f64 {
        distance(self, &live.center)
    }
}

impl Planar for VirtualObject {
    fn x(&self) -> f64 { self.x }
    fn y(&self) -> f64 { self.y }
}

/// Map rotation relative to `initial` onto `[0, 1]`; no turn is 0.5.
pub fn rotation_parameter(rotation: f64, initial: f64) -> f64 {
    clamp01((normalize_angle(rotation - initial) + PI) / (2.0 * PI))
}

#[cfg(test)]
mod tests {
    use super::*;
    use constellation::TouchPoint;

    fn sighting(name: &str, x: f64, y: f64, rotation: f64) -> RecognizedConstellation {
        RecognizedConstellation {
            template_name: name.to_string(),
            category:      Category::Track,
            members:       vec![TouchPoint::new(1, x, y)],
            center:        Point::new(x, y),
            rotation,
        }
    }

    #[test]
    fn fresh_object_is_neutral() {
        let o = VirtualObject::stamp(ObjectId(7), 3, &sighting("BASS", 10.0, 20.0, 1.0));
        assert_eq!(o.parameter_x, 0.5);
        assert_eq!(o.parameter_y, 0.5);
        assert_eq!(o.initial_rotation, 1.0);
        assert_eq!(o.creation_order, 3);
        assert!(o.is_tracking);
        assert!(!o.is_hub());
    }

    #[test]
    fn follow_eases_towards_sighting() {
        let mut o = VirtualObject::stamp(ObjectId(1), 0, &sighting("BASS", 0.0, 0.0, 0.0));
        o.follow(&sighting("BASS", 100.0, 50.0, 0.0), 0.2);
        assert!((o.x - 20.0).abs() < 1e-9);
        assert!((o.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn rotation_parameter_range() {
        assert!((rotation_parameter(0.3, 0.3) - 0.5).abs() < 1e-12);
        assert!((rotation_parameter(PI, 0.0) - 1.0).abs() < 1e-12);
        assert!((rotation_parameter(-PI / 2.0, 0.0) - 0.25).abs() < 1e-12);
        // 3.0 → -3.0 crosses ±π: a small positive turn, not a large negative one.
        let expected = (2.0 * PI - 6.0 + PI) / (2.0 * PI);
        assert!((rotation_parameter(-3.0, 3.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn id_display() {
        assert_eq!(ObjectId(42).to_string(), "#42");
    }
}
