//! # stamp_tracker
//!
//! Persistent objects for a stamp table.  A stamp recognised by
//! [`constellation`] only becomes an object when the host opens an add
//! window and the stamp is presented inside it; from then on the object
//! survives the stamp being lifted, and follows it whenever it is put back.
//!
//! ## Per-frame use
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use constellation::{Category, PatternLibrary, Point, TouchPoint};
//! use stamp_tracker::{topology, ObjectTracker, TopologyConfig};
//!
//! let mut lib = PatternLibrary::new();
//! lib.register(
//!     "WEDGE",
//!     &[Point::new(0.0, 0.0), Point::new(90.0, 0.0), Point::new(20.0, 140.0)],
//!     Category::Effect,
//! ).unwrap();
//!
//! let mut tracker = ObjectTracker::default();
//! let now = Instant::now();
//! tracker.begin_add(now, Duration::from_secs(5));
//!
//! let touches = [
//!     TouchPoint::new(1, 300.0, 300.0),
//!     TouchPoint::new(2, 390.0, 300.0),
//!     TouchPoint::new(3, 320.0, 440.0),
//! ];
//! let report = tracker.update(now, &lib.recognize(&touches));
//! assert!(report.added.is_some());
//!
//! let edges = topology::compute(tracker.objects(), &TopologyConfig::default());
//! assert!(edges.is_empty()); // a lone hub has nothing feeding it
//! ```

pub mod capture;
pub mod object;
pub mod topology;
pub mod tracker;

pub use capture::{CaptureError, CaptureMode, CaptureSession, StatusKind};
pub use object::{rotation_parameter, ObjectId, VirtualObject, NEUTRAL_PARAMETER};
pub use topology::{apply_hub_parameters, Connection, ConnectionKind, TopologyConfig};
pub use tracker::{FrameReport, LifecycleEvent, ObjectTracker, StatusCallback, TrackerConfig};
