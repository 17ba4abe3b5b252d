//! Object tracker: owns the stamped objects and the capture session.
//!
//! Each frame the host hands [`ObjectTracker::update`] the matcher's output
//! together with the current instant.  In order, the tracker:
//!
//! 1. closes a capture window whose deadline has passed;
//! 2. moves every stamped object that is visible this frame towards its
//!    live sighting and marks the rest as not tracking;
//! 3. if a window is open, tries to add or remove using the first
//!    constellation of the frame.
//!
//! Nothing here blocks or sleeps.  Status messages go to an optional
//! callback; everything that happened is also returned in a [`FrameReport`].

use std::fmt;
use std::time::{Duration, Instant};

use constellation::{Category, RecognizedConstellation};
use tracing::{debug, info};

use crate::capture::{CaptureError, CaptureMode, CaptureSession, StatusKind};
use crate::object::{ObjectId, VirtualObject, NEUTRAL_PARAMETER};
use crate::topology;

// ════════════════════════════════════════════════════════════════════════════
// Configuration
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackerConfig {
    /// Fraction of the way towards a live sighting moved per frame.
    pub smoothing:     f64,
    /// An add is refused if a same-name object is closer than this.
    pub add_radius:    f64,
    /// A remove only takes a same-name object closer than this.
    pub remove_radius: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig { smoothing: 0.2, add_radius: 50.0, remove_radius: 80.0 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Events and reports
// ════════════════════════════════════════════════════════════════════════════

/// Structural changes downstream consumers must hear about exactly once.
#[derive(Clone, Debug, PartialEq)]
pub enum LifecycleEvent {
    /// `hub_index` is the new effect's position in the hub chain.
    EffectAdded   { uuid: ObjectId, name: String, hub_index: usize, initial_y: f64 },
    /// `hub_index` is where the effect sat before it was detached.
    EffectRemoved { uuid: ObjectId, name: String, hub_index: usize },
    TrackRemoved  { uuid: ObjectId, name: String },
}

/// What one call to [`ObjectTracker::update`] did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub events:    Vec<LifecycleEvent>,
    pub errors:    Vec<CaptureError>,
    pub added:     Option<ObjectId>,
    pub removed:   Option<ObjectId>,
    pub timed_out: bool,
}

/// Receives `(message, kind)` for every user-visible capture status.
pub type StatusCallback = Box<dyn FnMut(&str, StatusKind)>;

// ════════════════════════════════════════════════════════════════════════════
// ObjectTracker
// ════════════════════════════════════════════════════════════════════════════

pub struct ObjectTracker {
    config:     TrackerConfig,
    objects:    Vec<VirtualObject>,
    session:    CaptureSession,
    next_uuid:  u64,
    next_order: u64,
    status:     Option<StatusCallback>,
}

impl fmt::Debug for ObjectTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectTracker")
            .field("config", &self.config)
            .field("objects", &self.objects)
            .field("session", &self.session)
            .field("next_order", &self.next_order)
            .finish_non_exhaustive()
    }
}

impl Default for ObjectTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl ObjectTracker {
    pub fn new(config: TrackerConfig) -> Self {
        ObjectTracker {
            config,
            objects:    Vec::new(),
            session:    CaptureSession::default(),
            next_uuid:  1,
            next_order: 0,
            status:     None,
        }
    }

    /// Install the status callback, replacing any previous one.
    pub fn set_status_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&str, StatusKind) + 'static,
    {
        self.status = Some(Box::new(callback));
    }

    // ── capture control ───────────────────────────────────────────────────

    /// Open an add window of length `window`, cancelling any pending one.
    pub fn begin_add(&mut self, now: Instant, window: Duration) {
        self.session.begin(CaptureMode::AddPending, now, window);
        debug!(window_ms = window.as_millis() as u64, "add window opened");
        self.notify(
            &format!("Place a stamp to add it ({:.1}s)", window.as_secs_f64()),
            StatusKind::Scanning,
        );
    }

    /// Open a remove window of length `window`, cancelling any pending one.
    pub fn begin_remove(&mut self, now: Instant, window: Duration) {
        self.session.begin(CaptureMode::RemovePending, now, window);
        debug!(window_ms = window.as_millis() as u64, "remove window opened");
        self.notify(
            &format!("Place the stamp to remove ({:.1}s)", window.as_secs_f64()),
            StatusKind::Scanning,
        );
    }

    // ── per-frame update ──────────────────────────────────────────────────

    pub fn update(&mut self, now: Instant, live: &[RecognizedConstellation]) -> FrameReport {
        let mut report = FrameReport::default();

        if self.session.expired(now) {
            self.session.finish();
            report.timed_out = true;
            info!("capture window expired");
            self.notify("Capture window expired.", StatusKind::Idle);
        }

        self.follow_live(live);

        if let Some(first) = live.first() {
            match self.session.mode() {
                CaptureMode::AddPending    => self.try_add(first, &mut report),
                CaptureMode::RemovePending => self.try_remove(first, &mut report),
                CaptureMode::Idle          => {}
            }
        }

        report
    }

    fn follow_live(&mut self, live: &[RecognizedConstellation]) {
        let smoothing = self.config.smoothing;
        for obj in &mut self.objects {
            // Several copies of a stamp on the table: follow the nearest.
            let sighting = live
                .iter()
                .filter(|c| c.template_name == obj.name)
                .min_by(|a, b| obj.distance_to(a).total_cmp(&obj.distance_to(b)));
            match sighting {
                Some(c) => obj.follow(c, smoothing),
                None    => obj.is_tracking = false,
            }
        }
    }

    fn try_add(&mut self, candidate: &RecognizedConstellation, report: &mut FrameReport) {
        let clash = self
            .objects
            .iter()
            .filter(|o| o.name == candidate.template_name)
            .map(|o| o.distance_to(candidate))
            .find(|&d| d < self.config.add_radius);

        if let Some(distance) = clash {
            let err = CaptureError::DuplicateObject {
                name: candidate.template_name.clone(),
                distance,
            };
            self.refuse(err, report);
            return;
        }

        let uuid = ObjectId(self.next_uuid);
        self.next_uuid += 1;
        let obj = VirtualObject::stamp(uuid, self.next_order, candidate);
        self.next_order += 1;
        self.objects.push(obj);

        info!(
            %uuid,
            name = %candidate.template_name,
            x = candidate.center.x,
            y = candidate.center.y,
            "stamped"
        );
        if candidate.category == Category::Effect {
            let hub_index = topology::hub_index(&self.objects, uuid).unwrap_or_default();
            report.events.push(LifecycleEvent::EffectAdded {
                uuid,
                name: candidate.template_name.clone(),
                hub_index,
                initial_y: NEUTRAL_PARAMETER,
            });
        }
        report.added = Some(uuid);
        self.session.finish();
        self.notify(&format!("Stamped {}", candidate.template_name), StatusKind::Success);
    }

    fn try_remove(&mut self, candidate: &RecognizedConstellation, report: &mut FrameReport) {
        let nearest = self
            .objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.name == candidate.template_name)
            .map(|(i, o)| (i, o.distance_to(candidate)))
            .filter(|&(_, d)| d < self.config.remove_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let Some((index, _)) = nearest else {
            let err = CaptureError::NothingToRemove { name: candidate.template_name.clone() };
            self.refuse(err, report);
            return;
        };

        let hub_index = topology::hub_index(&self.objects, self.objects[index].uuid);
        let obj = self.objects.remove(index);
        info!(uuid = %obj.uuid, name = %obj.name, "removed");

        report.events.push(match (obj.category, hub_index) {
            (Category::Effect, Some(hub_index)) => LifecycleEvent::EffectRemoved {
                uuid: obj.uuid,
                name: obj.name.clone(),
                hub_index,
            },
            (Category::Effect, None) | (Category::Track, _) => LifecycleEvent::TrackRemoved {
                uuid: obj.uuid,
                name: obj.name.clone(),
            },
        });
        report.removed = Some(obj.uuid);
        self.session.finish();
        self.notify(&format!("Removed {}", obj.name), StatusKind::Success);
    }

    /// Record a refused capture; the callback only hears about it once per
    /// window so a stamp held in place does not flood the status line.
    fn refuse(&mut self, err: CaptureError, report: &mut FrameReport) {
        if self.session.first_report(&err) {
            debug!(%err, "capture refused");
            self.notify(&err.to_string(), StatusKind::Error);
        }
        report.errors.push(err);
    }

    fn notify(&mut self, message: &str, kind: StatusKind) {
        if let Some(cb) = self.status.as_mut() {
            cb(message, kind);
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn objects(&self) -> &[VirtualObject] { &self.objects }

    /// Mutable access for the topology and emission passes.  Objects can be
    /// edited but not added or removed through this.
    pub fn objects_mut(&mut self) -> &mut [VirtualObject] { &mut self.objects }

    pub fn object(&self, uuid: ObjectId) -> Option<&VirtualObject> {
        self.objects.iter().find(|o| o.uuid == uuid)
    }

    pub fn session(&self) -> &CaptureSession { &self.session }
    pub fn mode(&self) -> CaptureMode { self.session.mode() }
    pub fn config(&self) -> &TrackerConfig { &self.config }
    pub fn len(&self) -> usize { self.objects.len() }
    pub fn is_empty(&self) -> bool { self.objects.is_empty() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use constellation::{Point, TouchPoint};
    use std::cell::RefCell;
    use std::f64::consts::PI;
    use std::rc::Rc;

    const WINDOW: Duration = Duration::from_millis(5000);

    fn seen(
        name: &str,
        category: Category,
        x: f64,
        y: f64,
        rotation: f64,
    ) -> RecognizedConstellation {
        RecognizedConstellation {
            template_name: name.to_string(),
            category,
            members:       vec![
                TouchPoint::new(1, x, y),
                TouchPoint::new(2, x + 1.0, y),
                TouchPoint::new(3, x, y + 1.0),
            ],
            center:        Point::new(x, y),
            rotation,
        }
    }

    fn track(name: &str, x: f64, y: f64) -> RecognizedConstellation {
        seen(name, Category::Track, x, y, 0.0)
    }

    fn effect(name: &str, x: f64, y: f64) -> RecognizedConstellation {
        seen(name, Category::Effect, x, y, 0.0)
    }

    fn with_log() -> (ObjectTracker, Rc<RefCell<Vec<(String, StatusKind)>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let mut t = ObjectTracker::default();
        t.set_status_callback(move |msg, kind| sink.borrow_mut().push((msg.to_string(), kind)));
        (t, log)
    }

    fn stamp(t: &mut ObjectTracker, now: Instant, c: RecognizedConstellation) -> FrameReport {
        t.begin_add(now, WINDOW);
        t.update(now, &[c])
    }

    // ── add / remove lifecycle ────────────────────────────────────────────

    #[test]
    fn add_creates_one_neutral_object() {
        let (mut t, log) = with_log();
        let t0 = Instant::now();
        t.begin_add(t0, WINDOW);
        assert_eq!(t.mode(), CaptureMode::AddPending);

        let r = t.update(t0 + Duration::from_millis(100), &[track("BASS", 200.0, 200.0)]);
        assert_eq!(t.len(), 1);
        assert_eq!(r.added, Some(t.objects()[0].uuid));
        let o = &t.objects()[0];
        assert_eq!((o.parameter_x, o.parameter_y), (0.5, 0.5));
        assert_eq!(o.category, Category::Track);
        assert_eq!(t.mode(), CaptureMode::Idle);
        assert!(r.events.is_empty());

        let log = log.borrow();
        assert_eq!(log[0].1, StatusKind::Scanning);
        assert_eq!(log.last().unwrap().1, StatusKind::Success);
    }

    #[test]
    fn duplicate_within_radius_rejected() {
        let (mut t, log) = with_log();
        let t0 = Instant::now();
        stamp(&mut t, t0, track("BASS", 200.0, 200.0));

        t.begin_add(t0, WINDOW);
        let r = t.update(t0, &[track("BASS", 230.0, 200.0)]);
        assert_eq!(t.len(), 1);
        assert!(matches!(r.errors[..], [CaptureError::DuplicateObject { .. }]));
        assert_eq!(t.mode(), CaptureMode::AddPending);
        assert_eq!(log.borrow().last().unwrap().1, StatusKind::Error);
    }

    #[test]
    fn duplicate_reported_to_callback_once_per_window() {
        let (mut t, log) = with_log();
        let t0 = Instant::now();
        stamp(&mut t, t0, track("BASS", 200.0, 200.0));
        t.begin_add(t0, WINDOW);
        for i in 0..10 {
            let r = t.update(t0 + Duration::from_millis(i * 16), &[track("BASS", 210.0, 200.0)]);
            assert_eq!(r.errors.len(), 1);
        }
        let errors = log.borrow().iter().filter(|(_, k)| *k == StatusKind::Error).count();
        assert_eq!(errors, 1);
    }

    #[test]
    fn same_name_far_away_is_a_second_object() {
        let mut t = ObjectTracker::default();
        let t0 = Instant::now();
        stamp(&mut t, t0, track("BASS", 200.0, 200.0));
        stamp(&mut t, t0, track("BASS", 600.0, 200.0));
        assert_eq!(t.len(), 2);
        assert!(t.objects()[0].creation_order < t.objects()[1].creation_order);
        assert_ne!(t.objects()[0].uuid, t.objects()[1].uuid);
    }

    #[test]
    fn remove_within_radius_deletes() {
        let (mut t, log) = with_log();
        let t0 = Instant::now();
        stamp(&mut t, t0, track("DRUMS", 100.0, 100.0));

        t.begin_remove(t0, WINDOW);
        let r = t.update(t0, &[track("DRUMS", 160.0, 100.0)]);
        assert!(t.is_empty());
        assert_eq!(t.mode(), CaptureMode::Idle);
        assert!(matches!(
            &r.events[..],
            [LifecycleEvent::TrackRemoved { name, .. }] if name == "DRUMS"
        ));
        assert_eq!(log.borrow().last().unwrap().1, StatusKind::Success);
    }

    #[test]
    fn remove_outside_radius_stays_pending() {
        let mut t = ObjectTracker::default();
        let t0 = Instant::now();
        stamp(&mut t, t0, track("DRUMS", 100.0, 100.0));

        t.begin_remove(t0, WINDOW);
        let r = t.update(t0, &[track("DRUMS", 190.0, 100.0)]);
        assert_eq!(t.len(), 1);
        assert_eq!(t.mode(), CaptureMode::RemovePending);
        assert!(matches!(r.errors[..], [CaptureError::NothingToRemove { .. }]));
    }

    #[test]
    fn remove_takes_nearest_of_several() {
        let mut t = ObjectTracker::default();
        let t0 = Instant::now();
        stamp(&mut t, t0, track("DRUMS", 100.0, 100.0));
        stamp(&mut t, t0, track("DRUMS", 200.0, 100.0));
        let far = t.objects()[0].uuid;

        t.begin_remove(t0, WINDOW);
        t.update(t0, &[track("DRUMS", 170.0, 100.0)]);
        assert_eq!(t.len(), 1);
        assert_eq!(t.objects()[0].uuid, far);
    }

    #[test]
    fn effect_events_carry_hub_positions() {
        let mut t = ObjectTracker::default();
        let t0 = Instant::now();
        let r1 = stamp(&mut t, t0, effect("LOWPASS", 100.0, 100.0));
        stamp(&mut t, t0, track("BASS", 400.0, 400.0));
        let r2 = stamp(&mut t, t0, effect("DELAY", 700.0, 100.0));

        assert!(matches!(
            r1.events[..],
            [LifecycleEvent::EffectAdded { hub_index: 0, initial_y, .. }] if initial_y == 0.5
        ));
        assert!(matches!(r2.events[..], [LifecycleEvent::EffectAdded { hub_index: 1, .. }]));

        t.begin_remove(t0, WINDOW);
        let r3 = t.update(t0, &[effect("LOWPASS", 100.0, 100.0)]);
        assert!(matches!(r3.events[..], [LifecycleEvent::EffectRemoved { hub_index: 0, .. }]));
    }

    // ── timeout ───────────────────────────────────────────────────────────

    #[test]
    fn timeout_reverts_to_idle_once() {
        let (mut t, log) = with_log();
        let t0 = Instant::now();
        t.begin_add(t0, Duration::from_millis(500));

        assert!(!t.update(t0 + Duration::from_millis(499), &[]).timed_out);
        assert!(t.update(t0 + Duration::from_millis(500), &[]).timed_out);
        assert_eq!(t.mode(), CaptureMode::Idle);
        assert!(!t.update(t0 + Duration::from_millis(900), &[]).timed_out);

        let idles = log.borrow().iter().filter(|(_, k)| *k == StatusKind::Idle).count();
        assert_eq!(idles, 1);
    }

    #[test]
    fn expired_window_does_not_add() {
        let mut t = ObjectTracker::default();
        let t0 = Instant::now();
        t.begin_add(t0, Duration::from_millis(100));
        let r = t.update(t0 + Duration::from_millis(200), &[track("BASS", 0.0, 0.0)]);
        assert!(r.timed_out);
        assert!(t.is_empty());
    }

    #[test]
    fn new_window_cancels_old_deadline() {
        let mut t = ObjectTracker::default();
        let t0 = Instant::now();
        t.begin_add(t0, Duration::from_millis(100));
        t.begin_remove(t0 + Duration::from_millis(80), Duration::from_millis(100));
        assert!(!t.update(t0 + Duration::from_millis(120), &[]).timed_out);
        assert_eq!(t.mode(), CaptureMode::RemovePending);
    }

    #[test]
    fn idle_frames_never_stamp() {
        let mut t = ObjectTracker::default();
        t.update(Instant::now(), &[track("BASS", 0.0, 0.0)]);
        assert!(t.is_empty());
    }

    // ── live pose ─────────────────────────────────────────────────────────

    #[test]
    fn visible_objects_follow_and_hidden_ones_ghost() {
        let mut t = ObjectTracker::default();
        let t0 = Instant::now();
        stamp(&mut t, t0, track("BASS", 0.0, 0.0));
        stamp(&mut t, t0, track("VOCALS", 500.0, 500.0));

        t.update(t0, &[track("BASS", 100.0, 0.0)]);
        let bass = &t.objects()[0];
        let vocals = &t.objects()[1];
        assert!(bass.is_tracking);
        assert!((bass.x - 20.0).abs() < 1e-9);
        assert!(!vocals.is_tracking);
        assert_eq!((vocals.x, vocals.y), (500.0, 500.0));
    }

    #[test]
    fn turning_a_stamp_moves_parameter_x() {
        let mut t = ObjectTracker::default();
        let t0 = Instant::now();
        stamp(&mut t, t0, seen("BASS", Category::Track, 0.0, 0.0, 0.0));

        // Hold it a quarter turn clockwise long enough to settle.
        for _ in 0..200 {
            t.update(t0, &[seen("BASS", Category::Track, 0.0, 0.0, PI / 2.0)]);
        }
        assert!((t.objects()[0].parameter_x - 0.75).abs() < 1e-6);
        assert!((0.0..=1.0).contains(&t.objects()[0].parameter_y));
    }

    #[test]
    fn rotation_smoothing_crosses_pi_the_short_way() {
        let mut t = ObjectTracker::default();
        let t0 = Instant::now();
        stamp(&mut t, t0, seen("BASS", Category::Track, 0.0, 0.0, 3.0));
        t.update(t0, &[seen("BASS", Category::Track, 0.0, 0.0, -3.0)]);
        let r = t.objects()[0].rotation;
        assert!(r > 3.0, "rotation went the long way: {r}");
    }

    #[test]
    fn objects_bind_to_nearest_same_name_sighting() {
        let mut t = ObjectTracker::default();
        let t0 = Instant::now();
        stamp(&mut t, t0, track("BASS", 0.0, 0.0));
        stamp(&mut t, t0, track("BASS", 1000.0, 0.0));

        t.update(t0, &[track("BASS", 1010.0, 0.0), track("BASS", 10.0, 0.0)]);
        assert!((t.objects()[0].x - 2.0).abs() < 1e-9);
        assert!((t.objects()[1].x - 1002.0).abs() < 1e-9);
    }
}
