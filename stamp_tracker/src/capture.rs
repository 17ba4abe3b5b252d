//! The timed add/remove capture window.
//!
//! The host owns the clock: it passes `now` into every call and the session
//! only compares it against a recorded deadline.  Starting a new window
//! replaces the old deadline, which is all cancellation amounts to here.

use std::fmt;
use std::mem::{discriminant, Discriminant};
use std::time::{Duration, Instant};

/// Reported, never fatal.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum CaptureError {
    #[error("a {name} is already stamped here ({distance:.0} units away)")]
    DuplicateObject { name: String, distance: f64 },
    #[error("no stamped {name} close enough to remove")]
    NothingToRemove { name: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureMode {
    Idle,
    AddPending,
    RemovePending,
}

/// Kind tag passed to the status callback alongside the message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Scanning,
    Success,
    Error,
    Idle,
}

impl StatusKind {
    pub fn name(self) -> &'static str {
        match self {
            StatusKind::Scanning => "scanning",
            StatusKind::Success  => "success",
            StatusKind::Error    => "error",
            StatusKind::Idle     => "idle",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Exactly one capture window, or none.
#[derive(Clone, Debug)]
pub struct CaptureSession {
    mode:     CaptureMode,
    deadline: Option<Instant>,
    reported: Option<Discriminant<CaptureError>>,
}

impl Default for CaptureSession {
    fn default() -> Self {
        CaptureSession { mode: CaptureMode::Idle, deadline: None, reported: None }
    }
}

impl CaptureSession {
    /// Open a window, discarding any pending one.
    pub fn begin(&mut self, mode: CaptureMode, now: Instant, window: Duration) {
        self.mode = mode;
        self.deadline = match mode {
            CaptureMode::Idle => None,
            _                 => Some(now + window),
        };
        self.reported = None;
    }

    /// Back to idle; the deadline is dropped with it.
    pub fn finish(&mut self) {
        *self = CaptureSession::default();
    }

    pub fn mode(&self) -> CaptureMode { self.mode }
    pub fn deadline(&self) -> Option<Instant> { self.deadline }

    pub fn is_pending(&self) -> bool {
        self.mode != CaptureMode::Idle
    }

    pub fn expired(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(d) if self.is_pending() && now >= d)
    }

    /// Whether `err` is the first of its kind in this window.
    pub(crate) fn first_report(&mut self, err: &CaptureError) -> bool {
        let kind = discriminant(err);
        if self.reported == Some(kind) {
            return false;
        }
        self.reported = Some(kind);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begins_idle() {
        let s = CaptureSession::default();
        assert_eq!(s.mode(), CaptureMode::Idle);
        assert!(!s.is_pending());
        assert!(!s.expired(Instant::now()));
    }

    #[test]
    fn deadline_is_inclusive() {
        let t0 = Instant::now();
        let mut s = CaptureSession::default();
        s.begin(CaptureMode::AddPending, t0, Duration::from_millis(100));
        assert!(!s.expired(t0 + Duration::from_millis(99)));
        assert!(s.expired(t0 + Duration::from_millis(100)));
    }

    #[test]
    fn new_window_replaces_old() {
        let t0 = Instant::now();
        let mut s = CaptureSession::default();
        s.begin(CaptureMode::AddPending, t0, Duration::from_millis(100));
        let later = t0 + Duration::from_millis(90);
        s.begin(CaptureMode::RemovePending, later, Duration::from_millis(100));
        assert_eq!(s.mode(), CaptureMode::RemovePending);
        assert!(!s.expired(t0 + Duration::from_millis(150)));
    }

    #[test]
    fn errors_reported_once_per_window() {
        let t0 = Instant::now();
        let mut s = CaptureSession::default();
        s.begin(CaptureMode::AddPending, t0, Duration::from_secs(1));
        let dup = CaptureError::DuplicateObject { name: "BASS".into(), distance: 3.0 };
        assert!(s.first_report(&dup));
        assert!(!s.first_report(&dup));
        s.begin(CaptureMode::AddPending, t0, Duration::from_secs(1));
        assert!(s.first_report(&dup));
    }

    #[test]
    fn finish_clears_everything() {
        let mut s = CaptureSession::default();
        s.begin(CaptureMode::RemovePending, Instant::now(), Duration::from_secs(5));
        s.finish();
        assert_eq!(s.mode(), CaptureMode::Idle);
        assert_eq!(s.deadline(), None);
    }
}
