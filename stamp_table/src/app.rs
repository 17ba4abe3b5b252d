//! Top-level application: input events in, frames out at a steady rate.
//!
//! `App` holds the engine plus the little bit of state input needs: the
//! touches currently down and whether a `wait` is holding further input
//! back.  [`run`] drives it from a [`TouchSource`] in real time.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use constellation::{
    standard_library, MatcherConfig, PatternError, TouchPoint, DEFAULT_STUD_SPACING,
};
use stamp_emit::{GateConfig, ParameterSink};
use stamp_tracker::{StatusKind, TopologyConfig, TrackerConfig};
use tracing::{debug, info, warn};

use crate::engine::{FrameSnapshot, StampEngine};
use crate::input::{spawn_touch_source, InputEvent, ScriptError, ScriptedTouchSource, TouchSource};
use crate::output::{build_sink, OutputKind};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub matcher:       MatcherConfig,
    pub tracker:       TrackerConfig,
    pub topology:      TopologyConfig,
    pub gate:          GateConfig,
    /// Frames per second of the pipeline loop.
    pub frame_rate_hz: u32,
    /// Default add/remove window length.
    pub capture_ms:    u64,
    pub output:        OutputKind,
    /// Stud spacing of the standard stamps, in surface units.
    pub stamp_size:    f64,
    /// Also write everything sent to this MIDI file.
    pub record_midi:   Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            matcher:       MatcherConfig::default(),
            tracker:       TrackerConfig::default(),
            topology:      TopologyConfig::default(),
            gate:          GateConfig::default(),
            frame_rate_hz: 60,
            capture_ms:    5000,
            output:        OutputKind::Json,
            stamp_size:    DEFAULT_STUD_SPACING,
            record_midi:   None,
        }
    }
}

impl AppConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate_hz.max(1) as f64)
    }

    pub fn capture_window(&self) -> Duration {
        Duration::from_millis(self.capture_ms)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("stamp library: {0}")]
    Pattern(#[from] PatternError),
    #[error("script: {0}")]
    Script(#[from] ScriptError),
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
}

/// Read and validate a touch script.
pub fn load_script(path: &Path) -> Result<ScriptedTouchSource, AppError> {
    let text = std::fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let source = ScriptedTouchSource::parse(&text)?;
    info!(path = %path.display(), events = source.events().len(), "script loaded");
    Ok(source)
}

// ════════════════════════════════════════════════════════════════════════════
// RunSummary
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames:   u64,
    pub added:    u64,
    pub removed:  u64,
    pub refused:  u64,
    pub commands: u64,
    /// Objects still on the table when the run ended.
    pub objects:  usize,
}

// ════════════════════════════════════════════════════════════════════════════
// App
// ════════════════════════════════════════════════════════════════════════════

pub struct App<S: ParameterSink> {
    engine:     StampEngine<S>,
    touches:    Vec<TouchPoint>,
    hold_until: Option<Instant>,
    capture:    Duration,
    quit:       bool,
    summary:    RunSummary,
}

impl<S: ParameterSink> App<S> {
    pub fn new(cfg: &AppConfig, sink: S) -> Result<Self, AppError> {
        let library = standard_library(cfg.stamp_size, cfg.matcher)?;
        let engine = StampEngine::new(library, sink)
            .with_tracker(cfg.tracker)
            .with_topology(cfg.topology)
            .with_gate(cfg.gate);
        Ok(App {
            engine,
            touches:    Vec::new(),
            hold_until: None,
            capture:    cfg.capture_window(),
            quit:       false,
            summary:    RunSummary::default(),
        })
    }

    // ── input ─────────────────────────────────────────────────────────────

    pub fn handle(&mut self, event: InputEvent, now: Instant) {
        match event {
            InputEvent::Frame(touches) => self.touches = touches,
            InputEvent::BeginAdd(ms) => {
                let window = ms.map_or(self.capture, Duration::from_millis);
                self.engine.begin_add(now, window);
            }
            InputEvent::BeginRemove(ms) => {
                let window = ms.map_or(self.capture, Duration::from_millis);
                self.engine.begin_remove(now, window);
            }
            InputEvent::Wait(ms) => self.hold_until = Some(now + Duration::from_millis(ms)),
            InputEvent::Quit => self.quit = true,
        }
    }

    /// False while a `wait` is still running.
    pub fn accepting_input(&self, now: Instant) -> bool {
        self.hold_until.map_or(true, |until| now >= until)
    }

    /// Take pending events until one needs a frame of its own: a new touch
    /// set, a wait, or quit.  Returns false once the source is gone.
    pub fn pump(&mut self, rx: &Receiver<InputEvent>, now: Instant) -> bool {
        while !self.quit && self.accepting_input(now) {
            match rx.try_recv() {
                Ok(event) => {
                    let needs_frame = matches!(
                        event,
                        InputEvent::Frame(_) | InputEvent::Wait(_) | InputEvent::Quit
                    );
                    self.handle(event, now);
                    if needs_frame {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.quit = true;
                    return false;
                }
            }
        }
        true
    }

    // ── frames ────────────────────────────────────────────────────────────

    pub fn tick(&mut self, now: Instant) -> FrameSnapshot<'_> {
        let snap = self.engine.frame(now, &self.touches);
        let s = &mut self.summary;
        s.frames += 1;
        s.added += snap.report.added.is_some() as u64;
        s.removed += snap.report.removed.is_some() as u64;
        s.refused += snap.report.errors.len() as u64;
        s.commands += snap.emitted as u64;
        s.objects = snap.objects.len();
        snap
    }

    pub fn is_quitting(&self) -> bool { self.quit }
    pub fn summary(&self) -> RunSummary { self.summary }
    pub fn engine(&self) -> &StampEngine<S> { &self.engine }
    pub fn touches(&self) -> &[TouchPoint] { &self.touches }

    pub fn set_status_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&str, StatusKind) + 'static,
    {
        self.engine.set_status_callback(callback);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run: the main loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the table until the source quits or closes.
pub fn run<T: TouchSource>(cfg: AppConfig, source: T) -> Result<RunSummary, AppError> {
    let start = Instant::now();
    let sink = build_sink(cfg.output, cfg.record_midi.clone(), start);
    let mut app = App::new(&cfg, sink)?;
    app.set_status_callback(|message, kind| match kind {
        StatusKind::Error => warn!(%kind, "{message}"),
        _                 => info!(%kind, "{message}"),
    });

    let rx = spawn_touch_source(source);
    let interval = cfg.frame_interval();
    info!(
        output = %cfg.output,
        frame_rate_hz = cfg.frame_rate_hz,
        stamps = app.engine().library().len(),
        "stamp table running"
    );

    loop {
        let frame_start = Instant::now();
        let open = app.pump(&rx, frame_start);
        app.tick(frame_start);
        if !open || app.is_quitting() {
            break;
        }
        if let Some(rest) = interval.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        }
    }

    let summary = app.summary();
    debug!(?summary, "stamp table stopped");
    Ok(summary)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
