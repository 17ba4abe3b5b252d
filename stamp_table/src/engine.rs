//! The per-frame pipeline: recognise → track → connect → emit.
//!
//! `StampEngine` owns one of everything and runs the whole pipeline on each
//! touch frame, in that order, synchronously.  It knows nothing about where
//! touches come from or how often frames arrive; see [`crate::app`].

use std::time::{Duration, Instant};

use constellation::{PatternLibrary, RecognizedConstellation, TouchPoint};
use stamp_emit::{EmissionGate, GateConfig, ParameterSink};
use stamp_tracker::{
    apply_hub_parameters, topology, CaptureMode, Connection, FrameReport, ObjectTracker,
    StatusKind, TopologyConfig, TrackerConfig, VirtualObject,
};
use tracing::debug;

// ════════════════════════════════════════════════════════════════════════════
// FrameSnapshot
// ════════════════════════════════════════════════════════════════════════════

/// Everything one frame produced, borrowed from the engine until the next.
#[derive(Debug)]
pub struct FrameSnapshot<'a> {
    pub objects:        &'a [VirtualObject],
    pub constellations: &'a [RecognizedConstellation],
    pub connections:    &'a [Connection],
    pub report:         FrameReport,
    /// Commands handed to the sink this frame.
    pub emitted:        usize,
}

// ════════════════════════════════════════════════════════════════════════════
// StampEngine
// ════════════════════════════════════════════════════════════════════════════

pub struct StampEngine<S: ParameterSink> {
    library:        PatternLibrary,
    tracker:        ObjectTracker,
    topology:       TopologyConfig,
    gate:           EmissionGate,
    sink:           S,
    constellations: Vec<RecognizedConstellation>,
    connections:    Vec<Connection>,
    frames:         u64,
}

impl<S: ParameterSink> StampEngine<S> {
    pub fn new(library: PatternLibrary, sink: S) -> Self {
        StampEngine {
            library,
            tracker:        ObjectTracker::default(),
            topology:       TopologyConfig::default(),
            gate:           EmissionGate::default(),
            sink,
            constellations: Vec::new(),
            connections:    Vec::new(),
            frames:         0,
        }
    }

    pub fn with_tracker(mut self, config: TrackerConfig) -> Self {
        self.tracker = ObjectTracker::new(config);
        self
    }

    pub fn with_topology(mut self, config: TopologyConfig) -> Self {
        self.topology = config;
        self
    }

    pub fn with_gate(mut self, config: GateConfig) -> Self {
        self.gate = EmissionGate::new(config);
        self
    }

    pub fn set_status_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&str, StatusKind) + 'static,
    {
        self.tracker.set_status_callback(callback);
    }

    pub fn begin_add(&mut self, now: Instant, window: Duration) {
        self.tracker.begin_add(now, window);
    }

    pub fn begin_remove(&mut self, now: Instant, window: Duration) {
        self.tracker.begin_remove(now, window);
    }

    /// Run one frame of the pipeline over the touches currently down.
    pub fn frame(&mut self, now: Instant, touches: &[TouchPoint]) -> FrameSnapshot<'_> {
        self.frames += 1;
        self.constellations = self.library.recognize(touches);

        let report = self.tracker.update(now, &self.constellations);

        self.connections = topology::compute(self.tracker.objects(), &self.topology);
        apply_hub_parameters(self.tracker.objects_mut(), &self.connections);

        let emitted = self.gate.emit(&report.events, self.tracker.objects_mut(), &mut self.sink);
        if emitted > 0 {
            debug!(frame = self.frames, emitted, "frame emitted commands");
        }

        FrameSnapshot {
            objects:        self.tracker.objects(),
            constellations: &self.constellations,
            connections:    &self.connections,
            report,
            emitted,
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn objects(&self) -> &[VirtualObject] { self.tracker.objects() }
    pub fn connections(&self) -> &[Connection] { &self.connections }
    pub fn constellations(&self) -> &[RecognizedConstellation] { &self.constellations }
    pub fn library(&self) -> &PatternLibrary { &self.library }
    pub fn mode(&self) -> CaptureMode { self.tracker.mode() }
    pub fn frames(&self) -> u64 { self.frames }
    pub fn sink(&self) -> &S { &self.sink }
    pub fn sink_mut(&mut self) -> &mut S { &mut self.sink }

    /// Give up the sink, e.g. so a recorder can finish its file.
    pub fn into_sink(self) -> S { self.sink }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
