//! MIDI encoding of sink commands, plus a recorder that writes what was
//! sent to a standard MIDI file.
//!
//! Every command becomes one Control Change message:
//!
//! | Command | Controller | Value |
//! |---|---|---|
//! | `SetVolume` | 7 (channel volume) | level × 127 |
//! | `SetEffectParam` | 20 + 2·index + axis (x = 0, y = 1) | value × 127 |
//! | `AddEffect` | 102 | initial y × 127 |
//! | `RemoveEffect` | 103 | effect index |
//!
//! Effect indices above 49 share controllers 118/119 so the mapping never
//! runs into the channel-mode controllers (120–127).

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use constellation::clamp01;
use tracing::{info, warn};

use crate::command::{ParameterSink, SinkCommand};

pub const CC_VOLUME:        u8 = 7;
pub const CC_EFFECT_BASE:   u8 = 20;
pub const CC_ADD_EFFECT:    u8 = 102;
pub const CC_REMOVE_EFFECT: u8 = 103;

/// Highest effect index with a controller of its own.
pub const MAX_EFFECT_INDEX: usize = 49;

// ════════════════════════════════════════════════════════════════════════════
// Encoding
// ════════════════════════════════════════════════════════════════════════════

/// `[0..1]` → `0..=127`.
pub fn scale7(v: f64) -> u8 {
    (clamp01(v) * 127.0).round() as u8
}

/// The three-byte Control Change message for `cmd`.
pub fn encode_cc(cmd: &SinkCommand) -> [u8; 3] {
    let (channel, controller, value) = match cmd {
        SinkCommand::SetVolume { channel, value } =>
            (*channel, CC_VOLUME, scale7(*value)),
        SinkCommand::SetEffectParam { channel, effect_index, axis, value } => {
            let i = (*effect_index).min(MAX_EFFECT_INDEX) as u8;
            (*channel, CC_EFFECT_BASE + 2 * i + axis.index(), scale7(*value))
        }
        SinkCommand::AddEffect { channel, initial_y, .. } =>
            (*channel, CC_ADD_EFFECT, scale7(*initial_y)),
        SinkCommand::RemoveEffect { channel, effect_index } =>
            (*channel, CC_REMOVE_EFFECT, (*effect_index).min(127) as u8),
    };
    [0xB0 | (channel & 0x0F), controller, value]
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut: where encoded bytes go
// ════════════════════════════════════════════════════════════════════════════

/// A destination for raw MIDI messages.
pub trait MidiOut: Send {
    fn send(&mut self, message: &[u8]);

    /// Called once when the output is shut down.
    fn close(&mut self) {}
}

impl<O: MidiOut + ?Sized> MidiOut for Box<O> {
    fn send(&mut self, message: &[u8]) { (**self).send(message) }
    fn close(&mut self) { (**self).close() }
}

/// Send to both outputs.
impl<A: MidiOut, B: MidiOut> MidiOut for (A, B) {
    fn send(&mut self, message: &[u8]) {
        self.0.send(message);
        self.1.send(message);
    }
    fn close(&mut self) {
        self.0.close();
        self.1.close();
    }
}

/// Swallows everything (used when no MIDI port is available).
#[derive(Clone, Copy, Debug, Default)]
pub struct NullOut;

impl MidiOut for NullOut {
    fn send(&mut self, _message: &[u8]) {}
}

/// Parameter sink that speaks MIDI CC.  The output is closed when the sink
/// is dropped.
pub struct MidiSink<O: MidiOut> {
    out: O,
}

impl<O: MidiOut> MidiSink<O> {
    pub fn new(out: O) -> Self {
        MidiSink { out }
    }

    pub fn output(&self) -> &O { &self.out }
}

impl<O: MidiOut> ParameterSink for MidiSink<O> {
    fn send(&mut self, command: &SinkCommand) {
        self.out.send(&encode_cc(command));
    }
}

impl<O: MidiOut> Drop for MidiSink<O> {
    fn drop(&mut self) {
        self.out.close();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SmfRecorder: captured messages → Type-0 MIDI file
// ════════════════════════════════════════════════════════════════════════════

/// Timestamps every message it is given and can serialise the lot as a
/// single-track standard MIDI file.  With a path set, the file is written
/// when the output is closed.
#[derive(Clone, Debug)]
pub struct SmfRecorder {
    start:             Instant,
    events:            Vec<(Instant, Vec<u8>)>,
    ticks_per_quarter: u16,
    tempo_bpm:         u32,
    path:              Option<PathBuf>,
    written:           bool,
}

impl SmfRecorder {
    pub fn new(start: Instant) -> Self {
        SmfRecorder {
            start,
            events:            Vec::new(),
            ticks_per_quarter: 480,
            tempo_bpm:         120,
            path:              None,
            written:           false,
        }
    }

    /// Write to `path` on close.
    pub fn to_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn record_at(&mut self, at: Instant, message: &[u8]) {
        self.events.push((at, message.to_vec()));
    }

    pub fn len(&self) -> usize { self.events.len() }
    pub fn is_empty(&self) -> bool { self.events.is_empty() }

    fn ticks_since_start(&self, at: Instant) -> u32 {
        let secs = at.saturating_duration_since(self.start).as_secs_f64();
        let per_sec = self.ticks_per_quarter as f64 * self.tempo_bpm as f64 / 60.0;
        (secs * per_sec).round() as u32
    }

    /// Serialise to a complete MIDI Type-0 file.
    pub fn to_bytes(&self) -> Vec<u8> {
        let track = self.build_track_chunk();

        let mut out = Vec::new();
        // ── Header chunk ──────────────────────────────────────────────────
        out.extend_from_slice(b"MThd");
        out.extend_from_slice(&6u32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // format 0
        out.extend_from_slice(&1u16.to_be_bytes()); // 1 track
        out.extend_from_slice(&self.ticks_per_quarter.to_be_bytes());

        // ── Track chunk ───────────────────────────────────────────────────
        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&(track.len() as u32).to_be_bytes());
        out.extend_from_slice(&track);
        out
    }

    fn build_track_chunk(&self) -> Vec<u8> {
        let mut t: Vec<u8> = Vec::new();

        // ── Tempo meta-event (delta=0) ────────────────────────────────────
        let micros = 60_000_000u32 / self.tempo_bpm;
        t.extend_from_slice(&[0x00, 0xFF, 0x51, 0x03]);
        t.push(((micros >> 16) & 0xFF) as u8);
        t.push(((micros >>  8) & 0xFF) as u8);
        t.push(( micros        & 0xFF) as u8);

        // ── Control changes ───────────────────────────────────────────────
        let mut last = 0u32;
        for (at, msg) in &self.events {
            let tick = self.ticks_since_start(*at).max(last);
            write_vlq(&mut t, tick - last);
            t.extend_from_slice(msg);
            last = tick;
        }

        // ── End of Track meta-event ───────────────────────────────────────
        t.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        t
    }

    fn write_file(&mut self) {
        let Some(path) = self.path.as_ref() else { return };
        if self.written {
            return;
        }
        let result = std::fs::File::create(path).and_then(|mut f| f.write_all(&self.to_bytes()));
        match result {
            Ok(()) => {
                info!(path = %path.display(), events = self.events.len(), "MIDI recording written")
            }
            Err(e) => warn!(path = %path.display(), error = %e, "could not write MIDI recording"),
        }
        self.written = true;
    }
}

impl MidiOut for SmfRecorder {
    fn send(&mut self, message: &[u8]) {
        self.record_at(Instant::now(), message);
    }

    fn close(&mut self) {
        self.write_file();
    }
}

/// Largest value a four-byte VLQ can carry.
const MAX_VLQ: u32 = 0x0FFF_FFFF;

/// Write a MIDI variable-length quantity (VLQ).  Longer values are clamped
/// to [`MAX_VLQ`].
fn write_vlq(buf: &mut Vec<u8>, value: u32) {
    let mut value = value.min(MAX_VLQ);
    let mut bytes = [0u8; 4];
    let mut i = 3;
    bytes[i] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 {
        i -= 1;
        bytes[i] = ((value & 0x7F) | 0x80) as u8;
        value >>= 7;
    }
    buf.extend_from_slice(&bytes[i..]);
}
