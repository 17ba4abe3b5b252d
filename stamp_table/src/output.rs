//! Choosing and opening the parameter sink.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use stamp_emit::{JsonLinesSink, MidiOut, MidiSink, NullOut, NullSink, ParameterSink, SmfRecorder};
use tracing::{info, warn};

// ════════════════════════════════════════════════════════════════════════════
// OutputKind
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputKind {
    /// JSON bridge messages on stdout, one per line.
    #[default]
    Json,
    /// Control Change messages on the first MIDI output port.
    Midi,
    Silent,
}

impl OutputKind {
    pub fn name(self) -> &'static str {
        match self {
            OutputKind::Json   => "json",
            OutputKind::Midi   => "midi",
            OutputKind::Silent => "silent",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("unknown output '{0}' (expected json, midi or silent)")]
pub struct UnknownOutput(pub String);

impl FromStr for OutputKind {
    type Err = UnknownOutput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json"             => Ok(OutputKind::Json),
            "midi"             => Ok(OutputKind::Midi),
            "silent" | "none"  => Ok(OutputKind::Silent),
            _                  => Err(UnknownOutput(s.to_string())),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// midir backend
// ════════════════════════════════════════════════════════════════════════════

struct MidirOut {
    conn: Option<midir::MidiOutputConnection>,
}

impl MidiOut for MidirOut {
    fn send(&mut self, message: &[u8]) {
        if let Some(conn) = self.conn.as_mut() {
            let _ = conn.send(message);
        }
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            conn.close();
        }
    }
}

/// Try to open the first available MIDI output port, preferring a
/// softsynth.  Falls back to `NullOut` with a warning if none is found.
pub fn open_midi_output() -> Box<dyn MidiOut> {
    let midi_out = match midir::MidiOutput::new("stamp_table") {
        Ok(m)  => m,
        Err(e) => {
            warn!(error = %e, "MIDI init failed; using null output");
            return Box::new(NullOut);
        }
    };

    let ports = midi_out.ports();
    if ports.is_empty() {
        warn!("no MIDI output ports found; using null output");
        return Box::new(NullOut);
    }

    let port_idx = ports
        .iter()
        .position(|p| {
            midi_out
                .port_name(p)
                .map(|n| {
                    let n = n.to_lowercase();
                    n.contains("fluid") || n.contains("timidity") || n.contains("synth")
                })
                .unwrap_or(false)
        })
        .unwrap_or(0);

    let port = &ports[port_idx];
    let name = midi_out.port_name(port).unwrap_or_else(|_| "Unknown".to_string());

    match midi_out.connect(port, "stamp-table-out") {
        Ok(conn) => {
            info!(port = %name, "MIDI output open");
            Box::new(MidirOut { conn: Some(conn) })
        }
        Err(e) => {
            warn!(port = %name, error = %e, "MIDI connect failed; using null output");
            Box::new(NullOut)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// build_sink
// ════════════════════════════════════════════════════════════════════════════

/// Build the sink for `kind`.  With `record` set, every command is also
/// captured as MIDI and written to that file when the sink is dropped.
pub fn build_sink(
    kind: OutputKind,
    record: Option<PathBuf>,
    start: Instant,
) -> Box<dyn ParameterSink> {
    let recorder = record.map(|path| {
        info!(path = %path.display(), "recording MIDI");
        SmfRecorder::new(start).to_file(path)
    });

    match (kind, recorder) {
        (OutputKind::Json, None) => Box::new(JsonLinesSink::new(io::stdout())),
        (OutputKind::Json, Some(rec)) => {
            Box::new((JsonLinesSink::new(io::stdout()), MidiSink::new(rec)))
        }
        (OutputKind::Midi, None) => Box::new(MidiSink::new(open_midi_output())),
        (OutputKind::Midi, Some(rec)) => Box::new(MidiSink::new((open_midi_output(), rec))),
        (OutputKind::Silent, None) => Box::new(NullSink),
        (OutputKind::Silent, Some(rec)) => Box::new(MidiSink::new(rec)),
    }
}
