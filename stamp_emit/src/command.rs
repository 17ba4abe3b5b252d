//! The command vocabulary of a parameter sink, and how stamp names are
//! addressed in it.

use std::fmt;

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Axis / SinkCommand
// ════════════════════════════════════════════════════════════════════════════

/// Which control axis of an effect a value is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn index(self) -> u8 {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
        })
    }
}

/// Everything a sink can be asked to do.
#[derive(Clone, Debug, PartialEq)]
pub enum SinkCommand {
    SetVolume      { channel: u8, value: f64 },
    SetEffectParam { channel: u8, effect_index: usize, axis: Axis, value: f64 },
    AddEffect      { channel: u8, effect_type: String, initial_y: f64 },
    RemoveEffect   { channel: u8, effect_index: usize },
}

impl fmt::Display for SinkCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkCommand::SetVolume { channel, value } =>
                write!(f, "volume ch{channel} = {value:.3}"),
            SinkCommand::SetEffectParam { channel, effect_index, axis, value } =>
                write!(f, "effect ch{channel}[{effect_index}].{axis} = {value:.3}"),
            SinkCommand::AddEffect { channel, effect_type, initial_y } =>
                write!(f, "add {effect_type} on ch{channel} (y = {initial_y:.3})"),
            SinkCommand::RemoveEffect { channel, effect_index } =>
                write!(f, "remove effect ch{channel}[{effect_index}]"),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Addressing
// ════════════════════════════════════════════════════════════════════════════

/// Fixed track-name → channel table.  Anything else is channel 0.
pub fn channel_for(name: &str) -> u8 {
    match name {
        "BASS"        => 0,
        "DRUMS"       => 1,
        "INSTRUMENTS" => 2,
        "VOCALS"      => 3,
        _             => 0,
    }
}

/// Effect type the audio engine knows an effect stamp by.
pub fn effect_type_for(name: &str) -> String {
    let known = match name {
        "LOWPASS"  => "lowcut",
        "HIPASS"   => "hicut",
        "LOWBOOST" => "lowboost",
        "HIBOOST"  => "hiboost",
        "DELAY"    => "delay",
        "REVERB"   => "reverb",
        "GATE"     => "gate",
        "FLANGER"  => "flanger",
        "CRUSH"    => "crush",
        other      => return other.to_ascii_lowercase(),
    };
    known.to_string()
}

// ════════════════════════════════════════════════════════════════════════════
// ParameterSink
// ════════════════════════════════════════════════════════════════════════════

/// Receiver of emitted commands.  Called synchronously, once per command,
/// from inside the frame that produced it.
pub trait ParameterSink {
    fn send(&mut self, command: &SinkCommand);

    /// Push out anything buffered.  Called once per frame.
    fn flush(&mut self) {}
}

impl<S: ParameterSink + ?Sized> ParameterSink for Box<S> {
    fn send(&mut self, command: &SinkCommand) { (**self).send(command) }
    fn flush(&mut self) { (**self).flush() }
}

/// Send to both sinks.
impl<A: ParameterSink, B: ParameterSink> ParameterSink for (A, B) {
    fn send(&mut self, command: &SinkCommand) {
        self.0.send(command);
        self.1.send(command);
    }
    fn flush(&mut self) {
        self.0.flush();
        self.1.flush();
    }
}

/// Keeps every command in memory.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub commands: Vec<SinkCommand>,
}

impl RecordingSink {
    pub fn new() -> Self { Self::default() }

    /// Take everything recorded so far.
    pub fn drain(&mut self) -> Vec<SinkCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl ParameterSink for RecordingSink {
    fn send(&mut self, command: &SinkCommand) {
        self.commands.push(command.clone());
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl ParameterSink for NullSink {
    fn send(&mut self, _command: &SinkCommand) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_channels() {
        assert_eq!(channel_for("BASS"), 0);
        assert_eq!(channel_for("DRUMS"), 1);
        assert_eq!(channel_for("INSTRUMENTS"), 2);
        assert_eq!(channel_for("VOCALS"), 3);
        assert_eq!(channel_for("KAZOO"), 0);
        assert_eq!(channel_for("drums"), 0);
    }

    #[test]
    fn effect_types() {
        assert_eq!(effect_type_for("LOWPASS"), "lowcut");
        assert_eq!(effect_type_for("HIPASS"), "hicut");
        assert_eq!(effect_type_for("REVERB"), "reverb");
        assert_eq!(effect_type_for("WOBBLE"), "wobble");
    }

    #[test]
    fn recording_sink_drains() {
        let mut s = RecordingSink::new();
        s.send(&SinkCommand::SetVolume { channel: 2, value: 0.4 });
        s.send(&SinkCommand::RemoveEffect { channel: 0, effect_index: 1 });
        assert_eq!(s.drain().len(), 2);
        assert!(s.commands.is_empty());
    }

    #[test]
    fn pair_sink_sends_to_both() {
        let mut pair = (RecordingSink::new(), RecordingSink::new());
        pair.send(&SinkCommand::SetVolume { channel: 1, value: 0.5 });
        assert_eq!(pair.0.commands, pair.1.commands);
        assert_eq!(pair.1.commands.len(), 1);
    }

    #[test]
    fn display_is_readable() {
        let c =
            SinkCommand::SetEffectParam { channel: 0, effect_index: 2, axis: Axis::Y, value: 0.25 };
        assert_eq!(c.to_string(), "effect ch0[2].y = 0.250");
    }
}
