//! JSON bridge encoding: the message format the audio bridge accepts, one
//! object per command.

use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::command::{Axis, ParameterSink, SinkCommand};

/// Wire shape of a command.  Field names follow the bridge, not Rust.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BridgeMessage {
    SetVolume      { channel: u8, volume: f64 },
    SetEffectParam { channel: u8, effect_id: usize, param: Axis, value: f64 },
    AddEffect      { channel: u8, effect_type: String, y_value: f64 },
    RemoveEffect   { channel: u8, effect_id: usize },
}

impl From<&SinkCommand> for BridgeMessage {
    fn from(cmd: &SinkCommand) -> Self {
        match cmd.clone() {
            SinkCommand::SetVolume { channel, value } =>
                BridgeMessage::SetVolume { channel, volume: value },
            SinkCommand::SetEffectParam { channel, effect_index, axis, value } =>
                BridgeMessage::SetEffectParam { channel, effect_id: effect_index, param: axis, value },
            SinkCommand::AddEffect { channel, effect_type, initial_y } =>
                BridgeMessage::AddEffect { channel, effect_type, y_value: initial_y },
            SinkCommand::RemoveEffect { channel, effect_index } =>
                BridgeMessage::RemoveEffect { channel, effect_id: effect_index },
        }
    }
}

impl From<BridgeMessage> for SinkCommand {
    fn from(msg: BridgeMessage) -> Self {
        match msg {
            BridgeMessage::SetVolume { channel, volume } =>
                SinkCommand::SetVolume { channel, value: volume },
            BridgeMessage::SetEffectParam { channel, effect_id, param, value } =>
                SinkCommand::SetEffectParam { channel, effect_index: effect_id, axis: param, value },
            BridgeMessage::AddEffect { channel, effect_type, y_value } =>
                SinkCommand::AddEffect { channel, effect_type, initial_y: y_value },
            BridgeMessage::RemoveEffect { channel, effect_id } =>
                SinkCommand::RemoveEffect { channel, effect_index: effect_id },
        }
    }
}

/// One bridge message as a single line of JSON (no trailing newline).
pub fn encode(cmd: &SinkCommand) -> serde_json::Result<String> {
    serde_json::to_string(&BridgeMessage::from(cmd))
}

/// Parse a bridge message back into a command.
pub fn decode(line: &str) -> serde_json::Result<SinkCommand> {
    serde_json::from_str::<BridgeMessage>(line).map(SinkCommand::from)
}

/// Writes each command as one JSON line.
///
/// A write failure is logged once and the sink goes quiet; the frame loop
/// keeps running.
pub struct JsonLinesSink<W: Write> {
    out:    W,
    failed: bool,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        JsonLinesSink { out, failed: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, cmd: &SinkCommand) -> std::io::Result<()> {
        let line = encode(cmd)?;
        writeln!(self.out, "{line}")
    }
}

impl<W: Write> ParameterSink for JsonLinesSink<W> {
    fn send(&mut self, command: &SinkCommand) {
        if self.failed {
            return;
        }
        if let Err(e) = self.write(command) {
            warn!(error = %e, "JSON output failed; further commands dropped");
            self.failed = true;
        }
    }

    fn flush(&mut self) {
        if !self.failed && self.out.flush().is_err() {
            self.failed = true;
        }
    }
}
