//! # stamp_emit
//!
//! Turns what the stamp table is doing into commands for an external
//! parameter sink (an audio engine, a MIDI port, a JSON bridge).
//!
//! * **Tracks** → `SetVolume` on the track's fixed channel, driven by how
//!   far the stamp has been turned since it was placed.
//! * **Effects** → `SetEffectParam` on both axes, addressed by the effect's
//!   position in the hub chain.
//! * **Add/remove** → `AddEffect` / `RemoveEffect` (a removed track is
//!   silenced with `SetVolume 0`).
//!
//! Parameter commands pass through an [`EmissionGate`] so a stamp resting
//! under a slightly shaky hand does not flood the sink.
//!
//! ## Quick start
//!
//! ```rust
//! use stamp_emit::{EmissionGate, RecordingSink, SinkCommand};
//! use stamp_tracker::LifecycleEvent;
//! use stamp_tracker::ObjectId;
//!
//! let gate = EmissionGate::default();
//! let mut sink = RecordingSink::new();
//! let added = LifecycleEvent::EffectAdded {
//!     uuid: ObjectId(1),
//!     name: "DELAY".into(),
//!     hub_index: 0,
//!     initial_y: 0.5,
//! };
//! gate.emit(&[added], &mut [], &mut sink);
//! assert_eq!(
//!     sink.commands,
//!     vec![SinkCommand::AddEffect { channel: 0, effect_type: "delay".into(), initial_y: 0.5 }],
//! );
//! ```

pub mod command;
pub mod gate;
pub mod json;
pub mod midi;

pub use command::{
    channel_for, effect_type_for, Axis, NullSink, ParameterSink, RecordingSink, SinkCommand,
};
pub use gate::{lifecycle_command, EmissionGate, GateConfig, EFFECT_CHANNEL};
pub use json::{BridgeMessage, JsonLinesSink};
pub use midi::{encode_cc, MidiOut, MidiSink, NullOut, SmfRecorder};
