//! Emission gate: decides what each frame actually tells the sink.
//!
//! Lifecycle events go out immediately and unconditionally.  Parameter
//! values only go out once they have drifted more than `threshold` from the
//! last value sent for that object and axis; the gate then remembers the
//! new value on the object itself.

use constellation::Category;
use stamp_tracker::topology::partition;
use stamp_tracker::{LifecycleEvent, ObjectId, VirtualObject};
use tracing::{debug, trace};

use crate::command::{channel_for, effect_type_for, Axis, ParameterSink, SinkCommand};

/// Channel every effect command is addressed to.
pub const EFFECT_CHANNEL: u8 = 0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GateConfig {
    /// Smallest change, exclusive, worth sending.
    pub threshold: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig { threshold: 0.005 }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EmissionGate {
    config: GateConfig,
}

impl EmissionGate {
    pub fn new(config: GateConfig) -> Self {
        EmissionGate { config }
    }

    pub fn config(&self) -> &GateConfig { &self.config }

    /// Forward one frame: its lifecycle events, then any parameter changes
    /// that clear the threshold.  Returns the number of commands sent.
    pub fn emit<S: ParameterSink + ?Sized>(
        &self,
        events: &[LifecycleEvent],
        objects: &mut [VirtualObject],
        sink: &mut S,
    ) -> usize {
        let mut sent = 0;
        for event in events {
            let cmd = lifecycle_command(event);
            debug!(%cmd, "lifecycle");
            sink.send(&cmd);
            sent += 1;
        }
        sent += self.emit_changes(objects, sink);
        sink.flush();
        sent
    }

    /// Parameter changes only.  Effects are addressed by their position in
    /// the hub chain as it stands now.
    pub fn emit_changes<S: ParameterSink + ?Sized>(
        &self,
        objects: &mut [VirtualObject],
        sink: &mut S,
    ) -> usize {
        let hubs: Vec<ObjectId> = partition(objects).1.iter().map(|h| h.uuid).collect();
        let threshold = self.config.threshold;
        let mut sent = 0;

        for obj in objects.iter_mut() {
            match obj.category {
                // Tracks have a single axis.
                Category::Track => {
                    if (obj.parameter_x - obj.last_sent_x).abs() > threshold {
                        obj.last_sent_x = obj.parameter_x;
                        let cmd = SinkCommand::SetVolume {
                            channel: channel_for(&obj.name),
                            value:   obj.parameter_x,
                        };
                        trace!(%cmd, uuid = %obj.uuid, "parameter");
                        sink.send(&cmd);
                        sent += 1;
                    }
                }
                Category::Effect => {
                    let Some(effect_index) = hubs.iter().position(|&id| id == obj.uuid) else {
                        continue;
                    };
                    for axis in [Axis::X, Axis::Y] {
                        let (value, last_sent) = match axis {
                            Axis::X => (obj.parameter_x, &mut obj.last_sent_x),
                            Axis::Y => (obj.parameter_y, &mut obj.last_sent_y),
                        };
                        if (value - *last_sent).abs() > threshold {
                            *last_sent = value;
                            let cmd = SinkCommand::SetEffectParam {
                                channel: EFFECT_CHANNEL,
                                effect_index,
                                axis,
                                value,
                            };
                            trace!(%cmd, uuid = %obj.uuid, "parameter");
                            sink.send(&cmd);
                            sent += 1;
                        }
                    }
                }
            }
        }
        sent
    }
}

/// The sink command a lifecycle event turns into.
pub fn lifecycle_command(event: &LifecycleEvent) -> SinkCommand {
    match event {
        LifecycleEvent::EffectAdded { name, initial_y, .. } => SinkCommand::AddEffect {
            channel:     EFFECT_CHANNEL,
            effect_type: effect_type_for(name),
            initial_y:   *initial_y,
        },
        LifecycleEvent::EffectRemoved { hub_index, .. } => SinkCommand::RemoveEffect {
            channel:      EFFECT_CHANNEL,
            effect_index: *hub_index,
        },
        // No remove-track command exists; silence the channel instead.
        LifecycleEvent::TrackRemoved { name, .. } => SinkCommand::SetVolume {
            channel: channel_for(name),
            value:   0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::RecordingSink;

    fn obj(uuid: u64, name: &str, category: Category) -> VirtualObject {
        VirtualObject {
            uuid:             ObjectId(uuid),
            name:             name.to_string(),
            category,
            x:                0.0,
            y:                0.0,
            rotation:         0.0,
            initial_rotation: 0.0,
            parameter_x:      0.5,
            parameter_y:      0.5,
            is_tracking:      true,
            last_sent_x:      0.5,
            last_sent_y:      0.5,
            creation_order:   uuid,
        }
    }

    #[test]
    fn small_drift_is_held_back() {
        let gate = EmissionGate::default();
        let mut sink = RecordingSink::new();
        let mut objs = vec![obj(1, "DRUMS", Category::Track)];
        for step in 1..=4 {
            objs[0].parameter_x = 0.5 + step as f64 * 0.001;
            assert_eq!(gate.emit(&[], &mut objs, &mut sink), 0);
        }
        assert!(sink.commands.is_empty());
        assert_eq!(objs[0].last_sent_x, 0.5);
    }

    #[test]
    fn crossing_threshold_sends_once_and_rearms() {
        let gate = EmissionGate::default();
        let mut sink = RecordingSink::new();
        let mut objs = vec![obj(1, "DRUMS", Category::Track)];

        objs[0].parameter_x = 0.51;
        assert_eq!(gate.emit(&[], &mut objs, &mut sink), 1);
        assert_eq!(sink.commands, vec![SinkCommand::SetVolume { channel: 1, value: 0.51 }]);
        assert_eq!(objs[0].last_sent_x, 0.51);

        // Same value next frame: nothing.
        assert_eq!(gate.emit(&[], &mut objs, &mut sink), 0);
        assert_eq!(sink.commands.len(), 1);
    }

    #[test]
    fn exactly_threshold_is_not_enough() {
        let gate = EmissionGate::new(GateConfig { threshold: 0.25 });
        let mut sink = RecordingSink::new();
        let mut objs = vec![obj(1, "BASS", Category::Track)];
        objs[0].parameter_x = 0.75;
        assert_eq!(gate.emit(&[], &mut objs, &mut sink), 0);
    }

    #[test]
    fn tracks_never_send_y() {
        let gate = EmissionGate::default();
        let mut sink = RecordingSink::new();
        let mut objs = vec![obj(1, "VOCALS", Category::Track)];
        objs[0].parameter_y = 0.9;
        assert_eq!(gate.emit(&[], &mut objs, &mut sink), 0);
    }

    #[test]
    fn effects_addressed_by_hub_position() {
        let gate = EmissionGate::default();
        let mut sink = RecordingSink::new();
        let mut objs = vec![
            obj(1, "LOWPASS", Category::Effect),
            obj(2, "BASS", Category::Track),
            obj(3, "DELAY", Category::Effect),
        ];
        objs[2].parameter_x = 0.7;
        objs[2].parameter_y = 0.1;
        gate.emit(&[], &mut objs, &mut sink);
        assert_eq!(
            sink.commands,
            vec![
                SinkCommand::SetEffectParam {
                    channel: 0, effect_index: 1, axis: Axis::X, value: 0.7,
                },
                SinkCommand::SetEffectParam {
                    channel: 0, effect_index: 1, axis: Axis::Y, value: 0.1,
                },
            ]
        );

        // With the first hub gone the same effect is now index 0.
        objs.remove(0);
        objs[1].parameter_x = 0.2;
        sink.drain();
        gate.emit(&[], &mut objs, &mut sink);
        assert!(matches!(sink.commands[..], [SinkCommand::SetEffectParam { effect_index: 0, .. }]));
    }

    #[test]
    fn tracks_and_effects_take_their_own_paths() {
        let gate = EmissionGate::default();
        let mut sink = RecordingSink::new();
        let mut objs = vec![
            obj(1, "DRUMS", Category::Track),
            obj(2, "CRUSH", Category::Effect),
        ];
        objs[0].parameter_x = 0.9;
        objs[0].parameter_y = 0.9;
        objs[1].parameter_y = 0.3;
        assert_eq!(gate.emit(&[], &mut objs, &mut sink), 2);
        assert_eq!(
            sink.commands,
            vec![
                SinkCommand::SetVolume { channel: 1, value: 0.9 },
                SinkCommand::SetEffectParam {
                    channel: 0, effect_index: 0, axis: Axis::Y, value: 0.3,
                },
            ]
        );
        // The track's y is never tracked; the effect's x never moved.
        assert_eq!(objs[0].last_sent_y, 0.5);
        assert_eq!(objs[1].last_sent_x, 0.5);
        assert_eq!(objs[1].last_sent_y, 0.3);
    }

    #[test]
    fn lifecycle_events_bypass_the_gate() {
        let gate = EmissionGate::new(GateConfig { threshold: 10.0 });
        let mut sink = RecordingSink::new();
        let events = [
            LifecycleEvent::EffectAdded {
                uuid:      ObjectId(4),
                name:      "REVERB".into(),
                hub_index: 2,
                initial_y: 0.5,
            },
            LifecycleEvent::EffectRemoved { uuid: ObjectId(1), name: "GATE".into(), hub_index: 0 },
            LifecycleEvent::TrackRemoved { uuid: ObjectId(2), name: "VOCALS".into() },
        ];
        assert_eq!(gate.emit(&events, &mut [], &mut sink), 3);
        assert_eq!(
            sink.commands,
            vec![
                SinkCommand::AddEffect { channel: 0, effect_type: "reverb".into(), initial_y: 0.5 },
                SinkCommand::RemoveEffect { channel: 0, effect_index: 0 },
                SinkCommand::SetVolume { channel: 3, value: 0.0 },
            ]
        );
    }
}
