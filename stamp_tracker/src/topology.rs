//! Signal-chain topology, rebuilt from scratch every frame.
//!
//! Objects are ordered by `creation_order` alone.  The first effect is the
//! master hub: every track feeds it directly.  Later effects chain after
//! earlier ones in the order they were stamped, wherever they sit on the
//! table.
//!
//! ```text
//!   DRUMS ─┐
//!   BASS  ─┼─▶ LOWPASS ──▶ DELAY ──▶ REVERB
//!   VOCALS─┘
//! ```

use constellation::{clamp01, distance};

use crate::object::{ObjectId, VirtualObject};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionKind {
    /// Track → master hub.
    SourceToHub,
    /// Hub → next hub.
    Chain,
}

/// One directed edge of the current frame's graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
    pub from:      ObjectId,
    pub to:        ObjectId,
    pub kind:      ConnectionKind,
    pub distance:  f64,
    /// `distance` mapped onto `[0, 1]`.
    pub parameter: f64,
}

/// Distance → parameter mapping bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TopologyConfig {
    /// At or below this distance the parameter is 0.
    pub min_distance: f64,
    /// At or above this distance the parameter is 1.
    pub max_distance: f64,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        TopologyConfig { min_distance: 150.0, max_distance: 600.0 }
    }
}

impl TopologyConfig {
    /// Linear ramp from `min_distance` to `max_distance`, clamped.
    pub fn map_distance(&self, d: f64) -> f64 {
        let span = self.max_distance - self.min_distance;
        if span <= 0.0 {
            return if d < self.max_distance { 0.0 } else { 1.0 };
        }
        clamp01((d - self.min_distance) / span)
    }
}

/// Tracks and hubs, each in creation order.
pub fn partition(objects: &[VirtualObject]) -> (Vec<&VirtualObject>, Vec<&VirtualObject>) {
    let mut ordered: Vec<&VirtualObject> = objects.iter().collect();
    ordered.sort_by_key(|o| o.creation_order);
    ordered.into_iter().partition(|o| !o.is_hub())
}

/// Position of `uuid` among the hubs in creation order.
pub fn hub_index(objects: &[VirtualObject], uuid: ObjectId) -> Option<usize> {
    let (_, hubs) = partition(objects);
    hubs.iter().position(|h| h.uuid == uuid)
}

/// Build the full connection graph for the current objects.
pub fn compute(objects: &[VirtualObject], config: &TopologyConfig) -> Vec<Connection> {
    let (tracks, hubs) = partition(objects);
    let Some(&master) = hubs.first() else {
        return Vec::new();
    };

    let edge = |from: &VirtualObject, to: &VirtualObject, kind: ConnectionKind| {
        let d = distance(from, to);
        Connection {
            from:      from.uuid,
            to:        to.uuid,
            kind,
            distance:  d,
            parameter: config.map_distance(d),
        }
    };

    let mut out = Vec::with_capacity(tracks.len() + hubs.len() - 1);
    out.extend(tracks.iter().map(|&t| edge(t, master, ConnectionKind::SourceToHub)));
    out.extend(hubs.windows(2).map(|w| edge(w[0], w[1], ConnectionKind::Chain)));
    out
}

/// Give every hub the parameter of its incoming edge as `parameter_y`.
///
/// A chained hub has exactly one incoming edge.  The master hub takes the
/// nearest of its sources; with no sources it keeps its current value.
pub fn apply_hub_parameters(objects: &mut [VirtualObject], connections: &[Connection]) {
    for hub in objects.iter_mut().filter(|o| o.is_hub()) {
        let uuid = hub.uuid;
        let into = move |c: &&Connection| c.to == uuid;
        let incoming = connections
            .iter()
            .filter(into)
            .find(|c| c.kind == ConnectionKind::Chain)
            .or_else(|| {
                connections
                    .iter()
                    .filter(into)
                    .min_by(|a, b| a.distance.total_cmp(&b.distance))
            });
        if let Some(edge) = incoming {
            hub.parameter_y = edge.parameter;
        }
    }
}
