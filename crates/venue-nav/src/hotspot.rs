// Hotspot overlay - places walkable neighbours as markers in the
// viewer's rotated frame and keeps the host surface in step with them.

use crate::actions::Action;
use crate::graph_state::{ConnectionId, NavGraph, NodeId};
use crate::projection::{NeighborBearing, neighbor_bearings};
use crate::settings::ViewerConfig;
use panorama::angle::wrap_degrees;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

/// Re-base a projection yaw into the viewer frame, which turns the
/// other way and starts at `background_offset`. Always in `[0, 360)`;
/// non-finite input yields 0.
pub fn mirrored_yaw(yaw: f64, background_offset: f64) -> f64 {
    wrap_degrees(background_offset - yaw)
}

/// The viewer's own yaw offset for `node`: its stored rotation.
pub fn background_offset(graph: &NavGraph, node: &NodeId) -> f64 {
    graph.node(node).map_or(0.0, |n| n.rotation)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hotspot {
    pub target: NodeId,
    pub connection: ConnectionId,
    /// Viewer-frame yaw.
    pub yaw: f64,
    pub pitch: f64,
    pub distance: f64,
    /// Close enough to get the "ahead" glyph.
    pub emphasized: bool,
    pub label: String,
}

pub fn place_hotspots(
    graph: &NavGraph,
    bearings: &[NeighborBearing],
    background_offset: f64,
    proximity_threshold: f64,
) -> Vec<Hotspot> {
    bearings
        .iter()
        .map(|b| Hotspot {
            target: b.neighbor.clone(),
            connection: b.connection.clone(),
            yaw: mirrored_yaw(b.yaw, background_offset),
            pitch: b.pitch,
            distance: b.distance,
            emphasized: b.distance < proximity_threshold,
            label: graph
                .node(&b.neighbor)
                .map_or_else(|| b.neighbor.to_string(), |n| n.display_name()),
        })
        .collect()
}

/// Hotspots for the panorama of `selected`, rebased on its rotation.
pub fn build_hotspots(
    graph: &NavGraph,
    selected: &NodeId,
    config: &ViewerConfig,
) -> Vec<Hotspot> {
    place_hotspots(
        graph,
        &neighbor_bearings(graph, selected),
        background_offset(graph, selected),
        config.proximity_threshold,
    )
}

// ------------------------------------------------------------------
// Host surface
// ------------------------------------------------------------------

/// The 360 viewer embedding the overlay.
pub trait PanoramaViewer {
    fn set_markers(&mut self, markers: &[Hotspot]);
    /// Re-layout markers after the surface changed its own state.
    fn refresh(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// The click was consumed by a marker; the drag handler must not
    /// see it.
    Stop,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClickResponse {
    pub action: Option<Action>,
    pub propagation: Propagation,
}

// ------------------------------------------------------------------
// Refresh retries
// ------------------------------------------------------------------

/// Deadlines of the refresh passes following the latest change. The
/// host viewer may finish its own layout after our first refresh, so
/// one change yields several passes.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    delays: Vec<Duration>,
    pending: Vec<Instant>,
}

impl RefreshScheduler {
    pub fn new(delays: Vec<Duration>) -> Self {
        let mut delays = delays;
        if delays.is_empty() {
            delays.push(Duration::ZERO);
        }
        delays.sort();
        Self {
            delays,
            pending: Vec::new(),
        }
    }

    /// Replace any pending passes with a fresh series from `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.pending = self.delays.iter().map(|d| now + *d).collect();
    }

    /// Remove and count the passes due at `now`.
    pub fn take_due(&mut self, now: Instant) -> usize {
        let before = self.pending.len();
        self.pending.retain(|deadline| *deadline > now);
        before - self.pending.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().min().copied()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

// ------------------------------------------------------------------
// Overlay
// ------------------------------------------------------------------

pub struct HotspotOverlay {
    markers: Vec<Hotspot>,
    scheduler: RefreshScheduler,
}

impl HotspotOverlay {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            markers: Vec::new(),
            scheduler: RefreshScheduler::new(config.refresh_delays()),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Take a new marker set after a selection, graph or offset change
    /// and restart the refresh passes.
    pub fn sync(&mut self, markers: Vec<Hotspot>, now: Instant) {
        debug!(count = markers.len(), "hotspots changed");
        self.markers = markers;
        self.scheduler.schedule(now);
    }

    /// Run the refresh passes due at `now`. Every pass pushes the
    /// current marker set, so late passes never apply stale positions.
    pub fn poll(
        &mut self,
        now: Instant,
        viewer: &mut dyn PanoramaViewer,
    ) -> usize {
        let due = self.scheduler.take_due(now);
        for _ in 0..due {
            viewer.set_markers(&self.markers);
            viewer.refresh();
        }
        due
    }

    pub fn click(&self, target: &NodeId) -> ClickResponse {
        if self.markers.iter().any(|m| &m.target == target) {
            ClickResponse {
                action: Some(Action::SelectNode {
                    node: Some(target.clone()),
                }),
                propagation: Propagation::Stop,
            }
        } else {
            ClickResponse {
                action: None,
                propagation: Propagation::Continue,
            }
        }
    }
}
