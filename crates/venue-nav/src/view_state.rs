use crate::error::GraphError;
use crate::graph_state::{NavGraph, Node, NodeId, NodePatch};
use crate::settings::{DEFAULT_FOV, FOV_RANGE};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// A node's own viewing parameters, independent of its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanoramaView {
    pub rotation: f64,
    pub heading: f64,
    pub pitch: f64,
    pub fov: f64,
}

impl PanoramaView {
    pub fn of(node: &Node) -> Self {
        Self {
            rotation: node.rotation,
            heading: node.heading,
            pitch: node.pitch,
            fov: node.fov,
        }
    }
}

fn write_back(
    graph: &mut NavGraph,
    node: &NodeId,
    patch: NodePatch,
) -> Result<PanoramaView, GraphError> {
    graph.update_node(node, patch).map(PanoramaView::of)
}

pub fn set_rotation(
    graph: &mut NavGraph,
    node: &NodeId,
    rotation: f64,
) -> Result<PanoramaView, GraphError> {
    write_back(graph, node, NodePatch::default().rotation(rotation))
}

pub fn rotate_by(
    graph: &mut NavGraph,
    node: &NodeId,
    delta: f64,
) -> Result<PanoramaView, GraphError> {
    let current = graph
        .node(node)
        .ok_or_else(|| GraphError::NotFound(node.clone()))?
        .rotation;
    set_rotation(graph, node, current + delta)
}

pub fn set_heading(
    graph: &mut NavGraph,
    node: &NodeId,
    heading: f64,
) -> Result<PanoramaView, GraphError> {
    write_back(graph, node, NodePatch::default().heading(heading))
}

pub fn set_pitch(
    graph: &mut NavGraph,
    node: &NodeId,
    pitch: f64,
) -> Result<PanoramaView, GraphError> {
    write_back(graph, node, NodePatch::default().pitch(pitch))
}

/// Set the field of view, clamped to the viewer's zoom range.
pub fn set_fov(
    graph: &mut NavGraph,
    node: &NodeId,
    fov: f64,
) -> Result<PanoramaView, GraphError> {
    let fov = if fov.is_finite() { FOV_RANGE.clamp(fov) } else { fov };
    write_back(graph, node, NodePatch::default().fov(fov))
}

/// Back to rotation 0, heading 0, fov 75. Pitch is kept.
pub fn reset(
    graph: &mut NavGraph,
    node: &NodeId,
) -> Result<PanoramaView, GraphError> {
    debug!(%node, "reset view");
    write_back(
        graph,
        node,
        NodePatch::default().rotation(0.0).heading(0.0).fov(DEFAULT_FOV),
    )
}

// ------------------------------------------------------------------
// Auto-rotate
// ------------------------------------------------------------------

/// Cancellation flag shared between the animation and its owner.
#[derive(Debug, Clone, Default)]
pub struct AnimationHandle(Arc<AtomicBool>);

impl AnimationHandle {
    /// Once this returns no further tick mutates the graph.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-frame rotation of the selected panorama.
#[derive(Debug, Clone)]
pub struct AutoRotate {
    step: f64,
    handle: Option<AnimationHandle>,
    primed: bool,
}

impl AutoRotate {
    pub fn new(step: f64) -> Self {
        Self {
            step,
            handle: None,
            primed: false,
        }
    }

    /// Start (or restart) the loop. A running loop is cancelled first.
    pub fn start(&mut self) -> AnimationHandle {
        self.stop();
        let handle = AnimationHandle::default();
        self.handle = Some(handle.clone());
        self.primed = false;
        handle
    }

    /// Halt advancement. Rotation stays where it is.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_stopped())
    }

    /// One display refresh. The first tick after `start` only primes
    /// the loop; later ticks advance `node`'s rotation by the step.
    /// Returns the new rotation when it moved.
    pub fn tick(
        &mut self,
        graph: &mut NavGraph,
        node: &NodeId,
    ) -> Result<Option<f64>, GraphError> {
        if !self.is_running() {
            self.handle = None;
            return Ok(None);
        }
        if !self.primed {
            self.primed = true;
            return Ok(None);
        }
        let view = rotate_by(graph, node, self.step)?;
        Ok(Some(view.rotation))
    }
}
