use crate::error::{GraphError, PersistError};
use crate::graph_state::{NavGraph, Node, NodeId};
use crate::hotspot;
use crate::permission::{GRAPH_EDIT, Permission};
use crate::serialization;
use crate::settings::ViewerConfig;
use crate::texture::PanoramaTexture;
use crate::versioned::Versioned;
use crate::view_state::AutoRotate;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Notifications delivered to subscribers after a change commits.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    GraphChanged { version: u64 },
    SelectionChanged { selected: Option<NodeId> },
    ErrorRaised { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// Everything the editor and viewer share: one floor's graph, the
/// selection, and viewer state. Passed explicitly to whoever needs it.
pub struct Store {
    pub graph: Versioned<NavGraph>,
    pub selected: Option<NodeId>,
    pub texture: PanoramaTexture,
    pub auto_rotate: AutoRotate,
    pub config: ViewerConfig,
    pub grants: HashSet<String>,
    pub error_message: Option<String>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Store {
    pub fn new(
        graph: NavGraph,
        config: ViewerConfig,
        grants: HashSet<String>,
    ) -> Self {
        Self {
            graph: Versioned::new(graph),
            selected: None,
            texture: PanoramaTexture::default(),
            auto_rotate: AutoRotate::new(config.auto_rotate_step),
            config,
            grants,
            error_message: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&StoreEvent) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        before != self.listeners.len()
    }

    pub fn emit(&mut self, event: StoreEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    // ------------------------------------------------------------------
    // Graph access
    // ------------------------------------------------------------------

    /// Run a graph mutation and notify subscribers if it succeeded.
    pub fn mutate_graph<R>(
        &mut self,
        mutation: impl FnOnce(&mut NavGraph) -> Result<R, GraphError>,
    ) -> Result<R, GraphError> {
        let out = mutation(self.graph.get_mut())?;
        let version = self.graph.version();
        self.emit(StoreEvent::GraphChanged { version });
        Ok(out)
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.selected.as_ref().and_then(|id| self.graph.get().node(id))
    }

    pub fn require_selection(&self) -> Result<NodeId, GraphError> {
        self.selected.clone().ok_or(GraphError::NoSelection)
    }

    pub fn background_offset(&self) -> f64 {
        self.selected
            .as_ref()
            .map_or(0.0, |id| hotspot::background_offset(self.graph.get(), id))
    }

    pub fn select(&mut self, node: Option<NodeId>) {
        if self.selected == node {
            return;
        }
        debug!(selected = ?node, "selection changed");
        self.selected = node.clone();
        self.emit(StoreEvent::SelectionChanged { selected: node });
    }

    /// Drop a selection that no longer names a node.
    pub fn prune_selection(&mut self) {
        if let Some(id) = &self.selected
            && !self.graph.get().contains_node(id)
        {
            self.select(None);
        }
    }

    pub fn require(&self, permission: &Permission) -> Result<(), GraphError> {
        if permission.is_granted(&self.grants) {
            Ok(())
        } else {
            Err(GraphError::Forbidden(permission.clone()))
        }
    }

    pub fn raise_error(&mut self, message: String) {
        self.error_message = Some(message.clone());
        self.emit(StoreEvent::ErrorRaised { message });
    }

    /// Point the texture at the selected node's panorama. Returns the
    /// url the host should fetch, if a new load is needed.
    pub fn request_panorama(&mut self) -> Option<String> {
        let url = self
            .selected_node()
            .and_then(|n| n.panorama_url.clone());
        self.texture.request(url.as_deref())
    }

    /// One display refresh of the auto-rotate loop.
    pub fn advance_auto_rotate(&mut self) -> Result<Option<f64>, GraphError> {
        let Some(node) = self.selected.clone() else {
            return Ok(None);
        };
        if !self.auto_rotate.is_running() {
            return Ok(None);
        }
        self.require(&Permission::single(GRAPH_EDIT))?;
        let moved = self.auto_rotate.tick(self.graph.get_mut(), &node)?;
        if moved.is_some() {
            let version = self.graph.version();
            self.emit(StoreEvent::GraphChanged { version });
        }
        Ok(moved)
    }

    // ------------------------------------------------------------------
    // File Operations
    // ------------------------------------------------------------------

    pub fn save_to_file(&self, path: &Path) -> Result<(), PersistError> {
        serialization::save_to_file(self.graph.get(), path)
    }

    pub fn load_from_file(&mut self, path: &Path) -> Result<(), PersistError> {
        let graph = serialization::load_from_file(path)?;
        self.auto_rotate.stop();
        self.graph.set(graph);
        let version = self.graph.version();
        self.emit(StoreEvent::GraphChanged { version });
        self.prune_selection();
        Ok(())
    }
}
