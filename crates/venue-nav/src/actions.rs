use crate::effects::Effect;
use crate::error::{GraphError, TextureError};
use crate::graph_state::{ConnectionId, NodeId, NodePatch};
use crate::permission::{GRAPH_EDIT, Permission, REVISION_PUBLISH};
use crate::settings::{GRID_SIZE_RANGE, GraphSettings};
use crate::store::Store;
use crate::view_state;
use panorama::Vec3;
use std::path::PathBuf;
use tracing::debug;

/// Actions that can be dispatched to modify the editor state
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // Graph Actions
    /// Add a node at a floor position
    CreateNode {
        position: Vec3,
        attributes: NodePatch,
    },
    /// Merge attributes into a node
    UpdateNode { node: NodeId, patch: NodePatch },
    /// Remove a node and everything connected to it
    DeleteNode { node: NodeId },
    ConnectNodes {
        from: NodeId,
        to: NodeId,
        bidirectional: bool,
    },
    DeleteConnection { connection: ConnectionId },
    /// Refresh authored distances from current positions
    RecomputeDistances,
    UpdateSettings { settings: GraphSettings },

    // Revision Actions
    RenameRevision { name: String },
    PublishRevision,

    // Viewer Actions
    /// Move to another viewpoint, or clear the selection
    SelectNode { node: Option<NodeId> },
    SetRotation { degrees: f64 },
    SetHeading { degrees: f64 },
    SetPitch { degrees: f64 },
    SetFov { degrees: f64 },
    /// Rotation, heading and fov back to defaults
    ResetView,
    StartAutoRotate,
    StopAutoRotate,
    /// Host finished fetching a panorama image
    PanoramaLoaded {
        url: String,
        outcome: Result<(), TextureError>,
    },

    // File Operations
    /// Save current revision to file
    SaveToFile { path: PathBuf },
    /// Load a revision from file
    LoadFromFile { path: PathBuf },
    /// Clear any error message
    ClearErrorMessage,
}

impl Action {
    pub fn required_permission(&self) -> Option<Permission> {
        match self {
            Action::CreateNode { .. }
            | Action::UpdateNode { .. }
            | Action::DeleteNode { .. }
            | Action::ConnectNodes { .. }
            | Action::DeleteConnection { .. }
            | Action::RecomputeDistances
            | Action::UpdateSettings { .. }
            | Action::RenameRevision { .. }
            | Action::SetRotation { .. }
            | Action::SetHeading { .. }
            | Action::SetPitch { .. }
            | Action::SetFov { .. }
            | Action::ResetView
            // rotation is written into the revision on every tick
            | Action::StartAutoRotate => Some(Permission::single(GRAPH_EDIT)),
            Action::PublishRevision => {
                Some(Permission::single(REVISION_PUBLISH))
            }
            Action::SelectNode { .. }
            | Action::StopAutoRotate
            | Action::PanoramaLoaded { .. }
            | Action::SaveToFile { .. }
            | Action::LoadFromFile { .. }
            | Action::ClearErrorMessage => None,
        }
    }
}

fn load_panorama(store: &mut Store) -> Vec<Effect> {
    store
        .request_panorama()
        .map(|url| Effect::LoadPanorama { url })
        .into_iter()
        .collect()
}

/// Apply a single action to the store. Nothing is committed when an
/// error is returned.
pub fn update(
    store: &mut Store,
    action: Action,
) -> Result<Vec<Effect>, GraphError> {
    if let Some(permission) = action.required_permission() {
        store.require(&permission)?;
    }

    match action {
        // Graph Actions
        Action::CreateNode {
            position,
            attributes,
        } => {
            store.mutate_graph(|g| g.create_node(position, attributes))?;
            Ok(vec![])
        }
        Action::UpdateNode { node, patch } => {
            store.mutate_graph(|g| g.update_node(&node, patch).map(|_| ()))?;
            // the selected panorama may have been swapped
            Ok(load_panorama(store))
        }
        Action::DeleteNode { node } => {
            if !store.graph.get().contains_node(&node) {
                return Ok(vec![]);
            }
            store.mutate_graph(|g| Ok(g.delete_node(&node)))?;
            if store.selected.as_ref() == Some(&node) {
                store.auto_rotate.stop();
                store.select(None);
                return Ok(load_panorama(store));
            }
            Ok(vec![])
        }
        Action::ConnectNodes {
            from,
            to,
            bidirectional,
        } => {
            store.mutate_graph(|g| g.connect_nodes(&from, &to, bidirectional))?;
            Ok(vec![])
        }
        Action::DeleteConnection { connection } => {
            if store.graph.get().connection(&connection).is_some() {
                store.mutate_graph(|g| Ok(g.delete_connection(&connection)))?;
            }
            Ok(vec![])
        }
        Action::RecomputeDistances => {
            let changed = store.mutate_graph(|g| Ok(g.recompute_distances()))?;
            debug!(changed, "recomputed distances");
            Ok(vec![])
        }
        Action::UpdateSettings { mut settings } => {
            if !settings.grid_size.is_finite() {
                return Err(GraphError::InvalidAttribute {
                    field: "gridSize",
                    value: settings.grid_size,
                });
            }
            settings.grid_size = GRID_SIZE_RANGE.clamp(settings.grid_size);
            store.mutate_graph(|g| {
                g.settings = settings;
                g.touch();
                Ok(())
            })?;
            Ok(vec![])
        }

        // Revision Actions
        Action::RenameRevision { name } => {
            store.mutate_graph(|g| {
                g.name = name;
                g.touch();
                Ok(())
            })?;
            Ok(vec![])
        }
        Action::PublishRevision => {
            store.mutate_graph(|g| {
                g.publish();
                Ok(())
            })?;
            Ok(vec![])
        }

        // Viewer Actions
        Action::SelectNode { node } => {
            if let Some(id) = &node
                && !store.graph.get().contains_node(id)
            {
                return Err(GraphError::InvalidReference(id.clone()));
            }
            if store.selected != node {
                store.auto_rotate.stop();
            }
            store.select(node);
            Ok(load_panorama(store))
        }
        Action::SetRotation { degrees } => {
            let node = store.require_selection()?;
            store.mutate_graph(|g| view_state::set_rotation(g, &node, degrees))?;
            Ok(vec![])
        }
        Action::SetHeading { degrees } => {
            let node = store.require_selection()?;
            store.mutate_graph(|g| view_state::set_heading(g, &node, degrees))?;
            Ok(vec![])
        }
        Action::SetPitch { degrees } => {
            let node = store.require_selection()?;
            store.mutate_graph(|g| view_state::set_pitch(g, &node, degrees))?;
            Ok(vec![])
        }
        Action::SetFov { degrees } => {
            let node = store.require_selection()?;
            store.mutate_graph(|g| view_state::set_fov(g, &node, degrees))?;
            Ok(vec![])
        }
        Action::ResetView => {
            let node = store.require_selection()?;
            store.mutate_graph(|g| view_state::reset(g, &node))?;
            Ok(vec![])
        }
        Action::StartAutoRotate => {
            store.require_selection()?;
            store.auto_rotate.start();
            Ok(vec![])
        }
        Action::StopAutoRotate => {
            store.auto_rotate.stop();
            Ok(vec![])
        }
        Action::PanoramaLoaded { url, outcome } => {
            store.texture.complete(&url, outcome);
            Ok(vec![])
        }

        // File Operations
        Action::SaveToFile { path } => Ok(vec![Effect::SaveRevision { path }]),
        Action::LoadFromFile { path } => Ok(vec![Effect::LoadRevision { path }]),
        Action::ClearErrorMessage => {
            store.error_message = None;
            Ok(vec![])
        }
    }
}
