// Graph state module - navigation graph types and the mutations that
// keep nodes, connections and adjacency lists consistent.

use crate::error::GraphError;
use crate::settings::{DEFAULT_FOV, GraphSettings};
use chrono::{DateTime, Utc};
use panorama::{Vec3, angle};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Tolerance when comparing a stored distance with the live one.
pub const DISTANCE_EPSILON: f64 = 1e-9;

// ------------------------------------------------------------------
// Identifiers
// ------------------------------------------------------------------

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Stable identifier of a viewpoint node.
    NodeId
);
string_id!(ConnectionId);
string_id!(
    /// Identifier of a revision, assigned locally or by the backend.
    RevisionId
);

// ------------------------------------------------------------------
// Node
// ------------------------------------------------------------------

fn default_fov() -> f64 {
    DEFAULT_FOV
}

fn default_bidirectional() -> bool {
    true
}

fn first_version() -> u32 {
    1
}

/// A mapped viewpoint anchored to one panorama.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub position: Vec3,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub heading: f64,
    #[serde(default = "default_fov")]
    pub fov: f64,
    /// Neighbours reachable from this node. Derived from the
    /// connection list and kept in step with it by every mutation.
    #[serde(default)]
    pub connections: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panorama_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

impl Node {
    fn at(id: NodeId, position: Vec3) -> Self {
        Self {
            id,
            position,
            rotation: 0.0,
            pitch: 0.0,
            heading: 0.0,
            fov: DEFAULT_FOV,
            connections: Vec::new(),
            panorama_url: None,
            label: None,
            locked: None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked.unwrap_or(false)
    }

    /// Label if set, id otherwise.
    pub fn display_name(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// Partial node attributes. `None` leaves a field untouched; the
/// doubled options on `panorama_url` and `label` allow clearing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub position: Option<Vec3>,
    pub rotation: Option<f64>,
    pub pitch: Option<f64>,
    pub heading: Option<f64>,
    pub fov: Option<f64>,
    pub panorama_url: Option<Option<String>>,
    pub label: Option<Option<String>>,
    pub locked: Option<bool>,
}

impl NodePatch {
    pub fn position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn rotation(mut self, rotation: f64) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn pitch(mut self, pitch: f64) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn fov(mut self, fov: f64) -> Self {
        self.fov = Some(fov);
        self
    }

    pub fn panorama_url(mut self, url: impl Into<String>) -> Self {
        self.panorama_url = Some(Some(url.into()));
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(Some(label.into()));
        self
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }
}

/// Merge a patch into a copy of `node`, normalising angles. Nothing is
/// written back, so a rejected patch leaves the graph untouched.
fn apply_patch(node: &Node, patch: &NodePatch) -> Result<Node, GraphError> {
    let mut next = node.clone();

    if let Some(position) = patch.position {
        if !position.is_finite() {
            return Err(GraphError::InvalidAttribute {
                field: "position",
                value: f64::NAN,
            });
        }
        let unlocking = patch.locked == Some(false);
        if node.is_locked() && !unlocking && position != node.position {
            return Err(GraphError::Locked(node.id.clone()));
        }
        next.position = position;
    }
    if let Some(rotation) = patch.rotation {
        next.rotation = angle::checked_wrap(rotation).map_err(|_| {
            GraphError::InvalidAttribute {
                field: "rotation",
                value: rotation,
            }
        })?;
    }
    if let Some(heading) = patch.heading {
        next.heading = angle::checked_wrap(heading).map_err(|_| {
            GraphError::InvalidAttribute {
                field: "heading",
                value: heading,
            }
        })?;
    }
    if let Some(pitch) = patch.pitch {
        next.pitch = angle::checked_pitch(pitch).map_err(|_| {
            GraphError::InvalidAttribute {
                field: "pitch",
                value: pitch,
            }
        })?;
    }
    if let Some(fov) = patch.fov {
        next.fov = angle::checked_fov(fov).map_err(|_| {
            GraphError::InvalidAttribute { field: "fov", value: fov }
        })?;
    }
    if let Some(url) = &patch.panorama_url {
        next.panorama_url = url.clone();
    }
    if let Some(label) = &patch.label {
        next.label = label.clone();
    }
    if let Some(locked) = patch.locked {
        next.locked = Some(locked);
    }

    Ok(next)
}

// ------------------------------------------------------------------
// Connection
// ------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub from_node_id: NodeId,
    pub to_node_id: NodeId,
    /// Length at authoring time. Moving an endpoint does not update
    /// it; see [`NavGraph::recompute_distances`].
    pub distance: f64,
    #[serde(default = "default_bidirectional")]
    pub bidirectional: bool,
}

impl Connection {
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.from_node_id == node || &self.to_node_id == node
    }

    /// The endpoint reached when leaving `node` over this connection,
    /// if the connection may be walked in that direction.
    pub fn traversable_from(&self, node: &NodeId) -> Option<&NodeId> {
        if &self.from_node_id == node {
            Some(&self.to_node_id)
        } else if self.bidirectional && &self.to_node_id == node {
            Some(&self.from_node_id)
        } else {
            None
        }
    }
}

// ------------------------------------------------------------------
// NavGraph
// ------------------------------------------------------------------

/// One floor's navigation graph; the unit exchanged with the backend
/// as a revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavGraph {
    pub id: RevisionId,
    pub venue_id: String,
    pub floor_id: String,
    pub name: String,
    pub(crate) nodes: Vec<Node>,
    pub(crate) connections: Vec<Connection>,
    #[serde(default)]
    pub settings: GraphSettings,
    #[serde(default = "first_version")]
    pub version: u32,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl NavGraph {
    pub fn new(
        venue_id: impl Into<String>,
        floor_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RevisionId::generate(),
            venue_id: venue_id.into(),
            floor_id: floor_id.into(),
            name: name.into(),
            nodes: Vec::new(),
            connections: Vec::new(),
            settings: GraphSettings::default(),
            version: first_version(),
            is_published: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| &c.id == id)
    }

    /// Connections walkable from `node`, paired with the neighbour
    /// each one leads to, in connection order.
    pub fn traversals_from<'a>(
        &'a self,
        node: &'a NodeId,
    ) -> impl Iterator<Item = (&'a Connection, &'a NodeId)> + 'a {
        self.connections
            .iter()
            .filter_map(move |c| c.traversable_from(node).map(|n| (c, n)))
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // --------------------------------------------------------------
    // Node mutations
    // --------------------------------------------------------------

    /// Add a node at `position`. Unset attributes take the defaults
    /// rotation 0, heading 0, pitch 0, fov 75. A position carried in
    /// `attributes` is ignored in favour of `position`.
    pub fn create_node(
        &mut self,
        position: Vec3,
        attributes: NodePatch,
    ) -> Result<Node, GraphError> {
        // a huge position on a fine grid can overflow while snapping
        let position = self.settings.snap(position);
        if !position.is_finite() {
            return Err(GraphError::InvalidAttribute {
                field: "position",
                value: f64::NAN,
            });
        }
        let template = Node::at(NodeId::generate(), position);
        let node = apply_patch(
            &template,
            &NodePatch {
                position: None,
                ..attributes
            },
        )?;

        debug!(node = %node.id, ?position, "created node");
        self.nodes.push(node.clone());
        self.touch();
        Ok(node)
    }

    /// Merge `patch` into an existing node. Connection distances are
    /// left as authored.
    pub fn update_node(
        &mut self,
        id: &NodeId,
        patch: NodePatch,
    ) -> Result<&Node, GraphError> {
        let index = self
            .nodes
            .iter()
            .position(|n| &n.id == id)
            .ok_or_else(|| GraphError::NotFound(id.clone()))?;

        let updated = apply_patch(&self.nodes[index], &patch)?;
        self.nodes[index] = updated;
        self.touch();
        debug!(node = %id, "updated node");
        Ok(&self.nodes[index])
    }

    /// Remove a node together with every connection touching it.
    /// Unknown ids are ignored; returns whether a node was removed.
    pub fn delete_node(&mut self, id: &NodeId) -> bool {
        let Some(index) = self.nodes.iter().position(|n| &n.id == id)
        else {
            return false;
        };

        self.nodes.remove(index);
        let before = self.connections.len();
        self.connections.retain(|c| !c.touches(id));
        for node in &mut self.nodes {
            node.connections.retain(|n| n != id);
        }
        self.touch();

        debug!(
            node = %id,
            cascaded = before - self.connections.len(),
            "deleted node"
        );
        true
    }

    // --------------------------------------------------------------
    // Connection mutations
    // --------------------------------------------------------------

    /// Connect two existing nodes. The distance is frozen at the
    /// current Euclidean distance between their positions.
    pub fn connect_nodes(
        &mut self,
        from: &NodeId,
        to: &NodeId,
        bidirectional: bool,
    ) -> Result<Connection, GraphError> {
        if from == to {
            return Err(GraphError::SelfConnection(from.clone()));
        }
        let a = self
            .node(from)
            .ok_or_else(|| GraphError::InvalidReference(from.clone()))?
            .position;
        let b = self
            .node(to)
            .ok_or_else(|| GraphError::InvalidReference(to.clone()))?
            .position;

        let connection = Connection {
            id: ConnectionId::generate(),
            from_node_id: from.clone(),
            to_node_id: to.clone(),
            distance: a.distance(&b),
            bidirectional,
        };
        self.connections.push(connection.clone());
        self.link(from, to);
        if bidirectional {
            self.link(to, from);
        }
        self.touch();

        debug!(
            connection = %connection.id,
            %from,
            %to,
            bidirectional,
            "connected nodes"
        );
        Ok(connection)
    }

    /// Remove a connection and prune both endpoints' adjacency, keeping
    /// entries another connection between the same pair still needs.
    /// Unknown ids are ignored; returns whether a connection was removed.
    pub fn delete_connection(&mut self, id: &ConnectionId) -> bool {
        let Some(index) = self.connections.iter().position(|c| &c.id == id)
        else {
            return false;
        };

        let removed = self.connections.remove(index);
        let (a, b) = (&removed.from_node_id, &removed.to_node_id);
        self.unlink(a, b);
        self.unlink(b, a);
        self.resync_pair(a, b);
        self.touch();

        debug!(connection = %id, "deleted connection");
        true
    }

    /// Re-derive every connection distance from current positions.
    /// Returns how many distances changed.
    pub fn recompute_distances(&mut self) -> usize {
        let positions: HashMap<&NodeId, Vec3> =
            self.nodes.iter().map(|n| (&n.id, n.position)).collect();

        let mut changed = 0;
        for connection in self.connections.iter_mut() {
            let ends = (
                positions.get(&connection.from_node_id),
                positions.get(&connection.to_node_id),
            );
            if let (Some(a), Some(b)) = ends {
                let distance = a.distance(b);
                if (distance - connection.distance).abs() > DISTANCE_EPSILON
                {
                    connection.distance = distance;
                    changed += 1;
                }
            }
        }

        if changed > 0 {
            self.touch();
        }
        changed
    }

    fn link(&mut self, node: &NodeId, neighbor: &NodeId) {
        if let Some(n) = self.nodes.iter_mut().find(|n| &n.id == node)
            && !n.connections.contains(neighbor)
        {
            n.connections.push(neighbor.clone());
        }
    }

    fn unlink(&mut self, node: &NodeId, neighbor: &NodeId) {
        if let Some(n) = self.nodes.iter_mut().find(|n| &n.id == node) {
            n.connections.retain(|id| id != neighbor);
        }
    }

    fn resync_pair(&mut self, a: &NodeId, b: &NodeId) {
        let a_to_b = self
            .connections
            .iter()
            .any(|c| c.traversable_from(a) == Some(b));
        let b_to_a = self
            .connections
            .iter()
            .any(|c| c.traversable_from(b) == Some(a));
        if a_to_b {
            self.link(a, b);
        }
        if b_to_a {
            self.link(b, a);
        }
    }

    // --------------------------------------------------------------
    // Revision lifecycle
    // --------------------------------------------------------------

    pub fn publish(&mut self) {
        self.is_published = true;
        self.touch();
    }

    /// Copy of this revision as a new unpublished draft with the next
    /// version number.
    pub fn clone_as_draft(&self) -> NavGraph {
        let now = Utc::now();
        NavGraph {
            id: RevisionId::generate(),
            version: self.version.saturating_add(1),
            is_published: false,
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------
