use crate::graph_state::{
    ConnectionId, DISTANCE_EPSILON, NavGraph, NodeId,
};
use crate::settings::PITCH_RANGE;
use panorama::angle::FULL_TURN;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One finding of [`validate_graph`].
#[derive(Debug, Clone, PartialEq)]
pub enum Issue {
    // Structural errors
    DuplicateNodeId { node: NodeId },
    DuplicateConnectionId { connection: ConnectionId },
    DanglingEndpoint { connection: ConnectionId, node: NodeId },
    SelfConnection { connection: ConnectionId },
    /// Adjacency entry no connection lets the node walk to.
    UnjustifiedAdjacency { node: NodeId, neighbor: NodeId },
    /// Connection whose walkable side is missing from adjacency.
    MissingAdjacency { connection: ConnectionId, node: NodeId },
    AttributeOutOfRange {
        node: NodeId,
        field: &'static str,
        value: f64,
    },
    NonFinitePosition { node: NodeId },

    // Soft issues
    IsolatedNode { node: NodeId },
    MissingPanorama { node: NodeId },
    CoincidentEndpoints { connection: ConnectionId },
    StaleDistance {
        connection: ConnectionId,
        stored: f64,
        actual: f64,
    },
}

impl Issue {
    pub fn severity(&self) -> Severity {
        match self {
            Issue::IsolatedNode { .. }
            | Issue::MissingPanorama { .. }
            | Issue::CoincidentEndpoints { .. }
            | Issue::StaleDistance { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::DuplicateNodeId { node } => {
                write!(f, "duplicate node id {}", node)
            }
            Issue::DuplicateConnectionId { connection } => {
                write!(f, "duplicate connection id {}", connection)
            }
            Issue::DanglingEndpoint { connection, node } => write!(
                f,
                "connection {} references missing node {}",
                connection, node
            ),
            Issue::SelfConnection { connection } => {
                write!(f, "connection {} joins a node to itself", connection)
            }
            Issue::UnjustifiedAdjacency { node, neighbor } => write!(
                f,
                "node {} lists {} but no connection leads there",
                node, neighbor
            ),
            Issue::MissingAdjacency { connection, node } => write!(
                f,
                "node {} does not list the neighbour of connection {}",
                node, connection
            ),
            Issue::AttributeOutOfRange { node, field, value } => write!(
                f,
                "node {} has {} = {} out of range",
                node, field, value
            ),
            Issue::NonFinitePosition { node } => {
                write!(f, "node {} has a non-finite position", node)
            }
            Issue::IsolatedNode { node } => {
                write!(f, "isolated node {}", node)
            }
            Issue::MissingPanorama { node } => {
                write!(f, "node {} has no panorama", node)
            }
            Issue::CoincidentEndpoints { connection } => write!(
                f,
                "connection {} has coincident endpoints",
                connection
            ),
            Issue::StaleDistance {
                connection,
                stored,
                actual,
            } => write!(
                f,
                "connection {} stores distance {:.3} but endpoints are {:.3} apart",
                connection, stored, actual
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, issue: Issue) {
        match issue.severity() {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
        }
    }
}

/// Check referential integrity and attribute ranges. Read-only.
pub fn validate_graph(graph: &NavGraph) -> ValidationResult {
    let mut result = ValidationResult::default();

    // 1. Unique ids
    let mut seen_nodes = HashSet::new();
    for node in graph.nodes() {
        if !seen_nodes.insert(&node.id) {
            result.push(Issue::DuplicateNodeId {
                node: node.id.clone(),
            });
        }
    }
    let mut seen_connections = HashSet::new();
    for connection in graph.connections() {
        if !seen_connections.insert(&connection.id) {
            result.push(Issue::DuplicateConnectionId {
                connection: connection.id.clone(),
            });
        }
    }

    // 2. Connection endpoints and their adjacency entries
    for c in graph.connections() {
        if c.from_node_id == c.to_node_id {
            result.push(Issue::SelfConnection {
                connection: c.id.clone(),
            });
        }

        let from = graph.node(&c.from_node_id);
        let to = graph.node(&c.to_node_id);
        for (end, id) in [(from, &c.from_node_id), (to, &c.to_node_id)] {
            if end.is_none() {
                result.push(Issue::DanglingEndpoint {
                    connection: c.id.clone(),
                    node: id.clone(),
                });
            }
        }
        let (Some(from), Some(to)) = (from, to) else {
            continue;
        };

        if !from.connections.contains(&to.id) {
            result.push(Issue::MissingAdjacency {
                connection: c.id.clone(),
                node: from.id.clone(),
            });
        }
        if c.bidirectional && !to.connections.contains(&from.id) {
            result.push(Issue::MissingAdjacency {
                connection: c.id.clone(),
                node: to.id.clone(),
            });
        }

        let actual = from.position.distance(&to.position);
        if actual == 0.0 {
            result.push(Issue::CoincidentEndpoints {
                connection: c.id.clone(),
            });
        } else if (actual - c.distance).abs() > DISTANCE_EPSILON {
            result.push(Issue::StaleDistance {
                connection: c.id.clone(),
                stored: c.distance,
                actual,
            });
        }
    }

    // 3. Per-node checks
    for node in graph.nodes() {
        for neighbor in &node.connections {
            let justified = graph
                .traversals_from(&node.id)
                .any(|(_, reached)| reached == neighbor);
            if !justified {
                result.push(Issue::UnjustifiedAdjacency {
                    node: node.id.clone(),
                    neighbor: neighbor.clone(),
                });
            }
        }

        if !node.position.is_finite() {
            result.push(Issue::NonFinitePosition {
                node: node.id.clone(),
            });
        }

        let ranges = [
            ("rotation", node.rotation, (0.0..FULL_TURN).contains(&node.rotation)),
            ("heading", node.heading, (0.0..FULL_TURN).contains(&node.heading)),
            ("pitch", node.pitch, PITCH_RANGE.contains(node.pitch)),
            ("fov", node.fov, node.fov > 0.0 && node.fov.is_finite()),
        ];
        for (field, value, ok) in ranges {
            if !ok {
                result.push(Issue::AttributeOutOfRange {
                    node: node.id.clone(),
                    field,
                    value,
                });
            }
        }

        if !graph.connections().iter().any(|c| c.touches(&node.id)) {
            result.push(Issue::IsolatedNode {
                node: node.id.clone(),
            });
        }
        if node.panorama_url.as_deref().is_none_or(str::is_empty) {
            result.push(Issue::MissingPanorama {
                node: node.id.clone(),
            });
        }
    }

    result
}

impl NavGraph {
    pub fn validate(&self) -> ValidationResult {
        validate_graph(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_state::{Connection, NodePatch};
    use panorama::Vec3;

    fn empty_graph() -> NavGraph {
        NavGraph::new("venue-1", "floor-1", "Level 2")
    }

    fn add_with_panorama(graph: &mut NavGraph, x: f64) -> NodeId {
        graph
            .create_node(
                Vec3::new(x, 0.0, 0.0),
                NodePatch::default().panorama_url(format!("pano-{}.jpg", x)),
            )
            .expect("node is created")
            .id
    }

    #[test]
    fn test_empty_graph_is_valid_without_warnings() {
        let result = empty_graph().validate();

        assert!(result.is_valid());
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_isolated_node_is_warning_not_error() {
        let mut graph = empty_graph();
        let a = add_with_panorama(&mut graph, 0.0);

        let result = graph.validate();

        assert!(result.is_valid());
        assert_eq!(result.warnings, vec![Issue::IsolatedNode { node: a }]);
    }

    #[test]
    fn test_missing_panorama_is_warning() {
        let mut graph = empty_graph();
        let a = graph
            .create_node(Vec3::ZERO, NodePatch::default())
            .expect("node is created")
            .id;
        let b = add_with_panorama(&mut graph, 2.0);
        graph.connect_nodes(&a, &b, true).expect("connected");

        let result = graph.validate();

        assert!(result.is_valid());
        assert_eq!(result.warnings, vec![Issue::MissingPanorama { node: a }]);
    }

    #[test]
    fn test_well_formed_graph_has_no_findings() {
        let mut graph = empty_graph();
        let a = add_with_panorama(&mut graph, 0.0);
        let b = add_with_panorama(&mut graph, 2.0);
        let c = add_with_panorama(&mut graph, 5.0);
        graph.connect_nodes(&a, &b, true).expect("connected");
        graph.connect_nodes(&b, &c, false).expect("connected");

        assert_eq!(graph.validate(), ValidationResult::default());
    }

    #[test]
    fn test_dangling_connection_is_error() {
        let mut graph = empty_graph();
        let a = add_with_panorama(&mut graph, 0.0);
        graph.connections.push(Connection {
            id: ConnectionId::from("c-1"),
            from_node_id: a.clone(),
            to_node_id: NodeId::from("gone"),
            distance: 1.0,
            bidirectional: true,
        });
        graph.nodes[0].connections.push(NodeId::from("gone"));

        let result = graph.validate();

        assert!(!result.is_valid());
        assert!(result.errors.contains(&Issue::DanglingEndpoint {
            connection: ConnectionId::from("c-1"),
            node: NodeId::from("gone"),
        }));
    }

    #[test]
    fn test_unjustified_and_missing_adjacency_are_errors() {
        let mut graph = empty_graph();
        let a = add_with_panorama(&mut graph, 0.0);
        let b = add_with_panorama(&mut graph, 1.0);
        let c = graph.connect_nodes(&a, &b, true).expect("connected");
        graph.nodes[1].connections.clear();
        graph.nodes[0].connections.push(NodeId::from("stranger"));

        let result = graph.validate();

        assert!(result.errors.contains(&Issue::MissingAdjacency {
            connection: c.id,
            node: b,
        }));
        assert!(result.errors.contains(&Issue::UnjustifiedAdjacency {
            node: a,
            neighbor: NodeId::from("stranger"),
        }));
    }

    #[test]
    fn test_adjacency_against_one_way_connection_is_unjustified() {
        let mut graph = empty_graph();
        let a = add_with_panorama(&mut graph, 0.0);
        let b = add_with_panorama(&mut graph, 1.0);
        graph.connect_nodes(&a, &b, false).expect("connected");
        // b cannot walk back to a
        graph.nodes[1].connections.push(a.clone());

        let result = graph.validate();

        assert_eq!(
            result.errors,
            vec![Issue::UnjustifiedAdjacency { node: b, neighbor: a }]
        );
    }

    #[test]
    fn test_non_finite_position_is_error() {
        let mut graph = empty_graph();
        let a = add_with_panorama(&mut graph, 0.0);
        graph.nodes[0].position = Vec3::new(f64::NAN, f64::NAN, 0.0);

        let result = graph.validate();

        assert_eq!(result.errors, vec![Issue::NonFinitePosition { node: a }]);
    }

    #[test]
    fn test_duplicate_ids_are_errors() {
        let mut graph = empty_graph();
        add_with_panorama(&mut graph, 0.0);
        let copy = graph.nodes[0].clone();
        graph.nodes.push(copy.clone());

        let result = graph.validate();

        assert!(result.errors.contains(&Issue::DuplicateNodeId {
            node: copy.id
        }));
    }

    #[test]
    fn test_coincident_and_stale_connections_are_warnings() {
        let mut graph = empty_graph();
        let a = add_with_panorama(&mut graph, 0.0);
        let b = add_with_panorama(&mut graph, 0.0);
        let c = add_with_panorama(&mut graph, 3.0);
        let ab = graph.connect_nodes(&a, &b, true).expect("connected");
        let ac = graph.connect_nodes(&a, &c, true).expect("connected");
        graph
            .update_node(
                &c,
                NodePatch::default().position(Vec3::new(6.0, 0.0, 0.0)),
            )
            .expect("updated");

        let result = graph.validate();

        assert!(result.is_valid());
        assert!(result.warnings.contains(&Issue::CoincidentEndpoints {
            connection: ab.id
        }));
        assert!(result.warnings.iter().any(|w| matches!(
            w,
            Issue::StaleDistance { connection, .. } if *connection == ac.id
        )));
    }

    #[test]
    fn test_out_of_range_attribute_from_raw_data() {
        let mut graph = empty_graph();
        let a = add_with_panorama(&mut graph, 0.0);
        graph.nodes[0].rotation = 360.0;

        let result = graph.validate();

        assert_eq!(
            result.errors,
            vec![Issue::AttributeOutOfRange {
                node: a,
                field: "rotation",
                value: 360.0
            }]
        );
    }

    #[test]
    fn test_validate_does_not_mutate() {
        let mut graph = empty_graph();
        let a = add_with_panorama(&mut graph, 0.0);
        let b = add_with_panorama(&mut graph, 4.0);
        graph.connect_nodes(&a, &b, false).expect("connected");
        graph.nodes[1].connections.push(NodeId::from("x"));
        let before = graph.clone();

        let _ = graph.validate();

        assert_eq!(graph, before);
    }
}
