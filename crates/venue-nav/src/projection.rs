use crate::graph_state::{ConnectionId, NavGraph, NodeId};
use panorama::bearing_between;
use serde::Serialize;
use tracing::warn;

/// Placement of one walkable neighbour as seen from the current node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborBearing {
    pub neighbor: NodeId,
    pub connection: ConnectionId,
    pub yaw: f64,
    pub pitch: f64,
    pub distance: f64,
}

/// Bearings from `current` to every neighbour reachable over one
/// connection, in connection order. A connection leaving `current` is
/// always walkable; one arriving at it only when bidirectional, so a
/// neighbour joined twice shows up twice.
///
/// Neighbours sharing `current`'s position have no direction and are
/// skipped. An unknown `current` yields an empty list.
pub fn neighbor_bearings(
    graph: &NavGraph,
    current: &NodeId,
) -> Vec<NeighborBearing> {
    let Some(origin) = graph.node(current) else {
        return Vec::new();
    };

    graph
        .traversals_from(current)
        .filter_map(|(connection, neighbor_id)| {
            let neighbor = graph.node(neighbor_id)?;
            let Some(bearing) =
                bearing_between(origin.position, neighbor.position)
            else {
                warn!(
                    node = %current,
                    neighbor = %neighbor_id,
                    "neighbour coincides with current node, no hotspot"
                );
                return None;
            };
            Some(NeighborBearing {
                neighbor: neighbor_id.clone(),
                connection: connection.id.clone(),
                yaw: bearing.yaw,
                pitch: bearing.pitch,
                distance: bearing.distance,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_state::NodePatch;
    use panorama::Vec3;

    const EPS: f64 = 1e-9;

    fn graph_with(points: &[(f64, f64, f64)]) -> (NavGraph, Vec<NodeId>) {
        let mut graph = NavGraph::new("v", "f", "projection");
        let ids = points
            .iter()
            .map(|p| {
                graph
                    .create_node(Vec3::from(*p), NodePatch::default())
                    .expect("node is created")
                    .id
            })
            .collect();
        (graph, ids)
    }

    #[test]
    fn test_neighbor_along_x_axis() {
        let (mut graph, ids) = graph_with(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0)]);
        graph.connect_nodes(&ids[0], &ids[1], true).expect("connected");

        let bearings = neighbor_bearings(&graph, &ids[0]);

        assert_eq!(bearings.len(), 1);
        let b = &bearings[0];
        assert_eq!(b.neighbor, ids[1]);
        assert!(b.yaw.abs() < EPS, "yaw was {}", b.yaw);
        assert!(b.pitch.abs() < EPS, "pitch was {}", b.pitch);
        assert!((b.distance - 1.0).abs() < EPS);
    }

    #[test]
    fn test_neighbor_directly_above_has_negative_pitch() {
        // viewer convention: a rise points the gaze up, which the
        // renderer frame expresses as negative pitch
        let (mut graph, ids) = graph_with(&[(0.0, 0.0, 0.0), (0.0, 0.0, 1.0)]);
        graph.connect_nodes(&ids[0], &ids[1], true).expect("connected");

        let bearings = neighbor_bearings(&graph, &ids[0]);

        assert!((bearings[0].pitch + 90.0).abs() < EPS);
    }

    #[test]
    fn test_directed_connection_only_seen_from_source() {
        let (mut graph, ids) = graph_with(&[(0.0, 0.0, 0.0), (2.0, 0.0, 0.0)]);
        graph.connect_nodes(&ids[0], &ids[1], false).expect("connected");

        assert_eq!(neighbor_bearings(&graph, &ids[0]).len(), 1);
        assert!(
            neighbor_bearings(&graph, &ids[1]).is_empty(),
            "directed connection must not be walkable backwards"
        );
    }

    #[test]
    fn test_reverse_traversal_points_back() {
        let (mut graph, ids) = graph_with(&[(0.0, 0.0, 0.0), (2.0, 0.0, 0.0)]);
        graph.connect_nodes(&ids[0], &ids[1], true).expect("connected");

        let back = neighbor_bearings(&graph, &ids[1]);

        assert_eq!(back[0].neighbor, ids[0]);
        assert!((back[0].yaw - 180.0).abs() < EPS);
    }

    #[test]
    fn test_one_entry_per_traversal() {
        let (mut graph, ids) = graph_with(&[(0.0, 0.0, 0.0), (0.0, 5.0, 0.0)]);
        graph.connect_nodes(&ids[0], &ids[1], true).expect("connected");
        graph.connect_nodes(&ids[1], &ids[0], true).expect("connected");

        let bearings = neighbor_bearings(&graph, &ids[0]);

        assert_eq!(bearings.len(), 2);
        assert!(bearings.iter().all(|b| b.neighbor == ids[1]));
        assert_ne!(bearings[0].connection, bearings[1].connection);
    }

    #[test]
    fn test_coincident_neighbor_is_skipped() {
        let (mut graph, ids) = graph_with(&[
            (1.0, 1.0, 0.0),
            (1.0, 1.0, 0.0),
            (4.0, 5.0, 0.0),
        ]);
        graph.connect_nodes(&ids[0], &ids[1], true).expect("connected");
        graph.connect_nodes(&ids[0], &ids[2], true).expect("connected");

        let bearings = neighbor_bearings(&graph, &ids[0]);

        assert_eq!(bearings.len(), 1);
        assert_eq!(bearings[0].neighbor, ids[2]);
        assert!((bearings[0].distance - 5.0).abs() < EPS);
    }

    #[test]
    fn test_unknown_current_node() {
        let (graph, _) = graph_with(&[(0.0, 0.0, 0.0)]);
        assert!(neighbor_bearings(&graph, &NodeId::from("nope")).is_empty());
    }
}
