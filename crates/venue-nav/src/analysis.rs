// Whole-graph queries that go through petgraph: summary statistics and
// shortest walkable routes.

use crate::error::GraphError;
use crate::graph_state::{NavGraph, NodeId};
use petgraph::algo::{astar, connected_components};
use petgraph::graph::{DiGraph, NodeIndex, UnGraph};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub node_count: usize,
    pub connection_count: usize,
    pub bidirectional_count: usize,
    pub isolated_nodes: usize,
    pub nodes_without_panorama: usize,
    pub total_distance: f64,
    pub mean_distance: Option<f64>,
    /// Connected components, ignoring direction.
    pub components: usize,
}

pub fn stats(graph: &NavGraph) -> GraphStats {
    let index: HashMap<&NodeId, usize> = graph
        .nodes()
        .iter()
        .enumerate()
        .map(|(i, n)| (&n.id, i))
        .collect();

    let mut undirected: UnGraph<(), ()> =
        UnGraph::with_capacity(graph.nodes().len(), graph.connections().len());
    for _ in graph.nodes() {
        undirected.add_node(());
    }
    let mut degree = vec![0usize; graph.nodes().len()];
    for c in graph.connections() {
        if let (Some(&a), Some(&b)) =
            (index.get(&c.from_node_id), index.get(&c.to_node_id))
        {
            undirected.add_edge(NodeIndex::new(a), NodeIndex::new(b), ());
            degree[a] += 1;
            degree[b] += 1;
        }
    }

    let connection_count = graph.connections().len();
    let total_distance: f64 =
        graph.connections().iter().map(|c| c.distance).sum();

    GraphStats {
        node_count: graph.nodes().len(),
        connection_count,
        bidirectional_count: graph
            .connections()
            .iter()
            .filter(|c| c.bidirectional)
            .count(),
        isolated_nodes: degree.iter().filter(|d| **d == 0).count(),
        nodes_without_panorama: graph
            .nodes()
            .iter()
            .filter(|n| n.panorama_url.as_deref().is_none_or(str::is_empty))
            .count(),
        total_distance,
        mean_distance: (connection_count > 0)
            .then(|| total_distance / connection_count as f64),
        components: connected_components(&undirected),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub nodes: Vec<NodeId>,
    pub distance: f64,
}

/// Shortest walkable route between two nodes over stored connection
/// distances. `Ok(None)` when `to` is unreachable from `from`.
pub fn route(
    graph: &NavGraph,
    from: &NodeId,
    to: &NodeId,
) -> Result<Option<Route>, GraphError> {
    let mut walk: DiGraph<NodeId, f64> = DiGraph::new();
    let mut index = HashMap::new();
    for node in graph.nodes() {
        index.insert(&node.id, walk.add_node(node.id.clone()));
    }
    let start = *index
        .get(from)
        .ok_or_else(|| GraphError::NotFound(from.clone()))?;
    let goal = *index
        .get(to)
        .ok_or_else(|| GraphError::NotFound(to.clone()))?;

    for c in graph.connections() {
        let (Some(&a), Some(&b)) =
            (index.get(&c.from_node_id), index.get(&c.to_node_id))
        else {
            continue;
        };
        walk.add_edge(a, b, c.distance);
        if c.bidirectional {
            walk.add_edge(b, a, c.distance);
        }
    }

    let found = astar(
        &walk,
        start,
        |n| n == goal,
        |e| *e.weight(),
        |_| 0.0,
    );

    Ok(found.map(|(distance, path)| Route {
        nodes: path.into_iter().map(|i| walk[i].clone()).collect(),
        distance,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_state::NodePatch;
    use panorama::Vec3;

    fn line_graph() -> (NavGraph, Vec<NodeId>) {
        let mut graph = NavGraph::new("v", "f", "line");
        let ids: Vec<NodeId> = [0.0, 3.0, 7.0, 20.0]
            .into_iter()
            .map(|x| {
                graph
                    .create_node(Vec3::new(x, 0.0, 0.0), NodePatch::default())
                    .expect("node is created")
                    .id
            })
            .collect();
        graph.connect_nodes(&ids[0], &ids[1], true).expect("connected");
        graph.connect_nodes(&ids[1], &ids[2], false).expect("connected");
        (graph, ids)
    }

    #[test]
    fn test_stats_counts() {
        let (graph, _) = line_graph();

        let s = stats(&graph);

        assert_eq!(s.node_count, 4);
        assert_eq!(s.connection_count, 2);
        assert_eq!(s.bidirectional_count, 1);
        assert_eq!(s.isolated_nodes, 1);
        assert_eq!(s.nodes_without_panorama, 4);
        assert!((s.total_distance - 7.0).abs() < 1e-9);
        assert_eq!(s.mean_distance, Some(3.5));
        assert_eq!(s.components, 2, "line plus one isolated node");
    }

    #[test]
    fn test_stats_empty_graph() {
        let s = stats(&NavGraph::new("v", "f", "empty"));
        assert_eq!(s.components, 0);
        assert_eq!(s.mean_distance, None);
    }

    #[test]
    fn test_route_follows_direction() {
        let (graph, ids) = line_graph();

        let forward = route(&graph, &ids[0], &ids[2])
            .expect("endpoints exist")
            .expect("reachable");
        assert_eq!(forward.nodes, vec![
            ids[0].clone(),
            ids[1].clone(),
            ids[2].clone()
        ]);
        assert!((forward.distance - 7.0).abs() < 1e-9);

        let backward = route(&graph, &ids[2], &ids[0]).expect("endpoints exist");
        assert_eq!(backward, None, "directed leg cannot be walked back");
    }

    #[test]
    fn test_route_prefers_shorter_total() {
        let (mut graph, ids) = line_graph();
        // long detour through the far node
        graph.connect_nodes(&ids[0], &ids[3], true).expect("connected");
        graph.connect_nodes(&ids[3], &ids[2], true).expect("connected");

        let r = route(&graph, &ids[0], &ids[2])
            .expect("endpoints exist")
            .expect("reachable");

        assert_eq!(r.nodes.len(), 3);
    }

    #[test]
    fn test_route_unknown_endpoint() {
        let (graph, ids) = line_graph();
        let missing = NodeId::from("missing");

        assert_eq!(
            route(&graph, &ids[0], &missing),
            Err(GraphError::NotFound(missing))
        );
    }

    #[test]
    fn test_route_to_self_is_trivial() {
        let (graph, ids) = line_graph();

        let r = route(&graph, &ids[3], &ids[3])
            .expect("endpoints exist")
            .expect("reachable");

        assert_eq!(r.nodes, vec![ids[3].clone()]);
        assert_eq!(r.distance, 0.0);
    }
}
