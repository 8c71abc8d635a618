// Navigation graph consumed by the belief core.
//
// The nav graph is a set of `NavNode`s (positions) connected by `NavEdge`s
// (weighted, undirected connections stored as two directed edges). It is
// built by an external loader, usually from the `NavGraphData` JSON form,
// and queried by `pathfinding.rs` and by the belief core for nearest-node
// lookup and for the "which nodes does this volume cover" test.
//
// All storage uses `Vec` indexed by `NavNodeId`/`NavEdgeId` for O(1) lookup
// and deterministic iteration order. No `HashMap`.
//
// See also: `pathfinding.rs` for the search over this graph, `types.rs` for
// `Vec3`/`Aabb`.
//
// **Critical constraint: determinism.** Node/edge IDs are sequential integers
// assigned in insertion order, and `neighbors()` yields edges in the order
// they were added. Path tie-breaking relies on that order.

use crate::pathfinding::BlockedNodes;
use crate::types::{Aabb, NavEdgeId, NavNodeId, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A node in the navigation graph, a walkable point.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavNode {
    pub id: NavNodeId,
    pub position: Vec3,
    /// Indices into `NavGraph.edges` for edges that originate from this node.
    pub edge_indices: Vec<usize>,
}

/// A directed edge in the navigation graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavEdge {
    pub id: NavEdgeId,
    pub from: NavNodeId,
    pub to: NavNodeId,
    /// Non-negative traversal cost.
    pub cost: f32,
}

/// Errors raised while building a graph from external data.
#[derive(Debug, Error, PartialEq)]
pub enum NavError {
    #[error("edge {index} references unknown node {node}")]
    UnknownNode { index: usize, node: u32 },
    #[error("edge {index} has invalid cost {cost}")]
    InvalidCost { index: usize, cost: f32 },
    #[error("node {index} has a non-finite position")]
    InvalidPosition { index: usize },
    #[error("nav graph JSON is malformed: {0}")]
    Malformed(String),
}

/// Interchange form of a graph: node positions in ID order plus an
/// undirected edge list.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NavGraphData {
    pub nodes: Vec<Vec3>,
    pub edges: Vec<EdgeData>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EdgeData {
    pub from: u32,
    pub to: u32,
    pub cost: f32,
}

/// The navigation graph container.
#[derive(Clone, Debug, Default)]
pub struct NavGraph {
    pub nodes: Vec<NavNode>,
    pub edges: Vec<NavEdge>,
}

impl NavGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from interchange data, validating node positions, edge
    /// endpoints and costs.
    pub fn from_data(data: &NavGraphData) -> Result<Self, NavError> {
        let mut graph = NavGraph::new();
        for (index, &position) in data.nodes.iter().enumerate() {
            if !position.is_finite() {
                return Err(NavError::InvalidPosition { index });
            }
            graph.add_node(position);
        }
        for (index, edge) in data.edges.iter().enumerate() {
            for node in [edge.from, edge.to] {
                if node as usize >= graph.node_count() {
                    return Err(NavError::UnknownNode { index, node });
                }
            }
            if !edge.cost.is_finite() || edge.cost < 0.0 {
                return Err(NavError::InvalidCost {
                    index,
                    cost: edge.cost,
                });
            }
            graph.add_edge(NavNodeId(edge.from), NavNodeId(edge.to), edge.cost);
        }
        Ok(graph)
    }

    /// Parse and validate a graph from its JSON interchange form.
    pub fn from_json(json: &str) -> Result<Self, NavError> {
        let data: NavGraphData =
            serde_json::from_str(json).map_err(|e| NavError::Malformed(e.to_string()))?;
        Self::from_data(&data)
    }

    /// Add a node at the given position. Returns its ID.
    pub fn add_node(&mut self, position: Vec3) -> NavNodeId {
        let id = NavNodeId(self.nodes.len() as u32);
        self.nodes.push(NavNode {
            id,
            position,
            edge_indices: Vec::new(),
        });
        id
    }

    /// Add a bidirectional edge between two nodes. Returns the edge ID of the
    /// forward (from -> to) edge.
    pub fn add_edge(&mut self, from: NavNodeId, to: NavNodeId, cost: f32) -> NavEdgeId {
        let forward_id = NavEdgeId(self.edges.len() as u32);
        let reverse_id = NavEdgeId(self.edges.len() as u32 + 1);

        let forward_idx = self.edges.len();
        self.edges.push(NavEdge {
            id: forward_id,
            from,
            to,
            cost,
        });

        let reverse_idx = self.edges.len();
        self.edges.push(NavEdge {
            id: reverse_id,
            from: to,
            to: from,
            cost,
        });

        self.nodes[from.0 as usize].edge_indices.push(forward_idx);
        self.nodes[to.0 as usize].edge_indices.push(reverse_idx);

        forward_id
    }

    /// Get all edges originating from a node.
    pub fn neighbors(&self, node: NavNodeId) -> &[usize] {
        &self.nodes[node.0 as usize].edge_indices
    }

    /// Get a node by ID.
    pub fn node(&self, id: NavNodeId) -> &NavNode {
        &self.nodes[id.0 as usize]
    }

    /// Get an edge by index.
    pub fn edge(&self, idx: usize) -> &NavEdge {
        &self.edges[idx]
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NavNodeId) -> bool {
        (id.0 as usize) < self.nodes.len()
    }

    /// Position of a node, or `None` for an ID outside the graph.
    pub fn position(&self, id: NavNodeId) -> Option<Vec3> {
        self.nodes.get(id.0 as usize).map(|n| n.position)
    }

    /// Find the nearest node to a given position (by Euclidean distance).
    /// Returns `None` if the graph is empty.
    pub fn find_nearest_node(&self, pos: Vec3) -> Option<NavNodeId> {
        self.nodes
            .iter()
            .min_by(|a, b| {
                a.position
                    .distance_squared(pos)
                    .total_cmp(&b.position.distance_squared(pos))
            })
            .map(|n| n.id)
    }

    /// Like `find_nearest_node`, but ignores nodes in `blocked`.
    pub fn find_nearest_node_excluding(
        &self,
        pos: Vec3,
        blocked: &BlockedNodes,
    ) -> Option<NavNodeId> {
        self.nodes
            .iter()
            .filter(|n| !blocked.contains(&n.id))
            .min_by(|a, b| {
                a.position
                    .distance_squared(pos)
                    .total_cmp(&b.position.distance_squared(pos))
            })
            .map(|n| n.id)
    }

    /// All nodes whose position lies inside `volume`, in ascending ID order.
    pub fn nodes_in_volume(&self, volume: &Aabb) -> Vec<NavNodeId> {
        self.nodes
            .iter()
            .filter(|n| volume.contains(n.position))
            .map(|n| n.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_node_assigns_sequential_ids() {
        let mut graph = NavGraph::new();
        let a = graph.add_node(Vec3::new(0.0, 0.0, 0.0));
        let b = graph.add_node(Vec3::new(1.0, 0.0, 0.0));
        let c = graph.add_node(Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(a, NavNodeId(0));
        assert_eq!(b, NavNodeId(1));
        assert_eq!(c, NavNodeId(2));
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn add_edge_creates_bidirectional() {
        let mut graph = NavGraph::new();
        let a = graph.add_node(Vec3::new(0.0, 0.0, 0.0));
        let b = graph.add_node(Vec3::new(5.0, 0.0, 0.0));
        graph.add_edge(a, b, 5.0);

        let a_edges: Vec<_> = graph
            .neighbors(a)
            .iter()
            .map(|&idx| graph.edge(idx).to)
            .collect();
        assert_eq!(a_edges, vec![b]);

        let b_edges: Vec<_> = graph
            .neighbors(b)
            .iter()
            .map(|&idx| graph.edge(idx).to)
            .collect();
        assert_eq!(b_edges, vec![a]);
    }

    #[test]
    fn find_nearest_node_works() {
        let mut graph = NavGraph::new();
        graph.add_node(Vec3::new(0.0, 0.0, 0.0));
        graph.add_node(Vec3::new(10.0, 0.0, 0.0));
        graph.add_node(Vec3::new(5.0, 5.0, 0.0));

        let nearest = graph.find_nearest_node(Vec3::new(4.0, 4.0, 0.0));
        assert_eq!(nearest, Some(NavNodeId(2)));
    }

    #[test]
    fn find_nearest_node_empty_graph() {
        let graph = NavGraph::new();
        assert_eq!(graph.find_nearest_node(Vec3::ZERO), None);
    }

    #[test]
    fn find_nearest_node_excluding_skips_blocked() {
        let mut graph = NavGraph::new();
        let a = graph.add_node(Vec3::new(0.0, 0.0, 0.0));
        let b = graph.add_node(Vec3::new(3.0, 0.0, 0.0));
        let blocked: BlockedNodes = [a].into_iter().collect();
        assert_eq!(
            graph.find_nearest_node_excluding(Vec3::new(0.1, 0.0, 0.0), &blocked),
            Some(b)
        );
        let everything: BlockedNodes = [a, b].into_iter().collect();
        assert_eq!(graph.find_nearest_node_excluding(Vec3::ZERO, &everything), None);
    }

    #[test]
    fn nodes_in_volume_returns_sorted_covered_nodes() {
        let mut graph = NavGraph::new();
        for x in 0..6 {
            graph.add_node(Vec3::new(x as f32, 0.0, 0.0));
        }
        let volume = Aabb::from_center_extent(Vec3::new(4.5, 0.0, 0.0), Vec3::new(0.5, 0.5, 0.5));
        assert_eq!(graph.nodes_in_volume(&volume), vec![NavNodeId(4), NavNodeId(5)]);
    }

    #[test]
    fn from_json_builds_graph() {
        let json = r#"{
            "nodes": [{"x":0,"y":0,"z":0},{"x":1,"y":0,"z":0},{"x":2,"y":0,"z":0}],
            "edges": [{"from":0,"to":1,"cost":1.0},{"from":1,"to":2,"cost":1.0}]
        }"#;
        let graph = NavGraph::from_json(json).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edges.len(), 4);
        assert_eq!(graph.position(NavNodeId(2)), Some(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn from_data_rejects_unknown_endpoint() {
        let data = NavGraphData {
            nodes: vec![Vec3::ZERO],
            edges: vec![EdgeData {
                from: 0,
                to: 3,
                cost: 1.0,
            }],
        };
        assert_eq!(
            NavGraph::from_data(&data).unwrap_err(),
            NavError::UnknownNode { index: 0, node: 3 }
        );
    }

    #[test]
    fn from_data_rejects_negative_cost() {
        let data = NavGraphData {
            nodes: vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)],
            edges: vec![EdgeData {
                from: 0,
                to: 1,
                cost: -2.0,
            }],
        };
        assert!(matches!(
            NavGraph::from_data(&data),
            Err(NavError::InvalidCost { index: 0, .. })
        ));
    }

    #[test]
    fn from_json_reports_malformed_input() {
        assert!(matches!(
            NavGraph::from_json("{\"nodes\": 3}"),
            Err(NavError::Malformed(_))
        ));
    }
}
