// Shortest-path search over the navigation graph.
//
// Implements Dijkstra's algorithm using a `BinaryHeap` (min-heap via reversed
// ordering). Node scores and came-from data are stored in `Vec`s indexed by
// `NavNodeId` for O(1) access and deterministic behavior (no `HashMap`).
//
// Blocked nodes are a hard exclusion: they are never pushed onto the open
// set, so a path can never pass through one, no matter how expensive the
// detour. A blocked start or goal means there is no path.
//
// `PathFinder` wraps a shared graph and answers world-space queries: it snaps
// the endpoints to graph nodes, runs the search, and returns waypoint
// positions.
//
// See also: `nav.rs` for the `NavGraph` being searched. The belief crate's
// `mental_map.rs` caches `PathFinder` results per goal.
//
// **Critical constraint: determinism.** Search is a pure function of graph,
// endpoints and blocked set. Costs compare with `total_cmp`, heap ties break
// on node ID, and equal-cost relaxations keep the first parent found in
// neighbor insertion order.

use crate::nav::NavGraph;
use crate::types::{NavNodeId, Vec3};
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};
use std::sync::Arc;

/// Set of nodes excluded from path search.
pub type BlockedNodes = BTreeSet<NavNodeId>;

/// The result of a successful search.
#[derive(Clone, Debug, PartialEq)]
pub struct PathResult {
    /// Sequence of node IDs from start to goal (inclusive).
    pub nodes: Vec<NavNodeId>,
    /// Total traversal cost.
    pub total_cost: f32,
}

/// Entry in the open set (min-heap via reversed ordering).
struct OpenEntry {
    node: NavNodeId,
    cost: f32,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost.total_cmp(&other.cost) == Ordering::Equal && self.node == other.node
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap: smallest cost is "greatest".
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.0.cmp(&self.node.0))
    }
}

/// Find the cheapest path from `start` to `goal` that avoids every node in
/// `blocked`.
///
/// Returns `None` if no such path exists, if either endpoint is blocked, or
/// if either endpoint is outside the graph.
pub fn shortest_path(
    graph: &NavGraph,
    start: NavNodeId,
    goal: NavNodeId,
    blocked: &BlockedNodes,
) -> Option<PathResult> {
    let n = graph.node_count();
    if !graph.contains(start) || !graph.contains(goal) {
        return None;
    }
    if blocked.contains(&start) || blocked.contains(&goal) {
        return None;
    }
    if start == goal {
        return Some(PathResult {
            nodes: vec![start],
            total_cost: 0.0,
        });
    }

    // dist[node] = cost of cheapest known path from start to node.
    let mut dist = vec![f32::INFINITY; n];
    let mut came_from: Vec<Option<NavNodeId>> = vec![None; n];
    let mut closed = vec![false; n];

    dist[start.0 as usize] = 0.0;

    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        node: start,
        cost: 0.0,
    });

    while let Some(current) = open.pop() {
        let current_id = current.node;
        let ci = current_id.0 as usize;

        if current_id == goal {
            return Some(reconstruct_path(&came_from, start, goal, dist[ci]));
        }

        if closed[ci] {
            continue;
        }
        closed[ci] = true;

        let current_dist = dist[ci];

        for &edge_idx in graph.neighbors(current_id) {
            let edge = graph.edge(edge_idx);
            let neighbor = edge.to;
            let ni = neighbor.0 as usize;

            if closed[ni] || blocked.contains(&neighbor) {
                continue;
            }

            let tentative = current_dist + edge.cost;

            if tentative < dist[ni] {
                dist[ni] = tentative;
                came_from[ni] = Some(current_id);
                open.push(OpenEntry {
                    node: neighbor,
                    cost: tentative,
                });
            }
        }
    }

    None
}

/// Reconstruct the path from came_from data.
fn reconstruct_path(
    came_from: &[Option<NavNodeId>],
    start: NavNodeId,
    goal: NavNodeId,
    total_cost: f32,
) -> PathResult {
    let mut nodes = Vec::new();
    let mut current = goal;

    loop {
        nodes.push(current);
        if current == start {
            break;
        }
        match came_from[current.0 as usize] {
            Some(prev) => current = prev,
            None => break,
        }
    }

    nodes.reverse();
    PathResult { nodes, total_cost }
}

/// World-space path queries over a shared, read-only graph.
#[derive(Clone, Debug)]
pub struct PathFinder {
    graph: Arc<NavGraph>,
}

impl PathFinder {
    pub fn new(graph: Arc<NavGraph>) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &NavGraph {
        &self.graph
    }

    /// Find a route from `from` to `to` that avoids `blocked`.
    ///
    /// The start snaps to the nearest unblocked node (an agent standing next
    /// to a closed door can still walk away from it); the goal snaps to the
    /// nearest node overall, so a goal inside a blocked region is
    /// unreachable. The route is the positions of the visited nodes.
    pub fn find_path(&self, from: Vec3, to: Vec3, blocked: &BlockedNodes) -> Option<Vec<Vec3>> {
        let start = self.graph.find_nearest_node_excluding(from, blocked)?;
        let goal = self.graph.find_nearest_node(to)?;
        let result = shortest_path(&self.graph, start, goal, blocked)?;
        Some(
            result
                .nodes
                .iter()
                .map(|&id| self.graph.node(id).position)
                .collect(),
        )
    }
}
