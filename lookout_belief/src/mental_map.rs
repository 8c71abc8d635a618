// NavMemory: the agent's mental map.
//
// Owns everything navigation-related that the agent has learned:
//
// - the current route cache: one entry keyed by goal position and the blocked
//   set it was computed against, plus the index of the next waypoint;
// - the set of nav nodes the agent has seen (monotonic: once known, a node
//   stays known), used to pick exploration frontiers;
// - the per-entity node contributions and the derived blocked-node set (see
//   `blocking.rs`);
// - the last reported agent position.
//
// ## Route cache
//
// `navigate` returns the cached outcome when the goal and the blocked set
// both match the cached entry, otherwise it searches again via
// `navigate_force`. The agent pursues one goal at a time, so a single entry
// is enough. Unreachable outcomes are cached too.
//
// See also: `lookout_nav::pathfinding` for the search, `belief.rs` which
// drives `update_known_vertices`/`update_current_waypoint` every tick.

use crate::blocking::{self, NodeContributions};
use crate::config::BeliefConfig;
use crate::entity::Entity;
use crate::store::EntityStore;
use lookout_nav::{BlockedNodes, NavNodeId, PathFinder, Vec3};
use rustc_hash::FxHashSet;
use tracing::debug;

/// The cached outcome of the last search.
#[derive(Clone, Debug)]
struct Route {
    goal: Vec3,
    blocked: BlockedNodes,
    /// `None` when the goal was unreachable.
    waypoints: Option<Vec<Vec3>>,
    next: usize,
}

#[derive(Clone, Debug)]
pub struct NavMemory {
    path_finder: PathFinder,
    route: Option<Route>,
    known_nodes: FxHashSet<NavNodeId>,
    position: Option<Vec3>,
    waypoint_tolerance: f32,
    contributions: NodeContributions,
    blocked: BlockedNodes,
}

impl NavMemory {
    pub fn new(path_finder: PathFinder, waypoint_tolerance: f32) -> Self {
        Self {
            path_finder,
            route: None,
            known_nodes: FxHashSet::default(),
            position: None,
            waypoint_tolerance,
            contributions: NodeContributions::new(),
            blocked: BlockedNodes::new(),
        }
    }

    pub fn path_finder(&self) -> &PathFinder {
        &self.path_finder
    }

    /// Search from scratch, ignoring the cache, and cache the outcome.
    pub fn navigate_force(
        &mut self,
        from: Vec3,
        to: Vec3,
        blocked: &BlockedNodes,
    ) -> Option<Vec<Vec3>> {
        let waypoints = self.path_finder.find_path(from, to, blocked);
        debug!(
            goal = %to,
            reachable = waypoints.is_some(),
            blocked = blocked.len(),
            "route_computed"
        );
        self.route = Some(Route {
            goal: to,
            blocked: blocked.clone(),
            waypoints: waypoints.clone(),
            next: 0,
        });
        waypoints
    }

    /// Cached search: reuse the last outcome if the goal and blocked set are
    /// unchanged.
    pub fn navigate(&mut self, from: Vec3, to: Vec3, blocked: &BlockedNodes) -> Option<Vec<Vec3>> {
        let cached = self
            .route
            .as_ref()
            .filter(|route| route.goal == to && route.blocked == *blocked);
        if let Some(route) = cached {
            return route.waypoints.clone();
        }
        self.navigate_force(from, to, blocked)
    }

    /// Mark `visible` nodes as known. Never forgets a node.
    pub fn update_known_vertices(&mut self, visible: &[NavNodeId]) {
        self.known_nodes.extend(visible.iter().copied());
    }

    /// Record the agent's position and advance past the next waypoint once
    /// the agent is within tolerance of it.
    pub fn update_current_waypoint(&mut self, position: Vec3) {
        self.position = Some(position);
        let tolerance_sq = self.waypoint_tolerance * self.waypoint_tolerance;
        let Some(route) = &mut self.route else {
            return;
        };
        let next = route
            .waypoints
            .as_ref()
            .and_then(|waypoints| waypoints.get(route.next).copied());
        if next.is_some_and(|next| position.distance_squared(next) < tolerance_sq) {
            route.next += 1;
        }
    }

    pub fn get_goal_location(&self) -> Option<Vec3> {
        self.route.as_ref().map(|r| r.goal)
    }

    /// The waypoint the agent should head to next; `None` once the route is
    /// finished, unreachable, or absent.
    pub fn get_next_waypoint(&self) -> Option<Vec3> {
        let route = self.route.as_ref()?;
        route.waypoints.as_ref()?.get(route.next).copied()
    }

    pub fn current_path(&self) -> Option<&[Vec3]> {
        self.route.as_ref()?.waypoints.as_deref()
    }

    pub fn current_position(&self) -> Option<Vec3> {
        self.position
    }

    /// Among the unknown, unblocked neighbours of the node nearest `start`,
    /// the one closest to `target`. Drives frontier exploration.
    pub fn get_unknown_neighbour_closest_to(
        &self,
        start: Vec3,
        target: Vec3,
        blocked: &BlockedNodes,
    ) -> Option<Vec3> {
        let graph = self.path_finder.graph();
        let origin = graph.find_nearest_node(start)?;
        graph
            .neighbors(origin)
            .iter()
            .map(|&idx| graph.edge(idx).to)
            .filter(|n| !self.known_nodes.contains(n) && !blocked.contains(n))
            .map(|n| graph.node(n).position)
            .min_by(|a, b| {
                a.distance_squared(target)
                    .total_cmp(&b.distance_squared(target))
            })
    }

    pub fn is_known(&self, node: NavNodeId) -> bool {
        self.known_nodes.contains(&node)
    }

    pub fn known_node_count(&self) -> usize {
        self.known_nodes.len()
    }

    /// Known nodes in ascending ID order.
    pub fn known_nodes(&self) -> Vec<NavNodeId> {
        let mut nodes: Vec<_> = self.known_nodes.iter().copied().collect();
        nodes.sort_unstable();
        nodes
    }

    // -----------------------------------------------------------------------
    // Blocked nodes
    // -----------------------------------------------------------------------

    pub fn blocked_nodes(&self) -> &BlockedNodes {
        &self.blocked
    }

    pub fn nodes_blocked_by_entity(&self, id: &str) -> &[NavNodeId] {
        self.contributions.get(id)
    }

    /// Recompute the nodes covered by `entity`.
    pub fn refresh_contribution(&mut self, entity: &Entity) {
        self.contributions
            .refresh(entity, self.path_finder.graph());
    }

    /// Rebuild the blocked set from scratch.
    pub fn recalculate_blocked_nodes(&mut self, store: &EntityStore, config: &BeliefConfig) {
        self.blocked = blocking::recompute_blocked_nodes(store, &self.contributions, config);
        debug!(blocked = self.blocked.len(), "blocked_nodes_recomputed");
    }
}
