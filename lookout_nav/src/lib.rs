// lookout_nav: navigation graph and path search for the lookout belief core.
//
// This crate holds the parts of navigation the belief core consumes but does
// not own: the spatial types, the read-only navigation graph and its query
// interface, and shortest-path search with hard node exclusion.
//
// Module overview:
// - `types.rs`:       Vec3, Aabb, NavNodeId, NavEdgeId.
// - `nav.rs`:         NavGraph container, nearest-node and volume queries, JSON loading.
// - `pathfinding.rs`: Dijkstra search with blocked nodes + the `PathFinder` wrapper.
//
// The belief crate (`lookout_belief`) shares a `NavGraph` behind an `Arc` and
// never mutates it after construction.
//
// **Critical constraint: determinism.** Node/edge IDs are sequential integers
// assigned in insertion order, neighbor iteration follows insertion order, and
// blocked sets are `BTreeSet`s. Identical inputs give identical paths.

pub mod nav;
pub mod pathfinding;
pub mod types;

pub use nav::{NavError, NavGraph, NavGraphData};
pub use pathfinding::{BlockedNodes, PathFinder, PathResult};
pub use types::{Aabb, NavEdgeId, NavNodeId, Vec3};
