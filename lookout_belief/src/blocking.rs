// Blocked nav nodes derived from closed obstacles.
//
// Two pieces of state feed path search exclusion:
//
// - `NodeContributions`: per entity ID, the nav nodes that entity's bounding
//   box covers. Refreshed for every interactive entity each time it is
//   reported, and kept across ticks otherwise.
// - The blocked set itself, which is never patched. `recompute_blocked_nodes`
//   rebuilds it from scratch as a pure function of the store, the
//   contribution cache and the config: a node is blocked iff some
//   interactive entity with an obstacle tag is inactive (closed) and covers
//   it. Non-obstacle interactives (buttons) never block.
//
// `interactive_state_changed` is the gate that decides whether a recompute is
// needed at all. It compares incoming interactive entities against the store
// *before* the merge, and treats a never-seen ID as a change.
//
// See also: `mental_map.rs` which owns both caches, `belief.rs` which runs the
// per-tick protocol.

use crate::config::BeliefConfig;
use crate::entity::Entity;
use crate::store::EntityStore;
use lookout_nav::{BlockedNodes, NavGraph, NavNodeId};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Nodes covered by one entity. Doors rarely cover more than a handful.
pub type Contribution = SmallVec<[NavNodeId; 8]>;

#[derive(Clone, Debug, Default)]
pub struct NodeContributions {
    by_entity: BTreeMap<String, Contribution>,
}

impl NodeContributions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute `entity`'s contribution from its current bounding box,
    /// overwriting any previous one.
    pub fn refresh(&mut self, entity: &Entity, graph: &NavGraph) {
        let nodes = graph.nodes_in_volume(&entity.bounding_box());
        self.by_entity
            .insert(entity.id.clone(), Contribution::from_vec(nodes));
    }

    /// Nodes contributed by `id`; empty for unknown IDs.
    pub fn get(&self, id: &str) -> &[NavNodeId] {
        self.by_entity.get(id).map(|c| c.as_slice()).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[NavNodeId])> {
        self.by_entity
            .iter()
            .map(|(id, nodes)| (id.as_str(), nodes.as_slice()))
    }
}

/// True if `entity` is a closed obstacle.
pub fn is_blocking(entity: &Entity, config: &BeliefConfig) -> bool {
    entity.is_active() == Some(false) && config.is_obstacle_tag(&entity.tag)
}

/// Rebuild the blocked-node set from scratch.
pub fn recompute_blocked_nodes(
    store: &EntityStore,
    contributions: &NodeContributions,
    config: &BeliefConfig,
) -> BlockedNodes {
    contributions
        .iter()
        .filter(|(id, _)| store.get(id).is_some_and(|e| is_blocking(e, config)))
        .flat_map(|(_, nodes)| nodes.iter().copied())
        .collect()
}

/// True if any interactive entity in `incoming` is new to the store or has a
/// different on/open flag than its stored record.
pub fn interactive_state_changed(store: &EntityStore, incoming: &[Entity]) -> bool {
    incoming.iter().any(|entity| match entity.is_active() {
        None => false,
        Some(active) => store.get(&entity.id).and_then(Entity::is_active) != Some(active),
    })
}
