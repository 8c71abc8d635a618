// BeliefState: the agent's accumulated model of the world.
//
// `BeliefState` owns the entity store, the mental map and the config, and is
// the only surface the decision layer talks to. Everything is derived from
// observations; there is no other input.
//
// ## Update protocol
//
// `mark_observation` runs once per agent tick, strictly sequentially:
//
//   1. Validate the observation and advance the tick by exactly one. The new
//      tick is returned to the caller.
//   2. Pre-merge change scan: did any reported interactive entity appear for
//      the first time or flip its on/open flag relative to the store?
//   3. Merge every reported entity with the freshness guard.
//   4. Refresh the node contribution of every reported interactive entity
//      from its stored (post-merge) bounding box.
//   5. Push the visible nav nodes and the agent position into the mental map.
//   6. If step 2 found a change, rebuild the blocked-node set.
//
// Step 6 is gated because the rebuild scans every known obstacle; when no
// interactive flag changed, the blocked set is left exactly as it was.
//
// ## Queries
//
// Identifier-based queries degrade gracefully for IDs that were never
// observed: `None`, `false`, or `f32::INFINITY` for distances. Reachability
// (`can_reach*`, `find_path_to`) always runs a fresh search, so it is not
// free.
//
// See also: `store.rs`, `mental_map.rs`, `blocking.rs`, `observation.rs`.
//
// **Critical constraint: single owner.** No interior mutability and no
// background work. Callers sharing a `BeliefState` across threads must
// serialize access themselves.

use crate::blocking;
use crate::config::BeliefConfig;
use crate::entity::Entity;
use crate::error::BeliefError;
use crate::mental_map::NavMemory;
use crate::observation::Observation;
use crate::store::{self, EntityStore, UpsertOutcome};
use lookout_nav::{BlockedNodes, NavGraph, NavNodeId, PathFinder, Vec3};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Clone, Debug)]
pub struct BeliefState {
    config: BeliefConfig,
    store: EntityStore,
    nav: NavMemory,
    /// Tick of the last accepted observation; `None` before the first.
    tick: Option<u64>,
    agent_id: String,
    position: Option<Vec3>,
    velocity: Option<Vec3>,
    did_nothing_previous_turn: bool,
}

impl BeliefState {
    pub fn new(graph: Arc<NavGraph>, config: BeliefConfig) -> Self {
        let nav = NavMemory::new(PathFinder::new(graph), config.waypoint_tolerance);
        Self {
            config,
            store: EntityStore::new(),
            nav,
            tick: None,
            agent_id: String::new(),
            position: None,
            velocity: None,
            did_nothing_previous_turn: false,
        }
    }

    // -----------------------------------------------------------------------
    // Update protocol
    // -----------------------------------------------------------------------

    /// Fold one observation into the belief. Returns the new tick.
    pub fn mark_observation(&mut self, observation: &Observation) -> Result<u64, BeliefError> {
        if let Err(error) = observation.validate() {
            warn!(%error, "observation_rejected");
            return Err(error);
        }

        let tick = self.tick.map_or(0, |t| t + 1);
        self.tick = Some(tick);
        self.agent_id.clone_from(&observation.agent_id);
        self.position = Some(observation.agent_position);
        self.velocity = Some(observation.velocity);
        self.did_nothing_previous_turn = observation.did_nothing;

        let any_changed = blocking::interactive_state_changed(&self.store, &observation.entities);

        for entity in &observation.entities {
            let outcome = self.store.upsert(entity.clone(), tick);
            if outcome == UpsertOutcome::Stale {
                trace!(id = %entity.id, tick, "stale_entity_dropped");
            }
            let stored = self.store.get(&entity.id).filter(|e| e.is_interactable());
            if let Some(stored) = stored {
                self.nav.refresh_contribution(stored);
            }
        }

        if let Some(visible) = &observation.nav_mesh_indices {
            self.nav.update_known_vertices(visible);
        }
        self.nav.update_current_waypoint(observation.agent_position);

        if any_changed {
            self.nav.recalculate_blocked_nodes(&self.store, &self.config);
        }

        debug!(
            tick,
            entities = observation.entities.len(),
            interactive_changed = any_changed,
            "observation_merged"
        );
        Ok(tick)
    }

    /// Decode and fold a JSON observation. A `null` payload is rejected.
    pub fn mark_observation_json(&mut self, value: &serde_json::Value) -> Result<u64, BeliefError> {
        let observation = match Observation::from_json_value(value) {
            Ok(observation) => observation,
            Err(error) => {
                warn!(%error, "observation_rejected");
                return Err(error);
            }
        };
        self.mark_observation(&observation)
    }

    // -----------------------------------------------------------------------
    // Agent
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &BeliefConfig {
        &self.config
    }

    /// Tick of the last accepted observation.
    pub fn tick(&self) -> Option<u64> {
        self.tick
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn position(&self) -> Option<Vec3> {
        self.position
    }

    pub fn velocity(&self) -> Option<Vec3> {
        self.velocity
    }

    pub fn did_nothing_previous_turn(&self) -> bool {
        self.did_nothing_previous_turn
    }

    pub fn nav(&self) -> &NavMemory {
        &self.nav
    }

    // -----------------------------------------------------------------------
    // Entity queries
    // -----------------------------------------------------------------------

    pub fn get_entity(&self, id: &str) -> Option<&Entity> {
        self.store.get(id)
    }

    /// The entity if it is interactive.
    pub fn get_interactive_entity(&self, id: &str) -> Option<&Entity> {
        self.store.get(id).filter(|e| e.is_interactable())
    }

    /// The entity if it is dynamic (interactive entities included).
    pub fn get_dynamic_entity(&self, id: &str) -> Option<&Entity> {
        self.store.get(id).filter(|e| e.is_dynamic())
    }

    pub fn entity_exists(&self, id: &str) -> bool {
        self.store.contains(id)
    }

    pub fn evaluate_entity(&self, id: &str, predicate: impl FnOnce(&Entity) -> bool) -> bool {
        self.store.get(id).is_some_and(predicate)
    }

    pub fn evaluate_interactive_entity(
        &self,
        id: &str,
        predicate: impl FnOnce(&Entity) -> bool,
    ) -> bool {
        self.get_interactive_entity(id).is_some_and(predicate)
    }

    /// See `EntityStore::changed`.
    pub fn changed(&self, id: &str) -> bool {
        self.store.changed(id)
    }

    pub fn known_entities(&self) -> Vec<&Entity> {
        self.store.iter().collect()
    }

    pub fn known_interactive_entities(&self) -> Vec<&Entity> {
        self.store.interactive().collect()
    }

    pub fn known_dynamic_entities(&self) -> Vec<&Entity> {
        self.store.dynamic().collect()
    }

    pub fn is_door(&self, entity: &Entity) -> bool {
        entity.is_interactable() && self.config.is_door_tag(&entity.tag)
    }

    pub fn is_button(&self, entity: &Entity) -> bool {
        entity.is_interactable() && self.config.is_button(&entity.id, &entity.tag)
    }

    pub fn known_buttons(&self) -> Vec<&Entity> {
        self.store.interactive().filter(|e| self.is_button(e)).collect()
    }

    /// Buttons, freshest first, then nearest to the agent.
    pub fn known_buttons_sorted_by_age_and_distance(&self) -> Vec<&Entity> {
        let mut buttons = self.known_buttons();
        self.sort_by_age_and_distance(&mut buttons);
        buttons
    }

    pub fn known_doors(&self) -> Vec<&Entity> {
        self.store.interactive().filter(|e| self.is_door(e)).collect()
    }

    /// Doors, freshest first, then nearest to the agent.
    pub fn known_doors_sorted_by_age_and_distance(&self) -> Vec<&Entity> {
        let mut doors = self.known_doors();
        self.sort_by_age_and_distance(&mut doors);
        doors
    }

    fn sort_by_age_and_distance(&self, entities: &mut [&Entity]) {
        store::sort_by_age_and_distance(entities, self.tick.unwrap_or(0), self.position);
    }

    /// True if the button is on. Unknown or non-interactive IDs are off.
    pub fn is_on(&self, id: &str) -> bool {
        self.get_interactive_entity(id)
            .and_then(Entity::is_active)
            .unwrap_or(false)
    }

    /// True if the door is open. Unknown or non-interactive IDs are closed.
    pub fn is_open(&self, id: &str) -> bool {
        self.is_on(id)
    }

    /// Ticks since the entity was last refreshed.
    pub fn age(&self, id: &str) -> Option<u64> {
        let tick = self.tick?;
        let entity = self.store.get(id)?;
        Some(tick.saturating_sub(entity.last_updated()))
    }

    /// True if the entity was refreshed by the latest observation.
    pub fn entity_is_up_to_date(&self, id: &str) -> bool {
        self.age(id) == Some(0)
    }

    /// Straight-line distance from the agent, ignoring reachability.
    pub fn distance_to(&self, id: &str) -> f32 {
        match (self.position, self.store.get(id)) {
            (Some(position), Some(entity)) => position.distance(entity.position),
            _ => f32::INFINITY,
        }
    }

    pub fn can_interact_with(&self, id: &str) -> bool {
        match (self.position, self.get_interactive_entity(id)) {
            (Some(position), Some(entity)) => {
                entity.can_interact(position, self.config.interaction_range)
            }
            _ => false,
        }
    }

    /// True if `q` is within `within_range` of the agent.
    pub fn within_range(&self, q: Vec3) -> bool {
        let range = self.config.within_range;
        self.position
            .is_some_and(|p| p.distance_squared(q) < range * range)
    }

    pub fn entity_within_range(&self, id: &str) -> bool {
        self.store
            .get(id)
            .is_some_and(|e| self.within_range(e.position))
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn blocked_nodes(&self) -> &BlockedNodes {
        self.nav.blocked_nodes()
    }

    pub fn nodes_blocked_by_entity(&self, id: &str) -> &[NavNodeId] {
        self.nav.nodes_blocked_by_entity(id)
    }

    /// A fresh route from the agent to `q`, or `None` if unreachable. Does not
    /// touch the route cache.
    pub fn can_reach_position(&self, q: Vec3) -> Option<Vec<Vec3>> {
        let from = self.position?;
        self.nav
            .path_finder()
            .find_path(from, q, self.nav.blocked_nodes())
    }

    /// A fresh route to the entity's position.
    pub fn can_reach(&self, id: &str) -> Option<Vec<Vec3>> {
        let target = self.store.get(id)?.position;
        self.can_reach_position(target)
    }

    /// Fresh search to `q`; becomes the current route.
    pub fn find_path_to(&mut self, q: Vec3) -> Option<Vec<Vec3>> {
        let from = self.position?;
        let blocked = self.nav.blocked_nodes().clone();
        self.nav.navigate_force(from, q, &blocked)
    }

    /// Route to `q`, reusing the current one if the goal and blocked set are
    /// unchanged.
    pub fn cached_find_path_to(&mut self, q: Vec3) -> Option<Vec<Vec3>> {
        let from = self.position?;
        let blocked = self.nav.blocked_nodes().clone();
        self.nav.navigate(from, q, &blocked)
    }

    pub fn get_goal_location(&self) -> Option<Vec3> {
        self.nav.get_goal_location()
    }

    pub fn get_next_waypoint(&self) -> Option<Vec3> {
        self.nav.get_next_waypoint()
    }

    pub fn get_unknown_neighbour_closest_to(&self, start: Vec3, target: Vec3) -> Option<Vec3> {
        self.nav
            .get_unknown_neighbour_closest_to(start, target, self.nav.blocked_nodes())
    }
}

/// Human-readable dump of the belief, one entity per line, for logs and the
/// replay tool.
impl fmt::Display for BeliefState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tick = self.tick.map_or_else(|| "-".to_string(), |t| t.to_string());
        let position = self
            .position
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        writeln!(
            f,
            "tick {tick}, agent '{}' at {position}, {} entities, {} blocked nodes",
            self.agent_id,
            self.store.len(),
            self.nav.blocked_nodes().len()
        )?;
        for entity in self.store.iter() {
            write!(f, "  {} [{}] at {}", entity.id, entity.tag, entity.position)?;
            match entity.is_active() {
                Some(true) => write!(f, " active")?,
                Some(false) => write!(f, " inactive")?,
                None => {}
            }
            writeln!(f, ", updated {}", entity.last_updated())?;
        }
        Ok(())
    }
}
