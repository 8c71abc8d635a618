// lookout_belief: belief state for an autonomous test agent.
//
// Folds periodic, partial, possibly-stale observations into a consistent
// model of the world: the entities seen so far and their state, which nav
// nodes closed obstacles currently block, and where the agent is along its
// current route. The decision layer reads everything through `BeliefState`.
//
// Module overview:
// - `belief.rs`:      BeliefState façade, per-tick update protocol, query surface.
// - `store.rs`:       EntityStore with the freshness-guarded merge.
// - `entity.rs`:      Entity record, kinds, typed properties, change detection.
// - `observation.rs`: Observation payload, JSON decoding, validation.
// - `blocking.rs`:    Per-entity node contributions and the blocked-node rebuild.
// - `mental_map.rs`:  NavMemory: route cache, waypoint progress, known nodes.
// - `config.rs`:      BeliefConfig loaded from JSON.
// - `error.rs`:       BeliefError.
//
// Navigation types and search live in the `lookout_nav` crate.
//
// **Critical constraint: determinism.** Entity storage and blocked sets are
// ordered collections, and ticks are assigned by `mark_observation` alone.
// Replaying the same observations gives the same belief.

pub mod belief;
pub mod blocking;
pub mod config;
pub mod entity;
pub mod error;
pub mod mental_map;
pub mod observation;
pub mod store;

pub use belief::BeliefState;
pub use config::{BeliefConfig, ConfigError};
pub use entity::{Entity, EntityKind, PropertyValue};
pub use error::BeliefError;
pub use mental_map::NavMemory;
pub use observation::Observation;
pub use store::{EntityStore, UpsertOutcome};
