// Entity store: the belief core's entity registry.
//
// Maps entity ID to the latest accepted `Entity` record. Records are merged,
// never deleted: an entity missing from an observation is "not reported this
// tick", not gone.
//
// ## Freshness guard
//
// `upsert(entity, tick)` is rejected when the stored record for that ID
// already has `last_updated >= tick`. Observations can arrive out of order or
// be replayed, and the guard guarantees the store never regresses to older
// data. Rejection is silent (`UpsertOutcome::Stale`), not an error.
//
// An accepted merge stamps the incoming entity with `tick`, aligns child IDs
// with their `elements` keys, links the old record as its one-generation
// history, and replaces the stored record.
//
// See also: `entity.rs` for the record and change detection, `belief.rs`
// which drives one upsert per reported entity per tick.
//
// **Critical constraint: determinism.** Storage is a `BTreeMap`, so every
// iteration (and every query built on one) is in ascending ID order.

use crate::entity::Entity;
use lookout_nav::Vec3;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// What `EntityStore::upsert` did with an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First record for this ID.
    Inserted,
    /// Replaced an older record; the old one is now the history.
    Updated,
    /// The stored record is as new or newer; nothing changed.
    Stale,
}

#[derive(Clone, Debug, Default)]
pub struct EntityStore {
    entities: BTreeMap<String, Entity>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freshness-guarded merge of `entity` observed at `tick`.
    pub fn upsert(&mut self, mut entity: Entity, tick: u64) -> UpsertOutcome {
        match self.entities.remove(&entity.id) {
            Some(old) if old.last_updated() >= tick => {
                self.entities.insert(old.id.clone(), old);
                UpsertOutcome::Stale
            }
            Some(old) => {
                entity.assign_timestamp(tick);
                entity.adopt_element_keys();
                entity.link_previous(old);
                self.entities.insert(entity.id.clone(), entity);
                UpsertOutcome::Updated
            }
            None => {
                entity.assign_timestamp(tick);
                entity.adopt_element_keys();
                self.entities.insert(entity.id.clone(), entity);
                UpsertOutcome::Inserted
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// True on first sighting or when the latest merge changed the state.
    /// Unknown IDs report `false`: nothing was observed, so nothing changed.
    pub fn changed(&self, id: &str) -> bool {
        self.entities.get(id).is_some_and(Entity::changed)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All records in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn interactive(&self) -> impl Iterator<Item = &Entity> {
        self.iter().filter(|e| e.is_interactable())
    }

    pub fn dynamic(&self) -> impl Iterator<Item = &Entity> {
        self.iter().filter(|e| e.is_dynamic())
    }
}

/// Sort fresher entities first, then nearer ones.
///
/// Age is `current_tick - last_updated`; ties are broken by straight-line
/// distance from `reference`. With no reference, only age is compared.
pub fn sort_by_age_and_distance(
    entities: &mut [&Entity],
    current_tick: u64,
    reference: Option<Vec3>,
) {
    entities.sort_by(|a, b| {
        let age_a = current_tick.saturating_sub(a.last_updated());
        let age_b = current_tick.saturating_sub(b.last_updated());
        age_a.cmp(&age_b).then_with(|| match reference {
            Some(r) => a
                .position
                .distance_squared(r)
                .total_cmp(&b.position.distance_squared(r)),
            None => Ordering::Equal,
        })
    });
}
