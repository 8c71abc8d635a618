// Entity model: one perceived entity as the belief core remembers it.
//
// An `Entity` is a shared base record (identity, geometry, properties,
// nested child entities) plus an `EntityKind` carrying the capability-specific
// state. Capability checks are `match`es on the kind, never per-type
// overrides: an interactive entity is one whose kind is `Interactive`, and
// its on/open flag lives inside that variant.
//
// Each stored entity keeps exactly one generation of history in `previous`,
// used only for change detection. `link_previous` clears the predecessor's
// own history before attaching it, so `previous.previous` is always `None`.
//
// See also: `store.rs` which performs the freshness-guarded merge that links
// history, `blocking.rs` which turns interactive entities into blocked nav
// nodes, `observation.rs` for the wire form entities arrive in.

use crate::error::BeliefError;
use lookout_nav::{Aabb, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Capability-specific part of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EntityKind {
    /// Static scenery or anything without runtime state.
    Generic,
    /// State may change at runtime, but the agent cannot act on it.
    Dynamic,
    /// Can be interacted with. `is_active` is on for buttons, open for doors.
    #[serde(rename_all = "camelCase")]
    Interactive { is_active: bool },
}

/// A typed property value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Opaque(serde_json::Value),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Int(i) => write!(f, "{i}"),
            PropertyValue::Str(s) => f.write_str(s),
            PropertyValue::Opaque(v) => write!(f, "{v}"),
        }
    }
}

/// A perceived entity.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    /// Category tag, e.g. "Door".
    pub tag: String,
    pub kind: EntityKind,
    /// Centre of the entity.
    pub position: Vec3,
    /// Half-size of the bounding box along each axis.
    #[serde(default)]
    pub extent: Vec3,
    /// Present for moving entities, even when the magnitude is zero.
    #[serde(default)]
    pub velocity: Option<Vec3>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    /// Nested child entities. The map key is the child's ID; a mismatching
    /// `id` inside the child is overwritten on merge.
    #[serde(default)]
    pub elements: BTreeMap<String, Entity>,
    /// Tick of the merge that stored this record. Assigned by the store.
    #[serde(skip)]
    last_updated: u64,
    #[serde(skip)]
    previous: Option<Box<Entity>>,
}

impl Entity {
    pub fn new(id: impl Into<String>, tag: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            kind,
            position: Vec3::ZERO,
            extent: Vec3::ZERO,
            velocity: None,
            properties: BTreeMap::new(),
            elements: BTreeMap::new(),
            last_updated: 0,
            previous: None,
        }
    }

    pub fn last_updated(&self) -> u64 {
        self.last_updated
    }

    /// The single retained previous state, if any.
    pub fn previous(&self) -> Option<&Entity> {
        self.previous.as_deref()
    }

    pub fn is_interactable(&self) -> bool {
        matches!(self.kind, EntityKind::Interactive { .. })
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(
            self.kind,
            EntityKind::Dynamic | EntityKind::Interactive { .. }
        )
    }

    /// On/open flag of an interactive entity; `None` for other kinds.
    pub fn is_active(&self) -> Option<bool> {
        match self.kind {
            EntityKind::Interactive { is_active } => Some(is_active),
            EntityKind::Generic | EntityKind::Dynamic => None,
        }
    }

    /// An entity is moving if it reports a velocity at all.
    pub fn is_moving(&self) -> bool {
        self.velocity.is_some()
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_center_extent(self.position, self.extent)
    }

    /// True if the agent at `agent` can interact with this entity.
    pub fn can_interact(&self, agent: Vec3, range: f32) -> bool {
        self.is_interactable() && agent.distance_squared(self.position) < range * range
    }

    /// Structural state equality: geometry, velocity, kind state, properties,
    /// and children (same child IDs, recursively same state). IDs and tags are
    /// identity, not state, and are not compared at the top level.
    pub fn has_same_state(&self, other: &Entity) -> bool {
        self.kind == other.kind
            && self.position == other.position
            && self.extent == other.extent
            && self.velocity == other.velocity
            && self.properties == other.properties
            && self.elements.len() == other.elements.len()
            && self.elements.iter().all(|(id, child)| {
                other
                    .elements
                    .get(id)
                    .is_some_and(|theirs| child.has_same_state(theirs))
            })
    }

    /// True on first sighting (no history) or when the state differs from the
    /// previous one.
    pub fn changed(&self) -> bool {
        self.previous
            .as_deref()
            .is_none_or(|previous| !self.has_same_state(previous))
    }

    /// Attach `old` as this entity's previous state, dropping `old`'s own
    /// history first.
    pub fn link_previous(&mut self, mut old: Entity) {
        old.previous = None;
        self.previous = Some(Box::new(old));
    }

    /// Stamp this entity and all of its children with `tick`.
    pub fn assign_timestamp(&mut self, tick: u64) {
        self.last_updated = tick;
        for child in self.elements.values_mut() {
            child.assign_timestamp(tick);
        }
    }

    /// Make every child's `id` equal to its key in `elements`, recursively.
    pub fn adopt_element_keys(&mut self) {
        for (key, child) in &mut self.elements {
            if child.id != *key {
                child.id.clone_from(key);
            }
            child.adopt_element_keys();
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Boolean property; an absent property reads as `false`.
    pub fn bool_property(&self, name: &str) -> Result<bool, BeliefError> {
        match self.properties.get(name) {
            None => Ok(false),
            Some(PropertyValue::Bool(b)) => Ok(*b),
            Some(_) => Err(self.type_mismatch(name, "boolean")),
        }
    }

    /// Integer property; absent counts as a mismatch since there is no
    /// sensible default.
    pub fn int_property(&self, name: &str) -> Result<i64, BeliefError> {
        match self.properties.get(name) {
            Some(PropertyValue::Int(i)) => Ok(*i),
            _ => Err(self.type_mismatch(name, "integer")),
        }
    }

    /// Display form of any property.
    pub fn string_property(&self, name: &str) -> Option<String> {
        self.properties.get(name).map(ToString::to_string)
    }

    fn type_mismatch(&self, property: &str, expected: &'static str) -> BeliefError {
        BeliefError::TypeMismatch {
            entity: self.id.clone(),
            property: property.to_string(),
            expected,
        }
    }
}
