// Observation: one tick's report from the environment.
//
// The environment delivers the agent's pose, whether its last action did
// nothing, the entities it can currently perceive, and (optionally) the nav
// node indices currently visible. Absent entities are "not reported", not
// destroyed.
//
// The JSON field names follow the environment's camel-case convention
// (`agentPosition`, `didNothing`, `navMeshIndices`).
//
// Validation happens here, before anything touches the belief state: a null
// payload or a non-finite pose is a contract violation and fails the whole
// observation. An ID reported twice in one observation is not an error: the
// first copy is merged at the current tick and the store's freshness guard
// drops the second.

use crate::entity::Entity;
use crate::error::BeliefError;
use lookout_nav::{NavNodeId, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(default)]
    pub agent_id: String,
    pub agent_position: Vec3,
    #[serde(default)]
    pub velocity: Vec3,
    #[serde(default)]
    pub did_nothing: bool,
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Visible nav nodes. `None` means the environment sent no update.
    #[serde(default)]
    pub nav_mesh_indices: Option<Vec<NavNodeId>>,
}

impl Observation {
    /// An observation of the agent alone: no entities, no visibility update.
    pub fn at(agent_position: Vec3) -> Self {
        Self {
            agent_position,
            ..Self::default()
        }
    }

    /// Check the observation is well-formed.
    pub fn validate(&self) -> Result<(), BeliefError> {
        if !self.agent_position.is_finite() {
            return Err(BeliefError::InvalidInput(format!(
                "non-finite agent position {}",
                self.agent_position
            )));
        }
        if !self.velocity.is_finite() {
            return Err(BeliefError::InvalidInput(format!(
                "non-finite agent velocity {}",
                self.velocity
            )));
        }
        Ok(())
    }

    /// Decode an observation from a JSON payload. `null` is an absent
    /// observation and is rejected.
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self, BeliefError> {
        if value.is_null() {
            return Err(BeliefError::InvalidInput("null observation received".into()));
        }
        Self::deserialize(value).map_err(|e| BeliefError::InvalidInput(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use serde_json::json;

    #[test]
    fn null_payload_is_rejected() {
        let err = Observation::from_json_value(&serde_json::Value::Null).unwrap_err();
        assert!(matches!(err, BeliefError::InvalidInput(_)));
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let err = Observation::from_json_value(&json!({ "entities": 5 })).unwrap_err();
        assert!(matches!(err, BeliefError::InvalidInput(_)));
    }

    #[test]
    fn decodes_camel_case_fields() {
        let obs = Observation::from_json_value(&json!({
            "agentId": "agent0",
            "agentPosition": { "x": 1.0, "y": 0.0, "z": 2.0 },
            "didNothing": true,
            "entities": [{
                "id": "b1",
                "tag": "Switch",
                "kind": { "type": "interactive", "isActive": false },
                "position": { "x": 0.0, "y": 0.0, "z": 0.0 }
            }],
            "navMeshIndices": [0, 3]
        }))
        .unwrap();
        assert_eq!(obs.agent_id, "agent0");
        assert!(obs.did_nothing);
        assert_eq!(obs.entities.len(), 1);
        assert_eq!(obs.nav_mesh_indices, Some(vec![NavNodeId(0), NavNodeId(3)]));
        assert_eq!(obs.velocity, Vec3::ZERO);
    }

    #[test]
    fn missing_indices_mean_no_update() {
        let obs = Observation::from_json_value(&json!({
            "agentPosition": { "x": 0.0, "y": 0.0, "z": 0.0 }
        }))
        .unwrap();
        assert!(obs.nav_mesh_indices.is_none());
        assert!(obs.entities.is_empty());
    }

    #[test]
    fn validate_rejects_non_finite_pose_only() {
        let mut obs = Observation::at(Vec3::ZERO);
        obs.entities.push(Entity::new("x", "Door", EntityKind::Generic));
        obs.entities.push(Entity::new("x", "Door", EntityKind::Generic));
        assert!(obs.validate().is_ok());

        let mut drifting = Observation::at(Vec3::ZERO);
        drifting.velocity.y = f32::INFINITY;
        assert!(drifting.validate().is_err());

        let nan = Observation::at(Vec3::new(f32::NAN, 0.0, 0.0));
        assert!(nan.validate().is_err());

        assert!(Observation::at(Vec3::ZERO).validate().is_ok());
    }
}
