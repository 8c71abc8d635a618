// End-to-end scenarios driving `BeliefState` through JSON observations, the
// way the agent loop does.

use std::sync::Arc;

use lookout_belief::{BeliefConfig, BeliefError, BeliefState};
use lookout_nav::{BlockedNodes, NavGraph, NavNodeId, Vec3};
use serde_json::{Value, json};

/// Two rooms joined by a doorway. Nodes 0..=3 run along x at unit spacing in
/// the west room, node 4 is the doorway at x=4, nodes 5..=7 continue east.
/// Node 8 hangs off node 2 at z=1.
const GRAPH: &str = r#"{
    "nodes": [
        {"x": 0.0, "y": 0.0, "z": 0.0},
        {"x": 1.0, "y": 0.0, "z": 0.0},
        {"x": 2.0, "y": 0.0, "z": 0.0},
        {"x": 3.0, "y": 0.0, "z": 0.0},
        {"x": 4.0, "y": 0.0, "z": 0.0},
        {"x": 5.0, "y": 0.0, "z": 0.0},
        {"x": 6.0, "y": 0.0, "z": 0.0},
        {"x": 7.0, "y": 0.0, "z": 0.0},
        {"x": 2.0, "y": 0.0, "z": 1.0}
    ],
    "edges": [
        {"from": 0, "to": 1, "cost": 1.0},
        {"from": 1, "to": 2, "cost": 1.0},
        {"from": 2, "to": 3, "cost": 1.0},
        {"from": 3, "to": 4, "cost": 1.0},
        {"from": 4, "to": 5, "cost": 1.0},
        {"from": 5, "to": 6, "cost": 1.0},
        {"from": 6, "to": 7, "cost": 1.0},
        {"from": 2, "to": 8, "cost": 1.0}
    ]
}"#;

fn belief() -> BeliefState {
    let graph = NavGraph::from_json(GRAPH).unwrap();
    BeliefState::new(Arc::new(graph), BeliefConfig::default())
}

fn door(id: &str, x: f32, open: bool) -> Value {
    json!({
        "id": id,
        "tag": "Door",
        "kind": { "type": "interactive", "isActive": open },
        "position": { "x": x, "y": 0.0, "z": 0.0 },
        "extent": { "x": 0.5, "y": 0.5, "z": 0.5 }
    })
}

fn button(id: &str, x: f32, on: bool) -> Value {
    json!({
        "id": id,
        "tag": "Switch",
        "kind": { "type": "interactive", "isActive": on },
        "position": { "x": x, "y": 0.0, "z": 0.0 },
        "properties": { "connectedTo": "d1", "presses": 0 }
    })
}

fn observation(x: f32, entities: Vec<Value>) -> Value {
    json!({
        "agentId": "agent",
        "agentPosition": { "x": x, "y": 0.0, "z": 0.0 },
        "velocity": { "x": 0.0, "y": 0.0, "z": 0.0 },
        "didNothing": false,
        "entities": entities
    })
}

fn blocked(ids: &[u32]) -> BlockedNodes {
    ids.iter().map(|&i| NavNodeId(i)).collect()
}

#[test]
fn door_opens_after_button_press() {
    let mut b = belief();
    let east = Vec3::new(7.0, 0.0, 0.0);

    b.mark_observation_json(&observation(
        0.0,
        vec![door("d1", 4.0, false), button("b1", 0.5, false)],
    ))
    .unwrap();
    assert_eq!(b.blocked_nodes(), &blocked(&[4]));
    assert_eq!(b.nodes_blocked_by_entity("d1"), &[NavNodeId(4)]);
    assert!(b.nodes_blocked_by_entity("b1").is_empty());
    assert!(b.can_reach_position(east).is_none());
    assert!(b.can_reach("b1").is_some());
    assert!(b.can_interact_with("b1"));

    // The agent presses the button; the door opens on the next report.
    b.mark_observation_json(&observation(
        1.0,
        vec![door("d1", 4.0, true), button("b1", 0.5, true)],
    ))
    .unwrap();
    assert!(b.is_on("b1"));
    assert!(b.is_open("d1"));
    assert!(b.changed("d1"));
    assert!(b.blocked_nodes().is_empty());

    let path = b.find_path_to(east).unwrap();
    assert_eq!(path.first(), Some(&Vec3::new(1.0, 0.0, 0.0)));
    assert_eq!(path.last(), Some(&east));
    assert_eq!(b.get_goal_location(), Some(east));
}

#[test]
fn empty_observation_only_advances_pose_and_tick() {
    let mut b = belief();
    b.mark_observation_json(&observation(0.0, vec![door("d1", 4.0, false)]))
        .unwrap();
    let before_blocked = b.blocked_nodes().clone();
    let before_door = b.get_entity("d1").unwrap().clone();

    let tick = b
        .mark_observation_json(&json!({
            "agentPosition": { "x": 2.0, "y": 0.0, "z": 0.0 },
            "velocity": { "x": 1.0, "y": 0.0, "z": 0.0 },
            "entities": []
        }))
        .unwrap();

    assert_eq!(tick, 1);
    assert_eq!(b.position(), Some(Vec3::new(2.0, 0.0, 0.0)));
    assert_eq!(b.velocity(), Some(Vec3::new(1.0, 0.0, 0.0)));
    assert_eq!(b.blocked_nodes(), &before_blocked);
    let after_door = b.get_entity("d1").unwrap();
    assert!(after_door.has_same_state(&before_door));
    assert_eq!(after_door.last_updated(), before_door.last_updated());
    assert_eq!(b.age("d1"), Some(1));
    assert_eq!(b.nav().known_node_count(), 0);
}

#[test]
fn blocked_set_is_untouched_when_no_flag_changes() {
    let mut b = belief();
    b.mark_observation_json(&observation(0.0, vec![door("d1", 4.0, false)]))
        .unwrap();
    assert_eq!(b.blocked_nodes(), &blocked(&[4]));

    // Same flag, new position: the contribution is refreshed but no rebuild
    // is triggered, so the blocked set stays as it was.
    b.mark_observation_json(&observation(0.0, vec![door("d1", 3.0, false)]))
        .unwrap();
    assert_eq!(b.nodes_blocked_by_entity("d1"), &[NavNodeId(3)]);
    assert_eq!(b.blocked_nodes(), &blocked(&[4]));

    // A newly seen open door triggers a rebuild, which picks up the move.
    b.mark_observation_json(&observation(0.0, vec![door("d2", 6.0, true)]))
        .unwrap();
    assert_eq!(b.blocked_nodes(), &blocked(&[3]));
}

#[test]
fn first_sighting_of_closed_door_blocks_immediately() {
    let mut b = belief();
    b.mark_observation_json(&observation(0.0, vec![])).unwrap();
    assert!(b.blocked_nodes().is_empty());
    b.mark_observation_json(&observation(0.0, vec![door("d1", 4.0, false)]))
        .unwrap();
    assert_eq!(b.blocked_nodes(), &blocked(&[4]));
}

#[test]
fn cached_route_survives_until_blocked_set_changes() {
    let mut b = belief();
    let goal = Vec3::new(7.0, 0.0, 0.0);
    b.mark_observation_json(&observation(0.0, vec![door("d1", 4.0, true)]))
        .unwrap();
    let first = b.cached_find_path_to(goal);
    assert_eq!(first.as_ref().map(Vec::len), Some(8));
    assert_eq!(b.cached_find_path_to(goal), first);

    b.mark_observation_json(&observation(0.0, vec![door("d1", 4.0, false)]))
        .unwrap();
    assert_eq!(b.cached_find_path_to(goal), None);
    assert_eq!(b.get_next_waypoint(), None);
}

#[test]
fn exploration_uses_visible_nodes() {
    let mut b = belief();
    let mut obs = observation(2.0, vec![]);
    obs["navMeshIndices"] = json!([0, 1, 2, 3]);
    b.mark_observation_json(&obs).unwrap();

    assert!(b.nav().is_known(NavNodeId(3)));
    // Around node 2 only node 8 is still unseen.
    assert_eq!(
        b.get_unknown_neighbour_closest_to(Vec3::new(2.0, 0.0, 0.0), Vec3::new(7.0, 0.0, 0.0)),
        Some(Vec3::new(2.0, 0.0, 1.0))
    );

    // Omitting the indices later never forgets what was seen.
    b.mark_observation_json(&observation(2.0, vec![])).unwrap();
    assert_eq!(b.nav().known_node_count(), 4);
}

#[test]
fn typed_properties_survive_the_json_boundary() {
    let mut b = belief();
    b.mark_observation_json(&observation(0.0, vec![button("b1", 1.0, false)]))
        .unwrap();
    let entity = b.get_entity("b1").unwrap();
    assert_eq!(entity.int_property("presses"), Ok(0));
    assert_eq!(entity.string_property("connectedTo").as_deref(), Some("d1"));
    assert!(!entity.bool_property("missing").unwrap());
    assert!(matches!(
        entity.int_property("connectedTo"),
        Err(BeliefError::TypeMismatch { .. })
    ));
}

#[test]
fn rejected_payloads_do_not_advance_the_tick() {
    let mut b = belief();
    assert!(b.mark_observation_json(&Value::Null).is_err());
    assert!(b.mark_observation_json(&json!({ "entities": [] })).is_err());
    assert_eq!(b.tick(), None);
    assert_eq!(b.mark_observation_json(&observation(0.0, vec![])), Ok(0));
}

#[test]
fn duplicate_entity_report_does_not_lose_the_tick() {
    let mut b = belief();
    let mut obs = observation(3.0, vec![door("d1", 4.0, false), door("d1", 6.0, true)]);
    obs["navMeshIndices"] = json!([0]);

    assert_eq!(b.mark_observation_json(&obs), Ok(0));
    assert_eq!(b.position(), Some(Vec3::new(3.0, 0.0, 0.0)));
    assert_eq!(b.nav().known_node_count(), 1);

    // The first copy is merged; the second is stale against it.
    let d1 = b.get_entity("d1").unwrap();
    assert_eq!(d1.position, Vec3::new(4.0, 0.0, 0.0));
    assert!(!b.is_open("d1"));
    assert_eq!(b.blocked_nodes(), &blocked(&[4]));
    assert_eq!(b.known_entities().len(), 1);
}

#[test]
fn config_changes_what_blocks() {
    let config = BeliefConfig::from_json(r#"{ "obstacle_tags": ["Gate"] }"#).unwrap();
    let graph = NavGraph::from_json(GRAPH).unwrap();
    let mut b = BeliefState::new(Arc::new(graph), config);
    b.mark_observation_json(&observation(0.0, vec![door("d1", 4.0, false)]))
        .unwrap();
    assert!(b.blocked_nodes().is_empty());
    // Doors are still doors for the query surface.
    assert_eq!(b.known_doors().len(), 1);
}
