use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use sim_kernel::data_store::InMemoryDataStore;
use sim_kernel::error::SimError;
use sim_kernel::events::{
    ComponentState, Event, EventCategory, EventKind, EventNetwork, LaneChangeDirection, RunResult,
};
use sim_kernel::world::AgentId;

fn ids(events: &[Arc<Event>]) -> Vec<u64> {
    events.iter().filter_map(|e| e.id()).collect()
}

#[test]
fn ids_increase_across_interleaved_categories() {
    let mut network = EventNetwork::new();
    network.insert_event(Event::new(0, "a", "test", EventKind::Basic));
    network.insert_event(Event::new(0, "b", "test", EventKind::ScenarioCondition));
    network.insert_event(Event::new(0, "c", "test", EventKind::Basic));
    network.insert_event(Event::new(
        0,
        "d",
        "test",
        EventKind::LaneChange {
            direction: LaneChangeDirection::Left,
        },
    ));

    assert_eq!(ids(network.get_events(EventCategory::Basic)), vec![0, 2]);
    assert_eq!(ids(network.get_events(EventCategory::OpenScenario)), vec![1]);
    assert_eq!(ids(network.get_events(EventCategory::LaneChange)), vec![3]);
    assert!(network.get_events(EventCategory::SpeedAction).is_empty());
}

#[test]
fn clearing_archives_in_cycle_order_and_pruning_is_strict() {
    let mut network = EventNetwork::new();
    for time in [0, 10, 20] {
        network.insert_event(Event::new(time, "tick", "test", EventKind::Basic));
        network.clear_active_events();
    }
    assert!(network.get_events(EventCategory::Basic).is_empty());

    let archived: Vec<u64> = network
        .archived_events(EventCategory::Basic)
        .map(|e| e.time())
        .collect();
    assert_eq!(archived, vec![0, 10, 20]);

    network.remove_old_events(10);
    let archived: Vec<u64> = network
        .archived_events(EventCategory::Basic)
        .map(|e| e.time())
        .collect();
    assert_eq!(archived, vec![10, 20]);
}

#[test]
fn narrated_categories_reach_the_data_store() {
    let store = Arc::new(InMemoryDataStore::new());
    let mut network = EventNetwork::with_publisher(store.clone());

    network.insert_event(Event::collision(40, "CollisionDetector", AgentId(1), AgentId(2), true));
    network.insert_event(
        Event::new(50, "LeadBrakes", "Scenario", EventKind::ScenarioCondition)
            .with_affected_entities([AgentId(3)]),
    );
    network.insert_event(Event::component_state_change(
        50,
        "Scenario",
        "AEB",
        ComponentState::Disabled,
    ));

    let records = store.acyclics();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].time, 40);
    assert_eq!(records[0].source, "CollisionDetector");
    assert_eq!(records[0].value.name, "Collision");
    assert_eq!(records[0].value.triggering_entities, vec![AgentId(1), AgentId(2)]);
    assert!(records[0]
        .value
        .parameters
        .contains(&("CollisionWithAgent".to_string(), "true".to_string())));
    assert_eq!(records[1].value.affected_entities, vec![AgentId(3)]);
}

#[test]
fn collisions_are_collected_once_bound() {
    let mut network = EventNetwork::new();
    network.add_collision(AgentId(9));

    let run_result = Arc::new(Mutex::new(RunResult::new()));
    network.initialize(run_result.clone());
    network.add_collision(AgentId(1));
    network.add_collision(AgentId(1));
    network.add_collision(AgentId(4));

    assert_eq!(run_result.lock().collision_ids(), &[AgentId(1), AgentId(4)]);

    network.clear();
    network.add_collision(AgentId(5));
    assert_eq!(run_result.lock().collision_ids().len(), 2);
}

#[test]
fn clear_restarts_ids() {
    let mut network = EventNetwork::new();
    network.insert_event(Event::new(0, "a", "test", EventKind::Basic));
    network.clear_active_events();
    network.insert_event(Event::new(0, "b", "test", EventKind::Basic));

    network.clear();

    assert_eq!(network.active_len(), 0);
    assert_eq!(network.archived_len(), 0);
    assert_eq!(network.insert_event(Event::new(0, "c", "test", EventKind::Basic)), 0);
}

#[test]
fn causal_link_is_set_at_most_once() {
    let mut network = EventNetwork::new();
    let cause = network.insert_event(Event::new(0, "cause", "test", EventKind::ScenarioCondition));

    let mut effect = Event::new(0, "effect", "test", EventKind::Simulation)
        .caused_by(cause)
        .unwrap();
    assert!(matches!(
        effect.set_triggering_event_id(cause + 1),
        Err(SimError::TriggeringEventAlreadySet { existing, .. }) if existing == cause
    ));

    network.insert_event(effect);
    let stored = &network.get_events(EventCategory::OpenPass)[0];
    assert_eq!(stored.triggering_event_id(), Some(cause));
}

#[test]
fn category_names_parse_case_insensitively() {
    assert_eq!(EventCategory::from_str("openscenario"), Ok(EventCategory::OpenScenario));
    assert_eq!(EventCategory::from_str("OpenPASS"), Ok(EventCategory::OpenPass));
    assert_eq!(
        EventCategory::from_str("Teleport"),
        Err(SimError::UnknownCategory("Teleport".to_string()))
    );
}
