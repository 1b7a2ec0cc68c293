use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::parameters::{ParameterSet, ParameterValue};
use crate::world::AgentId;

use super::category::EventCategory;

/// Globally unique, strictly increasing event id.
pub type EventId = u64;

/// Requested state of a component, carried by component state change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentState {
    Acting,
    Armed,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneChangeDirection {
    Left,
    Right,
}

/// What happened. The event category is derived from this tag.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Internal bookkeeping.
    Basic,
    /// A scenario condition fired.
    ScenarioCondition,
    /// A simulation-level fact (agent spawned, run ended, ...).
    Simulation,
    Collision {
        agent: AgentId,
        opponent: AgentId,
        with_agent: bool,
    },
    ComponentStateChange {
        component: String,
        state: ComponentState,
    },
    LaneChange {
        direction: LaneChangeDirection,
    },
    CustomLaneChange {
        delta_lanes: i32,
        duration_ms: u64,
    },
    SpeedAction {
        target_speed: f64,
        acceleration: f64,
    },
    SetTrajectory {
        trajectory: String,
    },
    SetGazeFollower {
        activity_state: String,
        gaze_file: String,
    },
    CustomCommand {
        command: String,
    },
}

impl EventKind {
    pub fn category(&self) -> EventCategory {
        match self {
            EventKind::Basic => EventCategory::Basic,
            EventKind::ScenarioCondition => EventCategory::OpenScenario,
            EventKind::Simulation | EventKind::Collision { .. } => EventCategory::OpenPass,
            EventKind::ComponentStateChange { .. } => EventCategory::ComponentStateChange,
            EventKind::LaneChange { .. } => EventCategory::LaneChange,
            EventKind::CustomLaneChange { .. } => EventCategory::CustomLaneChange,
            EventKind::SpeedAction { .. } => EventCategory::SpeedAction,
            EventKind::SetTrajectory { .. } => EventCategory::SetTrajectory,
            EventKind::SetGazeFollower { .. } => EventCategory::SetGazeFollower,
            EventKind::CustomCommand { .. } => EventCategory::CustomCommand,
        }
    }
}

/// A timestamped fact on the event network.
///
/// Events are built by producers, then handed to
/// [`EventNetwork::insert_event`](super::EventNetwork::insert_event), which assigns the id
/// and freezes them behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    id: Option<EventId>,
    time: u64,
    name: String,
    source: String,
    triggering_entities: Vec<AgentId>,
    affected_entities: Vec<AgentId>,
    kind: EventKind,
    parameters: ParameterSet,
    triggering_event_id: Option<EventId>,
}

impl Event {
    pub fn new(time: u64, name: impl Into<String>, source: impl Into<String>, kind: EventKind) -> Self {
        Self {
            id: None,
            time,
            name: name.into(),
            source: source.into(),
            triggering_entities: Vec::new(),
            affected_entities: Vec::new(),
            kind,
            parameters: ParameterSet::new(),
            triggering_event_id: None,
        }
    }

    /// Collision between `agent` and `opponent` (an agent or a static object).
    pub fn collision(
        time: u64,
        source: impl Into<String>,
        agent: AgentId,
        opponent: AgentId,
        with_agent: bool,
    ) -> Self {
        Self::new(
            time,
            "Collision",
            source,
            EventKind::Collision {
                agent,
                opponent,
                with_agent,
            },
        )
        .with_triggering_entities([agent, opponent])
        .with_parameter("CollisionWithAgent", with_agent)
    }

    /// Request to change the state of a named component of the affected agents.
    pub fn component_state_change(
        time: u64,
        source: impl Into<String>,
        component: impl Into<String>,
        state: ComponentState,
    ) -> Self {
        let component = component.into();
        Self::new(
            time,
            "ComponentStateChange",
            source,
            EventKind::ComponentStateChange {
                component: component.clone(),
                state,
            },
        )
        .with_parameter("ComponentName", component)
        .with_parameter("State", format!("{:?}", state))
    }

    pub fn with_triggering_entities(mut self, entities: impl IntoIterator<Item = AgentId>) -> Self {
        self.triggering_entities.extend(entities);
        self
    }

    pub fn with_affected_entities(mut self, entities: impl IntoIterator<Item = AgentId>) -> Self {
        self.affected_entities.extend(entities);
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.parameters.insert(key, value);
        self
    }

    /// Record the event that caused this one. Fails if a cause was already recorded.
    pub fn caused_by(mut self, triggering_event_id: EventId) -> Result<Self> {
        self.set_triggering_event_id(triggering_event_id)?;
        Ok(self)
    }

    pub fn set_triggering_event_id(&mut self, triggering_event_id: EventId) -> Result<()> {
        if let Some(existing) = self.triggering_event_id {
            return Err(SimError::TriggeringEventAlreadySet {
                name: self.name.clone(),
                existing,
            });
        }
        self.triggering_event_id = Some(triggering_event_id);
        Ok(())
    }

    pub(crate) fn assign_id(&mut self, id: EventId) {
        debug_assert!(self.id.is_none(), "event ids are assigned once");
        self.id = Some(id);
    }

    /// Id assigned on insertion; `None` before the event reaches the network.
    pub fn id(&self) -> Option<EventId> {
        self.id
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn triggering_entities(&self) -> &[AgentId] {
        &self.triggering_entities
    }

    pub fn affected_entities(&self) -> &[AgentId] {
        &self.affected_entities
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn category(&self) -> EventCategory {
        self.kind.category()
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn triggering_event_id(&self) -> Option<EventId> {
        self.triggering_event_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_follows_the_kind() {
        let collision = Event::collision(10, "Collision detector", AgentId(1), AgentId(2), true);
        assert_eq!(collision.category(), EventCategory::OpenPass);
        assert_eq!(collision.triggering_entities(), &[AgentId(1), AgentId(2)]);
        assert_eq!(collision.parameters().get_bool("CollisionWithAgent"), Some(true));

        let lane_change = Event::new(
            10,
            "LaneChange",
            "Scenario",
            EventKind::LaneChange {
                direction: LaneChangeDirection::Left,
            },
        );
        assert_eq!(lane_change.category(), EventCategory::LaneChange);
    }

    #[test]
    fn triggering_event_is_set_at_most_once() {
        let event = Event::new(0, "Condition", "Scenario", EventKind::ScenarioCondition)
            .caused_by(3)
            .unwrap();
        assert_eq!(event.triggering_event_id(), Some(3));

        let mut event = event;
        let err = event.set_triggering_event_id(4).unwrap_err();
        assert_eq!(
            err,
            SimError::TriggeringEventAlreadySet {
                name: "Condition".into(),
                existing: 3
            }
        );
        assert_eq!(event.triggering_event_id(), Some(3));
    }

    #[test]
    fn component_state_change_carries_flattened_parameters() {
        let event = Event::component_state_change(5, "Manipulator", "Dynamics", ComponentState::Disabled)
            .with_affected_entities([AgentId(0)]);
        assert_eq!(event.category(), EventCategory::ComponentStateChange);
        assert_eq!(
            event.parameters().flatten(),
            vec![
                ("ComponentName".to_string(), "Dynamics".to_string()),
                ("State".to_string(), "Disabled".to_string())
            ]
        );
        assert!(event.id().is_none());
    }
}
