use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Partition key of the event network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventCategory {
    Basic,
    OpenScenario,
    OpenPass,
    ComponentStateChange,
    LaneChange,
    CustomLaneChange,
    SpeedAction,
    SetTrajectory,
    SetGazeFollower,
    CustomCommand,
}

impl EventCategory {
    pub const ALL: [EventCategory; 10] = [
        EventCategory::Basic,
        EventCategory::OpenScenario,
        EventCategory::OpenPass,
        EventCategory::ComponentStateChange,
        EventCategory::LaneChange,
        EventCategory::CustomLaneChange,
        EventCategory::SpeedAction,
        EventCategory::SetTrajectory,
        EventCategory::SetGazeFollower,
        EventCategory::CustomCommand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Basic => "Basic",
            EventCategory::OpenScenario => "OpenSCENARIO",
            EventCategory::OpenPass => "OpenPASS",
            EventCategory::ComponentStateChange => "ComponentStateChange",
            EventCategory::LaneChange => "LaneChange",
            EventCategory::CustomLaneChange => "CustomLaneChange",
            EventCategory::SpeedAction => "SpeedAction",
            EventCategory::SetTrajectory => "SetTrajectory",
            EventCategory::SetGazeFollower => "SetGazeFollower",
            EventCategory::CustomCommand => "CustomCommand",
        }
    }

    /// Scenario- and simulation-originated events are forwarded to the publisher;
    /// action categories are internal triggers for components.
    pub fn is_narrated(&self) -> bool {
        matches!(self, EventCategory::OpenScenario | EventCategory::OpenPass)
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SimError::UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_case_insensitively() {
        assert_eq!("openscenario".parse::<EventCategory>().unwrap(), EventCategory::OpenScenario);
        assert_eq!("OpenPASS".parse::<EventCategory>().unwrap(), EventCategory::OpenPass);
        assert_eq!(
            "Teleport".parse::<EventCategory>(),
            Err(SimError::UnknownCategory("Teleport".into()))
        );
    }

    #[test]
    fn only_scenario_and_simulation_events_are_narrated() {
        let narrated: Vec<_> = EventCategory::ALL
            .iter()
            .filter(|c| c.is_narrated())
            .collect();
        assert_eq!(narrated, vec![&EventCategory::OpenScenario, &EventCategory::OpenPass]);
    }
}
