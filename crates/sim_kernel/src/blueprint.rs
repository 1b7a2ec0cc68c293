//! Declarative agent composition consumed by the agent factory.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::parameters::ParameterSet;
use crate::scenario::ScenarioEntity;
use crate::stochastics::Sampler;

/// Identifier of an input or output link on a component.
pub type LinkId = u32;

/// Identifier of a channel inside one agent's blueprint.
pub type ChannelId = u32;

/// Agent type group, published as `AgentTypeGroupName`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentCategory {
    Ego,
    Scenario,
    #[default]
    Common,
}

impl AgentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentCategory::Ego => "Ego",
            AgentCategory::Scenario => "Scenario",
            AgentCategory::Common => "Common",
        }
    }
}

fn default_cycle_time_ms() -> u64 {
    100
}

/// One component of an agent: which library builds it, its timing, and its links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentBlueprint {
    pub library: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub offset_ms: u64,
    #[serde(default)]
    pub response_time_ms: u64,
    #[serde(default = "default_cycle_time_ms")]
    pub cycle_time_ms: u64,
    #[serde(default)]
    pub input_links: BTreeMap<LinkId, ChannelId>,
    #[serde(default)]
    pub output_links: BTreeMap<LinkId, ChannelId>,
    #[serde(default)]
    pub parameters: ParameterSet,
}

impl ComponentBlueprint {
    pub fn new(library: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            priority: 0,
            offset_ms: 0,
            response_time_ms: 0,
            cycle_time_ms: default_cycle_time_ms(),
            input_links: BTreeMap::new(),
            output_links: BTreeMap::new(),
            parameters: ParameterSet::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_timing(mut self, offset_ms: u64, response_time_ms: u64, cycle_time_ms: u64) -> Self {
        self.offset_ms = offset_ms;
        self.response_time_ms = response_time_ms;
        self.cycle_time_ms = cycle_time_ms;
        self
    }

    pub fn with_input(mut self, link: LinkId, channel: ChannelId) -> Self {
        self.input_links.insert(link, channel);
        self
    }

    pub fn with_output(mut self, link: LinkId, channel: ChannelId) -> Self {
        self.output_links.insert(link, channel);
        self
    }

    pub fn with_parameters(mut self, parameters: ParameterSet) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Vehicle geometry in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VehicleModelParameters {
    pub width: f64,
    pub length: f64,
    pub height: f64,
    pub distance_reference_point_to_leading_edge: f64,
}

impl VehicleModelParameters {
    /// Offset between the geometric centre and the reference point along the vehicle axis.
    pub fn longitudinal_pivot_offset(&self) -> f64 {
        self.length / 2.0 - self.distance_reference_point_to_leading_edge
    }
}

/// Sensor mounting pose relative to the vehicle reference point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorPosition {
    pub longitudinal: f64,
    pub lateral: f64,
    pub height: f64,
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorProfile {
    #[serde(rename = "type")]
    pub sensor_type: String,
    #[serde(default)]
    pub parameters: ParameterSet,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorParameter {
    pub id: u32,
    pub position: SensorPosition,
    pub profile: SensorProfile,
}

/// Everything the factory needs to build one agent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentBlueprint {
    #[serde(default)]
    pub category: AgentCategory,
    pub type_name: String,
    #[serde(default)]
    pub vehicle_model_type: String,
    #[serde(default)]
    pub driver_profile_name: String,
    #[serde(default)]
    pub components: BTreeMap<String, ComponentBlueprint>,
    #[serde(default)]
    pub vehicle_parameters: VehicleModelParameters,
    #[serde(default)]
    pub sensor_parameters: Vec<SensorParameter>,
}

impl AgentBlueprint {
    pub fn new(category: AgentCategory, type_name: impl Into<String>) -> Self {
        Self {
            category,
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn with_component(mut self, name: impl Into<String>, component: ComponentBlueprint) -> Self {
        self.components.insert(name.into(), component);
        self
    }

    pub fn with_vehicle(mut self, model_type: impl Into<String>, parameters: VehicleModelParameters) -> Self {
        self.vehicle_model_type = model_type.into();
        self.vehicle_parameters = parameters;
        self
    }

    pub fn with_driver_profile(mut self, name: impl Into<String>) -> Self {
        self.driver_profile_name = name.into();
        self
    }

    pub fn with_sensor(mut self, sensor: SensorParameter) -> Self {
        self.sensor_parameters.push(sensor);
        self
    }

    /// Every channel id referenced by any link, ascending.
    pub fn channels(&self) -> BTreeSet<ChannelId> {
        self.components
            .values()
            .flat_map(|c| c.input_links.values().chain(c.output_links.values()))
            .copied()
            .collect()
    }

    /// Decode a blueprint from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(SimError::from)
    }
}

/// Source of blueprints for spawn points.
pub trait AgentBlueprintProvider: Send + Sync + Debug {
    /// Blueprint for a new agent of the named agent profile.
    fn sample_blueprint(&self, profile_name: &str, sampler: &Sampler) -> Result<AgentBlueprint>;

    /// Blueprint for a scenario entity, resolved through its catalog reference.
    fn blueprint_for_entity(&self, entity: &ScenarioEntity) -> Result<AgentBlueprint>;
}

/// Agent profile name → blueprint, held in memory.
///
/// A profile may list several weighted blueprints; one is drawn per request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticBlueprintProvider {
    profiles: BTreeMap<String, Vec<WeightedBlueprint>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedBlueprint {
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub blueprint: AgentBlueprint,
}

fn default_weight() -> f64 {
    1.0
}

impl StaticBlueprintProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, name: impl Into<String>, blueprint: AgentBlueprint) -> Self {
        self.with_weighted_profile(name, 1.0, blueprint)
    }

    /// Add one more alternative to the named profile.
    pub fn with_weighted_profile(
        mut self,
        name: impl Into<String>,
        weight: f64,
        blueprint: AgentBlueprint,
    ) -> Self {
        self.profiles
            .entry(name.into())
            .or_default()
            .push(WeightedBlueprint { weight, blueprint });
        self
    }

    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(SimError::from)
    }
}

impl AgentBlueprintProvider for StaticBlueprintProvider {
    fn sample_blueprint(&self, profile_name: &str, sampler: &Sampler) -> Result<AgentBlueprint> {
        let alternatives = self
            .profiles
            .get(profile_name)
            .ok_or_else(|| SimError::ProfileNotFound(profile_name.to_string()))?;
        sampler
            .sample_weighted(alternatives, |a| a.weight)
            .map(|a| a.blueprint.clone())
            .ok_or_else(|| SimError::ProfileNotFound(profile_name.to_string()))
    }

    fn blueprint_for_entity(&self, entity: &ScenarioEntity) -> Result<AgentBlueprint> {
        let alternatives = self
            .profiles
            .get(&entity.catalog_reference)
            .ok_or_else(|| SimError::ProfileNotFound(entity.catalog_reference.clone()))?;
        let mut blueprint = alternatives
            .first()
            .map(|a| a.blueprint.clone())
            .ok_or_else(|| SimError::ProfileNotFound(entity.catalog_reference.clone()))?;
        blueprint.category = if entity.is_ego() {
            AgentCategory::Ego
        } else {
            AgentCategory::Scenario
        };
        Ok(blueprint)
    }
}
