//! Agent factory: instantiates plugin components for a blueprint, wires them and
//! publishes the agent's static properties.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::agent::{connect_agent_links, Agent};
use crate::bindings::{call_plugin, ComponentParameters, ModelBinding};
use crate::blueprint::AgentBlueprint;
use crate::data_store::{AgentPublisher, SharedDataStore};
use crate::error::{Result, SimError};
use crate::events::SharedEventNetwork;
use crate::parameters::ParameterValue;
use crate::stochastics::Stochastics;
use crate::world::{AgentId, SharedWorld};

pub type SharedAgentFactory = Arc<Mutex<AgentFactory>>;

/// Sensor profile keys published under `Parameters/`, with the key they are published as.
const SENSOR_PARAMETER_KEYS: [(&str, &str); 4] = [
    ("Latency", "Latency"),
    ("OpeningAngleH", "OpeningAngleH"),
    ("OpeningAngleV", "OpeningAngleV"),
    ("DetectionRange", "Range"),
];

#[derive(Debug)]
pub struct AgentFactory {
    model_binding: Arc<ModelBinding>,
    world: SharedWorld,
    stochastics: Stochastics,
    event_network: SharedEventNetwork,
    data_store: SharedDataStore,
    agents: Vec<Agent>,
}

impl AgentFactory {
    pub fn new(
        model_binding: Arc<ModelBinding>,
        world: SharedWorld,
        stochastics: Stochastics,
        event_network: SharedEventNetwork,
        data_store: SharedDataStore,
    ) -> Self {
        Self {
            model_binding,
            world,
            stochastics,
            event_network,
            data_store,
            agents: Vec::new(),
        }
    }

    pub fn into_shared(self) -> SharedAgentFactory {
        Arc::new(Mutex::new(self))
    }

    /// Create, wire and publish one agent.
    ///
    /// On failure nothing is retained: created components are dropped and the world
    /// registration is withdrawn.
    pub fn add_agent(&mut self, blueprint: &AgentBlueprint) -> Result<AgentId> {
        let id = self
            .world
            .register_agent(blueprint.category, &blueprint.type_name)
            .map_err(|reason| {
                error!(
                    blueprint = %blueprint.type_name,
                    %reason,
                    "world rejected agent registration"
                );
                SimError::WorldRegistration {
                    blueprint: blueprint.type_name.clone(),
                    reason,
                }
            })?;

        let agent = match self.build_agent(id, blueprint) {
            Ok(agent) => agent,
            Err(err) => {
                self.world.remove_agent(id);
                error!(
                    agent_id = %id,
                    blueprint = %blueprint.type_name,
                    error = %err,
                    "agent could not be created"
                );
                return Err(err);
            }
        };

        self.publish_properties(&agent);
        info!(
            agent_id = %id,
            blueprint = %blueprint.type_name,
            category = blueprint.category.as_str(),
            components = blueprint.components.len(),
            "agent created"
        );
        self.agents.push(agent);
        Ok(id)
    }

    fn build_agent(&self, id: AgentId, blueprint: &AgentBlueprint) -> Result<Agent> {
        let mut agent = Agent::new(id, blueprint);

        for (name, component) in &blueprint.components {
            let library = self
                .model_binding
                .get(&component.library)
                .ok_or_else(|| SimError::BindingNotFound(component.library.clone()))?;

            let parameters = ComponentParameters {
                component_name: name.clone(),
                agent_id: id,
                priority: component.priority,
                offset_ms: component.offset_ms,
                response_time_ms: component.response_time_ms,
                cycle_time_ms: component.cycle_time_ms,
                parameters: component.parameters.clone(),
                stochastics: self.stochastics.clone(),
                world: Arc::clone(&self.world),
                event_network: Arc::clone(&self.event_network),
                publisher: AgentPublisher::new(Arc::clone(&self.data_store), id),
            };

            let model = call_plugin(|| library.create_instance(parameters)).map_err(|reason| {
                error!(
                    agent_id = %id,
                    component = %name,
                    library = %component.library,
                    priority = component.priority,
                    offset_ms = component.offset_ms,
                    response_time_ms = component.response_time_ms,
                    cycle_time_ms = component.cycle_time_ms,
                    parameters = ?component.parameters,
                    %reason,
                    "component instantiation failed"
                );
                SimError::Instantiation {
                    blueprint: blueprint.type_name.clone(),
                    component: name.clone(),
                    reason,
                }
            })?;

            agent.add_component(name, component, model)?;
            debug!(agent_id = %id, component = %name, library = %component.library, "component created");
        }

        connect_agent_links(&mut agent)?;
        Ok(agent)
    }

    /// Write the agent's static facts under `Agents/{id}/`. Failed writes are logged only.
    pub fn publish_properties(&self, agent: &Agent) {
        let prefix = format!("Agents/{}", agent.id());
        let put = |key: String, value: ParameterValue| {
            if let Err(reason) = self.data_store.put_static(&key, value) {
                warn!(agent_id = %agent.id(), %key, %reason, "could not publish agent property");
            }
        };

        put(
            format!("{prefix}/AgentTypeGroupName"),
            agent.category().as_str().into(),
        );
        put(format!("{prefix}/AgentTypeName"), agent.type_name().into());
        put(
            format!("{prefix}/VehicleModelType"),
            agent.vehicle_model_type().into(),
        );
        put(
            format!("{prefix}/DriverProfileName"),
            agent.driver_profile_name().into(),
        );

        let vehicle = agent.vehicle_parameters();
        put(format!("{prefix}/Vehicle/Width"), vehicle.width.into());
        put(format!("{prefix}/Vehicle/Length"), vehicle.length.into());
        put(format!("{prefix}/Vehicle/Height"), vehicle.height.into());
        put(
            format!("{prefix}/Vehicle/LongitudinalPivotOffset"),
            vehicle.longitudinal_pivot_offset().into(),
        );

        for sensor in agent.sensor_parameters() {
            let sensor_prefix = format!("{prefix}/Vehicle/Sensors/{}", sensor.id);
            put(
                format!("{sensor_prefix}/Type"),
                sensor.profile.sensor_type.as_str().into(),
            );

            let position = &sensor.position;
            let mounting = format!("{sensor_prefix}/Mounting");
            put(
                format!("{mounting}/Position/Longitudinal"),
                position.longitudinal.into(),
            );
            put(format!("{mounting}/Position/Lateral"), position.lateral.into());
            put(format!("{mounting}/Position/Height"), position.height.into());
            put(format!("{mounting}/Orientation/Yaw"), position.yaw.into());
            put(format!("{mounting}/Orientation/Pitch"), position.pitch.into());
            put(format!("{mounting}/Orientation/Roll"), position.roll.into());

            for (profile_key, published_key) in SENSOR_PARAMETER_KEYS {
                if let Some(value) = sensor.profile.parameters.get_double(profile_key) {
                    put(
                        format!("{sensor_prefix}/Parameters/{published_key}"),
                        value.into(),
                    );
                }
            }
        }
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id() == id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id() == id)
    }

    /// Agents in creation order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn world(&self) -> &SharedWorld {
        &self.world
    }

    pub fn event_network(&self) -> &SharedEventNetwork {
        &self.event_network
    }

    /// Release every agent.
    pub fn clear(&mut self) {
        debug!(agents = self.agents.len(), "clearing agent factory");
        self.agents.clear();
    }
}
