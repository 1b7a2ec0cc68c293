//! Agents: per-agent arenas of components, channels and buffers.
//!
//! Components, channels and buffers are owned by their [Agent] and refer to each other
//! through small integer handles into the agent's arenas, so teardown can never leave a
//! dangling reference behind.

mod channel;
mod component;
mod wiring;

use std::collections::BTreeMap;

use tracing::debug;

pub use channel::{Channel, ChannelBuffer};
pub use component::Component;
pub use wiring::connect_agent_links;

use crate::bindings::ComponentModel;
use crate::blueprint::{
    AgentBlueprint, AgentCategory, ChannelId, ComponentBlueprint, LinkId, SensorParameter,
    VehicleModelParameters,
};
use crate::error::{Result, SimError};
use crate::world::AgentId;

/// Index of a component in its agent's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentHandle(pub(crate) usize);

/// Index of a buffer in its agent's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub(crate) usize);

/// A simulated participant and everything it owns.
#[derive(Debug)]
pub struct Agent {
    id: AgentId,
    category: AgentCategory,
    type_name: String,
    vehicle_model_type: String,
    driver_profile_name: String,
    vehicle_parameters: VehicleModelParameters,
    sensor_parameters: Vec<SensorParameter>,
    components: Vec<Component>,
    component_index: BTreeMap<String, ComponentHandle>,
    channels: Vec<Channel>,
    channel_index: BTreeMap<ChannelId, usize>,
    buffers: Vec<ChannelBuffer>,
}

impl Agent {
    /// Empty agent with one channel per channel id referenced by the blueprint.
    pub(crate) fn new(id: AgentId, blueprint: &AgentBlueprint) -> Self {
        let mut channels = Vec::new();
        let mut channel_index = BTreeMap::new();
        for channel_id in blueprint.channels() {
            channel_index.insert(channel_id, channels.len());
            channels.push(Channel::new(channel_id));
        }

        Self {
            id,
            category: blueprint.category,
            type_name: blueprint.type_name.clone(),
            vehicle_model_type: blueprint.vehicle_model_type.clone(),
            driver_profile_name: blueprint.driver_profile_name.clone(),
            vehicle_parameters: blueprint.vehicle_parameters,
            sensor_parameters: blueprint.sensor_parameters.clone(),
            components: Vec::new(),
            component_index: BTreeMap::new(),
            channels,
            channel_index,
            buffers: Vec::new(),
        }
    }

    /// Add a component and register its links on the agent's channels.
    pub(crate) fn add_component(
        &mut self,
        name: &str,
        blueprint: &ComponentBlueprint,
        model: Box<dyn ComponentModel>,
    ) -> Result<ComponentHandle> {
        if self.component_index.contains_key(name) {
            return Err(SimError::StructuralWiring(format!(
                "agent {} already has a component named '{}'",
                self.id, name
            )));
        }

        let handle = ComponentHandle(self.components.len());

        for (&link, &channel_id) in &blueprint.input_links {
            debug!(agent_id = %self.id, component = name, link, channel = channel_id, "input link");
            self.channel_mut(channel_id)?.add_target(handle, link);
        }
        for (&link, &channel_id) in &blueprint.output_links {
            debug!(agent_id = %self.id, component = name, link, channel = channel_id, "output link");
            self.channel_mut(channel_id)?.set_source(handle, link)?;
        }

        self.components.push(Component::new(name, blueprint, model));
        self.component_index.insert(name.to_string(), handle);
        Ok(handle)
    }

    fn channel_mut(&mut self, channel_id: ChannelId) -> Result<&mut Channel> {
        let index = *self.channel_index.get(&channel_id).ok_or_else(|| {
            SimError::StructuralWiring(format!("agent {} has no channel {}", self.id, channel_id))
        })?;
        Ok(&mut self.channels[index])
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn category(&self) -> AgentCategory {
        self.category
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn vehicle_model_type(&self) -> &str {
        &self.vehicle_model_type
    }

    pub fn driver_profile_name(&self) -> &str {
        &self.driver_profile_name
    }

    pub fn vehicle_parameters(&self) -> &VehicleModelParameters {
        &self.vehicle_parameters
    }

    pub fn sensor_parameters(&self) -> &[SensorParameter] {
        &self.sensor_parameters
    }

    pub fn components(&self) -> impl Iterator<Item = (ComponentHandle, &Component)> {
        self.components
            .iter()
            .enumerate()
            .map(|(i, c)| (ComponentHandle(i), c))
    }

    pub fn component(&self, handle: ComponentHandle) -> Option<&Component> {
        self.components.get(handle.0)
    }

    pub fn component_handle(&self, name: &str) -> Option<ComponentHandle> {
        self.component_index.get(name).copied()
    }

    pub fn component_by_name(&self, name: &str) -> Option<&Component> {
        self.component_handle(name).and_then(|h| self.component(h))
    }

    /// Components in descending priority; equal priorities keep creation order.
    pub fn components_by_priority(&self) -> Vec<ComponentHandle> {
        let mut handles: Vec<_> = (0..self.components.len()).map(ComponentHandle).collect();
        handles.sort_by_key(|h| std::cmp::Reverse(self.components[h.0].priority()));
        handles
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, channel_id: ChannelId) -> Option<&Channel> {
        self.channel_index
            .get(&channel_id)
            .map(|&index| &self.channels[index])
    }

    pub fn buffer(&self, handle: BufferHandle) -> Option<&ChannelBuffer> {
        self.buffers.get(handle.0)
    }

    /// Number of buffers created by the wiring pass.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Let the source component create the buffer for one of its output links.
    pub(crate) fn create_output_buffer(
        &mut self,
        source: ComponentHandle,
        link: LinkId,
    ) -> Result<BufferHandle> {
        let handle = BufferHandle(self.buffers.len());
        let component = self.components.get_mut(source.0).ok_or_else(|| {
            SimError::StructuralWiring(format!("agent {} has no component {:?}", self.id, source))
        })?;
        component.set_output_buffer(link, handle)?;
        self.buffers.push(ChannelBuffer::default());
        Ok(handle)
    }

    pub(crate) fn set_input_buffer(
        &mut self,
        target: ComponentHandle,
        link: LinkId,
        buffer: BufferHandle,
    ) -> Result<()> {
        let component = self.components.get_mut(target.0).ok_or_else(|| {
            SimError::StructuralWiring(format!("agent {} has no component {:?}", self.id, target))
        })?;
        component.set_input_buffer(link, buffer)
    }

    pub(crate) fn channels_mut(&mut self) -> &mut [Channel] {
        &mut self.channels
    }

    /// Drop every buffer and every reference to one.
    pub(crate) fn unwire(&mut self) {
        for component in &mut self.components {
            component.clear_buffers();
        }
        for channel in &mut self.channels {
            channel.detach_buffer();
        }
        self.buffers.clear();
    }

    fn component_mut(&mut self, handle: ComponentHandle) -> Result<&mut Component> {
        let id = self.id;
        self.components.get_mut(handle.0).ok_or_else(|| {
            SimError::StructuralWiring(format!("agent {} has no component {:?}", id, handle))
        })
    }

    /// Hand the current value of input link `link` to the component.
    ///
    /// Does nothing while the producing component has not written yet.
    pub fn update_input(&mut self, handle: ComponentHandle, link: LinkId, time: u64) -> Result<()> {
        let id = self.id;
        let buffer = self
            .component_mut(handle)?
            .input_buffer(link)
            .ok_or_else(|| {
                SimError::StructuralWiring(format!(
                    "agent {}: input link {} of {:?} is not wired",
                    id, link, handle
                ))
            })?;
        let Some(data) = self.buffers[buffer.0].get_data() else {
            return Ok(());
        };
        let component = self.component_mut(handle)?;
        let name = component.name().to_string();
        component
            .model_mut()
            .update_input(link, data, time)
            .map_err(|reason| component_fault(id, &name, reason))
    }

    /// Ask the component for the value of output link `link` and store it in the link's buffer.
    pub fn update_output(&mut self, handle: ComponentHandle, link: LinkId, time: u64) -> Result<()> {
        let id = self.id;
        let component = self.component_mut(handle)?;
        let name = component.name().to_string();
        let buffer = component.output_buffer(link).ok_or_else(|| {
            SimError::StructuralWiring(format!(
                "agent {}: output link {} of '{}' is not wired",
                id, link, name
            ))
        })?;
        let data = component
            .model_mut()
            .update_output(link, time)
            .map_err(|reason| component_fault(id, &name, reason))?;
        self.buffers[buffer.0].set_data(data, time);
        Ok(())
    }

    pub fn trigger(&mut self, handle: ComponentHandle, time: u64) -> Result<()> {
        let id = self.id;
        let component = self.component_mut(handle)?;
        let name = component.name().to_string();
        component
            .model_mut()
            .trigger(time)
            .map_err(|reason| component_fault(id, &name, reason))
    }

    /// Run one full cycle of every component due at `time`, in descending priority:
    /// read inputs, trigger, write outputs.
    pub fn cycle(&mut self, time: u64) -> Result<()> {
        for handle in self.components_by_priority() {
            let component = &self.components[handle.0];
            if !component.is_due(time) {
                continue;
            }
            let inputs: Vec<LinkId> = component.input_links().keys().copied().collect();
            let outputs: Vec<LinkId> = component.output_links().keys().copied().collect();

            for link in inputs {
                self.update_input(handle, link, time)?;
            }
            self.trigger(handle, time)?;
            for link in outputs {
                self.update_output(handle, link, time)?;
            }
        }
        Ok(())
    }
}

fn component_fault(agent_id: AgentId, component: &str, reason: String) -> SimError {
    SimError::ComponentFault {
        agent_id: agent_id.0,
        component: component.to_string(),
        reason,
    }
}

impl Drop for Agent {
    fn drop(&mut self) {
        debug!(agent_id = %self.id, components = self.components.len(), "releasing agent");
        while let Some(component) = self.components.pop() {
            drop(component);
        }
        self.component_index.clear();
        self.channels.clear();
        self.channel_index.clear();
        self.buffers.clear();
    }
}
