use std::collections::BTreeMap;
use std::fmt;

use crate::bindings::ComponentModel;
use crate::blueprint::{ChannelId, ComponentBlueprint, LinkId};
use crate::error::{Result, SimError};

use super::BufferHandle;

/// A named behaviour instance inside an agent.
pub struct Component {
    name: String,
    library: String,
    priority: i32,
    offset_ms: u64,
    response_time_ms: u64,
    cycle_time_ms: u64,
    input_links: BTreeMap<LinkId, ChannelId>,
    output_links: BTreeMap<LinkId, ChannelId>,
    input_buffers: BTreeMap<LinkId, BufferHandle>,
    output_buffers: BTreeMap<LinkId, BufferHandle>,
    model: Box<dyn ComponentModel>,
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("library", &self.library)
            .field("priority", &self.priority)
            .field("input_links", &self.input_links)
            .field("output_links", &self.output_links)
            .field("input_buffers", &self.input_buffers)
            .field("output_buffers", &self.output_buffers)
            .finish_non_exhaustive()
    }
}

impl Component {
    pub(crate) fn new(name: &str, blueprint: &ComponentBlueprint, model: Box<dyn ComponentModel>) -> Self {
        Self {
            name: name.to_string(),
            library: blueprint.library.clone(),
            priority: blueprint.priority,
            offset_ms: blueprint.offset_ms,
            response_time_ms: blueprint.response_time_ms,
            cycle_time_ms: blueprint.cycle_time_ms,
            input_links: blueprint.input_links.clone(),
            output_links: blueprint.output_links.clone(),
            input_buffers: BTreeMap::new(),
            output_buffers: BTreeMap::new(),
            model,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn offset_ms(&self) -> u64 {
        self.offset_ms
    }

    pub fn response_time_ms(&self) -> u64 {
        self.response_time_ms
    }

    pub fn cycle_time_ms(&self) -> u64 {
        self.cycle_time_ms
    }

    /// Whether the component runs at `time` given its offset and cycle time.
    pub fn is_due(&self, time: u64) -> bool {
        if time < self.offset_ms {
            return false;
        }
        self.cycle_time_ms == 0 || (time - self.offset_ms) % self.cycle_time_ms == 0
    }

    pub fn input_links(&self) -> &BTreeMap<LinkId, ChannelId> {
        &self.input_links
    }

    pub fn output_links(&self) -> &BTreeMap<LinkId, ChannelId> {
        &self.output_links
    }

    pub fn input_buffer(&self, link: LinkId) -> Option<BufferHandle> {
        self.input_buffers.get(&link).copied()
    }

    pub fn output_buffer(&self, link: LinkId) -> Option<BufferHandle> {
        self.output_buffers.get(&link).copied()
    }

    /// Record the buffer created for output link `link`.
    pub(crate) fn set_output_buffer(&mut self, link: LinkId, buffer: BufferHandle) -> Result<()> {
        if !self.output_links.contains_key(&link) {
            return Err(SimError::StructuralWiring(format!(
                "component '{}' has no output link {}",
                self.name, link
            )));
        }
        if self.output_buffers.insert(link, buffer).is_some() {
            return Err(SimError::StructuralWiring(format!(
                "component '{}' already created a buffer for output link {}",
                self.name, link
            )));
        }
        Ok(())
    }

    pub(crate) fn set_input_buffer(&mut self, link: LinkId, buffer: BufferHandle) -> Result<()> {
        if !self.input_links.contains_key(&link) {
            return Err(SimError::StructuralWiring(format!(
                "component '{}' has no input link {}",
                self.name, link
            )));
        }
        self.input_buffers.insert(link, buffer);
        Ok(())
    }

    pub(crate) fn clear_buffers(&mut self) {
        self.input_buffers.clear();
        self.output_buffers.clear();
    }

    pub(crate) fn model_mut(&mut self) -> &mut dyn ComponentModel {
        self.model.as_mut()
    }
}
