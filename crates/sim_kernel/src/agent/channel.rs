use std::sync::Arc;

use crate::blueprint::{ChannelId, LinkId};
use crate::error::{Result, SimError};
use crate::signal::Signal;

use super::{BufferHandle, ComponentHandle};

/// Latest value written on one channel.
#[derive(Debug, Default)]
pub struct ChannelBuffer {
    data: Option<Arc<dyn Signal>>,
    written_at: Option<u64>,
}

impl ChannelBuffer {
    /// Current value; `None` until the source wrote once.
    pub fn get_data(&self) -> Option<Arc<dyn Signal>> {
        self.data.clone()
    }

    pub fn set_data(&mut self, data: Arc<dyn Signal>, time: u64) {
        self.data = Some(data);
        self.written_at = Some(time);
    }

    pub fn written_at(&self) -> Option<u64> {
        self.written_at
    }
}

/// One producer, any number of consumers.
#[derive(Debug, Clone)]
pub struct Channel {
    id: ChannelId,
    source: Option<(ComponentHandle, LinkId)>,
    targets: Vec<(LinkId, ComponentHandle)>,
    buffer: Option<BufferHandle>,
}

impl Channel {
    pub fn new(id: ChannelId) -> Self {
        Self {
            id,
            source: None,
            targets: Vec::new(),
            buffer: None,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Set the producing component. A second source is rejected: channels never fan in.
    pub fn set_source(&mut self, component: ComponentHandle, link: LinkId) -> Result<()> {
        if let Some((existing, existing_link)) = self.source {
            return Err(SimError::StructuralWiring(format!(
                "channel {} already has source {:?} (link {}), rejected {:?} (link {})",
                self.id, existing, existing_link, component, link
            )));
        }
        self.source = Some((component, link));
        Ok(())
    }

    pub fn add_target(&mut self, component: ComponentHandle, link: LinkId) {
        self.targets.push((link, component));
    }

    pub fn source(&self) -> Option<(ComponentHandle, LinkId)> {
        self.source
    }

    pub fn targets(&self) -> &[(LinkId, ComponentHandle)] {
        &self.targets
    }

    /// Attach the buffer created by the source. Only one buffer may ever be attached.
    pub fn attach_source_buffer(&mut self, buffer: BufferHandle) -> Result<()> {
        if self.buffer.is_some() {
            return Err(SimError::StructuralWiring(format!(
                "channel {} already has a source buffer",
                self.id
            )));
        }
        self.buffer = Some(buffer);
        Ok(())
    }

    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    pub(crate) fn detach_buffer(&mut self) {
        self.buffer = None;
    }
}
