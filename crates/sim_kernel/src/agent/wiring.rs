use tracing::debug;

use crate::blueprint::{ChannelId, LinkId};
use crate::error::{Result, SimError};

use super::{Agent, ComponentHandle};

/// Resolve every channel of `agent` into a buffer shared by its source and its targets.
///
/// For every output link the source component creates one buffer, which is attached to
/// the channel and registered as the input buffer of every target. Afterwards every
/// declared input link must resolve to a buffer. On failure all buffers are dropped and
/// no component keeps a buffer handle; the caller discards the agent.
pub fn connect_agent_links(agent: &mut Agent) -> Result<()> {
    let result = wire(agent).and_then(|_| check_inputs(agent));
    if result.is_err() {
        agent.unwire();
    }
    result
}

fn wire(agent: &mut Agent) -> Result<()> {
    let outputs: Vec<(ComponentHandle, LinkId, ChannelId)> = agent
        .components()
        .flat_map(|(handle, component)| {
            component
                .output_links()
                .iter()
                .map(move |(&link, &channel)| (handle, link, channel))
        })
        .collect();

    for (_, link, channel_id) in outputs {
        let index = agent
            .channels()
            .iter()
            .position(|c| c.id() == channel_id)
            .ok_or_else(|| {
                SimError::StructuralWiring(format!(
                    "agent {}: output link {} refers to missing channel {}",
                    agent.id(),
                    link,
                    channel_id
                ))
            })?;

        let (source, _) = agent.channels()[index].source().ok_or_else(|| {
            SimError::StructuralWiring(format!(
                "agent {}: channel {} has no source",
                agent.id(),
                channel_id
            ))
        })?;

        let buffer = agent.create_output_buffer(source, link)?;
        agent.channels_mut()[index].attach_source_buffer(buffer)?;

        let targets = agent.channels()[index].targets().to_vec();
        debug!(
            agent_id = %agent.id(),
            channel = channel_id,
            targets = targets.len(),
            "channel wired"
        );
        for (target_link, target) in targets {
            agent.set_input_buffer(target, target_link, buffer)?;
        }
    }
    Ok(())
}

fn check_inputs(agent: &Agent) -> Result<()> {
    for (_, component) in agent.components() {
        for (&link, &channel_id) in component.input_links() {
            if component.input_buffer(link).is_none() {
                return Err(SimError::StructuralWiring(format!(
                    "agent {}: input link {} of '{}' reads channel {} which has no source",
                    agent.id(),
                    link,
                    component.name(),
                    channel_id
                )));
            }
        }
    }
    Ok(())
}
