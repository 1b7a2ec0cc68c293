//! Error taxonomy shared by the agent factory, the wiring pass, the event network
//! and the spawn orchestrator.

use thiserror::Error;

/// Errors reported by kernel operations.
///
/// Plugin-origin failures arrive as plain messages and are wrapped into one of these
/// variants at the instantiation boundary, so a single bad agent or spawn point never
/// takes the run down with it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// A channel has no source, a link points at an unknown channel, or a buffer
    /// could not be created or attached.
    #[error("structural wiring error: {0}")]
    StructuralWiring(String),

    /// A plugin failed to create an instance.
    #[error("could not instantiate component '{component}' of blueprint '{blueprint}': {reason}")]
    Instantiation {
        blueprint: String,
        component: String,
        reason: String,
    },

    /// The world refused to register a new agent.
    #[error("world rejected agent registration for blueprint '{blueprint}': {reason}")]
    WorldRegistration { blueprint: String, reason: String },

    /// No plugin library is registered under the given name.
    #[error("no binding registered for library '{0}'")]
    BindingNotFound(String),

    /// A named parameter profile is missing.
    #[error("profile '{0}' not found")]
    ProfileNotFound(String),

    /// An event category name did not parse.
    #[error("unknown event category '{0}'")]
    UnknownCategory(String),

    /// A spawn point raised a fault while being triggered.
    #[error("spawn point '{library}' failed: {reason}")]
    SpawnPointTrigger { library: String, reason: String },

    /// A component model reported a fault while being driven.
    #[error("component '{component}' of agent {agent_id} failed: {reason}")]
    ComponentFault {
        agent_id: u32,
        component: String,
        reason: String,
    },

    /// The causal link of an event was already recorded.
    #[error("event '{name}' already has triggering event {existing}")]
    TriggeringEventAlreadySet { name: String, existing: u64 },

    /// Configuration could not be decoded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
