//! Plugin interfaces and the registries that resolve library names to them.
//!
//! Component libraries are registered at build time into a [ModelBinding], spawn point
//! libraries into [SpawnPointBindings]; there is no global registry. Dropping a model or
//! spawn point instance releases it.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::blueprint::{AgentBlueprintProvider, LinkId};
use crate::data_store::AgentPublisher;
use crate::events::SharedEventNetwork;
use crate::factory::SharedAgentFactory;
use crate::parameters::ParameterSet;
use crate::scenario::Scenario;
use crate::signal::Signal;
use crate::spawn::points::{
    SpawnPointPreRunCommonLibrary, SpawnPointRuntimeCommonLibrary, SpawnPointScenarioLibrary,
};
use crate::stochastics::{Sampler, Stochastics};
use crate::world::{AgentId, SharedWorld};

/// Behaviour instance driven by the scheduler.
pub trait ComponentModel: Send {
    /// Receive the current value of input link `link`.
    fn update_input(&mut self, link: LinkId, signal: Arc<dyn Signal>, time: u64) -> Result<(), String>;

    /// Produce the current value of output link `link`.
    fn update_output(&mut self, link: LinkId, time: u64) -> Result<Arc<dyn Signal>, String>;

    /// Run one cycle of the model.
    fn trigger(&mut self, time: u64) -> Result<(), String>;
}

/// Everything a component receives at construction.
#[derive(Debug, Clone)]
pub struct ComponentParameters {
    pub component_name: String,
    pub agent_id: AgentId,
    pub priority: i32,
    pub offset_ms: u64,
    pub response_time_ms: u64,
    pub cycle_time_ms: u64,
    pub parameters: ParameterSet,
    pub stochastics: Stochastics,
    pub world: SharedWorld,
    pub event_network: SharedEventNetwork,
    pub publisher: AgentPublisher,
}

/// Constructor side of a component plugin.
pub trait ComponentLibrary: Send + Sync + Debug {
    fn version(&self) -> &str;

    fn create_instance(&self, parameters: ComponentParameters) -> Result<Box<dyn ComponentModel>, String>;
}

/// Library name → component library.
#[derive(Debug, Clone, Default)]
pub struct ModelBinding {
    libraries: BTreeMap<String, Arc<dyn ComponentLibrary>>,
}

impl ModelBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `library` under `name`, replacing any previous registration.
    pub fn register(&mut self, name: impl Into<String>, library: Arc<dyn ComponentLibrary>) {
        self.libraries.insert(name.into(), library);
    }

    pub fn with_library(mut self, name: impl Into<String>, library: Arc<dyn ComponentLibrary>) -> Self {
        self.register(name, library);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ComponentLibrary>> {
        self.libraries.get(name)
    }

    pub fn library_names(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }
}

/// Agent source driven by the spawn orchestrator.
pub trait SpawnPoint: Send + Sync + Debug {
    /// Create the agents due at `time` and return their ids.
    fn trigger(&mut self, time: u64) -> Result<Vec<AgentId>, String>;
}

/// Everything a spawn point receives at construction.
///
/// A spawn point configured with a profile gets the sampled `parameters`; otherwise it
/// gets the `scenario`.
#[derive(Debug, Clone)]
pub struct SpawnPointDependencies {
    pub agent_factory: SharedAgentFactory,
    pub world: SharedWorld,
    pub blueprint_provider: Arc<dyn AgentBlueprintProvider>,
    pub sampler: Sampler,
    pub parameters: Option<ParameterSet>,
    pub scenario: Option<Arc<Scenario>>,
}

impl SpawnPointDependencies {
    pub fn new(
        agent_factory: SharedAgentFactory,
        world: SharedWorld,
        blueprint_provider: Arc<dyn AgentBlueprintProvider>,
        sampler: Sampler,
    ) -> Self {
        Self {
            agent_factory,
            world,
            blueprint_provider,
            sampler,
            parameters: None,
            scenario: None,
        }
    }

    pub fn with_scenario(mut self, scenario: Arc<Scenario>) -> Self {
        self.scenario = Some(scenario);
        self
    }

    pub fn with_parameters(mut self, parameters: ParameterSet) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

/// Constructor side of a spawn point plugin.
pub trait SpawnPointLibrary: Send + Sync + Debug {
    fn version(&self) -> &str;

    fn create_instance(&self, dependencies: SpawnPointDependencies) -> Result<Box<dyn SpawnPoint>, String>;
}

/// Library name → spawn point library.
#[derive(Debug, Clone, Default)]
pub struct SpawnPointBindings {
    libraries: BTreeMap<String, Arc<dyn SpawnPointLibrary>>,
}

impl SpawnPointBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings with the built-in spawn points registered under their library names.
    pub fn with_defaults() -> Self {
        Self::new()
            .with_library(SpawnPointScenarioLibrary::NAME, Arc::new(SpawnPointScenarioLibrary))
            .with_library(
                SpawnPointPreRunCommonLibrary::NAME,
                Arc::new(SpawnPointPreRunCommonLibrary),
            )
            .with_library(
                SpawnPointRuntimeCommonLibrary::NAME,
                Arc::new(SpawnPointRuntimeCommonLibrary),
            )
    }

    pub fn register(&mut self, name: impl Into<String>, library: Arc<dyn SpawnPointLibrary>) {
        self.libraries.insert(name.into(), library);
    }

    pub fn with_library(mut self, name: impl Into<String>, library: Arc<dyn SpawnPointLibrary>) -> Self {
        self.register(name, library);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn SpawnPointLibrary>> {
        self.libraries.get(name)
    }

    pub fn library_names(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }
}

/// Run a plugin constructor, turning a panic into an error string.
pub(crate) fn call_plugin<T>(create: impl FnOnce() -> Result<T, String>) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(create)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Err(format!("plugin panicked: {}", message))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{test_model_binding, NullLibrary};

    #[test]
    fn plugin_panics_become_errors() {
        assert_eq!(call_plugin(|| Ok::<_, String>(3)), Ok(3));
        assert_eq!(
            call_plugin::<()>(|| panic!("bad parameters")),
            Err("plugin panicked: bad parameters".to_string())
        );
        let owned = call_plugin::<()>(|| panic!("{} missing", "Rate"));
        assert_eq!(owned, Err("plugin panicked: Rate missing".to_string()));
    }

    #[test]
    fn default_spawn_point_bindings_hold_the_built_in_libraries() {
        let bindings = SpawnPointBindings::with_defaults();
        assert_eq!(
            bindings.library_names().collect::<Vec<_>>(),
            vec![
                "SpawnPointPreRunCommon",
                "SpawnPointRuntimeCommon",
                "SpawnPointScenario"
            ]
        );
    }

    #[test]
    fn later_registration_replaces_earlier_one() {
        let binding = test_model_binding().with_library("Null", Arc::new(NullLibrary::versioned("2.0")));
        assert_eq!(binding.get("Null").map(|l| l.version()), Some("2.0"));
        assert!(binding.get("Unknown").is_none());
    }
}
