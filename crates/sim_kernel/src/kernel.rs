//! Assembly of kernel parts into an ECS world for the tick driver.

use std::sync::Arc;

use bevy_ecs::prelude::{Resource, World};
use parking_lot::Mutex;
use tracing::info;

use crate::bindings::{ModelBinding, SpawnPointBindings, SpawnPointDependencies};
use crate::blueprint::AgentBlueprintProvider;
use crate::clock::SimulationClock;
use crate::config::KernelConfig;
use crate::data_store::{InMemoryDataStore, SharedDataStore};
use crate::error::{Result, SimError};
use crate::events::{EventNetwork, RunResult, SharedEventNetwork, SharedRunResult};
use crate::factory::{AgentFactory, SharedAgentFactory};
use crate::scenario::Scenario;
use crate::spawn::SpawnOrchestrator;
use crate::stochastics::{Sampler, Stochastics};
use crate::world::{AgentId, AgentRegistryWorld, SharedWorld};

#[derive(Debug, Clone, Resource)]
pub struct AgentFactoryResource(pub SharedAgentFactory);

#[derive(Debug, Clone, Resource)]
pub struct EventNetworkResource(pub SharedEventNetwork);

#[derive(Debug, Clone, Resource)]
pub struct RunResultResource(pub SharedRunResult);

#[derive(Debug, Resource)]
pub struct SpawnOrchestratorResource(pub SpawnOrchestrator);

#[derive(Debug, Clone, Copy, Resource)]
pub struct EventRetentionMs(pub u64);

/// Agents handed over by the orchestrator and cycled every tick, in admission order.
#[derive(Debug, Clone, Default, Resource)]
pub struct ActiveAgents(pub Vec<AgentId>);

/// Faults raised by systems, in the order they happened.
#[derive(Debug, Clone, Default, Resource)]
pub struct KernelFaults(pub Vec<SimError>);

/// Collaborators and configuration of one run.
#[derive(Debug)]
pub struct KernelSetup {
    config: KernelConfig,
    model_binding: ModelBinding,
    spawn_bindings: SpawnPointBindings,
    blueprint_provider: Arc<dyn AgentBlueprintProvider>,
    world: SharedWorld,
    data_store: SharedDataStore,
    scenario: Option<Arc<Scenario>>,
}

impl KernelSetup {
    /// Setup with the built-in spawn points, an in-memory world and an in-memory data store.
    pub fn new(
        config: KernelConfig,
        model_binding: ModelBinding,
        blueprint_provider: Arc<dyn AgentBlueprintProvider>,
    ) -> Self {
        Self {
            config,
            model_binding,
            spawn_bindings: SpawnPointBindings::with_defaults(),
            blueprint_provider,
            world: Arc::new(AgentRegistryWorld::new()),
            data_store: Arc::new(InMemoryDataStore::new()),
            scenario: None,
        }
    }

    pub fn with_spawn_bindings(mut self, spawn_bindings: SpawnPointBindings) -> Self {
        self.spawn_bindings = spawn_bindings;
        self
    }

    pub fn with_world(mut self, world: SharedWorld) -> Self {
        self.world = world;
        self
    }

    pub fn with_data_store(mut self, data_store: SharedDataStore) -> Self {
        self.data_store = data_store;
        self
    }

    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = Some(Arc::new(scenario));
        self
    }
}

/// Build every kernel part, load the spawn points and insert it all as resources.
pub fn build_kernel(world: &mut World, setup: KernelSetup) -> Result<()> {
    let KernelSetup {
        config,
        model_binding,
        spawn_bindings,
        blueprint_provider,
        world: sim_world,
        data_store,
        scenario,
    } = setup;
    config.validate()?;

    let stochastics = Stochastics::new(config.seed);
    let sampler = Sampler::new(config.seed.wrapping_add(1));
    let event_network = EventNetwork::with_publisher(Arc::clone(&data_store)).into_shared();
    let run_result: SharedRunResult = Arc::new(Mutex::new(RunResult::new()));

    let agent_factory = AgentFactory::new(
        Arc::new(model_binding),
        Arc::clone(&sim_world),
        stochastics,
        Arc::clone(&event_network),
        data_store,
    )
    .into_shared();

    let mut dependencies = SpawnPointDependencies::new(
        Arc::clone(&agent_factory),
        sim_world,
        blueprint_provider,
        sampler,
    );
    if let Some(scenario) = scenario {
        dependencies = dependencies.with_scenario(scenario);
    }

    let mut orchestrator = SpawnOrchestrator::new(spawn_bindings);
    orchestrator.instantiate(
        &config.spawn_points,
        &dependencies,
        &config.spawn_point_profiles,
    )?;

    info!(
        seed = config.seed,
        cycle_time_ms = config.cycle_time_ms,
        end_time_ms = config.end_time_ms,
        spawn_points = config.spawn_points.len(),
        "kernel built"
    );

    world.insert_resource(SimulationClock::new(config.cycle_time_ms, config.end_time_ms));
    world.insert_resource(AgentFactoryResource(agent_factory));
    world.insert_resource(EventNetworkResource(event_network));
    world.insert_resource(RunResultResource(run_result));
    world.insert_resource(SpawnOrchestratorResource(orchestrator));
    world.insert_resource(EventRetentionMs(config.event_retention_ms));
    world.insert_resource(ActiveAgents::default());
    world.insert_resource(KernelFaults::default());
    Ok(())
}
