#![allow(dead_code)]

use std::sync::Arc;

use bevy_ecs::prelude::World;
use sim_kernel::bindings::{ModelBinding, SpawnPointBindings};
use sim_kernel::blueprint::StaticBlueprintProvider;
use sim_kernel::config::KernelConfig;
use sim_kernel::data_store::InMemoryDataStore;
use sim_kernel::events::{EventNetwork, RunResult};
use sim_kernel::factory::AgentFactory;
use sim_kernel::kernel::{
    build_kernel, ActiveAgents, AgentFactoryResource, EventNetworkResource, KernelFaults,
    KernelSetup, RunResultResource,
};
use sim_kernel::scenario::Scenario;
use sim_kernel::spawn::{SpawnPointLibraryInfo, SpawnPointProfiles};
use sim_kernel::test_helpers::{test_blueprint_provider, test_model_binding};
use sim_kernel::world::{AgentId, AgentRegistryWorld};

/// Builder for reproducible kernel worlds.
#[derive(Debug)]
pub struct TestKernelBuilder {
    config: KernelConfig,
    model_binding: ModelBinding,
    spawn_bindings: SpawnPointBindings,
    provider: StaticBlueprintProvider,
    scenario: Option<Scenario>,
    store: Arc<InMemoryDataStore>,
    world: Arc<AgentRegistryWorld>,
}

impl Default for TestKernelBuilder {
    fn default() -> Self {
        Self {
            config: KernelConfig::default()
                .with_seed(42)
                .with_cycle_time_ms(100)
                .with_end_time_ms(1_000),
            model_binding: test_model_binding(),
            spawn_bindings: SpawnPointBindings::with_defaults(),
            provider: test_blueprint_provider(),
            scenario: None,
            store: Arc::new(InMemoryDataStore::new()),
            world: Arc::new(AgentRegistryWorld::new()),
        }
    }
}

impl TestKernelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config = self.config.with_seed(seed);
        self
    }

    pub fn with_end_time_ms(mut self, end_time_ms: u64) -> Self {
        self.config = self.config.with_end_time_ms(end_time_ms);
        self
    }

    pub fn with_event_retention_ms(mut self, retention_ms: u64) -> Self {
        self.config = self.config.with_event_retention_ms(retention_ms);
        self
    }

    pub fn with_spawn_point(mut self, info: SpawnPointLibraryInfo) -> Self {
        self.config = self.config.with_spawn_point(info);
        self
    }

    pub fn with_profiles(mut self, profiles: SpawnPointProfiles) -> Self {
        self.config = self.config.with_spawn_point_profiles(profiles);
        self
    }

    pub fn with_model_binding(mut self, model_binding: ModelBinding) -> Self {
        self.model_binding = model_binding;
        self
    }

    pub fn with_spawn_bindings(mut self, spawn_bindings: SpawnPointBindings) -> Self {
        self.spawn_bindings = spawn_bindings;
        self
    }

    pub fn with_provider(mut self, provider: StaticBlueprintProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = Some(scenario);
        self
    }

    pub fn store(&self) -> Arc<InMemoryDataStore> {
        self.store.clone()
    }

    pub fn registry(&self) -> Arc<AgentRegistryWorld> {
        self.world.clone()
    }

    pub fn build(self) -> World {
        let mut setup = KernelSetup::new(self.config, self.model_binding, Arc::new(self.provider))
            .with_spawn_bindings(self.spawn_bindings)
            .with_world(self.world)
            .with_data_store(self.store);
        if let Some(scenario) = self.scenario {
            setup = setup.with_scenario(scenario);
        }
        let mut world = World::new();
        build_kernel(&mut world, setup).expect("kernel should build");
        world
    }
}

pub fn active_agents(world: &World) -> Vec<AgentId> {
    world.resource::<ActiveAgents>().0.clone()
}

pub fn faults(world: &World) -> usize {
    world.resource::<KernelFaults>().0.len()
}

pub fn run_result(world: &World) -> RunResult {
    world.resource::<RunResultResource>().0.lock().clone()
}

pub fn with_factory<R>(world: &World, f: impl FnOnce(&AgentFactory) -> R) -> R {
    let factory = world.resource::<AgentFactoryResource>().0.clone();
    let guard = factory.lock();
    f(&guard)
}

pub fn with_event_network<R>(world: &World, f: impl FnOnce(&EventNetwork) -> R) -> R {
    let network = world.resource::<EventNetworkResource>().0.clone();
    let guard = network.lock();
    f(&guard)
}
