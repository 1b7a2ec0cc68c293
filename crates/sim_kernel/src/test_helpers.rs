//! Test helpers: fake component and spawn point libraries plus a pre-assembled kernel.
//!
//! Shared by unit tests, integration tests, benchmarks and the demo.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::bindings::{
    ComponentLibrary, ComponentModel, ComponentParameters, ModelBinding, SpawnPoint,
    SpawnPointDependencies, SpawnPointLibrary,
};
use crate::blueprint::{AgentBlueprint, AgentCategory, ComponentBlueprint, LinkId, StaticBlueprintProvider};
use crate::data_store::{AgentPublisher, InMemoryDataStore};
use crate::events::{Event, EventKind, EventNetwork, SharedEventNetwork};
use crate::factory::{AgentFactory, SharedAgentFactory};
use crate::parameters::ParameterSet;
use crate::signal::{ScalarSignal, Signal};
use crate::stochastics::{Sampler, Stochastics};
use crate::world::{AgentId, AgentRegistryWorld};

/// Seed used by [TestKernel].
pub const TEST_SEED: u64 = 42;

/// Model that accepts everything and always outputs `0.0`.
#[derive(Debug, Default)]
pub struct NullModel;

impl ComponentModel for NullModel {
    fn update_input(&mut self, _link: LinkId, _signal: Arc<dyn Signal>, _time: u64) -> Result<(), String> {
        Ok(())
    }

    fn update_output(&mut self, _link: LinkId, _time: u64) -> Result<Arc<dyn Signal>, String> {
        Ok(Arc::new(ScalarSignal(0.0)))
    }

    fn trigger(&mut self, _time: u64) -> Result<(), String> {
        Ok(())
    }
}

/// Counts model instances created and dropped.
#[derive(Debug, Clone, Default)]
pub struct LifecycleCounter {
    pub created: Arc<AtomicUsize>,
    pub dropped: Arc<AtomicUsize>,
}

#[derive(Debug)]
struct CountedModel {
    counter: LifecycleCounter,
}

impl Drop for CountedModel {
    fn drop(&mut self) {
        self.counter.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

impl ComponentModel for CountedModel {
    fn update_input(&mut self, link: LinkId, signal: Arc<dyn Signal>, time: u64) -> Result<(), String> {
        NullModel.update_input(link, signal, time)
    }

    fn update_output(&mut self, link: LinkId, time: u64) -> Result<Arc<dyn Signal>, String> {
        NullModel.update_output(link, time)
    }

    fn trigger(&mut self, time: u64) -> Result<(), String> {
        NullModel.trigger(time)
    }
}

/// Library of [NullModel]s, optionally counting instances.
#[derive(Debug, Clone)]
pub struct NullLibrary {
    version: String,
    counter: Option<LifecycleCounter>,
}

impl Default for NullLibrary {
    fn default() -> Self {
        Self::versioned("1.0.0")
    }
}

impl NullLibrary {
    pub fn versioned(version: &str) -> Self {
        Self {
            version: version.to_string(),
            counter: None,
        }
    }

    pub fn counting(counter: LifecycleCounter) -> Self {
        Self {
            counter: Some(counter),
            ..Self::default()
        }
    }
}

impl ComponentLibrary for NullLibrary {
    fn version(&self) -> &str {
        &self.version
    }

    fn create_instance(&self, _parameters: ComponentParameters) -> Result<Box<dyn ComponentModel>, String> {
        match &self.counter {
            Some(counter) => {
                counter.created.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(CountedModel {
                    counter: counter.clone(),
                }))
            }
            None => Ok(Box::new(NullModel)),
        }
    }
}

/// Outputs parameter `Value` (default `1.0`) plus `Step` per cycle on every output link.
#[derive(Debug)]
struct ConstantModel {
    value: f64,
    step: f64,
}

impl ComponentModel for ConstantModel {
    fn update_input(&mut self, link: LinkId, _signal: Arc<dyn Signal>, _time: u64) -> Result<(), String> {
        Err(format!("constant source has no input link {}", link))
    }

    fn update_output(&mut self, _link: LinkId, _time: u64) -> Result<Arc<dyn Signal>, String> {
        Ok(Arc::new(ScalarSignal(self.value)))
    }

    fn trigger(&mut self, _time: u64) -> Result<(), String> {
        self.value += self.step;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ConstantLibrary;

impl ComponentLibrary for ConstantLibrary {
    fn version(&self) -> &str {
        "1.0.0"
    }

    fn create_instance(&self, parameters: ComponentParameters) -> Result<Box<dyn ComponentModel>, String> {
        let value = parameters.parameters.get_double("Value").unwrap_or(1.0);
        let step = parameters.parameters.get_double("Step").unwrap_or(0.0);
        // Trigger runs before outputs are read, so start one step back.
        Ok(Box::new(ConstantModel {
            value: value - step,
            step,
        }))
    }
}

/// One scalar received by a relay.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedSignal {
    pub agent_id: AgentId,
    pub component: String,
    pub link: LinkId,
    pub value: f64,
    pub time: u64,
}

pub type SignalLog = Arc<Mutex<Vec<ReceivedSignal>>>;

/// Records every scalar input and outputs the last one times parameter `Gain`.
#[derive(Debug)]
struct RelayModel {
    agent_id: AgentId,
    component: String,
    gain: f64,
    last: f64,
    log: SignalLog,
    publisher: AgentPublisher,
}

impl ComponentModel for RelayModel {
    fn update_input(&mut self, link: LinkId, signal: Arc<dyn Signal>, time: u64) -> Result<(), String> {
        let scalar = signal
            .downcast_ref::<ScalarSignal>()
            .ok_or_else(|| format!("link {} expects a scalar signal", link))?;
        self.last = scalar.0;
        self.log.lock().push(ReceivedSignal {
            agent_id: self.agent_id,
            component: self.component.clone(),
            link,
            value: scalar.0,
            time,
        });
        Ok(())
    }

    fn update_output(&mut self, _link: LinkId, time: u64) -> Result<Arc<dyn Signal>, String> {
        let value = self.last * self.gain;
        self.publisher.publish(time, &format!("{}/Output", self.component), value)?;
        Ok(Arc::new(ScalarSignal(value)))
    }

    fn trigger(&mut self, _time: u64) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelayLibrary {
    pub log: SignalLog,
}

impl ComponentLibrary for RelayLibrary {
    fn version(&self) -> &str {
        "1.0.0"
    }

    fn create_instance(&self, parameters: ComponentParameters) -> Result<Box<dyn ComponentModel>, String> {
        Ok(Box::new(RelayModel {
            agent_id: parameters.agent_id,
            component: parameters.component_name,
            gain: parameters.parameters.get_double("Gain").unwrap_or(1.0),
            last: 0.0,
            log: self.log.clone(),
            publisher: parameters.publisher,
        }))
    }
}

/// Inserts an event named by parameter `EventName` every cycle; `Collision` reports a collision.
#[derive(Debug)]
struct EmitterModel {
    agent_id: AgentId,
    component: String,
    event_name: String,
    event_network: SharedEventNetwork,
}

impl ComponentModel for EmitterModel {
    fn update_input(&mut self, _link: LinkId, _signal: Arc<dyn Signal>, _time: u64) -> Result<(), String> {
        Ok(())
    }

    fn update_output(&mut self, link: LinkId, _time: u64) -> Result<Arc<dyn Signal>, String> {
        Err(format!("emitter has no output link {}", link))
    }

    fn trigger(&mut self, time: u64) -> Result<(), String> {
        let mut network = self.event_network.lock();
        if self.event_name == "Collision" {
            network.insert_event(Event::collision(time, &self.component, self.agent_id, self.agent_id, false));
            network.add_collision(self.agent_id);
        } else {
            network.insert_event(
                Event::new(time, &self.event_name, &self.component, EventKind::Basic)
                    .with_triggering_entities([self.agent_id]),
            );
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct EmitterLibrary;

impl ComponentLibrary for EmitterLibrary {
    fn version(&self) -> &str {
        "1.0.0"
    }

    fn create_instance(&self, parameters: ComponentParameters) -> Result<Box<dyn ComponentModel>, String> {
        Ok(Box::new(EmitterModel {
            agent_id: parameters.agent_id,
            event_name: parameters
                .parameters
                .get_string("EventName")
                .unwrap_or("Tick")
                .to_string(),
            component: parameters.component_name,
            event_network: parameters.event_network,
        }))
    }
}

/// Library whose instances can never be created.
#[derive(Debug, Default)]
pub struct FailingLibrary;

impl ComponentLibrary for FailingLibrary {
    fn version(&self) -> &str {
        "0.0.0"
    }

    fn create_instance(&self, parameters: ComponentParameters) -> Result<Box<dyn ComponentModel>, String> {
        Err(format!("refusing to build '{}'", parameters.component_name))
    }
}

/// Library that panics while building an instance.
#[derive(Debug, Default)]
pub struct PanickingLibrary;

impl ComponentLibrary for PanickingLibrary {
    fn version(&self) -> &str {
        "0.0.0"
    }

    fn create_instance(&self, parameters: ComponentParameters) -> Result<Box<dyn ComponentModel>, String> {
        panic!("{} has no parameters to read", parameters.component_name)
    }
}

/// Bindings for `Null`, `Constant`, `Relay`, `Emitter`, `Failing` and `Panicking`.
pub fn test_model_binding() -> ModelBinding {
    ModelBinding::new()
        .with_library("Null", Arc::new(NullLibrary::default()))
        .with_library("Constant", Arc::new(ConstantLibrary))
        .with_library("Relay", Arc::new(RelayLibrary::default()))
        .with_library("Emitter", Arc::new(EmitterLibrary))
        .with_library("Failing", Arc::new(FailingLibrary))
        .with_library("Panicking", Arc::new(PanickingLibrary))
}

/// Constant source on channel 1 feeding a relay.
pub fn source_relay_blueprint(type_name: &str) -> AgentBlueprint {
    AgentBlueprint::new(AgentCategory::Common, type_name)
        .with_component(
            "source",
            ComponentBlueprint::new("Constant")
                .with_priority(10)
                .with_output(0, 1),
        )
        .with_component(
            "relay",
            ComponentBlueprint::new("Relay")
                .with_priority(1)
                .with_input(0, 1),
        )
}

/// Provider with profile `car` ([source_relay_blueprint]) and `empty` (no components).
pub fn test_blueprint_provider() -> StaticBlueprintProvider {
    StaticBlueprintProvider::new()
        .with_profile("car", source_relay_blueprint("Car"))
        .with_profile("empty", AgentBlueprint::new(AgentCategory::Common, "Empty"))
}

/// Kernel collaborators wired together around an in-memory world and data store.
#[derive(Debug, Clone)]
pub struct TestKernel {
    pub world: Arc<AgentRegistryWorld>,
    pub store: Arc<InMemoryDataStore>,
    pub event_network: SharedEventNetwork,
    pub factory: SharedAgentFactory,
}

impl TestKernel {
    pub fn new(binding: ModelBinding) -> Self {
        Self::with_world(binding, AgentRegistryWorld::new())
    }

    /// Kernel whose world accepts at most `capacity` agents.
    pub fn with_capacity_limit(binding: ModelBinding, capacity: usize) -> Self {
        Self::with_world(binding, AgentRegistryWorld::with_capacity_limit(capacity))
    }

    fn with_world(binding: ModelBinding, world: AgentRegistryWorld) -> Self {
        let world = Arc::new(world);
        let store = Arc::new(InMemoryDataStore::new());
        let event_network = EventNetwork::with_publisher(store.clone()).into_shared();
        let factory = AgentFactory::new(
            Arc::new(binding),
            world.clone(),
            Stochastics::new(TEST_SEED),
            event_network.clone(),
            store.clone(),
        )
        .into_shared();
        Self {
            world,
            store,
            event_network,
            factory,
        }
    }

    /// Spawn point dependencies using [test_blueprint_provider].
    pub fn spawn_dependencies(&self) -> SpawnPointDependencies {
        SpawnPointDependencies::new(
            self.factory.clone(),
            self.world.clone(),
            Arc::new(test_blueprint_provider()),
            Sampler::new(TEST_SEED),
        )
    }
}

#[derive(Debug, Default)]
struct SpawnLogState {
    triggers: Vec<(String, u64)>,
    created_with: Vec<Option<ParameterSet>>,
}

/// Shared record of spawn point activity.
#[derive(Debug, Clone, Default)]
pub struct SpawnLog(Arc<Mutex<SpawnLogState>>);

impl SpawnLog {
    /// `(label, time)` per trigger, in call order.
    pub fn entries(&self) -> Vec<(String, u64)> {
        self.0.lock().triggers.clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.0.lock().triggers.iter().map(|(label, _)| label.clone()).collect()
    }

    /// Profile parameters each instance was created with.
    pub fn created_with(&self) -> Vec<Option<ParameterSet>> {
        self.0.lock().created_with.clone()
    }
}

#[derive(Debug)]
struct RecordingSpawnPoint {
    label: String,
    log: SpawnLog,
    fail_on_trigger: bool,
    dependencies: SpawnPointDependencies,
}

impl SpawnPoint for RecordingSpawnPoint {
    fn trigger(&mut self, time: u64) -> Result<Vec<AgentId>, String> {
        self.log.0.lock().triggers.push((self.label.clone(), time));
        if self.fail_on_trigger {
            return Err(format!("{} exploded", self.label));
        }
        let blueprint = AgentBlueprint::new(AgentCategory::Common, self.label.clone());
        let id = self
            .dependencies
            .agent_factory
            .lock()
            .add_agent(&blueprint)
            .map_err(|err| err.to_string())?;
        Ok(vec![id])
    }
}

/// Spawn point library whose instances log each trigger and spawn one empty agent.
#[derive(Debug, Clone)]
pub struct RecordingSpawnPointLibrary {
    label: String,
    log: SpawnLog,
    fail_on_create: bool,
    panic_on_create: bool,
    fail_on_trigger: bool,
}

impl RecordingSpawnPointLibrary {
    pub fn new(label: &str, log: SpawnLog) -> Self {
        Self {
            label: label.to_string(),
            log,
            fail_on_create: false,
            panic_on_create: false,
            fail_on_trigger: false,
        }
    }

    pub fn failing_on_create(mut self) -> Self {
        self.fail_on_create = true;
        self
    }

    pub fn panicking_on_create(mut self) -> Self {
        self.panic_on_create = true;
        self
    }

    pub fn failing_on_trigger(mut self) -> Self {
        self.fail_on_trigger = true;
        self
    }
}

impl SpawnPointLibrary for RecordingSpawnPointLibrary {
    fn version(&self) -> &str {
        "1.0.0"
    }

    fn create_instance(&self, dependencies: SpawnPointDependencies) -> Result<Box<dyn SpawnPoint>, String> {
        if self.fail_on_create {
            return Err(format!("{} cannot be created", self.label));
        }
        if self.panic_on_create {
            panic!("{} lost its configuration", self.label);
        }
        self.log.0.lock().created_with.push(dependencies.parameters.clone());
        Ok(Box::new(RecordingSpawnPoint {
            label: self.label.clone(),
            log: self.log.clone(),
            fail_on_trigger: self.fail_on_trigger,
            dependencies,
        }))
    }
}
