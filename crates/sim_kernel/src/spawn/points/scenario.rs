use std::sync::Arc;

use tracing::info;

use crate::bindings::{SpawnPoint, SpawnPointDependencies, SpawnPointLibrary};
use crate::scenario::Scenario;
use crate::world::AgentId;

/// Pre-run spawn point that creates one agent per scenario entity, ego first.
///
/// Every failure is fatal: a scenario without all of its entities is not the scenario.
#[derive(Debug)]
pub struct SpawnPointScenario {
    dependencies: SpawnPointDependencies,
    scenario: Arc<Scenario>,
    spawned: bool,
}

impl SpawnPoint for SpawnPointScenario {
    fn trigger(&mut self, _time: u64) -> Result<Vec<AgentId>, String> {
        if self.spawned {
            return Ok(Vec::new());
        }
        self.spawned = true;

        let entities = self.scenario.entities.iter();
        let ordered = entities
            .clone()
            .filter(|e| e.is_ego())
            .chain(entities.filter(|e| !e.is_ego()));

        let mut ids = Vec::with_capacity(self.scenario.entities.len());
        for entity in ordered {
            let blueprint = self
                .dependencies
                .blueprint_provider
                .blueprint_for_entity(entity)
                .map_err(|err| format!("entity '{}': {}", entity.name, err))?;
            let id = self
                .dependencies
                .agent_factory
                .lock()
                .add_agent(&blueprint)
                .map_err(|err| format!("entity '{}': {}", entity.name, err))?;
            info!(agent_id = %id, entity = %entity.name, "scenario agent spawned");
            ids.push(id);
        }
        Ok(ids)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnPointScenarioLibrary;

impl SpawnPointScenarioLibrary {
    pub const NAME: &'static str = "SpawnPointScenario";
}

impl SpawnPointLibrary for SpawnPointScenarioLibrary {
    fn version(&self) -> &str {
        "1.0.0"
    }

    fn create_instance(&self, dependencies: SpawnPointDependencies) -> Result<Box<dyn SpawnPoint>, String> {
        let scenario = dependencies
            .scenario
            .clone()
            .ok_or_else(|| format!("{} needs a scenario", Self::NAME))?;
        Ok(Box::new(SpawnPointScenario {
            dependencies,
            scenario,
            spawned: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::AgentCategory;
    use crate::parameters::ParameterSet;
    use crate::scenario::ScenarioEntity;
    use crate::test_helpers::{test_model_binding, TestKernel};

    fn scenario() -> Arc<Scenario> {
        Arc::new(
            Scenario::new()
                .with_entity(ScenarioEntity::new("Lead", "car"))
                .with_entity(ScenarioEntity::new("Ego", "car"))
                .with_entity(ScenarioEntity::new("Follower", "car")),
        )
    }

    #[test]
    fn spawns_every_entity_once_with_ego_first() {
        let kernel = TestKernel::new(test_model_binding());
        let mut spawn_point = SpawnPointScenarioLibrary
            .create_instance(kernel.spawn_dependencies().with_scenario(scenario()))
            .unwrap();

        let ids = spawn_point.trigger(0).unwrap();

        assert_eq!(ids.len(), 3);
        let factory = kernel.factory.lock();
        assert_eq!(factory.agent(ids[0]).unwrap().category(), AgentCategory::Ego);
        assert_eq!(factory.agent(ids[1]).unwrap().category(), AgentCategory::Scenario);
        drop(factory);
        assert!(spawn_point.trigger(100).unwrap().is_empty());
    }

    #[test]
    fn unknown_catalog_reference_is_fatal() {
        let kernel = TestKernel::new(test_model_binding());
        let scenario = Arc::new(Scenario::new().with_entity(ScenarioEntity::new("Ego", "bicycle")));
        let mut spawn_point = SpawnPointScenarioLibrary
            .create_instance(kernel.spawn_dependencies().with_scenario(scenario))
            .unwrap();

        let err = spawn_point.trigger(0).unwrap_err();
        assert!(err.contains("bicycle"), "{}", err);
    }

    #[test]
    fn requires_a_scenario() {
        let kernel = TestKernel::new(test_model_binding());
        let dependencies = kernel.spawn_dependencies().with_parameters(ParameterSet::new());
        assert!(SpawnPointScenarioLibrary.create_instance(dependencies).is_err());
    }
}
