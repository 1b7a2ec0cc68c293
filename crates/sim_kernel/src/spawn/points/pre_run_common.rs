use tracing::info;

use crate::bindings::{SpawnPoint, SpawnPointDependencies, SpawnPointLibrary};
use crate::world::AgentId;

use super::AgentProfileChoice;

/// Pre-run spawn point that fills the scene with `Count` agents drawn from agent profiles.
#[derive(Debug)]
pub struct SpawnPointPreRunCommon {
    dependencies: SpawnPointDependencies,
    profiles: AgentProfileChoice,
    count: usize,
    spawned: bool,
}

impl SpawnPoint for SpawnPointPreRunCommon {
    fn trigger(&mut self, _time: u64) -> Result<Vec<AgentId>, String> {
        if self.spawned {
            return Ok(Vec::new());
        }
        self.spawned = true;

        let mut ids = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            if let Some(id) = self
                .profiles
                .spawn(&self.dependencies, SpawnPointPreRunCommonLibrary::NAME)?
            {
                ids.push(id);
            }
        }
        info!(
            requested = self.count,
            spawned = ids.len(),
            "pre-run common agents spawned"
        );
        Ok(ids)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnPointPreRunCommonLibrary;

impl SpawnPointPreRunCommonLibrary {
    pub const NAME: &'static str = "SpawnPointPreRunCommon";
}

impl SpawnPointLibrary for SpawnPointPreRunCommonLibrary {
    fn version(&self) -> &str {
        "1.0.0"
    }

    fn create_instance(&self, dependencies: SpawnPointDependencies) -> Result<Box<dyn SpawnPoint>, String> {
        let parameters = dependencies
            .parameters
            .as_ref()
            .ok_or_else(|| format!("{} needs a spawn point profile", Self::NAME))?;
        let count = parameters
            .get_int("Count")
            .ok_or_else(|| "missing Count".to_string())?;
        let count = usize::try_from(count).map_err(|_| format!("Count must not be negative, got {}", count))?;
        let profiles = AgentProfileChoice::from_parameters(parameters)?;

        Ok(Box::new(SpawnPointPreRunCommon {
            dependencies,
            profiles,
            count,
            spawned: false,
        }))
    }
}
