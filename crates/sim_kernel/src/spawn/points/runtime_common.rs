use tracing::debug;

use crate::bindings::{SpawnPoint, SpawnPointDependencies, SpawnPointLibrary};
use crate::spawn::distributions::{self, InterArrivalDistribution};
use crate::world::AgentId;

use super::AgentProfileChoice;

/// Runtime spawn point that keeps adding agents, spaced by an inter-arrival distribution.
///
/// Parameters: the agent profile keys, the distribution keys, and optional `StartTimeMs`,
/// `EndTimeMs` and `MaxCount`.
#[derive(Debug)]
pub struct SpawnPointRuntimeCommon {
    dependencies: SpawnPointDependencies,
    profiles: AgentProfileChoice,
    inter_arrival: Box<dyn InterArrivalDistribution>,
    start_time_ms: u64,
    end_time_ms: Option<u64>,
    max_count: Option<usize>,
    /// `None` once the distribution can no longer produce a reachable spawn time.
    next_spawn_time_ms: Option<u64>,
    spawned_count: usize,
}

impl SpawnPointRuntimeCommon {
    fn should_spawn(&self, time: u64) -> bool {
        let Some(next) = self.next_spawn_time_ms else {
            return false;
        };
        if let Some(max) = self.max_count {
            if self.spawned_count >= max {
                return false;
            }
        }
        if let Some(end) = self.end_time_ms {
            if next > end {
                return false;
            }
        }
        time >= self.start_time_ms && time >= next
    }

    /// Schedule the next spawn relative to the one just due, so slow ticks catch up.
    /// An infinite gap or a time past `u64::MAX` stops the spawn point for good.
    fn advance(&mut self, time: u64) {
        self.spawned_count += 1;
        let gap_ms = self
            .inter_arrival
            .sample_ms(self.spawned_count as u64 - 1, time);
        self.next_spawn_time_ms = self
            .next_spawn_time_ms
            .zip(finite_gap_ms(gap_ms))
            .and_then(|(next, gap)| next.checked_add(gap));
    }
}

/// Whole-millisecond gap of at least 1 ms; `None` for a gap that never elapses.
fn finite_gap_ms(gap_ms: f64) -> Option<u64> {
    if !gap_ms.is_finite() || gap_ms >= u64::MAX as f64 {
        return None;
    }
    Some((gap_ms as u64).max(1))
}

impl SpawnPoint for SpawnPointRuntimeCommon {
    fn trigger(&mut self, time: u64) -> Result<Vec<AgentId>, String> {
        let mut ids = Vec::new();
        while self.should_spawn(time) {
            if let Some(id) = self
                .profiles
                .spawn(&self.dependencies, SpawnPointRuntimeCommonLibrary::NAME)?
            {
                debug!(agent_id = %id, time, "runtime common agent spawned");
                ids.push(id);
            }
            self.advance(time);
        }
        Ok(ids)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnPointRuntimeCommonLibrary;

impl SpawnPointRuntimeCommonLibrary {
    pub const NAME: &'static str = "SpawnPointRuntimeCommon";
}

fn non_negative(value: Option<i64>, key: &str) -> Result<Option<u64>, String> {
    value
        .map(|v| u64::try_from(v).map_err(|_| format!("{} must not be negative, got {}", key, v)))
        .transpose()
}

impl SpawnPointLibrary for SpawnPointRuntimeCommonLibrary {
    fn version(&self) -> &str {
        "1.0.0"
    }

    fn create_instance(&self, dependencies: SpawnPointDependencies) -> Result<Box<dyn SpawnPoint>, String> {
        let parameters = dependencies
            .parameters
            .as_ref()
            .ok_or_else(|| format!("{} needs a spawn point profile", Self::NAME))?;
        let profiles = AgentProfileChoice::from_parameters(parameters)?;
        let inter_arrival = distributions::from_parameters(parameters, dependencies.sampler.next_seed())?;
        let start_time_ms = non_negative(parameters.get_int("StartTimeMs"), "StartTimeMs")?.unwrap_or(0);
        let end_time_ms = non_negative(parameters.get_int("EndTimeMs"), "EndTimeMs")?;
        let max_count = non_negative(parameters.get_int("MaxCount"), "MaxCount")?.map(|v| v as usize);
        // A distribution whose first gap never elapses never spawns at all.
        let next_spawn_time_ms =
            finite_gap_ms(inter_arrival.sample_ms(0, start_time_ms)).map(|_| start_time_ms);

        Ok(Box::new(SpawnPointRuntimeCommon {
            dependencies,
            profiles,
            inter_arrival,
            start_time_ms,
            end_time_ms,
            max_count,
            next_spawn_time_ms,
            spawned_count: 0,
        }))
    }
}
