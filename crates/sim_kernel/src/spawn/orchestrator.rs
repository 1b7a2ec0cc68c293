use std::collections::BTreeMap;
use std::mem;

use tracing::{debug, error, info};

use crate::bindings::{call_plugin, SpawnPoint, SpawnPointBindings, SpawnPointDependencies};
use crate::error::{Result, SimError};
use crate::world::AgentId;

use super::library::{SpawnPointLibraryInfo, SpawnPointPhase, SpawnPointProfiles};

/// A loaded spawn point and where it was filed.
#[derive(Debug)]
pub struct SpawnPointInstance {
    library_name: String,
    priority: i32,
    phase: SpawnPointPhase,
    spawn_point: Box<dyn SpawnPoint>,
}

impl SpawnPointInstance {
    pub fn library_name(&self) -> &str {
        &self.library_name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn phase(&self) -> SpawnPointPhase {
        self.phase
    }
}

type PriorityBuckets = BTreeMap<i32, Vec<SpawnPointInstance>>;

/// Owns every spawn point, grouped by phase and priority.
///
/// Passes run in descending priority; spawn points of equal priority run in the order
/// they were filed. Agents returned by a pass wait in a pending buffer until the driver
/// takes them with [`consume_new_agents`](Self::consume_new_agents).
#[derive(Debug, Default)]
pub struct SpawnOrchestrator {
    bindings: SpawnPointBindings,
    pre_run: PriorityBuckets,
    runtime: PriorityBuckets,
    new_agents: Vec<AgentId>,
}

impl SpawnOrchestrator {
    pub fn new(bindings: SpawnPointBindings) -> Self {
        Self {
            bindings,
            ..Self::default()
        }
    }

    /// Load every spawn point in `infos`.
    ///
    /// `base` carries the shared collaborators and the scenario. Spawn points with a
    /// profile get a parameter set sampled from `profiles` instead of the scenario.
    /// Nothing is filed unless every spawn point loads.
    pub fn instantiate(
        &mut self,
        infos: &[SpawnPointLibraryInfo],
        base: &SpawnPointDependencies,
        profiles: &SpawnPointProfiles,
    ) -> Result<()> {
        let mut loaded = Vec::with_capacity(infos.len());
        for info in infos {
            loaded.push(self.load(info, base, profiles)?);
        }

        for instance in loaded {
            debug!(
                library = %instance.library_name,
                priority = instance.priority,
                phase = ?instance.phase,
                "spawn point filed"
            );
            let buckets = match instance.phase {
                SpawnPointPhase::PreRun => &mut self.pre_run,
                SpawnPointPhase::Runtime => &mut self.runtime,
            };
            buckets.entry(instance.priority).or_default().push(instance);
        }
        info!(
            pre_run = count(&self.pre_run),
            runtime = count(&self.runtime),
            "spawn points instantiated"
        );
        Ok(())
    }

    fn load(
        &self,
        info: &SpawnPointLibraryInfo,
        base: &SpawnPointDependencies,
        profiles: &SpawnPointProfiles,
    ) -> Result<SpawnPointInstance> {
        let library = self.bindings.get(&info.library_name).ok_or_else(|| {
            error!(library = %info.library_name, "spawn point library not bound");
            SimError::BindingNotFound(info.library_name.clone())
        })?;

        let mut dependencies = base.clone();
        match &info.profile_name {
            Some(profile_name) => {
                let parameters = profiles.sample(profile_name, &base.sampler).map_err(|err| {
                    error!(
                        library = %info.library_name,
                        profile = %profile_name,
                        "spawn point profile not found"
                    );
                    err
                })?;
                dependencies.parameters = Some(parameters);
                dependencies.scenario = None;
            }
            None => dependencies.parameters = None,
        }

        let parameters = dependencies.parameters.clone();
        let spawn_point = call_plugin(|| library.create_instance(dependencies)).map_err(|reason| {
            error!(
                library = %info.library_name,
                priority = info.priority,
                phase = ?info.phase,
                parameters = ?parameters,
                %reason,
                "spawn point instantiation failed"
            );
            SimError::Instantiation {
                blueprint: info.library_name.clone(),
                component: info
                    .profile_name
                    .clone()
                    .unwrap_or_else(|| info.library_name.clone()),
                reason,
            }
        })?;

        Ok(SpawnPointInstance {
            library_name: info.library_name.clone(),
            priority: info.priority,
            phase: info.phase,
            spawn_point,
        })
    }

    /// Trigger every pre-run spawn point once.
    pub fn trigger_pre_run_spawn_points(&mut self) -> Result<()> {
        trigger_pass(&mut self.pre_run, 0, &mut self.new_agents)
    }

    /// Trigger every runtime spawn point for `timestamp`.
    pub fn trigger_runtime_spawn_points(&mut self, timestamp: u64) -> Result<()> {
        trigger_pass(&mut self.runtime, timestamp, &mut self.new_agents)
    }

    /// Take the agents spawned since the last call.
    pub fn consume_new_agents(&mut self) -> Vec<AgentId> {
        mem::take(&mut self.new_agents)
    }

    pub fn pending_agents(&self) -> &[AgentId] {
        &self.new_agents
    }

    /// Instances of `phase` in trigger order.
    pub fn spawn_points(&self, phase: SpawnPointPhase) -> impl Iterator<Item = &SpawnPointInstance> {
        let buckets = match phase {
            SpawnPointPhase::PreRun => &self.pre_run,
            SpawnPointPhase::Runtime => &self.runtime,
        };
        buckets.values().rev().flatten()
    }

    /// Drop every spawn point and every pending agent id.
    pub fn clear(&mut self) {
        self.pre_run.clear();
        self.runtime.clear();
        self.new_agents.clear();
    }
}

fn count(buckets: &PriorityBuckets) -> usize {
    buckets.values().map(Vec::len).sum()
}

/// Highest priority first. A fault stops the pass; agents collected before it stay pending.
fn trigger_pass(buckets: &mut PriorityBuckets, time: u64, pending: &mut Vec<AgentId>) -> Result<()> {
    for instances in buckets.values_mut().rev() {
        for instance in instances.iter_mut() {
            let spawned = instance.spawn_point.trigger(time).map_err(|reason| {
                error!(
                    library = %instance.library_name,
                    priority = instance.priority,
                    time,
                    %reason,
                    "spawn point failed"
                );
                SimError::SpawnPointTrigger {
                    library: instance.library_name.clone(),
                    reason,
                }
            })?;
            if !spawned.is_empty() {
                debug!(
                    library = %instance.library_name,
                    priority = instance.priority,
                    time,
                    agents = spawned.len(),
                    "spawn point created agents"
                );
            }
            pending.extend(spawned);
        }
    }
    Ok(())
}
