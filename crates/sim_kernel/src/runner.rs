//! Reference tick driver: advances the clock and runs one kernel cycle per tick.
//!
//! Clock progression happens here, outside systems. Each tick runs the schedule at the
//! current time, then advances the clock. Within a tick the systems run in a fixed
//! order: runtime spawning, admission of new agents, agent cycles, event bookkeeping.

use bevy_ecs::prelude::{Res, ResMut, Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;
use tracing::{info, warn};

use crate::clock::SimulationClock;
use crate::error::Result;
use crate::kernel::{
    ActiveAgents, AgentFactoryResource, EventNetworkResource, EventRetentionMs, KernelFaults,
    RunResultResource, SpawnOrchestratorResource,
};

/// Trigger runtime spawn points for the current time.
pub fn runtime_spawn_system(
    clock: Res<SimulationClock>,
    mut orchestrator: ResMut<SpawnOrchestratorResource>,
    mut faults: ResMut<KernelFaults>,
) {
    if let Err(err) = orchestrator.0.trigger_runtime_spawn_points(clock.now()) {
        faults.0.push(err);
    }
}

/// Move agents spawned since the last tick into the set of cycled agents.
pub fn admit_new_agents_system(
    mut orchestrator: ResMut<SpawnOrchestratorResource>,
    mut active: ResMut<ActiveAgents>,
) {
    active.0.extend(orchestrator.0.consume_new_agents());
}

/// Cycle every admitted agent. A faulty agent is reported and the others still run.
pub fn agent_cycle_system(
    clock: Res<SimulationClock>,
    factory: Res<AgentFactoryResource>,
    active: Res<ActiveAgents>,
    mut faults: ResMut<KernelFaults>,
) {
    let now = clock.now();
    let mut factory = factory.0.lock();
    for id in &active.0 {
        let Some(agent) = factory.agent_mut(*id) else {
            continue;
        };
        if let Err(err) = agent.cycle(now) {
            warn!(agent_id = %id, time = now, error = %err, "agent cycle failed");
            faults.0.push(err);
        }
    }
}

/// Archive this tick's events and prune the archive to the retention window.
pub fn event_cycle_system(
    clock: Res<SimulationClock>,
    network: Res<EventNetworkResource>,
    retention: Res<EventRetentionMs>,
) {
    let mut network = network.0.lock();
    network.clear_active_events();
    network.remove_old_events(clock.now().saturating_sub(retention.0));
}

/// The per-tick kernel schedule.
pub fn kernel_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            runtime_spawn_system,
            admit_new_agents_system,
            agent_cycle_system,
            event_cycle_system,
        )
            .chain(),
    );
    schedule
}

/// Bind the run result collector, trigger pre-run spawn points and admit their agents.
///
/// Call once after [`build_kernel`](crate::kernel::build_kernel) and before the first tick.
pub fn initialize_run(world: &mut World) -> Result<()> {
    let run_result = world.resource::<RunResultResource>().0.clone();
    world
        .resource::<EventNetworkResource>()
        .0
        .lock()
        .initialize(run_result);

    world
        .resource_mut::<SpawnOrchestratorResource>()
        .0
        .trigger_pre_run_spawn_points()?;
    let spawned = world
        .resource_mut::<SpawnOrchestratorResource>()
        .0
        .consume_new_agents();
    info!(agents = spawned.len(), "pre-run spawning done");
    world.resource_mut::<ActiveAgents>().0.extend(spawned);
    Ok(())
}

/// Run the schedule for the current tick and advance the clock.
/// Returns `false` without running anything once the clock reached its end time.
pub fn run_tick(world: &mut World, schedule: &mut Schedule) -> bool {
    if world.resource::<SimulationClock>().is_finished() {
        return false;
    }
    schedule.run(world);
    world.resource_mut::<SimulationClock>().advance();
    true
}

/// Run ticks until the end time or `max_ticks`. Returns the number of ticks run.
pub fn run_until_end(world: &mut World, schedule: &mut Schedule, max_ticks: usize) -> usize {
    let mut ticks = 0;
    while ticks < max_ticks && run_tick(world, schedule) {
        ticks += 1;
    }
    ticks
}
