//! Run a scenario with an ego car, pre-run traffic and a runtime traffic stream, then print
//! what the kernel produced.
//!
//! Run with: cargo run -p sim_kernel --example kernel_run
//! Set RUST_LOG=debug to see every spawned agent.

use std::sync::Arc;

use bevy_ecs::prelude::World;
use sim_kernel::clock::SimulationClock;
use sim_kernel::config::KernelConfig;
use sim_kernel::data_store::InMemoryDataStore;
use sim_kernel::error::Result;
use sim_kernel::kernel::{build_kernel, ActiveAgents, KernelFaults, KernelSetup, RunResultResource};
use sim_kernel::logging::init_logging;
use sim_kernel::runner::{initialize_run, kernel_schedule, run_until_end};
use sim_kernel::scenario::Scenario;
use sim_kernel::test_helpers::{test_blueprint_provider, test_model_binding};

const CONFIG: &str = r#"{
    "seed": 123,
    "cycle_time_ms": 100,
    "end_time_ms": 30000,
    "event_retention_ms": 5000,
    "spawn_points": [
        {"library_name": "SpawnPointScenario", "priority": 10, "phase": "PreRun"},
        {"library_name": "SpawnPointPreRunCommon", "priority": 1, "phase": "PreRun", "profile_name": "Initial"},
        {"library_name": "SpawnPointRuntimeCommon", "phase": "Runtime", "profile_name": "Stream"}
    ],
    "spawn_point_profiles": {
        "Initial": [
            {"probability": 1.0, "parameters": {"Count": 5, "AgentProfile": "car"}}
        ],
        "Stream": [
            {"probability": 0.7, "parameters": {"AgentProfile": "car", "Rate": 0.5, "MaxCount": 20}},
            {"probability": 0.3, "parameters": {"AgentProfile": "car", "Distribution": "Uniform", "IntervalMs": 1500}}
        ]
    }
}"#;

const SCENARIO: &str = r#"{
    "entities": [
        {"name": "Ego", "catalog_reference": "car"},
        {"name": "Lead", "catalog_reference": "car"}
    ]
}"#;

fn main() -> Result<()> {
    init_logging("info");

    let config = KernelConfig::from_json_str(CONFIG)?;
    let scenario = Scenario::from_json_str(SCENARIO)?;
    let store = Arc::new(InMemoryDataStore::new());

    let mut world = World::new();
    let setup = KernelSetup::new(config, test_model_binding(), Arc::new(test_blueprint_provider()))
        .with_data_store(store.clone())
        .with_scenario(scenario);
    build_kernel(&mut world, setup)?;
    initialize_run(&mut world)?;
    let initial_agents = world.resource::<ActiveAgents>().0.len();

    let mut schedule = kernel_schedule();
    let ticks = run_until_end(&mut world, &mut schedule, 1_000_000);

    let clock = world.resource::<SimulationClock>();
    let agents = world.resource::<ActiveAgents>().0.len();
    let faults = world.resource::<KernelFaults>();
    let run_result = world.resource::<RunResultResource>().0.lock().clone();

    println!("--- Kernel run (seed 123, {} ms ticks) ---", clock.cycle_time_ms());
    println!("Ticks executed: {}", ticks);
    println!("Simulation time: {} s", clock.now() / 1000);
    println!("Agents before first tick: {}", initial_agents);
    println!("Agents at end: {}", agents);
    println!("Cyclic records: {}", store.cyclics().len());
    println!("Narrated events: {}", store.acyclics().len());
    println!("Collisions: {:?}", run_result.collision_ids());
    println!("Faults: {}", faults.0.len());
    for fault in faults.0.iter().take(10) {
        println!("  {}", fault);
    }
    Ok(())
}
