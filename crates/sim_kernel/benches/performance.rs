//! Performance benchmarks for sim_kernel using Criterion.rs.

use std::sync::Arc;

use bevy_ecs::prelude::World;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sim_kernel::config::KernelConfig;
use sim_kernel::events::{Event, EventKind, EventNetwork};
use sim_kernel::kernel::{build_kernel, KernelSetup};
use sim_kernel::parameters::ParameterSet;
use sim_kernel::runner::{initialize_run, kernel_schedule, run_until_end};
use sim_kernel::spawn::{SpawnPointLibraryInfo, SpawnPointPhase, SpawnPointProfiles};
use sim_kernel::test_helpers::{
    source_relay_blueprint, test_blueprint_provider, test_model_binding, TestKernel,
};
use sim_kernel::world::AgentId;

fn bench_kernel_run(c: &mut Criterion) {
    let scenarios = vec![("small", 10_i64, 50_i64), ("medium", 50, 200), ("large", 200, 500)];

    let mut group = c.benchmark_group("kernel_run");
    for (name, pre_run_agents, interval_ms) in scenarios {
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &(pre_run_agents, interval_ms),
            |b, &(pre_run_agents, interval_ms)| {
                b.iter(|| {
                    let profiles = SpawnPointProfiles::new()
                        .with_alternative(
                            "Initial",
                            1.0,
                            ParameterSet::new()
                                .with("Count", pre_run_agents)
                                .with("AgentProfile", "car"),
                        )
                        .with_alternative(
                            "Traffic",
                            1.0,
                            ParameterSet::new()
                                .with("AgentProfile", "car")
                                .with("Distribution", "Uniform")
                                .with("IntervalMs", interval_ms),
                        );
                    let config = KernelConfig::default()
                        .with_seed(42)
                        .with_cycle_time_ms(100)
                        .with_end_time_ms(60 * 1000)
                        .with_spawn_point_profiles(profiles)
                        .with_spawn_point(
                            SpawnPointLibraryInfo::new("SpawnPointPreRunCommon", 1, SpawnPointPhase::PreRun)
                                .with_profile("Initial"),
                        )
                        .with_spawn_point(
                            SpawnPointLibraryInfo::new("SpawnPointRuntimeCommon", 0, SpawnPointPhase::Runtime)
                                .with_profile("Traffic"),
                        );

                    let mut world = World::new();
                    let setup = KernelSetup::new(
                        config,
                        test_model_binding(),
                        Arc::new(test_blueprint_provider()),
                    );
                    build_kernel(&mut world, setup).expect("kernel should build");
                    initialize_run(&mut world).expect("pre-run spawning should succeed");
                    let mut schedule = kernel_schedule();
                    black_box(run_until_end(&mut world, &mut schedule, 1_000_000));
                });
            },
        );
    }
    group.finish();
}

fn bench_agent_creation(c: &mut Criterion) {
    let blueprint = source_relay_blueprint("Car");

    c.bench_function("add_agent_100", |b| {
        b.iter(|| {
            let kernel = TestKernel::new(test_model_binding());
            let mut factory = kernel.factory.lock();
            for _ in 0..100 {
                black_box(factory.add_agent(&blueprint).expect("agent should build"));
            }
        });
    });
}

fn bench_event_network(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_network");

    group.bench_function("insert_and_archive_1000", |b| {
        b.iter(|| {
            let mut network = EventNetwork::new();
            for time in 0..1000_u64 {
                network.insert_event(
                    Event::new(time, "tick", "bench", EventKind::Basic)
                        .with_triggering_entities([AgentId((time % 16) as u32)]),
                );
                if time % 10 == 9 {
                    network.clear_active_events();
                }
            }
            black_box(network.archived_len());
        });
    });

    group.bench_function("prune_sliding_window", |b| {
        b.iter(|| {
            let mut network = EventNetwork::new();
            for time in (0..10_000_u64).step_by(100) {
                for _ in 0..10 {
                    network.insert_event(Event::new(time, "tick", "bench", EventKind::Basic));
                }
                network.clear_active_events();
                network.remove_old_events(time.saturating_sub(1_000));
            }
            black_box(network.archived_len());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_kernel_run, bench_agent_creation, bench_event_network);
criterion_main!(benches);
