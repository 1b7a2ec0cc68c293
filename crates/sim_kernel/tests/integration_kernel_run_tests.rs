mod support;

use sim_kernel::blueprint::{AgentBlueprint, AgentCategory, ComponentBlueprint, StaticBlueprintProvider};
use sim_kernel::clock::SimulationClock;
use sim_kernel::events::EventCategory;
use sim_kernel::parameters::ParameterSet;
use sim_kernel::runner::initialize_run;
use sim_kernel::spawn::{SpawnPointLibraryInfo, SpawnPointPhase, SpawnPointProfiles};
use sim_kernel::test_helpers::source_relay_blueprint;
use support::kernel::{active_agents, faults, run_result, with_event_network, TestKernelBuilder};
use support::schedule::ScheduleRunner;

fn runtime_traffic(interval_ms: i64) -> SpawnPointProfiles {
    SpawnPointProfiles::new().with_alternative(
        "Traffic",
        1.0,
        ParameterSet::new()
            .with("AgentProfile", "car")
            .with("Distribution", "Uniform")
            .with("IntervalMs", interval_ms),
    )
}

fn runtime_spawn_point() -> SpawnPointLibraryInfo {
    SpawnPointLibraryInfo::new("SpawnPointRuntimeCommon", 0, SpawnPointPhase::Runtime).with_profile("Traffic")
}

#[test]
fn run_stops_at_end_time() {
    let mut world = TestKernelBuilder::new().with_end_time_ms(1_000).build();
    initialize_run(&mut world).unwrap();
    let mut runner = ScheduleRunner::new();

    assert_eq!(runner.run_full(&mut world), 10);
    assert_eq!(world.resource::<SimulationClock>().now(), 1_000);
    assert!(!runner.run_one(&mut world));
}

#[test]
fn runtime_spawn_point_feeds_agents_into_the_cycle() {
    let mut world = TestKernelBuilder::new()
        .with_end_time_ms(1_000)
        .with_profiles(runtime_traffic(250))
        .with_spawn_point(runtime_spawn_point())
        .build();
    initialize_run(&mut world).unwrap();
    assert!(active_agents(&world).is_empty());

    let mut runner = ScheduleRunner::new();
    runner.run_one(&mut world);
    assert_eq!(active_agents(&world).len(), 1);

    runner.run_full(&mut world);
    assert_eq!(active_agents(&world).len(), 4);
    assert_eq!(faults(&world), 0);
}

#[test]
fn events_are_archived_each_tick_and_pruned_after_retention() {
    let emitter = AgentBlueprint::new(AgentCategory::Common, "Beacon").with_component(
        "beacon",
        ComponentBlueprint::new("Emitter").with_parameters(ParameterSet::new().with("EventName", "Ping")),
    );
    let mut world = TestKernelBuilder::new()
        .with_end_time_ms(1_000)
        .with_event_retention_ms(300)
        .with_provider(StaticBlueprintProvider::new().with_profile("car", emitter))
        .with_profiles(
            SpawnPointProfiles::new().with_alternative(
                "Traffic",
                1.0,
                ParameterSet::new().with("Count", 1_i64).with("AgentProfile", "car"),
            ),
        )
        .with_spawn_point(
            SpawnPointLibraryInfo::new("SpawnPointPreRunCommon", 0, SpawnPointPhase::PreRun)
                .with_profile("Traffic"),
        )
        .build();
    initialize_run(&mut world).unwrap();
    let mut runner = ScheduleRunner::new();

    runner.run_full(&mut world);

    with_event_network(&world, |network| {
        assert!(network.get_events(EventCategory::Basic).is_empty());
        let times: Vec<u64> = network
            .archived_events(EventCategory::Basic)
            .map(|e| e.time())
            .collect();
        assert_eq!(times, vec![600, 700, 800, 900]);
        let ids: Vec<u64> = network
            .archived_events(EventCategory::Basic)
            .filter_map(|e| e.id())
            .collect();
        assert_eq!(ids, vec![6, 7, 8, 9]);
    });
}

#[test]
fn collisions_reach_the_run_result() {
    let crasher = AgentBlueprint::new(AgentCategory::Common, "Crasher").with_component(
        "detector",
        ComponentBlueprint::new("Emitter")
            .with_timing(200, 0, 1_000)
            .with_parameters(ParameterSet::new().with("EventName", "Collision")),
    );
    let builder = TestKernelBuilder::new()
        .with_end_time_ms(500)
        .with_provider(StaticBlueprintProvider::new().with_profile("car", crasher))
        .with_profiles(
            SpawnPointProfiles::new().with_alternative(
                "Traffic",
                1.0,
                ParameterSet::new().with("Count", 2_i64).with("AgentProfile", "car"),
            ),
        )
        .with_spawn_point(
            SpawnPointLibraryInfo::new("SpawnPointPreRunCommon", 0, SpawnPointPhase::PreRun)
                .with_profile("Traffic"),
        );
    let store = builder.store();
    let mut world = builder.build();
    initialize_run(&mut world).unwrap();

    ScheduleRunner::new().run_full(&mut world);

    let result = run_result(&world);
    assert!(result.has_collision());
    assert_eq!(result.collision_ids(), active_agents(&world).as_slice());

    let narrated: Vec<_> = store
        .acyclics()
        .into_iter()
        .filter(|r| r.value.name == "Collision")
        .collect();
    assert_eq!(narrated.len(), 2);
    assert!(narrated.iter().all(|r| r.time == 200));
}

#[test]
fn same_seed_replays_the_same_run() {
    let run = |seed: u64| {
        let profiles = SpawnPointProfiles::new().with_alternative(
            "Traffic",
            1.0,
            ParameterSet::new().with("AgentProfile", "car").with("Rate", 5.0),
        );
        let mut world = TestKernelBuilder::new()
            .with_seed(seed)
            .with_end_time_ms(2_000)
            .with_provider(StaticBlueprintProvider::new().with_profile("car", source_relay_blueprint("Car")))
            .with_profiles(profiles)
            .with_spawn_point(runtime_spawn_point())
            .build();
        initialize_run(&mut world).unwrap();
        ScheduleRunner::new().run_full(&mut world);
        active_agents(&world).len()
    };

    let first = run(7);
    assert!(first > 0);
    assert_eq!(first, run(7));
}
