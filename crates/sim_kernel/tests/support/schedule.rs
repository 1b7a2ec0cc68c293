#![allow(dead_code)]

use bevy_ecs::prelude::World;
use bevy_ecs::schedule::Schedule;
use sim_kernel::runner::{kernel_schedule, run_tick, run_until_end};

/// Helper that owns a reusable `Schedule` so tests can step or drain the run.
pub struct ScheduleRunner {
    schedule: Schedule,
}

impl Default for ScheduleRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleRunner {
    pub fn new() -> Self {
        Self {
            schedule: kernel_schedule(),
        }
    }

    /// Run a single tick (returns `true` if one ran).
    pub fn run_one(&mut self, world: &mut World) -> bool {
        run_tick(world, &mut self.schedule)
    }

    pub fn run_until_end(&mut self, world: &mut World, max_ticks: usize) -> usize {
        run_until_end(world, &mut self.schedule, max_ticks)
    }

    /// Drive the run until the clock reaches its end time.
    pub fn run_full(&mut self, world: &mut World) -> usize {
        self.run_until_end(world, usize::MAX)
    }
}
