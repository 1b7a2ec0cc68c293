use bevy_ecs::prelude::Resource;

/// Fixed-step simulation time.
#[derive(Debug, Clone, PartialEq, Eq, Resource)]
pub struct SimulationClock {
    now: u64,
    cycle_time_ms: u64,
    end_time_ms: u64,
    ticks: u64,
}

impl SimulationClock {
    pub fn new(cycle_time_ms: u64, end_time_ms: u64) -> Self {
        debug_assert!(cycle_time_ms > 0, "cycle time must be positive");
        Self {
            now: 0,
            cycle_time_ms,
            end_time_ms,
            ticks: 0,
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn cycle_time_ms(&self) -> u64 {
        self.cycle_time_ms
    }

    pub fn end_time_ms(&self) -> u64 {
        self.end_time_ms
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_finished(&self) -> bool {
        self.now >= self.end_time_ms
    }

    /// Move to the next tick and return the new time.
    pub fn advance(&mut self) -> u64 {
        self.now = self.now.saturating_add(self.cycle_time_ms);
        self.ticks += 1;
        self.now
    }
}
