use std::sync::Arc;

use parking_lot::Mutex;

use crate::world::AgentId;

/// Outcome facts of one run, filled while the run is in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResult {
    collision_ids: Vec<AgentId>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a collided agent. Repeated reports of the same agent are kept once.
    pub fn add_collision(&mut self, agent_id: AgentId) {
        if !self.collision_ids.contains(&agent_id) {
            self.collision_ids.push(agent_id);
        }
    }

    pub fn collision_ids(&self) -> &[AgentId] {
        &self.collision_ids
    }

    pub fn has_collision(&self) -> bool {
        !self.collision_ids.is_empty()
    }
}

pub type SharedRunResult = Arc<Mutex<RunResult>>;
