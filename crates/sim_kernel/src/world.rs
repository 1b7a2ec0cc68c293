//! Narrow view of the world model: agent identity registration.
//!
//! Geometry, road network and perception live outside the kernel. The factory only
//! needs the world to hand out agent ids and to forget an agent whose creation failed.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::blueprint::AgentCategory;

/// Identifier assigned by the world when an agent is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub trait WorldInterface: Send + Sync + fmt::Debug {
    /// Register a new agent and return its id.
    fn register_agent(&self, category: AgentCategory, type_name: &str) -> Result<AgentId, String>;

    /// Forget an agent. Unknown ids are ignored.
    fn remove_agent(&self, id: AgentId);

    /// Ids of every registered agent, ascending.
    fn agent_ids(&self) -> Vec<AgentId>;
}

pub type SharedWorld = Arc<dyn WorldInterface>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredAgent {
    pub category: AgentCategory,
    pub type_name: String,
}

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u32,
    agents: BTreeMap<AgentId, RegisteredAgent>,
}

/// In-memory world that only tracks agent registrations. Ids start at 0 and are never reused.
#[derive(Debug, Default)]
pub struct AgentRegistryWorld {
    state: Mutex<RegistryState>,
    capacity: Option<usize>,
}

impl AgentRegistryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse registrations once `capacity` agents are present.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            capacity: Some(capacity),
        }
    }

    pub fn get(&self, id: AgentId) -> Option<RegisteredAgent> {
        self.state.lock().agents.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WorldInterface for AgentRegistryWorld {
    fn register_agent(&self, category: AgentCategory, type_name: &str) -> Result<AgentId, String> {
        let mut state = self.state.lock();
        if let Some(capacity) = self.capacity {
            if state.agents.len() >= capacity {
                return Err(format!("world is full ({} agents)", capacity));
            }
        }
        let id = AgentId(state.next_id);
        state.next_id += 1;
        state.agents.insert(
            id,
            RegisteredAgent {
                category,
                type_name: type_name.to_string(),
            },
        );
        Ok(id)
    }

    fn remove_agent(&self, id: AgentId) {
        self.state.lock().agents.remove(&id);
    }

    fn agent_ids(&self) -> Vec<AgentId> {
        self.state.lock().agents.keys().copied().collect()
    }
}
