//! Data sink for facts emitted by the kernel: static agent properties, cyclic
//! component values and acyclic (narrated) events.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::parameters::ParameterValue;
use crate::world::AgentId;

/// Narrated projection of an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Acyclic {
    pub name: String,
    pub triggering_entities: Vec<AgentId>,
    pub affected_entities: Vec<AgentId>,
    pub parameters: Vec<(String, String)>,
}

/// One stored acyclic record.
#[derive(Debug, Clone, PartialEq)]
pub struct AcyclicRecord {
    pub time: u64,
    pub source: String,
    pub key: String,
    pub value: Acyclic,
}

/// One stored cyclic record.
#[derive(Debug, Clone, PartialEq)]
pub struct CyclicRecord {
    pub time: u64,
    pub agent_id: AgentId,
    pub key: String,
    pub value: ParameterValue,
}

pub trait DataStoreWriter: Send + Sync + Debug {
    /// Write a value that never changes for the rest of the run.
    fn put_static(&self, key: &str, value: ParameterValue) -> Result<(), String>;

    /// Write a per-agent value for one point in time.
    fn put_cyclic(
        &self,
        time: u64,
        agent_id: AgentId,
        key: &str,
        value: ParameterValue,
    ) -> Result<(), String>;

    /// Write an event-like fact.
    fn put_acyclic(&self, time: u64, source: &str, key: &str, value: Acyclic) -> Result<(), String>;
}

pub type SharedDataStore = Arc<dyn DataStoreWriter>;

/// Store that keeps everything in memory. Static keys are write-once.
#[derive(Debug, Default)]
pub struct InMemoryDataStore {
    statics: Mutex<BTreeMap<String, ParameterValue>>,
    cyclics: Mutex<Vec<CyclicRecord>>,
    acyclics: Mutex<Vec<AcyclicRecord>>,
}

impl InMemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_static(&self, key: &str) -> Option<ParameterValue> {
        self.statics.lock().get(key).cloned()
    }

    /// Static keys starting with `prefix`, ascending.
    pub fn static_keys(&self, prefix: &str) -> Vec<String> {
        self.statics
            .lock()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn cyclics(&self) -> Vec<CyclicRecord> {
        self.cyclics.lock().clone()
    }

    pub fn acyclics(&self) -> Vec<AcyclicRecord> {
        self.acyclics.lock().clone()
    }

    pub fn clear(&self) {
        self.statics.lock().clear();
        self.cyclics.lock().clear();
        self.acyclics.lock().clear();
    }
}

impl DataStoreWriter for InMemoryDataStore {
    fn put_static(&self, key: &str, value: ParameterValue) -> Result<(), String> {
        let mut statics = self.statics.lock();
        if statics.contains_key(key) {
            return Err(format!("static key '{}' already written", key));
        }
        statics.insert(key.to_string(), value);
        Ok(())
    }

    fn put_cyclic(
        &self,
        time: u64,
        agent_id: AgentId,
        key: &str,
        value: ParameterValue,
    ) -> Result<(), String> {
        self.cyclics.lock().push(CyclicRecord {
            time,
            agent_id,
            key: key.to_string(),
            value,
        });
        Ok(())
    }

    fn put_acyclic(&self, time: u64, source: &str, key: &str, value: Acyclic) -> Result<(), String> {
        self.acyclics.lock().push(AcyclicRecord {
            time,
            source: source.to_string(),
            key: key.to_string(),
            value,
        });
        Ok(())
    }
}

/// Per-agent view of the data store handed to components.
#[derive(Debug, Clone)]
pub struct AgentPublisher {
    store: SharedDataStore,
    agent_id: AgentId,
}

impl AgentPublisher {
    pub fn new(store: SharedDataStore, agent_id: AgentId) -> Self {
        Self { store, agent_id }
    }

    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    pub fn publish(&self, time: u64, key: &str, value: impl Into<ParameterValue>) -> Result<(), String> {
        self.store.put_cyclic(time, self.agent_id, key, value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_keys_are_write_once() {
        let store = InMemoryDataStore::new();
        store.put_static("Agents/0/AgentTypeName", "car".into()).unwrap();
        assert!(store
            .put_static("Agents/0/AgentTypeName", "truck".into())
            .is_err());
        assert_eq!(
            store.get_static("Agents/0/AgentTypeName"),
            Some(ParameterValue::String("car".into()))
        );
    }

    #[test]
    fn agent_publisher_tags_records_with_agent() {
        let store = Arc::new(InMemoryDataStore::new());
        let publisher = AgentPublisher::new(store.clone(), AgentId(4));
        publisher.publish(200, "Velocity", 13.9).unwrap();
        let records = store.cyclics();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].agent_id, AgentId(4));
        assert_eq!(records[0].time, 200);
        assert_eq!(records[0].value, ParameterValue::Double(13.9));
    }
}
