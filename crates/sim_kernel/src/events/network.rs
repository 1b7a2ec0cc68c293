use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::data_store::SharedDataStore;
use crate::world::AgentId;

use super::category::EventCategory;
use super::event::{Event, EventId};
use super::publisher::EventNetworkDataPublisher;
use super::run_result::SharedRunResult;

/// Categorized event bus.
///
/// Producers insert into the *active* partition during a cycle. The driver calls
/// [`clear_active_events`](Self::clear_active_events) exactly once per cycle after all
/// producers ran, which moves every active list onto the tail of the *archive*. Archives
/// are therefore non-decreasing in time and are pruned from the front by
/// [`remove_old_events`](Self::remove_old_events).
#[derive(Debug, Default)]
pub struct EventNetwork {
    active: BTreeMap<EventCategory, Vec<Arc<Event>>>,
    archived: BTreeMap<EventCategory, VecDeque<Arc<Event>>>,
    next_id: EventId,
    publisher: Option<EventNetworkDataPublisher>,
    run_result: Option<SharedRunResult>,
}

pub type SharedEventNetwork = Arc<Mutex<EventNetwork>>;

impl EventNetwork {
    /// Network without narration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Network that narrates scenario and simulation events into `store`.
    pub fn with_publisher(store: SharedDataStore) -> Self {
        Self {
            publisher: Some(EventNetworkDataPublisher::new(store)),
            ..Self::default()
        }
    }

    pub fn into_shared(self) -> SharedEventNetwork {
        Arc::new(Mutex::new(self))
    }

    /// Bind the collector that receives collision reports for the current run.
    pub fn initialize(&mut self, run_result: SharedRunResult) {
        self.run_result = Some(run_result);
    }

    /// Assign the next id to `event` and append it to its category's active list.
    pub fn insert_event(&mut self, mut event: Event) -> EventId {
        let id = self.next_id;
        self.next_id += 1;
        event.assign_id(id);

        let category = event.category();
        if category.is_narrated() {
            if let Some(publisher) = &self.publisher {
                publisher.publish(&event);
            }
        }

        trace!(id, %category, name = event.name(), time = event.time(), "event inserted");
        self.active.entry(category).or_default().push(Arc::new(event));
        id
    }

    /// Active events of `category` in insertion order; empty if none were inserted.
    pub fn get_events(&self, category: EventCategory) -> &[Arc<Event>] {
        self.active
            .get(&category)
            .map(|events| events.as_slice())
            .unwrap_or(&[])
    }

    /// Archived events of `category`, oldest first.
    pub fn archived_events(&self, category: EventCategory) -> impl Iterator<Item = &Arc<Event>> {
        self.archived.get(&category).into_iter().flatten()
    }

    /// Move every active list onto the end of its archive and empty the active partition.
    pub fn clear_active_events(&mut self) {
        for (category, events) in std::mem::take(&mut self.active) {
            self.archived.entry(category).or_default().extend(events);
        }
    }

    /// Drop archived events strictly older than `time`.
    pub fn remove_old_events(&mut self, time: u64) {
        let mut removed = 0usize;
        for events in self.archived.values_mut() {
            while events.front().is_some_and(|event| event.time() < time) {
                events.pop_front();
                removed += 1;
            }
        }
        if removed > 0 {
            trace!(removed, before = time, "pruned archived events");
        }
    }

    /// Forward a collision to the bound run result; no-op when unbound.
    pub fn add_collision(&mut self, agent_id: AgentId) {
        if let Some(run_result) = &self.run_result {
            run_result.lock().add_collision(agent_id);
        }
    }

    /// Reset for a new run: ids restart at 0, both partitions empty, collector unbound.
    pub fn clear(&mut self) {
        debug!(
            next_id = self.next_id,
            "clearing event network"
        );
        self.next_id = 0;
        self.active.clear();
        self.archived.clear();
        self.run_result = None;
    }

    pub fn active_len(&self) -> usize {
        self.active.values().map(Vec::len).sum()
    }

    pub fn archived_len(&self) -> usize {
        self.archived.values().map(VecDeque::len).sum()
    }
}
