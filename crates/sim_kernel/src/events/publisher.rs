use tracing::warn;

use crate::data_store::{Acyclic, SharedDataStore};

use super::event::Event;

const EVENT_KEY: &str = "Event";

/// Forwards narrated events to the data store as acyclic records.
#[derive(Debug, Clone)]
pub struct EventNetworkDataPublisher {
    store: SharedDataStore,
}

impl EventNetworkDataPublisher {
    pub fn new(store: SharedDataStore) -> Self {
        Self { store }
    }

    /// Project `event` onto its narrated form and write it. Write failures are logged only.
    pub fn publish(&self, event: &Event) {
        let projection = Acyclic {
            name: event.name().to_string(),
            triggering_entities: event.triggering_entities().to_vec(),
            affected_entities: event.affected_entities().to_vec(),
            parameters: event.parameters().flatten(),
        };

        if let Err(reason) = self
            .store
            .put_acyclic(event.time(), event.source(), EVENT_KEY, projection)
        {
            warn!(event = event.name(), %reason, "could not publish event");
        }
    }
}
