//! Event network: categorized, cycle-partitioned bus for simulation facts.
//!
//! Components and manipulators insert [Event]s while a cycle runs and read the active
//! events of the categories they react to. The tick driver archives the active
//! partition once per cycle and prunes archives older than the retention window.

mod category;
mod event;
mod network;
mod publisher;
mod run_result;

pub use category::EventCategory;
pub use event::{ComponentState, Event, EventId, EventKind, LaneChangeDirection};
pub use network::{EventNetwork, SharedEventNetwork};
pub use publisher::EventNetworkDataPublisher;
pub use run_result::{RunResult, SharedRunResult};
