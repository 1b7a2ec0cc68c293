//! Spawn orchestration: loading spawn point plugins, triggering them in priority order,
//! and handing the agents they create to the driver.

pub mod distributions;
mod library;
mod orchestrator;
pub mod points;

pub use library::{ProfileAlternative, SpawnPointLibraryInfo, SpawnPointPhase, SpawnPointProfiles};
pub use orchestrator::{SpawnOrchestrator, SpawnPointInstance};
