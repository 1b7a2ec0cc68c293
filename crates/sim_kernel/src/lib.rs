pub mod agent;
pub mod bindings;
pub mod blueprint;
pub mod clock;
pub mod config;
pub mod data_store;
pub mod error;
pub mod events;
pub mod factory;
pub mod kernel;
pub mod logging;
pub mod parameters;
pub mod runner;
pub mod scenario;
pub mod signal;
pub mod spawn;
pub mod stochastics;
pub mod world;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
