//! Tracing subscriber setup for binaries and demos.

use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_logging(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
