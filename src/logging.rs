//! Diagnostic logging for the command-line tools.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "warn";

/// Installs a `tracing` subscriber writing to stderr, filtered by `RUST_LOG`.
///
/// Reports are written to stdout directly, so enabling `debug` output never mixes diagnostic
/// events into machine-readable results. Calling this more than once is a no-op.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
