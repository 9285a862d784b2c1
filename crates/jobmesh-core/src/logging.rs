//! Tracing bootstrap for drivers and tests.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,jobmesh=debug";

/// Install the global tracing subscriber.
///
/// Honors `RUST_LOG`, falling back to `default_filter` (or [`DEFAULT_FILTER`]).
/// Calling this more than once is harmless: later calls are ignored.
pub fn init_tracing(default_filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or(DEFAULT_FILTER)));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init();
}
