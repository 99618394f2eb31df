//! Tracing subscriber setup for hosts that do not install their own.
//!
//! The crate only emits `tracing` events; embedding runtimes usually route
//! them into their own logger. Hosts without one can call [`init_tracing`].

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when neither `RUST_LOG` nor an explicit filter is given.
pub const DEFAULT_FILTER: &str = "nativehttp=info";

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `filter`.
///
/// Returns `false` when a global subscriber was already installed; calling
/// this more than once is harmless.
pub fn init_tracing(filter: Option<&str>) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}
