//! Logging setup based on `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "debug,wgpu_core=info,naga=info,wgpu_hal=info,lyon=info";

/// Install the global fmt subscriber.
///
/// `RUST_LOG` overrides the default filter when set.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    init_with_filter(filter);
}

/// Install the global fmt subscriber with an explicit filter.
///
/// Calling this twice is harmless; the second subscriber is discarded.
pub fn init_with_filter(filter: impl Into<EnvFilter>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter.into())
        .try_init();
}
