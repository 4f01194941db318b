//! Profiling utilities based on the `puffin` crate.
//!
//! With the `profiling` feature disabled the scope macros expand to nothing,
//! so hot paths can be instrumented unconditionally.

#[cfg(feature = "profiling")]
use std::sync::OnceLock;

#[cfg(feature = "profiling")]
pub use puffin::{GlobalProfiler, profile_function, profile_scope};

#[cfg(not(feature = "profiling"))]
pub use crate::{profile_function, profile_scope};

/// No-op stand-in for `puffin::profile_function!`.
#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! profile_function {
    ($($arg:tt)*) => {};
}

/// No-op stand-in for `puffin::profile_scope!`.
#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! profile_scope {
    ($($arg:tt)*) => {};
}

/// Profiling backend options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilingBackend {
    /// Send profiling data to puffin_viewer via HTTP.
    PuffinHttp,
}

#[cfg(feature = "profiling")]
static PROFILING_SERVER: OnceLock<puffin_http::Server> = OnceLock::new();

/// Start collecting profiling scopes.
///
/// ```no_run
/// use tessel_core::profiling::{init_profiling, ProfilingBackend};
///
/// init_profiling(ProfilingBackend::PuffinHttp);
/// ```
#[cfg(feature = "profiling")]
pub fn init_profiling(backend: ProfilingBackend) {
    match backend {
        ProfilingBackend::PuffinHttp => {
            puffin::set_scopes_on(true);

            match puffin_http::Server::new("127.0.0.1:8585") {
                Ok(server) => {
                    tracing::info!("Puffin profiler server started on http://127.0.0.1:8585");
                    let _ = PROFILING_SERVER.set(server);
                }
                Err(e) => {
                    tracing::error!("Failed to start puffin server: {}", e);
                }
            }
        }
    }
}

#[cfg(not(feature = "profiling"))]
pub fn init_profiling(_backend: ProfilingBackend) {
    tracing::debug!("Profiling requested but the `profiling` feature is disabled");
}

/// Mark the start of a new frame.
///
/// Call once per frame, after the geometry for the frame has been prepared.
#[inline]
pub fn new_frame() {
    #[cfg(feature = "profiling")]
    puffin::GlobalProfiler::lock().new_frame();
}
