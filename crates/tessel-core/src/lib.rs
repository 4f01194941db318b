//! Tessel Core
//!
//! Shared plumbing for the tessel crates: logging setup, profiling scopes,
//! hash collections and the math types used across the geometry pipeline.

pub mod alloc;
pub mod logging;
pub mod math;
pub mod profiling;
