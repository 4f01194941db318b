//! Renderer abstraction and test utilities for tessel.
//!
//! The geometry engine never talks to a graphics API directly. Everything it
//! needs from the GPU side goes through [`RenderContext`]: create a buffer,
//! write a byte range into it, destroy it, and submit an indexed draw over a
//! range of a pass's index buffer.
//!
//! - [`RenderContext`] - Trait abstracting the renderer collaborator
//! - [`GpuBuffer`] - Owned buffer handle, real or mock
//! - `MockRenderContext` - Recording implementation (requires `mock` feature)
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use tessel_test_utils::{MockRenderContext, RenderContext};
//! use wgpu::*;
//!
//! let mock = MockRenderContext::new();
//! let buffer = mock.create_buffer(&BufferDescriptor {
//!     label: Some("fill positions"),
//!     size: 1024,
//!     usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
//!     mapped_at_creation: false,
//! });
//! mock.write_buffer(&buffer, 0, &[0u8; 64]);
//!
//! assert_eq!(mock.count_buffer_creates(), 1);
//! assert_eq!(mock.count_buffer_writes(), 1);
//! assert!(buffer.is_mock());
//! # }
//! ```
//!
//! # Design
//!
//! The trait takes `&self` and is object-safe, so the same code path can be
//! driven by a wgpu device or by the mock. The mock records calls behind a
//! `parking_lot::Mutex`.

pub mod gpu_types;
#[cfg(feature = "mock")]
pub mod mock_render;
pub mod render_context;

pub use gpu_types::*;
#[cfg(feature = "mock")]
pub use mock_render::*;
pub use render_context::*;
