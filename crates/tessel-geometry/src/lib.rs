//! Tessel Geometry - shape tessellation and retained buffer aggregation
//!
//! This crate provides:
//! - A raw vertex store for authored shapes, curves and primitives
//! - A tessellator turning raw shapes into fill, line and point buffers
//! - A retained shape tree aggregated into one set of contiguous buffers
//! - Texture runs and dirty spans for minimal draws and partial uploads
//! - An immediate-mode renderer that flushes whenever its buffers fill up
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use tessel_geometry::*;
//!
//! let mut ctx = GeometryContext::default();
//! let mut tree = ShapeTree::new(ctx.limits().clone());
//!
//! let rect = tree.create_primitive(Primitive::Rect {
//!     origin: Vec2::ZERO,
//!     size: Vec2::new(100.0, 50.0),
//! });
//! tree.add_shape(tree.root(), rect).unwrap();
//! tree.set_fill(rect, Color::rgb(1.0, 0.0, 0.0)).unwrap();
//!
//! let stats = tree.prepare(&mut ctx);
//! assert_eq!(stats.totals.vertices[0], 4);
//! assert_eq!(tree.geometry().fill.index_count(), 6);
//! ```
//!
//! Drawing goes through a [`RenderContext`]: [`WgpuRenderContext`] on a
//! real device, or the recording mock from `tessel-test-utils` in tests.

// Authoring
mod color;
mod config;
mod error;
mod primitive;
mod raw;
mod style;

// Tessellation
mod tess;
mod tessellator;
mod vertex;

// Retained mode
mod aggregate;
mod dirty_spans;
mod texture_runs;
mod tree;

// Rendering
mod context;
mod context_impl;
mod gpu;
mod immediate;

pub use color::*;
pub use config::*;
pub use error::*;
pub use primitive::*;
pub use raw::*;
pub use style::*;

pub use tess::*;
pub use tessellator::*;
pub use vertex::*;

pub use aggregate::AggregateStats;
pub use dirty_spans::*;
pub use texture_runs::*;
pub use tree::*;

pub use context::*;
pub use context_impl::*;
pub use gpu::*;
pub use immediate::*;

pub use tessel_test_utils::{DrawCall, GpuBuffer, PrimitivePass, RenderContext, TextureHandle};
