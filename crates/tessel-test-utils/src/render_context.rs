//! Trait abstracting the renderer collaborator.

use crate::gpu_types::{GpuBuffer, TextureHandle};
use glam::Mat4;
use std::ops::Range;
use wgpu::BufferDescriptor;

/// The three primitive passes a tessellated shape is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitivePass {
    /// Filled triangles.
    Fill,
    /// Screen-space expanded line ribbons.
    Line,
    /// Screen-space expanded point sprites.
    Point,
}

impl PrimitivePass {
    pub const ALL: [PrimitivePass; 3] = [PrimitivePass::Fill, PrimitivePass::Line, PrimitivePass::Point];
}

/// A range-limited indexed draw over one pass's bound buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub pass: PrimitivePass,
    /// Range into the pass's index buffer, in indices (not bytes).
    pub indices: Range<u32>,
    /// Added to each index before fetching vertices, as in
    /// `wgpu::RenderPass::draw_indexed`.
    pub base_vertex: i32,
    pub texture: Option<TextureHandle>,
    /// Model matrix of a transformed group, applied on top of the view.
    pub transform: Option<Mat4>,
}

impl DrawCall {
    pub fn new(pass: PrimitivePass, indices: Range<u32>, texture: Option<TextureHandle>) -> Self {
        Self {
            pass,
            indices,
            base_vertex: 0,
            texture,
            transform: None,
        }
    }

    pub fn with_base_vertex(mut self, base_vertex: i32) -> Self {
        self.base_vertex = base_vertex;
        self
    }

    pub fn with_transform(mut self, transform: Option<Mat4>) -> Self {
        self.transform = transform;
        self
    }

    pub fn index_count(&self) -> u32 {
        self.indices.end - self.indices.start
    }
}

/// Trait abstracting buffer management and draw submission.
///
/// Methods take `&self` and return owned handles, so a context can be shared
/// behind an `Arc` and mocked with interior mutability.
///
/// ```rust,no_run
/// use tessel_test_utils::RenderContext;
/// use wgpu::{BufferDescriptor, BufferUsages};
///
/// fn upload(ctx: &dyn RenderContext, bytes: &[u8]) {
///     let buffer = ctx.create_buffer(&BufferDescriptor {
///         label: Some("fill indices"),
///         size: bytes.len() as u64,
///         usage: BufferUsages::INDEX | BufferUsages::COPY_DST,
///         mapped_at_creation: false,
///     });
///     ctx.write_buffer(&buffer, 0, bytes);
/// }
/// ```
pub trait RenderContext: Send + Sync {
    /// Create a GPU buffer.
    fn create_buffer(&self, desc: &BufferDescriptor) -> GpuBuffer;

    /// Write `data` into `buffer` starting at byte `offset`.
    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]);

    /// Release a buffer. Only called from a deletion queue drain.
    fn destroy_buffer(&self, buffer: &GpuBuffer);

    /// Submit an indexed draw.
    fn draw_indexed(&self, call: DrawCall);
}
