//! Mock implementation of RenderContext for testing.
//!
//! Records every operation without touching a GPU.

use crate::{
    gpu_types::GpuBuffer,
    render_context::{DrawCall, PrimitivePass, RenderContext},
};
use parking_lot::Mutex;
use wgpu::{BufferDescriptor, BufferUsages};

/// Records a renderer call for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    CreateBuffer {
        buffer_id: usize,
        label: Option<String>,
        size: u64,
        usage: BufferUsages,
    },
    WriteBuffer {
        buffer_id: usize,
        offset: u64,
        size: usize,
    },
    DestroyBuffer {
        buffer_id: usize,
    },
    DrawIndexed(DrawCall),
}

/// Mock implementation of RenderContext for testing.
///
/// Calls are appended to a `parking_lot::Mutex<Vec<RenderCall>>` so the
/// trait's `&self` methods can record them.
///
/// ```rust
/// use tessel_test_utils::{DrawCall, MockRenderContext, PrimitivePass, RenderContext};
///
/// let mock = MockRenderContext::new();
/// mock.draw_indexed(DrawCall::new(PrimitivePass::Fill, 0..6, None));
///
/// assert_eq!(mock.count_draws(), 1);
/// assert_eq!(mock.draws()[0].index_count(), 6);
/// ```
pub struct MockRenderContext {
    calls: Mutex<Vec<RenderCall>>,
    next_buffer_id: Mutex<usize>,
}

impl MockRenderContext {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_buffer_id: Mutex::new(0),
        }
    }

    /// Copy of all recorded calls.
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().clone()
    }

    pub fn count_buffer_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateBuffer { .. }))
    }

    pub fn count_buffer_writes(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::WriteBuffer { .. }))
    }

    pub fn count_buffer_destroys(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::DestroyBuffer { .. }))
    }

    pub fn count_draws(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::DrawIndexed(_)))
    }

    /// Draw calls in submission order.
    pub fn draws(&self) -> Vec<DrawCall> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                RenderCall::DrawIndexed(draw) => Some(draw.clone()),
                _ => None,
            })
            .collect()
    }

    /// Draw calls for one pass.
    pub fn draws_for(&self, pass: PrimitivePass) -> Vec<DrawCall> {
        self.draws().into_iter().filter(|draw| draw.pass == pass).collect()
    }

    /// Id of the most recently created buffer with the given label.
    pub fn buffer_labeled(&self, label: &str) -> Option<usize> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            RenderCall::CreateBuffer {
                buffer_id,
                label: Some(l),
                ..
            } if l == label => Some(*buffer_id),
            _ => None,
        })
    }

    /// `(offset, size)` of every write into `buffer_id`.
    pub fn writes_to(&self, buffer_id: usize) -> Vec<(u64, usize)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                RenderCall::WriteBuffer {
                    buffer_id: id,
                    offset,
                    size,
                } if *id == buffer_id => Some((*offset, *size)),
                _ => None,
            })
            .collect()
    }

    /// Clear recorded calls (useful between test steps).
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn count(&self, predicate: impl Fn(&RenderCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }
}

impl Default for MockRenderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext for MockRenderContext {
    fn create_buffer(&self, desc: &BufferDescriptor) -> GpuBuffer {
        let mut next = self.next_buffer_id.lock();
        let buffer_id = *next;
        *next += 1;

        self.calls.lock().push(RenderCall::CreateBuffer {
            buffer_id,
            label: desc.label.map(|s| s.to_string()),
            size: desc.size,
            usage: desc.usage,
        });

        GpuBuffer::mock(buffer_id, desc.size)
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        if let Some(buffer_id) = buffer.mock_id() {
            self.calls.lock().push(RenderCall::WriteBuffer {
                buffer_id,
                offset,
                size: data.len(),
            });
        }
    }

    fn destroy_buffer(&self, buffer: &GpuBuffer) {
        if let Some(buffer_id) = buffer.mock_id() {
            self.calls.lock().push(RenderCall::DestroyBuffer { buffer_id });
        }
    }

    fn draw_indexed(&self, call: DrawCall) {
        self.calls.lock().push(RenderCall::DrawIndexed(call));
    }
}
