//! Shared state for building and drawing geometry.

use crate::{GeometryLimits, Tessellator};
use parking_lot::Mutex;
use tessel_test_utils::{GpuBuffer, RenderContext};

/// GPU buffers waiting to be destroyed.
///
/// Buffers may still be referenced by in-flight frames when a shape lets go
/// of them, so they are parked here and destroyed at a point the render
/// thread chooses.
#[derive(Default)]
pub struct DeletionQueue {
    pending: Mutex<Vec<GpuBuffer>>,
}

impl DeletionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, buffer: GpuBuffer) {
        self.pending.lock().push(buffer);
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Destroy every queued buffer. Returns how many were destroyed.
    pub fn drain(&self, render: &dyn RenderContext) -> usize {
        let buffers = std::mem::take(&mut *self.pending.lock());
        for buffer in &buffers {
            render.destroy_buffer(buffer);
        }
        if !buffers.is_empty() {
            tracing::debug!("Destroyed {} geometry buffers", buffers.len());
        }
        buffers.len()
    }
}

/// Limits, the tessellator and the deletion queue, passed to every tree and
/// immediate renderer instead of living in globals.
pub struct GeometryContext {
    pub(crate) limits: GeometryLimits,
    pub(crate) tessellator: Tessellator,
    pub(crate) deletions: DeletionQueue,
}

impl Default for GeometryContext {
    fn default() -> Self {
        Self::new(GeometryLimits::default())
    }
}

impl GeometryContext {
    pub fn new(limits: GeometryLimits) -> Self {
        Self {
            tessellator: Tessellator::new(limits.clone()),
            limits,
            deletions: DeletionQueue::new(),
        }
    }

    pub fn limits(&self) -> &GeometryLimits {
        &self.limits
    }

    pub fn tessellator_mut(&mut self) -> &mut Tessellator {
        &mut self.tessellator
    }

    pub fn deletions(&self) -> &DeletionQueue {
        &self.deletions
    }

    /// Destroy buffers released since the last call.
    pub fn drain_deletions(&self, render: &dyn RenderContext) -> usize {
        self.deletions.drain(render)
    }
}
