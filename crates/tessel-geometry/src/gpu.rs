//! GPU-side copies of aggregated geometry, one buffer per channel.
//!
//! [`GpuGeometry`] mirrors the retained root; [`StreamingGeometry`] packs
//! the immediate renderer's batches for one frame.

use crate::{Channel, DeletionQueue, DirtySpan, TessGeometry};
use std::collections::hash_map::Entry;
use tessel_core::alloc::HashMap;
use tessel_core::profiling::profile_function;
use tessel_test_utils::{GpuBuffer, PrimitivePass, RenderContext};

#[derive(Default)]
pub struct GpuGeometry {
    buffers: HashMap<Channel, GpuBuffer>,
}

impl GpuGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every non-empty channel of `geometry` in full.
    ///
    /// Buffers that are too small are replaced by one sized to the next
    /// power of two; the old buffer goes to `deletions`.
    pub fn upload(&mut self, render: &dyn RenderContext, geometry: &TessGeometry, deletions: &DeletionQueue) {
        profile_function!();

        for channel in Channel::ALL {
            let bytes = geometry.channel_bytes(channel);
            if bytes.is_empty() {
                continue;
            }
            let buffer = self.reserve(render, channel, bytes.len() as u64, deletions).0;
            render.write_buffer(buffer, 0, bytes);
        }
    }

    /// Buffer for `channel` holding at least `needed` bytes, and whether it
    /// was just created. Contents of a replaced buffer are not carried over.
    fn reserve(
        &mut self,
        render: &dyn RenderContext,
        channel: Channel,
        needed: u64,
        deletions: &DeletionQueue,
    ) -> (&GpuBuffer, bool) {
        let create = || {
            render.create_buffer(&wgpu::BufferDescriptor {
                label: Some(channel.label()),
                size: needed.next_power_of_two(),
                usage: channel.usage(),
                mapped_at_creation: false,
            })
        };
        match self.buffers.entry(channel) {
            Entry::Occupied(entry) if entry.get().size() >= needed => (&*entry.into_mut(), false),
            Entry::Occupied(mut entry) => {
                deletions.enqueue(entry.insert(create()));
                (&*entry.into_mut(), true)
            }
            Entry::Vacant(entry) => (&*entry.insert(create()), true),
        }
    }

    /// Apply one dirty span to its channel buffer.
    pub fn write_span(&self, render: &dyn RenderContext, span: &DirtySpan) {
        match self.buffers.get(&span.channel) {
            Some(buffer) => render.write_buffer(buffer, span.offset, &span.data),
            None => tracing::warn!("Dirty span for {} has no buffer", span.channel.label()),
        }
    }

    pub fn buffer(&self, channel: Channel) -> Option<&GpuBuffer> {
        self.buffers.get(&channel)
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Hand every buffer to `deletions`.
    pub fn release(&mut self, deletions: &DeletionQueue) {
        for (_, buffer) in self.buffers.drain() {
            deletions.enqueue(buffer);
        }
    }
}

/// Where an appended batch starts in each pass's buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchBase {
    /// First vertex of the batch; becomes the draw's base vertex.
    pub vertex: u32,
    /// First index of the batch.
    pub index: u32,
}

/// Per-frame GPU buffers that immediate batches are appended to.
///
/// Draws are only executed once the frame's render pass runs, so every batch
/// keeps its own region of the buffers until [`begin_frame`](Self::begin_frame).
/// A buffer that outgrows its capacity is replaced and refilled with the
/// frame's bytes so far.
#[derive(Default)]
pub struct StreamingGeometry {
    gpu: GpuGeometry,
    frame: HashMap<Channel, Vec<u8>>,
    cursors: [BatchBase; 3],
}

impl StreamingGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start writing from the front of the buffers again.
    pub fn begin_frame(&mut self) {
        for bytes in self.frame.values_mut() {
            bytes.clear();
        }
        self.cursors = [BatchBase::default(); 3];
    }

    /// Append `geometry` after the batches already written this frame.
    ///
    /// Returns the batch base for each of [`PrimitivePass::ALL`].
    pub fn append(
        &mut self,
        render: &dyn RenderContext,
        geometry: &TessGeometry,
        deletions: &DeletionQueue,
    ) -> [BatchBase; 3] {
        profile_function!();

        for channel in Channel::ALL {
            let bytes = geometry.channel_bytes(channel);
            if bytes.is_empty() {
                continue;
            }
            let frame = self.frame.entry(channel).or_default();
            let offset = frame.len() as u64;
            frame.extend_from_slice(bytes);

            let (buffer, created) = self.gpu.reserve(render, channel, frame.len() as u64, deletions);
            if created {
                render.write_buffer(buffer, 0, frame);
            } else {
                render.write_buffer(buffer, offset, bytes);
            }
        }

        let bases = self.cursors;
        for (cursor, pass) in self.cursors.iter_mut().zip(PrimitivePass::ALL) {
            cursor.vertex += geometry.vertex_count(pass) as u32;
            cursor.index += geometry.index_count(pass) as u32;
        }
        bases
    }

    pub fn buffer(&self, channel: Channel) -> Option<&GpuBuffer> {
        self.gpu.buffer(channel)
    }

    pub fn release(&mut self, deletions: &DeletionQueue) {
        self.gpu.release(deletions);
        self.frame.clear();
        self.cursors = [BatchBase::default(); 3];
    }
}
