//! [`RenderContext`] backed by a wgpu device.
//!
//! Buffers are real wgpu buffers. Draws are collected for the host's render
//! pass, which owns pipelines and bind groups and replays them with
//! [`take_draws`](WgpuRenderContext::take_draws), passing each call's
//! index range and base vertex to `draw_indexed`.

use parking_lot::Mutex;
use tessel_test_utils::{DrawCall, GpuBuffer, RenderContext};
use wgpu::BufferDescriptor;

pub struct WgpuRenderContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    draws: Mutex<Vec<DrawCall>>,
}

impl WgpuRenderContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            draws: Mutex::new(Vec::new()),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Draws submitted since the last call, in submission order.
    pub fn take_draws(&self) -> Vec<DrawCall> {
        std::mem::take(&mut *self.draws.lock())
    }
}

impl RenderContext for WgpuRenderContext {
    fn create_buffer(&self, desc: &BufferDescriptor) -> GpuBuffer {
        let buffer = self.device.create_buffer(desc);
        GpuBuffer::from_wgpu(buffer)
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer.as_wgpu(), offset, data);
    }

    fn destroy_buffer(&self, buffer: &GpuBuffer) {
        buffer.as_wgpu().destroy();
    }

    fn draw_indexed(&self, call: DrawCall) {
        self.draws.lock().push(call);
    }
}
