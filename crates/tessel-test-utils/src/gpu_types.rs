//! GPU handle wrappers that can be real or mock.

/// Opaque texture binding owned by the host renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

/// Wrapper around a GPU buffer that can be real or mock.
///
/// Cheap to clone: real buffers are reference counted by wgpu.
#[derive(Clone, Debug)]
pub struct GpuBuffer {
    inner: GpuBufferInner,
}

#[derive(Clone, Debug)]
enum GpuBufferInner {
    Real(wgpu::Buffer),
    #[cfg(feature = "mock")]
    Mock { id: usize, size: u64 },
}

impl GpuBuffer {
    /// Wrap a real wgpu buffer.
    pub fn from_wgpu(buffer: wgpu::Buffer) -> Self {
        Self {
            inner: GpuBufferInner::Real(buffer),
        }
    }

    /// Create a mock buffer handle.
    #[cfg(feature = "mock")]
    pub fn mock(id: usize, size: u64) -> Self {
        Self {
            inner: GpuBufferInner::Mock { id, size },
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        match &self.inner {
            GpuBufferInner::Real(buffer) => buffer.size(),
            #[cfg(feature = "mock")]
            GpuBufferInner::Mock { size, .. } => *size,
        }
    }

    /// The underlying wgpu buffer.
    ///
    /// # Panics
    /// Panics on a mock buffer; only the wgpu-backed context calls this.
    pub fn as_wgpu(&self) -> &wgpu::Buffer {
        match &self.inner {
            GpuBufferInner::Real(buffer) => buffer,
            #[cfg(feature = "mock")]
            GpuBufferInner::Mock { .. } => {
                panic!("Attempted to get wgpu::Buffer from mock buffer - this is a test-only buffer")
            }
        }
    }

    #[cfg(feature = "mock")]
    pub fn is_mock(&self) -> bool {
        matches!(self.inner, GpuBufferInner::Mock { .. })
    }

    /// Mock id, for test assertions.
    #[cfg(feature = "mock")]
    pub fn mock_id(&self) -> Option<usize> {
        match &self.inner {
            GpuBufferInner::Mock { id, .. } => Some(*id),
            GpuBufferInner::Real(_) => None,
        }
    }
}
