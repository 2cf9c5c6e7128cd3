//! Buffer types and descriptors.

use bitflags::bitflags;

bitflags! {
    /// How the backend may use an allocated buffer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Structured data read and written by kernels.
        const STORAGE = 1 << 0;
        /// Source of copies.
        const COPY_SRC = 1 << 1;
        /// Destination of uploads, copies and clears.
        const COPY_DST = 1 << 2;
    }
}

impl Default for BufferUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Shape of a buffer allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BufferDescriptor {
    pub label: Option<String>,
    /// Total size in bytes.
    pub size: u64,
    /// Bytes per element.
    pub stride: u32,
    pub usage: BufferUsage,
}

impl BufferDescriptor {
    /// Buffer of `size` bytes holding 4-byte elements.
    pub fn new(size: u64, usage: BufferUsage) -> Self {
        Self {
            label: None,
            size,
            stride: 4,
            usage,
        }
    }

    pub fn with_stride(self, stride: u32) -> Self {
        Self { stride, ..self }
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..self
        }
    }
}
