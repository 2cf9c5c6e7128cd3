//! Allocation descriptors handed to the [`GpuBackend`](crate::GpuBackend).

mod buffer;
mod common;
mod texture;

pub use buffer::{BufferDescriptor, BufferUsage};
pub use common::Extent2d;
pub use texture::{TextureDescriptor, TextureFormat, TextureUsage};
