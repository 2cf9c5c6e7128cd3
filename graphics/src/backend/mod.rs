//! GPU backend abstraction layer.
//!
//! The resolver and the frame orchestrator never talk to a graphics API
//! directly. Everything they need (resource creation and destruction, clears,
//! copies, kernel creation, dispatch, and a full pipeline flush) goes through
//! the [`GpuBackend`] trait.
//!
//! # Available Backends
//!
//! - [`DummyBackend`]: no-op backend that validates descriptors and records
//!   every call, used for tests and the command-line driver.
//!
//! # Handles
//!
//! Backends hand out small copyable handles ([`TextureHandle`],
//! [`BufferHandle`], [`KernelHandle`]). A handle is only meaningful to the
//! backend that created it and only until it is destroyed.

pub mod dummy;
mod error;

pub use dummy::{DummyBackend, DummyCommand, DummyStats};
pub use error::BackendError;

use crate::types::{BufferDescriptor, TextureDescriptor};

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw backend identifier.
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// The raw backend identifier.
            pub const fn raw(&self) -> u64 {
                self.0
            }
        }
    };
}

define_handle!(
    /// Handle to a GPU texture.
    TextureHandle
);
define_handle!(
    /// Handle to a GPU buffer.
    BufferHandle
);
define_handle!(
    /// Handle to a compiled compute kernel.
    KernelHandle
);

/// Description of a compute kernel to compile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KernelDescriptor {
    /// Program name, also used as the debug label.
    pub label: String,
    /// Entry point within the program.
    pub entry_point: String,
    /// Preprocessor defines.
    pub defines: Vec<String>,
}

impl KernelDescriptor {
    /// Create a kernel descriptor.
    pub fn new(label: impl Into<String>, entry_point: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entry_point: entry_point.into(),
            defines: Vec::new(),
        }
    }

    /// Add a preprocessor define.
    pub fn with_define(mut self, define: impl Into<String>) -> Self {
        self.defines.push(define.into());
        self
    }
}

/// A resource bound to a kernel parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binding {
    Texture(TextureHandle),
    Buffer(BufferHandle),
    Uint(u32),
    Float(f32),
}

/// One compute dispatch: kernel, named parameter bindings and group counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// Kernel to run.
    pub kernel: KernelHandle,
    /// Named parameter bindings.
    pub bindings: Vec<(String, Binding)>,
    /// Workgroup counts.
    pub workgroups: [u32; 3],
}

impl Dispatch {
    /// Create a dispatch with no bindings.
    pub fn new(kernel: KernelHandle, workgroups: [u32; 3]) -> Self {
        Self {
            kernel,
            bindings: Vec::new(),
            workgroups,
        }
    }

    /// Bind a texture to a named parameter.
    pub fn with_texture(mut self, name: impl Into<String>, texture: TextureHandle) -> Self {
        self.bindings.push((name.into(), Binding::Texture(texture)));
        self
    }

    /// Bind a buffer to a named parameter.
    pub fn with_buffer(mut self, name: impl Into<String>, buffer: BufferHandle) -> Self {
        self.bindings.push((name.into(), Binding::Buffer(buffer)));
        self
    }

    /// Bind a constant to a named parameter.
    pub fn with_constant(mut self, name: impl Into<String>, value: Binding) -> Self {
        self.bindings.push((name.into(), value));
        self
    }

    /// Look up a binding by parameter name.
    pub fn binding(&self, name: &str) -> Option<Binding> {
        self.bindings
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, binding)| *binding)
    }
}

/// The graphics-API boundary.
///
/// All methods take `&self`; implementations synchronise internally so the
/// backend can be shared behind an `Arc`.
pub trait GpuBackend: Send + Sync {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Create a texture.
    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureHandle, BackendError>;

    /// Destroy a texture. The caller must have flushed any work using it.
    fn destroy_texture(&self, texture: TextureHandle);

    /// Create a buffer.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferHandle, BackendError>;

    /// Destroy a buffer. The caller must have flushed any work using it.
    fn destroy_buffer(&self, buffer: BufferHandle);

    /// Upload bytes into a buffer.
    fn write_buffer(
        &self,
        buffer: BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<(), BackendError>;

    /// Zero-fill a texture.
    fn clear_texture(&self, texture: TextureHandle) -> Result<(), BackendError>;

    /// Zero-fill a buffer.
    fn clear_buffer(&self, buffer: BufferHandle) -> Result<(), BackendError>;

    /// Copy the full contents of one texture into a same-shaped texture.
    fn copy_texture(
        &self,
        source: TextureHandle,
        destination: TextureHandle,
    ) -> Result<(), BackendError>;

    /// Compile a compute kernel.
    fn create_kernel(&self, descriptor: &KernelDescriptor) -> Result<KernelHandle, BackendError>;

    /// Destroy a compute kernel.
    fn destroy_kernel(&self, kernel: KernelHandle);

    /// Record a compute dispatch.
    fn dispatch(&self, dispatch: &Dispatch) -> Result<(), BackendError>;

    /// Block until all submitted GPU work has completed.
    fn wait_idle(&self);
}

static_assertions::assert_impl_all!(TextureHandle: Send, Sync, Copy);
static_assertions::assert_impl_all!(BufferHandle: Send, Sync, Copy);
static_assertions::assert_obj_safe!(GpuBackend);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_bindings() {
        let dispatch = Dispatch::new(KernelHandle::from_raw(3), [4, 4, 1])
            .with_texture("g_Input", TextureHandle::from_raw(1))
            .with_buffer("g_Exposure", BufferHandle::from_raw(2))
            .with_constant("g_Operator", Binding::Uint(5));

        assert_eq!(
            dispatch.binding("g_Input"),
            Some(Binding::Texture(TextureHandle::from_raw(1)))
        );
        assert_eq!(dispatch.binding("g_Operator"), Some(Binding::Uint(5)));
        assert_eq!(dispatch.binding("g_Missing"), None);
    }

    #[test]
    fn test_kernel_descriptor_builder() {
        let desc = KernelDescriptor::new("tone_mapping", "main").with_define("TONEMAP_ACES");
        assert_eq!(desc.defines, vec!["TONEMAP_ACES".to_string()]);
    }
}
