//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't perform actual GPU operations but validates every
//! descriptor it receives and keeps a record of live resources, statistics,
//! and the commands submitted to it. Tests use that record to check what the
//! resolver and orchestrator did without requiring GPU hardware.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use crate::types::{BufferDescriptor, TextureDescriptor};

use super::{
    BackendError, BufferHandle, Dispatch, GpuBackend, KernelDescriptor, KernelHandle,
    TextureHandle,
};

/// Default maximum texture dimension accepted by the dummy backend.
pub const DEFAULT_MAX_TEXTURE_DIMENSION: u32 = 16384;

/// Counters of every operation performed on a [`DummyBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DummyStats {
    pub textures_created: u64,
    pub textures_destroyed: u64,
    pub buffers_created: u64,
    pub buffers_destroyed: u64,
    pub buffer_writes: u64,
    pub clears: u64,
    pub copies: u64,
    pub kernels_created: u64,
    pub kernels_destroyed: u64,
    pub dispatches: u64,
    pub flushes: u64,
}

/// A command recorded by the dummy backend.
#[derive(Debug, Clone, PartialEq)]
pub enum DummyCommand {
    ClearTexture(TextureHandle),
    ClearBuffer(BufferHandle),
    CopyTexture {
        source: TextureHandle,
        destination: TextureHandle,
    },
    WriteBuffer {
        buffer: BufferHandle,
        bytes: usize,
    },
    Dispatch {
        kernel: String,
        dispatch: Dispatch,
    },
    WaitIdle,
}

#[derive(Debug, Default)]
struct DummyState {
    next_id: u64,
    textures: HashMap<TextureHandle, TextureDescriptor>,
    buffers: HashMap<BufferHandle, BufferDescriptor>,
    kernels: HashMap<KernelHandle, KernelDescriptor>,
    failing_kernels: HashSet<String>,
    failing_textures: HashSet<String>,
    commands: Vec<DummyCommand>,
    stats: DummyStats,
}

impl DummyState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Dummy GPU backend.
#[derive(Debug)]
pub struct DummyBackend {
    max_texture_dimension: u32,
    state: Mutex<DummyState>,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::with_max_texture_dimension(DEFAULT_MAX_TEXTURE_DIMENSION)
    }

    /// Create a dummy backend that rejects textures larger than `max`.
    pub fn with_max_texture_dimension(max: u32) -> Self {
        Self {
            max_texture_dimension: max,
            state: Mutex::new(DummyState::default()),
        }
    }

    /// Make kernel creation fail for the given label.
    pub fn fail_kernel(&self, label: impl Into<String>) {
        self.state.lock().failing_kernels.insert(label.into());
    }

    /// Make texture creation fail for the given label.
    pub fn fail_texture(&self, label: impl Into<String>) {
        self.state.lock().failing_textures.insert(label.into());
    }

    /// Stop injecting failures.
    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.failing_kernels.clear();
        state.failing_textures.clear();
    }

    /// Snapshot of the operation counters.
    pub fn stats(&self) -> DummyStats {
        self.state.lock().stats
    }

    /// Copy of every recorded command.
    pub fn commands(&self) -> Vec<DummyCommand> {
        self.state.lock().commands.clone()
    }

    /// Drain the recorded commands.
    pub fn take_commands(&self) -> Vec<DummyCommand> {
        std::mem::take(&mut self.state.lock().commands)
    }

    /// Number of textures currently alive.
    pub fn live_textures(&self) -> usize {
        self.state.lock().textures.len()
    }

    /// Number of buffers currently alive.
    pub fn live_buffers(&self) -> usize {
        self.state.lock().buffers.len()
    }

    /// Number of kernels currently alive.
    pub fn live_kernels(&self) -> usize {
        self.state.lock().kernels.len()
    }

    /// Descriptor of a live texture.
    pub fn texture_descriptor(&self, texture: TextureHandle) -> Option<TextureDescriptor> {
        self.state.lock().textures.get(&texture).cloned()
    }

    /// Descriptor of a live buffer.
    pub fn buffer_descriptor(&self, buffer: BufferHandle) -> Option<BufferDescriptor> {
        self.state.lock().buffers.get(&buffer).cloned()
    }

    /// Labels of every kernel dispatched so far, in order.
    pub fn dispatched_kernels(&self) -> Vec<String> {
        self.state
            .lock()
            .commands
            .iter()
            .filter_map(|command| match command {
                DummyCommand::Dispatch { kernel, .. } => Some(kernel.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy"
    }

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureHandle, BackendError> {
        let size = descriptor.size;
        if size.is_zero() {
            return Err(BackendError::InvalidParameter(format!(
                "texture {:?} has zero size ({size})",
                descriptor.label
            )));
        }
        if size.width > self.max_texture_dimension || size.height > self.max_texture_dimension {
            return Err(BackendError::InvalidParameter(format!(
                "texture {:?} size {size} exceeds maximum dimension {}",
                descriptor.label, self.max_texture_dimension
            )));
        }
        if descriptor.mip_level_count == 0 || descriptor.mip_level_count > size.mip_level_count() {
            return Err(BackendError::InvalidParameter(format!(
                "texture {:?} requests {} mip levels, {size} allows {}",
                descriptor.label,
                descriptor.mip_level_count,
                size.mip_level_count()
            )));
        }

        let mut state = self.state.lock();
        if let Some(label) = &descriptor.label {
            if state.failing_textures.contains(label) {
                return Err(BackendError::OutOfMemory);
            }
        }

        let handle = TextureHandle::from_raw(state.next_id());
        log::trace!(
            "DummyBackend: creating texture {:?} ({}, {:?}, {} mips) -> {:?}",
            descriptor.label,
            size,
            descriptor.format,
            descriptor.mip_level_count,
            handle
        );
        state.textures.insert(handle, descriptor.clone());
        state.stats.textures_created += 1;
        Ok(handle)
    }

    fn destroy_texture(&self, texture: TextureHandle) {
        let mut state = self.state.lock();
        match state.textures.remove(&texture) {
            Some(descriptor) => {
                log::trace!("DummyBackend: destroying texture {:?}", descriptor.label);
                state.stats.textures_destroyed += 1;
            }
            None => log::warn!("DummyBackend: destroying unknown texture {:?}", texture),
        }
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferHandle, BackendError> {
        if descriptor.size == 0 {
            return Err(BackendError::InvalidParameter(format!(
                "buffer {:?} has zero size",
                descriptor.label
            )));
        }

        let mut state = self.state.lock();
        let handle = BufferHandle::from_raw(state.next_id());
        log::trace!(
            "DummyBackend: creating buffer {:?} (size: {}, stride: {}) -> {:?}",
            descriptor.label,
            descriptor.size,
            descriptor.stride,
            handle
        );
        state.buffers.insert(handle, descriptor.clone());
        state.stats.buffers_created += 1;
        Ok(handle)
    }

    fn destroy_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.lock();
        match state.buffers.remove(&buffer) {
            Some(descriptor) => {
                log::trace!("DummyBackend: destroying buffer {:?}", descriptor.label);
                state.stats.buffers_destroyed += 1;
            }
            None => log::warn!("DummyBackend: destroying unknown buffer {:?}", buffer),
        }
    }

    fn write_buffer(
        &self,
        buffer: BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        let size = state
            .buffers
            .get(&buffer)
            .map(|descriptor| descriptor.size)
            .ok_or_else(|| BackendError::InvalidParameter(format!("unknown buffer {buffer:?}")))?;
        if offset + data.len() as u64 > size {
            return Err(BackendError::InvalidParameter(format!(
                "write of {} bytes at offset {offset} overflows buffer of {size} bytes",
                data.len()
            )));
        }

        state.commands.push(DummyCommand::WriteBuffer {
            buffer,
            bytes: data.len(),
        });
        state.stats.buffer_writes += 1;
        Ok(())
    }

    fn clear_texture(&self, texture: TextureHandle) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        if !state.textures.contains_key(&texture) {
            return Err(BackendError::InvalidParameter(format!(
                "unknown texture {texture:?}"
            )));
        }
        state.commands.push(DummyCommand::ClearTexture(texture));
        state.stats.clears += 1;
        Ok(())
    }

    fn clear_buffer(&self, buffer: BufferHandle) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        if !state.buffers.contains_key(&buffer) {
            return Err(BackendError::InvalidParameter(format!(
                "unknown buffer {buffer:?}"
            )));
        }
        state.commands.push(DummyCommand::ClearBuffer(buffer));
        state.stats.clears += 1;
        Ok(())
    }

    fn copy_texture(
        &self,
        source: TextureHandle,
        destination: TextureHandle,
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        let (Some(src), Some(dst)) = (state.textures.get(&source), state.textures.get(&destination))
        else {
            return Err(BackendError::InvalidParameter(format!(
                "copy between unknown textures {source:?} -> {destination:?}"
            )));
        };
        if src.size != dst.size || src.format != dst.format {
            return Err(BackendError::InvalidParameter(format!(
                "copy between mismatched textures {:?} ({}, {:?}) -> {:?} ({}, {:?})",
                src.label, src.size, src.format, dst.label, dst.size, dst.format
            )));
        }

        state.commands.push(DummyCommand::CopyTexture {
            source,
            destination,
        });
        state.stats.copies += 1;
        Ok(())
    }

    fn create_kernel(&self, descriptor: &KernelDescriptor) -> Result<KernelHandle, BackendError> {
        let mut state = self.state.lock();
        if state.failing_kernels.contains(&descriptor.label) {
            return Err(BackendError::KernelCreationFailed(descriptor.label.clone()));
        }

        let handle = KernelHandle::from_raw(state.next_id());
        log::trace!(
            "DummyBackend: compiling kernel {}::{} {:?}",
            descriptor.label,
            descriptor.entry_point,
            descriptor.defines
        );
        state.kernels.insert(handle, descriptor.clone());
        state.stats.kernels_created += 1;
        Ok(handle)
    }

    fn destroy_kernel(&self, kernel: KernelHandle) {
        let mut state = self.state.lock();
        if state.kernels.remove(&kernel).is_some() {
            state.stats.kernels_destroyed += 1;
        } else {
            log::warn!("DummyBackend: destroying unknown kernel {:?}", kernel);
        }
    }

    fn dispatch(&self, dispatch: &Dispatch) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        let kernel = state
            .kernels
            .get(&dispatch.kernel)
            .map(|descriptor| descriptor.label.clone())
            .ok_or_else(|| {
                BackendError::InvalidParameter(format!("unknown kernel {:?}", dispatch.kernel))
            })?;
        log::trace!(
            "DummyBackend: dispatching {} {:?} with {} binding(s)",
            kernel,
            dispatch.workgroups,
            dispatch.bindings.len()
        );
        state.commands.push(DummyCommand::Dispatch {
            kernel,
            dispatch: dispatch.clone(),
        });
        state.stats.dispatches += 1;
        Ok(())
    }

    fn wait_idle(&self) {
        let mut state = self.state.lock();
        state.commands.push(DummyCommand::WaitIdle);
        state.stats.flushes += 1;
    }
}

static_assertions::assert_impl_all!(DummyBackend: Send, Sync);
