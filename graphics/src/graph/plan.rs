//! The resolved per-frame resource plan.

use std::collections::HashMap;

use super::{Access, ResourceFlags};
use crate::backend::{BufferHandle, TextureHandle};
use crate::error::LookupError;
use crate::types::{BufferDescriptor, Extent2d, TextureDescriptor, TextureFormat};

/// GPU descriptor backing a resolved resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceDescriptor {
    Texture(TextureDescriptor),
    Buffer(BufferDescriptor),
}

/// GPU handle backing a resolved resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuResource {
    Texture(TextureHandle),
    Buffer(BufferHandle),
}

/// The single allocation backing a name for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedResource {
    /// Resource name.
    pub name: String,
    /// Concrete descriptor the allocation was created with.
    pub descriptor: ResourceDescriptor,
    /// GPU handle.
    pub handle: GpuResource,
    /// Union of every requester's access.
    pub access: Access,
    /// Union of every requester's flags.
    pub flags: ResourceFlags,
    /// Incremented every time the allocation is recreated.
    pub generation: u64,
    /// Zero-filled at the start of this frame.
    pub cleared: bool,
    /// Consecutive resolves the allocation was reused unchanged.
    pub frames_valid: u64,
    /// Contributors that requested the resource, in request order.
    pub contributors: Vec<String>,
    /// Name of the primary when this resource is a backup twin.
    pub backup_of: Option<String>,
    /// Name of the backup twin when this resource has one.
    pub backup: Option<String>,
}

impl ResolvedResource {
    /// Returns true for textures.
    pub fn is_texture(&self) -> bool {
        matches!(self.descriptor, ResourceDescriptor::Texture(_))
    }

    /// Texture handle, if this is a texture.
    pub fn texture_handle(&self) -> Option<TextureHandle> {
        match self.handle {
            GpuResource::Texture(handle) => Some(handle),
            GpuResource::Buffer(_) => None,
        }
    }

    /// Buffer handle, if this is a buffer.
    pub fn buffer_handle(&self) -> Option<BufferHandle> {
        match self.handle {
            GpuResource::Buffer(handle) => Some(handle),
            GpuResource::Texture(_) => None,
        }
    }

    /// Texture descriptor, if this is a texture.
    pub fn texture_descriptor(&self) -> Option<&TextureDescriptor> {
        match &self.descriptor {
            ResourceDescriptor::Texture(descriptor) => Some(descriptor),
            ResourceDescriptor::Buffer(_) => None,
        }
    }

    /// Buffer descriptor, if this is a buffer.
    pub fn buffer_descriptor(&self) -> Option<&BufferDescriptor> {
        match &self.descriptor {
            ResourceDescriptor::Buffer(descriptor) => Some(descriptor),
            ResourceDescriptor::Texture(_) => None,
        }
    }

    /// Texture format, if this is a texture.
    pub fn format(&self) -> Option<TextureFormat> {
        self.texture_descriptor().map(|descriptor| descriptor.format)
    }

    /// Texture dimensions, if this is a texture.
    pub fn dimensions(&self) -> Option<Extent2d> {
        self.texture_descriptor().map(|descriptor| descriptor.size)
    }

    /// Buffer size in bytes, if this is a buffer.
    pub fn size(&self) -> Option<u64> {
        self.buffer_descriptor().map(|descriptor| descriptor.size)
    }
}

/// Every resolved resource of the current frame, in first-request order.
#[derive(Debug, Clone, Default)]
pub struct ResourcePlan {
    resources: Vec<ResolvedResource>,
    index: HashMap<String, usize>,
}

impl ResourcePlan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_resources(resources: Vec<ResolvedResource>) -> Self {
        let index = resources
            .iter()
            .enumerate()
            .map(|(position, resource)| (resource.name.clone(), position))
            .collect();
        Self { resources, index }
    }

    pub(crate) fn into_resources(self) -> Vec<ResolvedResource> {
        self.resources
    }

    /// Look up a resource by name.
    pub fn get(&self, name: &str) -> Option<&ResolvedResource> {
        self.index
            .get(name)
            .and_then(|&position| self.resources.get(position))
    }

    /// Look up a resource by name, failing with `NotFound`.
    pub fn resource(&self, name: &str) -> Result<&ResolvedResource, LookupError> {
        self.get(name)
            .ok_or_else(|| LookupError::not_found("resource", name))
    }

    /// Returns true if a resource with this name exists this frame.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate over resources in first-request order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedResource> {
        self.resources.iter()
    }

    /// Iterate over resource names in first-request order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(|resource| resource.name.as_str())
    }

    /// Iterate over textures.
    pub fn textures(&self) -> impl Iterator<Item = &ResolvedResource> {
        self.resources.iter().filter(|resource| resource.is_texture())
    }

    /// Iterate over buffers.
    pub fn buffers(&self) -> impl Iterator<Item = &ResolvedResource> {
        self.resources.iter().filter(|resource| !resource.is_texture())
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if the plan holds no resource.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Approximate GPU memory held by the plan, in bytes.
    pub fn byte_size(&self) -> u64 {
        self.resources
            .iter()
            .map(|resource| match &resource.descriptor {
                ResourceDescriptor::Texture(descriptor) => descriptor.byte_size(),
                ResourceDescriptor::Buffer(descriptor) => descriptor.size,
            })
            .sum()
    }

    /// Exchange the handles of a primary texture and its backup twin.
    pub(crate) fn swap_history(&mut self, primary: &str) -> Result<(), LookupError> {
        let primary_index = *self
            .index
            .get(primary)
            .ok_or_else(|| LookupError::not_found("texture", primary))?;
        let backup = self.resources[primary_index]
            .backup
            .clone()
            .ok_or_else(|| LookupError::not_found("backup texture of", primary))?;
        let backup_index = *self
            .index
            .get(&backup)
            .ok_or_else(|| LookupError::not_found("texture", &backup))?;

        let primary_handle = self.resources[primary_index].handle;
        self.resources[primary_index].handle = self.resources[backup_index].handle;
        self.resources[backup_index].handle = primary_handle;
        Ok(())
    }
}

static_assertions::assert_impl_all!(ResourcePlan: Send, Sync);
