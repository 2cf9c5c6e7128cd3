//! Contexts handed to contributors while declaring and executing.

use lumen_core::{OptionError, OptionRegistry, OptionType};

use super::Contributor;
use crate::backend::{BufferHandle, GpuBackend, TextureHandle};
use crate::error::{ContributorError, LookupError};
use crate::frame::ContributorSlot;
use crate::graph::{ResolvedResource, ResourcePlan};
use crate::types::{Extent2d, TextureFormat};

/// Context for declaring the frame's resource requests.
///
/// Declarations must be a pure function of what this context exposes.
#[derive(Debug, Clone, Copy)]
pub struct DeclarationContext<'a> {
    options: &'a OptionRegistry,
    window: Extent2d,
    render: Extent2d,
    frame_index: u64,
}

impl<'a> DeclarationContext<'a> {
    /// Create a declaration context.
    pub fn new(
        options: &'a OptionRegistry,
        window: Extent2d,
        render: Extent2d,
        frame_index: u64,
    ) -> Self {
        Self {
            options,
            window,
            render,
            frame_index,
        }
    }

    /// The option registry.
    pub fn options(&self) -> &'a OptionRegistry {
        self.options
    }

    /// Read an option.
    pub fn option<T: OptionType>(&self, name: &str) -> Result<T, OptionError> {
        self.options.get(name)
    }

    /// Returns true if the option exists and is truthy.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.options.is_truthy(name)
    }

    /// Output window size.
    pub fn window_dimensions(&self) -> Extent2d {
        self.window
    }

    /// Internal render size.
    pub fn render_dimensions(&self) -> Extent2d {
        self.render
    }

    /// Index of the frame being declared.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

/// Per-frame values shared by every [`FrameContext`] of a frame.
#[derive(Debug, Clone, Default)]
pub(crate) struct FrameInfo {
    pub frame_index: u64,
    pub window: Extent2d,
    pub render: Extent2d,
    pub dimensions_changed: bool,
    pub debug_view: Option<String>,
}

/// Context for executing a contributor.
///
/// Gives read-only access to the resolved shared resources, the options,
/// the components registered before this contributor, and the backend.
pub struct FrameContext<'a> {
    backend: &'a dyn GpuBackend,
    options: &'a OptionRegistry,
    plan: &'a ResourcePlan,
    info: &'a FrameInfo,
    components: &'a [ContributorSlot],
    history_swaps: Vec<String>,
}

impl<'a> FrameContext<'a> {
    pub(crate) fn new(
        backend: &'a dyn GpuBackend,
        options: &'a OptionRegistry,
        plan: &'a ResourcePlan,
        info: &'a FrameInfo,
        components: &'a [ContributorSlot],
    ) -> Self {
        Self {
            backend,
            options,
            plan,
            info,
            components,
            history_swaps: Vec::new(),
        }
    }

    pub(crate) fn into_history_swaps(self) -> Vec<String> {
        self.history_swaps
    }

    /// Graphics backend.
    pub fn backend(&self) -> &'a dyn GpuBackend {
        self.backend
    }

    /// The option registry.
    pub fn options(&self) -> &'a OptionRegistry {
        self.options
    }

    /// Read an option.
    pub fn option<T: OptionType>(&self, name: &str) -> Result<T, OptionError> {
        self.options.get(name)
    }

    /// Index of the current frame, starting at zero.
    pub fn frame_index(&self) -> u64 {
        self.info.frame_index
    }

    /// Output window size.
    pub fn window_dimensions(&self) -> Extent2d {
        self.info.window
    }

    /// Internal render size.
    pub fn render_dimensions(&self) -> Extent2d {
        self.info.render
    }

    /// Returns true if the window or render size changed since last frame.
    pub fn dimensions_changed(&self) -> bool {
        self.info.dimensions_changed
    }

    /// Currently selected debug view.
    pub fn debug_view(&self) -> Option<&'a str> {
        self.info.debug_view.as_deref()
    }

    /// The full resolved plan.
    pub fn plan(&self) -> &'a ResourcePlan {
        self.plan
    }

    /// Returns true if a shared resource with this name exists this frame.
    pub fn has_resource(&self, name: &str) -> bool {
        self.plan.contains(name)
    }

    /// Look up a shared resource.
    pub fn resource(&self, name: &str) -> Result<&'a ResolvedResource, LookupError> {
        self.plan.resource(name)
    }

    /// Handle of a shared texture.
    pub fn texture(&self, name: &str) -> Result<TextureHandle, LookupError> {
        self.plan
            .get(name)
            .ok_or_else(|| LookupError::not_found("texture", name))?
            .texture_handle()
            .ok_or_else(|| LookupError::KindMismatch {
                name: name.to_string(),
                expected: "texture",
            })
    }

    /// Handle of a shared buffer.
    pub fn buffer(&self, name: &str) -> Result<BufferHandle, LookupError> {
        self.plan
            .get(name)
            .ok_or_else(|| LookupError::not_found("buffer", name))?
            .buffer_handle()
            .ok_or_else(|| LookupError::KindMismatch {
                name: name.to_string(),
                expected: "buffer",
            })
    }

    /// Format of a shared texture.
    pub fn texture_format(&self, name: &str) -> Result<TextureFormat, LookupError> {
        self.texture_resource(name)?
            .format()
            .ok_or_else(|| LookupError::not_found("texture", name))
    }

    /// Dimensions of a shared texture.
    pub fn texture_dimensions(&self, name: &str) -> Result<Extent2d, LookupError> {
        self.texture_resource(name)?
            .dimensions()
            .ok_or_else(|| LookupError::not_found("texture", name))
    }

    /// Size in bytes of a shared buffer.
    pub fn buffer_size(&self, name: &str) -> Result<u64, LookupError> {
        self.plan
            .get(name)
            .ok_or_else(|| LookupError::not_found("buffer", name))?
            .size()
            .ok_or_else(|| LookupError::KindMismatch {
                name: name.to_string(),
                expected: "buffer",
            })
    }

    fn texture_resource(&self, name: &str) -> Result<&'a ResolvedResource, LookupError> {
        let resource = self
            .plan
            .get(name)
            .ok_or_else(|| LookupError::not_found("texture", name))?;
        if resource.is_texture() {
            Ok(resource)
        } else {
            Err(LookupError::KindMismatch {
                name: name.to_string(),
                expected: "texture",
            })
        }
    }

    /// A component registered before this contributor.
    pub fn component<T: Contributor>(&self, name: &str) -> Result<&'a T, LookupError> {
        let slot = self
            .components
            .iter()
            .find(|slot| slot.name == name)
            .ok_or_else(|| LookupError::not_found("component", name))?;
        slot.contributor
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| LookupError::KindMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Exchange a texture with its backup twin at the end of the frame.
    pub fn swap_history(&mut self, name: &str) -> Result<(), LookupError> {
        let resource = self.texture_resource(name)?;
        if resource.backup.is_none() {
            return Err(LookupError::not_found("backup texture of", name));
        }
        if !self.history_swaps.iter().any(|queued| queued == name) {
            self.history_swaps.push(name.to_string());
        }
        Ok(())
    }

    /// Copy a texture into its backup twin now.
    pub fn copy_to_backup(&self, name: &str) -> Result<(), ContributorError> {
        let resource = self.texture_resource(name)?;
        let backup = resource
            .backup
            .as_deref()
            .ok_or_else(|| LookupError::not_found("backup texture of", name))?;
        let source = self.texture(name)?;
        let destination = self.texture(backup)?;
        self.backend.copy_texture(source, destination)?;
        Ok(())
    }
}
