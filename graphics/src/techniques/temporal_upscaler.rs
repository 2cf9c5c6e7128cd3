use std::any::Any;

use lumen_core::{OptionList, OptionRegistry};

use crate::backend::{Binding, Dispatch, GpuBackend, KernelDescriptor, KernelHandle};
use crate::contributor::{Contributor, DeclarationContext, FrameContext};
use crate::error::ContributorError;
use crate::graph::{Access, Require, ResourceFlags, SharedBuffer, SharedTexture};
use crate::types::TextureFormat;

/// Temporal anti-aliasing and upscaling from render to window size.
///
/// Declares nothing while `taa_enable` is false, so `ColorScaled`,
/// `Exposure` and the history pair disappear from the plan.
#[derive(Debug, Default)]
pub struct TemporalUpscaler {
    kernel: Option<KernelHandle>,
}

impl TemporalUpscaler {
    pub const NAME: &'static str = "TemporalUpscaler";
    pub const ENABLE: &'static str = "taa_enable";
    pub const SHARPEN: &'static str = "upscaler_sharpen_enable";
    pub const SHARPNESS: &'static str = "upscaler_sharpness";

    pub const HISTORY: &'static str = "UpscalerHistory";
    pub const HISTORY_PREVIOUS: &'static str = "UpscalerHistoryPrevious";

    /// Returns true while the upscaling kernel exists.
    pub fn is_active(&self) -> bool {
        self.kernel.is_some()
    }
}

impl Contributor for TemporalUpscaler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn options(&self) -> OptionList {
        OptionList::new()
            .with(Self::ENABLE, false)
            .with(Self::SHARPEN, false)
            .with(Self::SHARPNESS, 0.8f32)
    }

    fn shared_textures(&self, ctx: &DeclarationContext<'_>) -> Vec<SharedTexture> {
        if !ctx.is_enabled(Self::ENABLE) {
            return Vec::new();
        }
        let window = ctx.window_dimensions();
        vec![
            SharedTexture::read("Color"),
            SharedTexture::read("VisibilityDepth"),
            SharedTexture::read("Velocity"),
            SharedTexture::write("ColorScaled")
                .with_flags(ResourceFlags::OPTIONAL)
                .with_dimensions(window.width, window.height)
                .with_require(Require::name(Self::ENABLE)),
            SharedTexture::read_write(Self::HISTORY)
                .with_flags(ResourceFlags::ACCUMULATE)
                .with_format(TextureFormat::Rgba16Float)
                .with_dimensions(window.width, window.height)
                .with_backup(Self::HISTORY_PREVIOUS),
        ]
    }

    fn shared_buffers(&self, ctx: &DeclarationContext<'_>) -> Vec<SharedBuffer> {
        if !ctx.is_enabled(Self::ENABLE) {
            return Vec::new();
        }
        vec![SharedBuffer::new("Exposure", Access::WRITE)
            .with_flags(ResourceFlags::OPTIONAL_DISCARD)
            .with_size(4)]
    }

    fn on_options_changed(&mut self, changed: &[String], _options: &OptionRegistry) -> bool {
        changed
            .iter()
            .any(|name| name == Self::ENABLE || name == Self::SHARPEN)
    }

    fn init(&mut self, ctx: &FrameContext<'_>) -> Result<(), ContributorError> {
        if !ctx.options().is_truthy(Self::ENABLE) {
            return Ok(());
        }
        let mut descriptor = KernelDescriptor::new("temporal_upscaler", "main");
        if ctx.options().is_truthy(Self::SHARPEN) {
            descriptor = descriptor.with_define("SHARPEN");
        }
        self.kernel = Some(ctx.backend().create_kernel(&descriptor)?);
        Ok(())
    }

    fn run(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), ContributorError> {
        let Some(kernel) = self.kernel else {
            return Ok(());
        };
        if !ctx.has_resource("ColorScaled") {
            // No consumer is connected to the upscaled output.
            return Ok(());
        }
        let sharpness: f32 = ctx.option(Self::SHARPNESS)?;

        let mut dispatch = Dispatch::new(kernel, ctx.window_dimensions().workgroups(8))
            .with_texture("g_Color", ctx.texture("Color")?)
            .with_texture("g_Depth", ctx.texture("VisibilityDepth")?)
            .with_texture("g_Velocity", ctx.texture("Velocity")?)
            .with_texture("g_History", ctx.texture(Self::HISTORY_PREVIOUS)?)
            .with_texture("g_HistoryOut", ctx.texture(Self::HISTORY)?)
            .with_texture("g_Output", ctx.texture("ColorScaled")?)
            .with_constant("g_Sharpness", Binding::Float(sharpness))
            .with_constant("g_Reset", Binding::Uint(u32::from(ctx.dimensions_changed())));
        if ctx.has_resource("Exposure") {
            dispatch = dispatch.with_buffer("g_Exposure", ctx.buffer("Exposure")?);
        }
        ctx.backend().dispatch(&dispatch)?;
        ctx.swap_history(Self::HISTORY)?;
        Ok(())
    }

    fn terminate(&mut self, backend: &dyn GpuBackend) {
        if let Some(kernel) = self.kernel.take() {
            backend.destroy_kernel(kernel);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Extent2d;

    fn registry(enabled: bool) -> OptionRegistry {
        let mut options = OptionRegistry::new();
        options
            .register_all(&TemporalUpscaler::default().options())
            .unwrap();
        options.set(TemporalUpscaler::ENABLE, enabled).unwrap();
        options
    }

    #[test]
    fn test_disabled_declares_nothing() {
        let options = registry(false);
        let ctx = DeclarationContext::new(&options, Extent2d::new(1920, 1080), Extent2d::new(960, 540), 0);
        let upscaler = TemporalUpscaler::default();
        assert!(upscaler.shared_textures(&ctx).is_empty());
        assert!(upscaler.shared_buffers(&ctx).is_empty());
    }

    #[test]
    fn test_enabled_writes_at_window_size() {
        let options = registry(true);
        let ctx = DeclarationContext::new(&options, Extent2d::new(1920, 1080), Extent2d::new(960, 540), 0);
        let textures = TemporalUpscaler::default().shared_textures(&ctx);
        let scaled = textures.iter().find(|t| t.name == "ColorScaled").unwrap();
        assert_eq!(scaled.dimensions, Extent2d::new(1920, 1080));
        let history = textures.iter().find(|t| t.name == TemporalUpscaler::HISTORY).unwrap();
        assert_eq!(history.backup_name.as_deref(), Some(TemporalUpscaler::HISTORY_PREVIOUS));
    }
}
