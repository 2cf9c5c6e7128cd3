use std::any::Any;

use crate::backend::{Binding, Dispatch, GpuBackend, KernelDescriptor, KernelHandle};
use crate::components::RandomNumberGenerator;
use crate::contributor::{Contributor, DeclarationContext, FrameContext};
use crate::error::ContributorError;
use crate::graph::{ResourceFlags, SharedTexture};
use crate::types::TextureFormat;

/// Fills the geometry buffer: scene color, depth, motion vectors and the
/// debug target.
#[derive(Debug, Default)]
pub struct GBuffer {
    kernel: Option<KernelHandle>,
}

impl GBuffer {
    pub const NAME: &'static str = "GBuffer";
}

impl Contributor for GBuffer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn components(&self) -> Vec<String> {
        vec![RandomNumberGenerator::NAME.to_string()]
    }

    fn shared_textures(&self, _ctx: &DeclarationContext<'_>) -> Vec<SharedTexture> {
        vec![
            SharedTexture::write("Color")
                .with_flags(ResourceFlags::CLEAR)
                .with_format(TextureFormat::Rgba16Float),
            SharedTexture::write("VisibilityDepth")
                .with_flags(ResourceFlags::CLEAR)
                .with_format(TextureFormat::Depth32Float),
            SharedTexture::write("Velocity")
                .with_flags(ResourceFlags::CLEAR)
                .with_format(TextureFormat::Rg16Float),
            SharedTexture::write("Debug").with_flags(ResourceFlags::CLEAR),
        ]
    }

    fn init(&mut self, ctx: &FrameContext<'_>) -> Result<(), ContributorError> {
        let kernel = ctx
            .backend()
            .create_kernel(&KernelDescriptor::new("gbuffer", "main"))?;
        self.kernel = Some(kernel);
        Ok(())
    }

    fn run(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), ContributorError> {
        let Some(kernel) = self.kernel else {
            return Ok(());
        };
        let rng = ctx.component::<RandomNumberGenerator>(RandomNumberGenerator::NAME)?;

        let dispatch = Dispatch::new(kernel, ctx.render_dimensions().workgroups(8))
            .with_texture("g_Color", ctx.texture("Color")?)
            .with_texture("g_Depth", ctx.texture("VisibilityDepth")?)
            .with_texture("g_Velocity", ctx.texture("Velocity")?)
            .with_texture("g_Debug", ctx.texture("Debug")?)
            .with_constant("g_FrameIndex", Binding::Uint(ctx.frame_index() as u32));
        ctx.backend().dispatch(&rng.bind(dispatch))?;
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
