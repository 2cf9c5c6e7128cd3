use std::any::Any;

use lumen_core::{OptionList, OptionRegistry};

use crate::backend::{Binding, Dispatch, GpuBackend, KernelDescriptor, KernelHandle};
use crate::components::BlueNoiseSampler;
use crate::contributor::{Contributor, DeclarationContext, FrameContext};
use crate::error::ContributorError;
use crate::graph::{ResourceFlags, SharedBuffer, SharedTexture};

/// Tone mapping curve, stored in the `tonemap_operator` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TonemapOperator {
    None = 0,
    ReinhardSimple = 1,
    ReinhardLuminance = 2,
    AcesFast = 3,
    AcesFitted = 4,
    #[default]
    Aces = 5,
    PbrNeutral = 6,
    Uncharted2 = 7,
    AgxFitted = 8,
    Agx = 9,
}

impl TonemapOperator {
    pub const ALL: [TonemapOperator; 10] = [
        Self::None,
        Self::ReinhardSimple,
        Self::ReinhardLuminance,
        Self::AcesFast,
        Self::AcesFitted,
        Self::Aces,
        Self::PbrNeutral,
        Self::Uncharted2,
        Self::AgxFitted,
        Self::Agx,
    ];

    /// Convert an option value, falling back to the default for unknown ones.
    pub fn from_u8(value: u8) -> Self {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .unwrap_or_default()
    }

    /// Kernel define selecting the curve.
    pub fn define(self) -> &'static str {
        match self {
            Self::None => "TONEMAP_NONE",
            Self::ReinhardSimple => "TONEMAP_REINHARD",
            Self::ReinhardLuminance => "TONEMAP_REINHARDL",
            Self::AcesFast => "TONEMAP_ACESFAST",
            Self::AcesFitted => "TONEMAP_ACESFITTED",
            Self::Aces => "TONEMAP_ACES",
            Self::PbrNeutral => "TONEMAP_PBRNEUTRAL",
            Self::Uncharted2 => "TONEMAP_UNCHARTED2",
            Self::AgxFitted => "TONEMAP_AGXFITTED",
            Self::Agx => "TONEMAP_AGX",
        }
    }
}

/// Maps the HDR scene color into display range, in place.
///
/// Operates on `ColorScaled` when the upscaler produced it, otherwise on
/// `Color`. Multiplies by `Exposure` when some technique provides it.
#[derive(Debug, Default)]
pub struct ToneMapping {
    kernel: Option<KernelHandle>,
    operator: TonemapOperator,
}

impl ToneMapping {
    pub const NAME: &'static str = "ToneMapping";
    pub const ENABLE: &'static str = "tonemap_enable";
    pub const OPERATOR: &'static str = "tonemap_operator";
    pub const DEBUG_VIEW: &'static str = "ToneMappedOutput";

    /// Operator the current kernel was built for.
    pub fn operator(&self) -> Option<TonemapOperator> {
        self.kernel.map(|_| self.operator)
    }
}

impl Contributor for ToneMapping {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn options(&self) -> OptionList {
        OptionList::new()
            .with(Self::ENABLE, true)
            .with(Self::OPERATOR, TonemapOperator::default() as u8)
    }

    fn components(&self) -> Vec<String> {
        vec![BlueNoiseSampler::NAME.to_string()]
    }

    fn shared_textures(&self, ctx: &DeclarationContext<'_>) -> Vec<SharedTexture> {
        if !ctx.is_enabled(Self::ENABLE) {
            return Vec::new();
        }
        vec![
            SharedTexture::read_write("Color"),
            SharedTexture::read_write("Debug"),
            SharedTexture::read_write("ColorScaled").with_flags(ResourceFlags::OPTIONAL),
        ]
    }

    fn shared_buffers(&self, ctx: &DeclarationContext<'_>) -> Vec<SharedBuffer> {
        if !ctx.is_enabled(Self::ENABLE) {
            return Vec::new();
        }
        vec![SharedBuffer::read("Exposure").with_flags(ResourceFlags::OPTIONAL)]
    }

    fn debug_views(&self) -> Vec<String> {
        vec![Self::DEBUG_VIEW.to_string()]
    }

    fn on_options_changed(&mut self, changed: &[String], _options: &OptionRegistry) -> bool {
        changed
            .iter()
            .any(|name| name == Self::ENABLE || name == Self::OPERATOR)
    }

    fn init(&mut self, ctx: &FrameContext<'_>) -> Result<(), ContributorError> {
        if !ctx.options().is_truthy(Self::ENABLE) {
            return Ok(());
        }
        self.operator = TonemapOperator::from_u8(ctx.option(Self::OPERATOR)?);
        let descriptor = KernelDescriptor::new("tone_mapping", "main")
            .with_define("OUTPUT_SRGB")
            .with_define("DITHER_8")
            .with_define(self.operator.define());
        self.kernel = Some(ctx.backend().create_kernel(&descriptor)?);
        log::debug!("Tone mapping kernel built for {:?}", self.operator);
        Ok(())
    }

    fn run(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), ContributorError> {
        let Some(kernel) = self.kernel else {
            return Ok(());
        };

        let uses_scaling = ctx.has_resource("ColorScaled") && ctx.options().is_truthy("taa_enable");
        let mut input = ctx.texture(if uses_scaling { "ColorScaled" } else { "Color" })?;
        let mut output = input;
        match ctx.debug_view() {
            Some(Self::DEBUG_VIEW) => {
                if !uses_scaling {
                    output = ctx.texture("Debug")?;
                }
            }
            Some(view) if ctx.texture_format(view).is_ok_and(|format| format.is_hdr_color()) => {
                input = ctx.texture(view)?;
                output = ctx.texture("Debug")?;
            }
            Some(_) => {
                input = ctx.texture("Debug")?;
                output = input;
            }
            None => {}
        }

        let dimensions = if uses_scaling {
            ctx.window_dimensions()
        } else {
            ctx.render_dimensions()
        };
        let sampler = ctx.component::<BlueNoiseSampler>(BlueNoiseSampler::NAME)?;
        let mut dispatch = Dispatch::new(kernel, dimensions.workgroups(8))
            .with_texture("g_InputBuffer", input)
            .with_texture("g_OutputBuffer", output)
            .with_constant("g_FrameIndex", Binding::Uint(dither_frame(ctx.frame_index())));
        if ctx.has_resource("Exposure") {
            dispatch = dispatch.with_buffer("g_Exposure", ctx.buffer("Exposure")?);
        }
        ctx.backend().dispatch(&sampler.bind(dispatch))?;
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

/// Frame counter fed to the dither pattern.
fn dither_frame(frame_index: u64) -> u32 {
    // Only the low bits select the noise slice, so the counter wraps.
    (frame_index & u64::from(u32::MAX)) as u32
}
