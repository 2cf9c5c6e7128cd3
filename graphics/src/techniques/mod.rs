//! Built-in techniques.
//!
//! | Technique | Writes | Reads | Components |
//! |-----------|--------|-------|------------|
//! | [`GBuffer`] | `Color`, `VisibilityDepth`, `Velocity`, `Debug` | | `RandomNumberGenerator` |
//! | [`TemporalUpscaler`] | `ColorScaled`, `Exposure`, `UpscalerHistory` | `Color`, `VisibilityDepth`, `Velocity` | |
//! | [`ToneMapping`] | `Color` or `ColorScaled`, `Debug` | `Exposure` | `BlueNoiseSampler` |

mod gbuffer;
mod temporal_upscaler;
mod tone_mapping;

pub use gbuffer::GBuffer;
pub use temporal_upscaler::TemporalUpscaler;
pub use tone_mapping::{TonemapOperator, ToneMapping};
