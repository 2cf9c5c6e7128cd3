//! Command line arguments of the `lumen` driver.
//!
//! Parsed with clap, with help text (`--help`) and validation of sizes and
//! the render scale.

use std::path::PathBuf;

use clap::Parser;
use lumen_graphics::Extent2d;

/// Techniques run when `--techniques` is not given.
pub const DEFAULT_TECHNIQUES: &str = "GBuffer,TemporalUpscaler,ToneMapping";

/// Lumen frame driver arguments.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(
    name = "lumen",
    about = "Run Lumen techniques on the dummy backend",
    long_about = "Builds a frame orchestrator from technique names, applies option \
        overrides and renders a fixed number of frames on the dummy backend.\n\n\
        EXAMPLES:\n\
          # Three frames of the default pipeline\n\
          lumen --frames 3\n\
        \n\
          # Upscale from half resolution with a custom tone mapper\n\
          lumen --render-scale 0.5 --set taa_enable=true --set tonemap_operator=9\n\
        \n\
          # Load overrides from a file\n\
          lumen --options lumen.toml",
    version
)]
pub struct DriverArgs {
    /// Techniques to run, in execution order.
    #[arg(long, value_delimiter = ',', default_value = DEFAULT_TECHNIQUES)]
    pub techniques: Vec<String>,

    /// Window width in pixels.
    #[arg(long, default_value_t = 1280, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,

    /// Window height in pixels.
    #[arg(long, default_value_t = 720, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: u32,

    /// Ratio of render to window size, in (0, 1].
    #[arg(long, default_value_t = 1.0, value_parser = parse_render_scale)]
    pub render_scale: f32,

    /// Number of frames to render.
    #[arg(long, default_value_t = 3)]
    pub frames: u64,

    /// TOML file with option overrides.
    #[arg(long, value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Override a single option. May be repeated.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub overrides: Vec<String>,

    /// Debug view to select, by contributor view or texture name.
    #[arg(long)]
    pub debug_view: Option<String>,

    /// Print the available contributors and their options, then exit.
    #[arg(long)]
    pub list: bool,
}

impl DriverArgs {
    /// Window size requested on the command line.
    pub fn window(&self) -> Extent2d {
        Extent2d::new(self.width, self.height)
    }
}

impl Default for DriverArgs {
    fn default() -> Self {
        Self {
            techniques: DEFAULT_TECHNIQUES.split(',').map(str::to_string).collect(),
            width: 1280,
            height: 720,
            render_scale: 1.0,
            frames: 3,
            options: None,
            overrides: Vec::new(),
            debug_view: None,
            list: false,
        }
    }
}

fn parse_render_scale(value: &str) -> Result<f32, String> {
    let scale: f32 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if scale.is_finite() && scale > 0.0 && scale <= 1.0 {
        Ok(scale)
    } else {
        Err(format!("render scale must be in (0, 1], got {value}"))
    }
}
