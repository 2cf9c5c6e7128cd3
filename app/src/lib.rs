//! # Lumen App
//!
//! Command-line driver for Lumen: builds a frame orchestrator from technique
//! names, applies option overrides and renders frames on the dummy backend.
//!
//! ## Overview
//!
//! - [`DriverArgs`] - Command line arguments parsed with clap
//! - [`run`] - Render the requested frames and return a [`RunSummary`]
//! - [`catalog`] - List the registered contributors and their options
//!
//! ## Example
//!
//! ```ignore
//! use clap::Parser;
//! use lumen_app::{run, DriverArgs};
//!
//! let summary = run(&DriverArgs::parse())?;
//! println!("{} frames", summary.frames);
//! ```

mod args;
mod driver;

pub use args::{DriverArgs, DEFAULT_TECHNIQUES};
pub use driver::{build, catalog, render, run, RunSummary, Session};

/// App library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library versions in use.
pub fn init() {
    lumen_core::init();
    lumen_graphics::init();
    log::info!("Lumen App v{} initialized", VERSION);
}
