//! # Lumen Core
//!
//! Core crate for Lumen: the typed option registry shared by every frame
//! contributor, plus TOML-based option overrides.

pub mod options;

pub use options::{
    ConfigError, OptionError, OptionKind, OptionList, OptionRegistry, OptionType, OptionValue,
};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core library version.
pub fn init() {
    log::info!("Lumen Core v{} initialized", VERSION);
}
