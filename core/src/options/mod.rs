//! Typed, process-wide tunable parameters.
//!
//! Every contributor (component or technique) declares its own options with
//! defaults in an [`OptionList`]. The orchestrator merges all lists into one
//! [`OptionRegistry`] at startup. A name maps to exactly one [`OptionKind`]
//! for the lifetime of the registry: re-registering with the same kind keeps
//! the first default, re-registering with a different kind is a conflict.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = OptionRegistry::new();
//! registry.register_all(
//!     &OptionList::new()
//!         .with("tonemap_enable", true)
//!         .with("tonemap_operator", 5u8),
//! )?;
//!
//! let enabled: bool = registry.get("tonemap_enable")?;
//! registry.set("tonemap_operator", 2u8)?;
//! registry.apply_toml("tonemap_enable = false")?;
//! ```

mod config;
mod error;
mod registry;
mod value;

pub use error::{ConfigError, OptionError};
pub use registry::{OptionList, OptionRegistry};
pub use value::{OptionKind, OptionType, OptionValue};
