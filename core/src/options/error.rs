//! Option and configuration error types.

use thiserror::Error;

use super::OptionKind;

/// Errors raised by [`OptionRegistry`](super::OptionRegistry) lookups and writes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    /// No option with this name was registered.
    #[error("option '{name}' is not registered")]
    NotFound { name: String },
    /// The option exists but holds a different kind of value.
    #[error("option '{name}' holds a {found} value, not {expected}")]
    TypeMismatch {
        name: String,
        expected: OptionKind,
        found: OptionKind,
    },
    /// Two declarations disagree on the kind of an option.
    #[error("option '{name}' is already registered as {registered}, cannot register it as {requested}")]
    Conflict {
        name: String,
        registered: OptionKind,
        requested: OptionKind,
    },
}

/// Errors raised while applying option overrides from TOML or the command line.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read or write an options file.
    #[error("options file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The TOML document could not be parsed.
    #[error("failed to parse options: {0}")]
    Parse(#[from] toml::de::Error),
    /// The registry could not be serialised.
    #[error("failed to serialise options: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A `name=value` override was malformed.
    #[error("invalid option override '{0}', expected name=value")]
    InvalidOverride(String),
    /// The value cannot be represented as the registered kind.
    #[error("option '{name}' expects a {expected} value, got '{value}'")]
    UnsupportedValue {
        name: String,
        expected: OptionKind,
        value: String,
    },
    /// An integer value does not fit the registered integer kind.
    #[error("value {value} is out of range for option '{name}' ({kind})")]
    OutOfRange {
        name: String,
        value: i64,
        kind: OptionKind,
    },
    /// The underlying registry rejected the write.
    #[error(transparent)]
    Option(#[from] OptionError),
}
