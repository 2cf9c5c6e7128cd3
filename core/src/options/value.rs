//! Option values and their kinds.

use std::fmt;

use serde::Serialize;

/// The closed set of kinds an option can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    Bool,
    U32,
    I32,
    U8,
    F32,
    String,
}

impl OptionKind {
    /// Lowercase type name, as used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::U8 => "u8",
            Self::F32 => "f32",
            Self::String => "string",
        }
    }

    /// Returns true for the integer kinds.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::U32 | Self::I32 | Self::U8)
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged option value.
///
/// Serialises untagged, so a registry dumps to plain `name = value` TOML.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    U32(u32),
    I32(i32),
    U8(u8),
    F32(f32),
    String(String),
}

impl OptionValue {
    /// The kind of this value.
    pub fn kind(&self) -> OptionKind {
        match self {
            Self::Bool(_) => OptionKind::Bool,
            Self::U32(_) => OptionKind::U32,
            Self::I32(_) => OptionKind::I32,
            Self::U8(_) => OptionKind::U8,
            Self::F32(_) => OptionKind::F32,
            Self::String(_) => OptionKind::String,
        }
    }

    /// Truthiness used by `require` predicates: `true`, any non-zero number,
    /// or a non-empty string.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::U32(value) => *value != 0,
            Self::I32(value) => *value != 0,
            Self::U8(value) => *value != 0,
            Self::F32(value) => *value != 0.0,
            Self::String(value) => !value.is_empty(),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::U32(value) => write!(f, "{value}"),
            Self::I32(value) => write!(f, "{value}"),
            Self::U8(value) => write!(f, "{value}"),
            Self::F32(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "\"{value}\""),
        }
    }
}

/// A Rust type that can be stored in and read from an [`OptionValue`].
///
/// Reads never coerce: a `u8` option cannot be read as `u32`.
pub trait OptionType: Clone + Into<OptionValue> {
    /// The kind this type maps to.
    const KIND: OptionKind;

    /// Extract the value if `value` holds exactly this kind.
    fn from_value(value: &OptionValue) -> Option<Self>;
}

macro_rules! impl_option_type {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for OptionValue {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        }

        impl OptionType for $ty {
            const KIND: OptionKind = OptionKind::$variant;

            fn from_value(value: &OptionValue) -> Option<Self> {
                match value {
                    OptionValue::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_option_type!(bool, Bool);
impl_option_type!(u32, U32);
impl_option_type!(i32, I32);
impl_option_type!(u8, U8);
impl_option_type!(f32, F32);
impl_option_type!(String, String);

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}
