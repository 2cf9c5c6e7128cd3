//! The option registry and per-contributor option lists.

use std::collections::BTreeMap;

use super::{OptionError, OptionKind, OptionType, OptionValue};

/// Ordered option defaults declared by one contributor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionList {
    entries: Vec<(String, OptionValue)>,
}

impl OptionList {
    /// Create an empty option list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option default (builder style).
    pub fn with(mut self, name: impl Into<String>, default: impl Into<OptionValue>) -> Self {
        self.push(name, default);
        self
    }

    /// Add an option default.
    pub fn push(&mut self, name: impl Into<String>, default: impl Into<OptionValue>) {
        self.entries.push((name.into(), default.into()));
    }

    /// Iterate over `(name, default)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Iterate over declared names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of declared options.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Process-wide table of typed options.
///
/// Built once from every contributor's [`OptionList`] and owned by the frame
/// orchestrator. Values may change between frames; each effective write bumps
/// [`revision`](Self::revision).
#[derive(Debug, Clone, Default)]
pub struct OptionRegistry {
    values: BTreeMap<String, OptionValue>,
    revision: u64,
}

impl OptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an option with its default value.
    ///
    /// Returns `Ok(true)` when the option was inserted and `Ok(false)` when it
    /// already existed with the same kind (the first default is kept).
    pub fn register(
        &mut self,
        name: impl Into<String>,
        default: impl Into<OptionValue>,
    ) -> Result<bool, OptionError> {
        let name = name.into();
        let default = default.into();
        if let Some(existing) = self.values.get(&name) {
            if existing.kind() != default.kind() {
                return Err(OptionError::Conflict {
                    name,
                    registered: existing.kind(),
                    requested: default.kind(),
                });
            }
            log::trace!("Option '{}' already registered, keeping {}", name, existing);
            return Ok(false);
        }

        log::trace!("Registering option '{}' = {}", name, default);
        self.values.insert(name, default);
        self.revision += 1;
        Ok(true)
    }

    /// Register every entry of an option list, stopping at the first conflict.
    pub fn register_all(&mut self, list: &OptionList) -> Result<(), OptionError> {
        for (name, default) in list.iter() {
            self.register(name, default.clone())?;
        }
        Ok(())
    }

    /// Read an option as `T`.
    pub fn get<T: OptionType>(&self, name: &str) -> Result<T, OptionError> {
        let value = self.get_value(name)?;
        T::from_value(value).ok_or_else(|| OptionError::TypeMismatch {
            name: name.to_string(),
            expected: T::KIND,
            found: value.kind(),
        })
    }

    /// Read an option as `T`, falling back to `default` if it is missing or
    /// holds another kind.
    pub fn get_or<T: OptionType>(&self, name: &str, default: T) -> T {
        self.get(name).unwrap_or(default)
    }

    /// Read the raw tagged value of an option.
    pub fn get_value(&self, name: &str) -> Result<&OptionValue, OptionError> {
        self.values.get(name).ok_or_else(|| OptionError::NotFound {
            name: name.to_string(),
        })
    }

    /// Write an option. The kind of `value` must match the registered kind.
    pub fn set<T: OptionType>(&mut self, name: &str, value: T) -> Result<(), OptionError> {
        self.set_value(name, value.into())
    }

    /// Write a raw tagged value. The kind must match the registered kind.
    pub fn set_value(&mut self, name: &str, value: OptionValue) -> Result<(), OptionError> {
        let slot = self
            .values
            .get_mut(name)
            .ok_or_else(|| OptionError::NotFound {
                name: name.to_string(),
            })?;

        if slot.kind() != value.kind() {
            return Err(OptionError::TypeMismatch {
                name: name.to_string(),
                expected: slot.kind(),
                found: value.kind(),
            });
        }

        if *slot != value {
            log::debug!("Option '{}': {} -> {}", name, slot, value);
            *slot = value;
            self.revision += 1;
        }
        Ok(())
    }

    /// Returns true if an option with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns true if an option with this name exists and has `kind`.
    pub fn contains_kind(&self, name: &str, kind: OptionKind) -> bool {
        self.kind_of(name) == Some(kind)
    }

    /// The registered kind of an option.
    pub fn kind_of(&self, name: &str) -> Option<OptionKind> {
        self.values.get(name).map(OptionValue::kind)
    }

    /// Returns true if the option exists and is truthy.
    pub fn is_truthy(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(OptionValue::is_truthy)
    }

    /// Iterate over option names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of registered options.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no option is registered.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Counter bumped by every registration and every effective write.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(super) fn values(&self) -> &BTreeMap<String, OptionValue> {
        &self.values
    }
}

static_assertions::assert_impl_all!(OptionRegistry: Send, Sync);
