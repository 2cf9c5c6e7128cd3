//! TOML and command-line overrides for the option registry.
//!
//! An options file is a flat list of `name = value` pairs; the pairs may also
//! be placed under an `[options]` table. Values are converted into the kind
//! the option was registered with, so the file never introduces new options.

use std::path::Path;

use serde::Deserialize;

use super::{ConfigError, OptionError, OptionKind, OptionRegistry, OptionValue};

#[derive(Debug, Default, Deserialize)]
struct OptionsDocument {
    #[serde(default)]
    options: toml::Table,
    #[serde(flatten)]
    root: toml::Table,
}

impl OptionRegistry {
    /// Apply every `name = value` pair of a TOML document.
    ///
    /// Returns the number of options written.
    pub fn apply_toml(&mut self, text: &str) -> Result<usize, ConfigError> {
        let document: OptionsDocument = toml::from_str(text)?;
        let mut applied = 0;
        for (name, value) in document.root.iter().chain(document.options.iter()) {
            let value = self.convert_toml(name, value)?;
            self.set_value(name, value)?;
            applied += 1;
        }
        log::debug!("Applied {} option override(s) from TOML", applied);
        Ok(applied)
    }

    /// Load and apply an options file.
    pub fn load_toml_file(&mut self, path: &Path) -> Result<usize, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        log::info!("Loading options from {}", path.display());
        self.apply_toml(&text)
    }

    /// Serialise the current table as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self.values())?)
    }

    /// Write the current table to a TOML file.
    pub fn save_toml_file(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Apply a single `name=value` override, parsed according to the
    /// registered kind of `name`.
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), ConfigError> {
        let (name, raw) = assignment
            .split_once('=')
            .map(|(name, raw)| (name.trim(), raw.trim()))
            .filter(|(name, _)| !name.is_empty())
            .ok_or_else(|| ConfigError::InvalidOverride(assignment.to_string()))?;

        let kind = self.kind_of(name).ok_or_else(|| OptionError::NotFound {
            name: name.to_string(),
        })?;
        let value = parse_override(name, kind, raw)?;
        self.set_value(name, value)?;
        Ok(())
    }

    fn convert_toml(&self, name: &str, value: &toml::Value) -> Result<OptionValue, ConfigError> {
        let kind = self.kind_of(name).ok_or_else(|| OptionError::NotFound {
            name: name.to_string(),
        })?;

        let unsupported = || ConfigError::UnsupportedValue {
            name: name.to_string(),
            expected: kind,
            value: value.to_string(),
        };

        match (kind, value) {
            (OptionKind::Bool, toml::Value::Boolean(value)) => Ok(OptionValue::Bool(*value)),
            (OptionKind::String, toml::Value::String(value)) => {
                Ok(OptionValue::String(value.clone()))
            }
            (OptionKind::F32, toml::Value::Float(value)) => Ok(OptionValue::F32(*value as f32)),
            (OptionKind::F32, toml::Value::Integer(value)) => Ok(OptionValue::F32(*value as f32)),
            (kind, toml::Value::Integer(value)) if kind.is_integer() => {
                integer_value(name, kind, *value)
            }
            _ => Err(unsupported()),
        }
    }
}

fn integer_value(name: &str, kind: OptionKind, value: i64) -> Result<OptionValue, ConfigError> {
    let out_of_range = || ConfigError::OutOfRange {
        name: name.to_string(),
        value,
        kind,
    };

    match kind {
        OptionKind::U8 => u8::try_from(value)
            .map(OptionValue::U8)
            .map_err(|_| out_of_range()),
        OptionKind::U32 => u32::try_from(value)
            .map(OptionValue::U32)
            .map_err(|_| out_of_range()),
        OptionKind::I32 => i32::try_from(value)
            .map(OptionValue::I32)
            .map_err(|_| out_of_range()),
        _ => Err(out_of_range()),
    }
}

fn parse_override(name: &str, kind: OptionKind, raw: &str) -> Result<OptionValue, ConfigError> {
    let unsupported = || ConfigError::UnsupportedValue {
        name: name.to_string(),
        expected: kind,
        value: raw.to_string(),
    };

    match kind {
        OptionKind::Bool => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "on" | "yes" => Ok(OptionValue::Bool(true)),
            "false" | "0" | "off" | "no" => Ok(OptionValue::Bool(false)),
            _ => Err(unsupported()),
        },
        OptionKind::U8 | OptionKind::U32 | OptionKind::I32 => {
            let value = raw.parse::<i64>().map_err(|_| unsupported())?;
            integer_value(name, kind, value)
        }
        OptionKind::F32 => raw
            .parse::<f32>()
            .map(OptionValue::F32)
            .map_err(|_| unsupported()),
        OptionKind::String => {
            let unquoted = raw
                .strip_prefix('"')
                .and_then(|inner| inner.strip_suffix('"'))
                .unwrap_or(raw);
            Ok(OptionValue::String(unquoted.to_string()))
        }
    }
}
