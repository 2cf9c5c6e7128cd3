//! Name-keyed construction of contributors.

use std::collections::BTreeMap;

use super::{Contributor, ContributorKind};
use crate::components::{BlueNoiseSampler, RandomNumberGenerator};
use crate::error::SetupError;
use crate::techniques::{GBuffer, TemporalUpscaler, ToneMapping};

/// Builds a fresh contributor instance.
pub type ContributorConstructor = fn() -> Box<dyn Contributor>;

fn construct<T: Contributor + Default>() -> Box<dyn Contributor> {
    Box::new(T::default())
}

/// Registry of contributor constructors.
///
/// Components named by a technique are created through the same factory,
/// so every component a technique depends on must be registered here.
#[derive(Debug, Clone, Default)]
pub struct ContributorFactory {
    entries: BTreeMap<String, (ContributorKind, ContributorConstructor)>,
}

impl ContributorFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory holding every built-in component and technique.
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.register_type::<BlueNoiseSampler>(BlueNoiseSampler::NAME, ContributorKind::Component);
        factory.register_type::<RandomNumberGenerator>(
            RandomNumberGenerator::NAME,
            ContributorKind::Component,
        );
        factory.register_type::<GBuffer>(GBuffer::NAME, ContributorKind::Technique);
        factory.register_type::<TemporalUpscaler>(TemporalUpscaler::NAME, ContributorKind::Technique);
        factory.register_type::<ToneMapping>(ToneMapping::NAME, ContributorKind::Technique);
        factory
    }

    /// Register a constructor, replacing any previous entry under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        kind: ContributorKind,
        constructor: ContributorConstructor,
    ) -> &mut Self {
        let name = name.into();
        if self.entries.insert(name.clone(), (kind, constructor)).is_some() {
            log::warn!("Replacing factory entry for {} '{}'", kind, name);
        }
        self
    }

    /// Register a `Default`-constructible contributor type.
    pub fn register_type<T: Contributor + Default>(
        &mut self,
        name: impl Into<String>,
        kind: ContributorKind,
    ) -> &mut Self {
        self.register(name, kind, construct::<T>)
    }

    /// Instantiate the contributor registered under `name`.
    pub fn create(&self, name: &str) -> Result<Box<dyn Contributor>, SetupError> {
        self.instantiate(name).map(|(_, contributor)| contributor)
    }

    /// Instantiate the contributor registered under `name` together with
    /// the kind it was registered as.
    pub fn instantiate(
        &self,
        name: &str,
    ) -> Result<(ContributorKind, Box<dyn Contributor>), SetupError> {
        let (kind, constructor) = self
            .entries
            .get(name)
            .ok_or_else(|| SetupError::UnknownContributor(name.to_string()))?;
        Ok((*kind, constructor()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ContributorKind> {
        self.entries.get(name).map(|(kind, _)| *kind)
    }

    /// Every registered name, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Registered component names, sorted.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.names_of(ContributorKind::Component)
    }

    /// Registered technique names, sorted.
    pub fn techniques(&self) -> impl Iterator<Item = &str> {
        self.names_of(ContributorKind::Technique)
    }

    fn names_of(&self, wanted: ContributorKind) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |(_, (kind, _))| *kind == wanted)
            .map(|(name, _)| name.as_str())
    }
}
