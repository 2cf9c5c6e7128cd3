//! Per-contributor bookkeeping kept by the orchestrator.

use lumen_core::{OptionRegistry, OptionValue};

use super::ContributorState;
use crate::contributor::{Contributor, DeclarationContext};
use crate::graph::ContributorRequests;

/// A contributor together with its lifecycle state.
pub struct ContributorSlot {
    pub(crate) name: String,
    pub(crate) contributor: Box<dyn Contributor>,
    pub(crate) state: ContributorState,
    pub(crate) reinit_pending: bool,
    /// Last seen value of every option the contributor declared.
    watched: Vec<(String, OptionValue)>,
    /// Resource names declared during the last collection.
    declared: Vec<String>,
}

impl ContributorSlot {
    pub(crate) fn new(contributor: Box<dyn Contributor>, options: &OptionRegistry) -> Self {
        let watched = contributor
            .options()
            .names()
            .filter_map(|name| {
                options
                    .get_value(name)
                    .ok()
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect();
        Self {
            name: contributor.name().to_string(),
            contributor,
            state: ContributorState::Uninitialized,
            reinit_pending: false,
            watched,
            declared: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ContributorState {
        self.state
    }

    pub fn contributor(&self) -> &dyn Contributor {
        self.contributor.as_ref()
    }

    /// Names of this contributor's options whose value differs from the last
    /// snapshot. The snapshot is updated.
    pub(crate) fn changed_options(&mut self, options: &OptionRegistry) -> Vec<String> {
        let mut changed = Vec::new();
        for (name, seen) in &mut self.watched {
            let Ok(current) = options.get_value(name) else {
                continue;
            };
            if current != seen {
                log::debug!("Option '{}' changed: {} -> {}", name, seen, current);
                *seen = current.clone();
                changed.push(name.clone());
            }
        }
        changed
    }

    /// Collect this frame's requests and remember the declared names.
    pub(crate) fn declare(&mut self, ctx: &DeclarationContext<'_>) -> ContributorRequests {
        let mut requests = ContributorRequests::new(self.name.clone());
        requests.textures = self.contributor.shared_textures(ctx);
        requests.buffers = self.contributor.shared_buffers(ctx);

        self.declared.clear();
        self.declared.extend(
            requests
                .textures
                .iter()
                .map(|texture| texture.name.clone())
                .chain(requests.buffers.iter().map(|buffer| buffer.name.clone())),
        );
        requests
    }

    /// Returns true if the last collection declared `name`.
    pub(crate) fn declared(&self, name: &str) -> bool {
        self.declared.iter().any(|declared| declared == name)
    }
}

impl std::fmt::Debug for ContributorSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContributorSlot")
            .field("name", &self.name)
            .field("kind", &self.contributor.kind())
            .field("state", &self.state)
            .field("reinit_pending", &self.reinit_pending)
            .finish()
    }
}
