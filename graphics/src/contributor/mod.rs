//! Frame contributors: components and techniques.
//!
//! A contributor is an independently written unit that takes part in every
//! frame. It declares options with defaults, declares the shared textures
//! and buffers it needs (re-evaluated each frame from the current options),
//! and implements the `init` / `run` / `terminate` lifecycle driven by the
//! [`FrameOrchestrator`](crate::frame::FrameOrchestrator).
//!
//! Components are reusable GPU utilities (samplers, random number tables)
//! that techniques list by name in [`Contributor::components`]. Components
//! always run before the techniques that depend on them.

mod context;
mod factory;

use std::any::Any;

use lumen_core::{OptionList, OptionRegistry};

use crate::backend::GpuBackend;
use crate::error::ContributorError;
use crate::graph::{SharedBuffer, SharedTexture};

pub use context::{DeclarationContext, FrameContext};
pub(crate) use context::FrameInfo;
pub use factory::{ContributorConstructor, ContributorFactory};

/// Whether a contributor is a reusable component or a technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContributorKind {
    Component,
    Technique,
}

impl std::fmt::Display for ContributorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Component => write!(f, "component"),
            Self::Technique => write!(f, "technique"),
        }
    }
}

/// A unit that takes part in every frame.
pub trait Contributor: Any + Send {
    /// Unique name, also used as the factory key.
    fn name(&self) -> &str;

    /// Component or technique, used when the contributor is added directly.
    /// Contributors built by a [`ContributorFactory`] take the kind they were
    /// registered with instead.
    fn kind(&self) -> ContributorKind {
        ContributorKind::Technique
    }

    /// Options with their defaults.
    fn options(&self) -> OptionList {
        OptionList::new()
    }

    /// Names of the components this contributor depends on.
    fn components(&self) -> Vec<String> {
        Vec::new()
    }

    /// Shared textures needed this frame.
    fn shared_textures(&self, _ctx: &DeclarationContext<'_>) -> Vec<SharedTexture> {
        Vec::new()
    }

    /// Shared buffers needed this frame.
    fn shared_buffers(&self, _ctx: &DeclarationContext<'_>) -> Vec<SharedBuffer> {
        Vec::new()
    }

    /// Named debug views this contributor can render.
    fn debug_views(&self) -> Vec<String> {
        Vec::new()
    }

    /// React to changes of this contributor's own options.
    ///
    /// Returning `true` terminates and re-initialises the contributor before
    /// its next run.
    fn on_options_changed(&mut self, _changed: &[String], _options: &OptionRegistry) -> bool {
        false
    }

    /// Create private GPU state. Shared resources are already resolved.
    fn init(&mut self, ctx: &FrameContext<'_>) -> Result<(), ContributorError>;

    /// Record this frame's work.
    fn run(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), ContributorError>;

    /// Release private GPU state. The pipeline has been flushed.
    ///
    /// Runs once after every `init` attempt, including a failed one, so it
    /// must release whatever a partial `init` left behind. A reinit whose
    /// `init` fails calls it twice in a row; the second call must find
    /// nothing left to release.
    fn terminate(&mut self, backend: &dyn GpuBackend);

    /// Allow downcasting.
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
