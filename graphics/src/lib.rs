//! # Lumen Graphics
//!
//! Shared-resource resolution and frame orchestration for independently
//! written rendering techniques.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`SharedTexture`] / [`SharedBuffer`] - Named resource requests declared by contributors
//! - [`ResourceResolver`] - Merges requests into one allocation per name and reuses it across frames
//! - [`Contributor`] - Trait implemented by components and techniques
//! - [`FrameOrchestrator`] - Drives the contributor lifecycle once per frame
//! - [`GpuBackend`] - The graphics-API boundary, with a [`DummyBackend`] for testing
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lumen_graphics::{ContributorFactory, DummyBackend, Extent2d, FrameOrchestrator};
//!
//! let factory = ContributorFactory::with_builtins();
//! let mut frames = FrameOrchestrator::from_techniques(
//!     Arc::new(DummyBackend::new()),
//!     Extent2d::new(1280, 720),
//!     &factory,
//!     &["GBuffer", "ToneMapping"],
//! )?;
//! for _ in 0..3 {
//!     frames.render_frame();
//! }
//! frames.shutdown();
//! ```

pub mod backend;
pub mod components;
pub mod contributor;
pub mod error;
pub mod frame;
pub mod graph;
pub mod techniques;
pub mod types;

// Re-export main types for convenience
pub use backend::{BackendError, DummyBackend, GpuBackend};
pub use contributor::{
    Contributor, ContributorFactory, ContributorKind, DeclarationContext, FrameContext,
};
pub use error::{ConflictReason, ContributorError, LookupError, ResolveError, SetupError};
pub use frame::{ContributorState, FrameOrchestrator, FrameReport};
pub use graph::{
    Access, ContributorRequests, Require, ResolveOutcome, ResolvedResource, ResourceFlags,
    ResourcePlan, ResourceResolver, SharedBuffer, SharedTexture,
};
pub use types::{
    BufferDescriptor, BufferUsage, Extent2d, TextureDescriptor, TextureFormat, TextureUsage,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
pub fn init() {
    log::info!("Lumen Graphics v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_empty_resolver() {
        let resolver = ResourceResolver::new();
        assert!(resolver.plan().is_empty());
    }

    #[test]
    fn test_dummy_backend() {
        let backend = DummyBackend::new();
        assert!(backend.name() == "Dummy");
    }
}
