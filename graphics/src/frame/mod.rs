//! Frame orchestration.
//!
//! The [`FrameOrchestrator`] owns the option registry, the resource resolver
//! and every contributor. Each call to
//! [`render_frame`](FrameOrchestrator::render_frame) performs:
//!
//! 1. Option change detection and contributor reactions
//! 2. Declaration of the frame's shared resources
//! 3. Resolution (falling back to the previous plan on error)
//! 4. First-time initialisation and pending reinitialisation, after a single
//!    pipeline flush
//! 5. Zero-fill clears
//! 6. Contributor execution in dependency order
//! 7. History swaps and frame counter advance
//!
//! # Example
//!
//! ```ignore
//! let backend = Arc::new(DummyBackend::new());
//! let factory = ContributorFactory::with_builtins();
//! let mut frames = FrameOrchestrator::from_techniques(
//!     backend,
//!     Extent2d::new(1920, 1080),
//!     &factory,
//!     &["GBuffer", "TemporalUpscaler", "ToneMapping"],
//! )?;
//!
//! frames.options_mut().set("taa_enable", true)?;
//! let report = frames.render_frame();
//! assert!(!report.is_degraded());
//! ```

mod orchestrator;
mod report;
mod slot;
mod state;

pub use orchestrator::{FrameOrchestrator, NO_DEBUG_VIEW};
pub use report::FrameReport;
pub use slot::ContributorSlot;
pub use state::ContributorState;
