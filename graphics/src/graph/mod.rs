//! Shared-resource declaration and resolution.
//!
//! Contributors never allocate shared GPU memory themselves. Each frame they
//! declare [`SharedTexture`] and [`SharedBuffer`] requests; the
//! [`ResourceResolver`] merges every request for the same name into one
//! [`ResolvedResource`] and keeps the allocations behind a [`ResourcePlan`].
//!
//! # Resolution
//!
//! 1. Requests whose [`Require`] predicate does not hold are dropped when
//!    optional and rejected otherwise. Names whose requests are all optional
//!    are only created for `OPTIONAL_KEEP`, or for `OPTIONAL` once a second
//!    contributor asks for them.
//! 2. Requests are grouped by name in first-request order.
//! 3. Each group merges into one resource: access bits are unioned, flags
//!    are OR-ed, the first concrete format and size win, and zero sizes
//!    inherit the render resolution. `CLEAR` together with `ACCUMULATE` is a
//!    conflict.
//! 4. Every backup name gets a twin with its primary's shape.
//! 5. The merged set is diffed against the previous plan: unchanged
//!    descriptors keep their allocation and generation, changed ones are
//!    recreated with the next generation, and names nobody requests any more
//!    are destroyed (or kept dormant when flagged `OPTIONAL_KEEP`).
//!
//! # Example
//!
//! ```ignore
//! let requests = vec![
//!     ContributorRequests::new("GBuffer").with_texture(SharedTexture::write("Color")),
//!     ContributorRequests::new("ToneMapping").with_texture(SharedTexture::read("Color")),
//! ];
//!
//! let mut resolver = ResourceResolver::new();
//! let outcome = resolver.resolve(&requests, &options, Extent2d::new(1920, 1080), &backend)?;
//! let color = resolver.plan().resource("Color")?;
//! assert_eq!(color.access, Access::READ_WRITE);
//! ```

mod merge;
mod plan;
mod request;
mod require;
mod resolver;

pub use merge::{ContributorRequests, DEFAULT_BUFFER_STRIDE, DEFAULT_TEXTURE_FORMAT};
pub use plan::{GpuResource, ResolvedResource, ResourceDescriptor, ResourcePlan};
pub use request::{Access, ResourceFlags, SharedBuffer, SharedTexture};
pub use require::{Require, RequireParseError};
pub use resolver::{ResolveOutcome, ResourceResolver};
