//! The resource resolver: merged requests in, live allocations out.

use std::collections::HashMap;

use lumen_core::OptionRegistry;

use super::merge::{merge_requests, MergedResource, MergedShape};
use super::{
    Access, ContributorRequests, GpuResource, ResolvedResource, ResourceDescriptor, ResourceFlags,
    ResourcePlan,
};
use crate::backend::GpuBackend;
use crate::error::ResolveError;
use crate::types::{BufferDescriptor, BufferUsage, Extent2d, TextureDescriptor, TextureUsage};

/// What a resolve pass did to each name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOutcome {
    /// Names allocated for the first time.
    pub created: Vec<String>,
    /// Names whose allocation was recreated with a new shape.
    pub reallocated: Vec<String>,
    /// Names whose allocation was kept unchanged.
    pub reused: Vec<String>,
    /// Names brought back from dormant allocations.
    pub revived: Vec<String>,
    /// Names whose allocation was destroyed.
    pub destroyed: Vec<String>,
    /// Names that stopped being requested but stay allocated.
    pub retained: Vec<String>,
}

impl ResolveOutcome {
    /// Returns true if every allocation was reused.
    pub fn is_unchanged(&self) -> bool {
        self.created.is_empty()
            && self.reallocated.is_empty()
            && self.revived.is_empty()
            && self.destroyed.is_empty()
            && self.retained.is_empty()
    }

    /// Returns true if `name` got a new allocation this pass.
    pub fn was_reallocated(&self, name: &str) -> bool {
        self.reallocated.iter().any(|reallocated| reallocated == name)
    }
}

enum Placement {
    Reuse(ResolvedResource),
    Revive(ResolvedResource),
    Allocate {
        handle: GpuResource,
        generation: u64,
        replaces: Option<ResolvedResource>,
    },
}

/// Owns every shared allocation and rebuilds the plan each frame.
///
/// The plan is only replaced when a resolve pass succeeds completely. A
/// failing pass releases whatever it allocated and leaves the previous plan
/// and its allocations untouched.
#[derive(Debug, Default)]
pub struct ResourceResolver {
    plan: ResourcePlan,
    dormant: HashMap<String, ResolvedResource>,
    passes: u64,
}

impl ResourceResolver {
    /// Create a resolver with an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// The plan produced by the last successful pass.
    pub fn plan(&self) -> &ResourcePlan {
        &self.plan
    }

    pub(crate) fn plan_mut(&mut self) -> &mut ResourcePlan {
        &mut self.plan
    }

    /// Returns true if `name` is kept allocated while nobody requests it.
    pub fn is_dormant(&self, name: &str) -> bool {
        self.dormant.contains_key(name)
    }

    /// A dormant allocation, if `name` is one.
    pub fn dormant(&self, name: &str) -> Option<&ResolvedResource> {
        self.dormant.get(name)
    }

    /// Number of successful resolve passes.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Merge `requests`, diff against the current plan, and update the
    /// allocations accordingly.
    pub fn resolve(
        &mut self,
        requests: &[ContributorRequests],
        options: &OptionRegistry,
        render_dimensions: Extent2d,
        backend: &dyn GpuBackend,
    ) -> Result<ResolveOutcome, ResolveError> {
        let merged = merge_requests(requests, options, render_dimensions)?;
        let placements = self.place(&merged, backend)?;
        Ok(self.commit(merged, placements, backend))
    }

    /// Decide reuse or allocation for every merged name, allocating new
    /// resources as needed. Nothing owned by the resolver changes here.
    fn place(
        &self,
        merged: &[MergedResource],
        backend: &dyn GpuBackend,
    ) -> Result<Vec<Placement>, ResolveError> {
        let mut placements: Vec<Placement> = Vec::with_capacity(merged.len());

        for resource in merged {
            let descriptor = descriptor_for(resource);
            let live = self.plan.get(&resource.name);
            let dormant = self.dormant.get(&resource.name);

            let placement = match (live, dormant) {
                (Some(previous), _) if previous.descriptor == descriptor => {
                    Placement::Reuse(previous.clone())
                }
                (None, Some(previous)) if previous.descriptor == descriptor => {
                    Placement::Revive(previous.clone())
                }
                (previous, dormant) => {
                    let previous = previous.or(dormant);
                    match allocate(backend, &descriptor) {
                        Ok(handle) => Placement::Allocate {
                            handle,
                            generation: previous.map_or(1, |previous| previous.generation + 1),
                            replaces: previous.cloned(),
                        },
                        Err(source) => {
                            rollback(backend, &placements);
                            return Err(ResolveError::AllocationFailed {
                                name: resource.name.clone(),
                                contributors: resource.contributors.clone(),
                                source,
                            });
                        }
                    }
                }
            };
            placements.push(placement);
        }
        Ok(placements)
    }

    /// Install the new plan, then flush once and destroy whatever the new
    /// plan no longer uses.
    fn commit(
        &mut self,
        merged: Vec<MergedResource>,
        placements: Vec<Placement>,
        backend: &dyn GpuBackend,
    ) -> ResolveOutcome {
        let mut outcome = ResolveOutcome::default();
        let mut doomed: Vec<(String, GpuResource)> = Vec::new();
        let mut resources = Vec::with_capacity(merged.len());

        for (resource, placement) in merged.into_iter().zip(placements) {
            let descriptor = descriptor_for(&resource);
            let cleared = resource.flags.contains(ResourceFlags::CLEAR);
            let (handle, generation, frames_valid, fresh) = match placement {
                Placement::Reuse(previous) => {
                    outcome.reused.push(resource.name.clone());
                    (previous.handle, previous.generation, previous.frames_valid + 1, false)
                }
                Placement::Revive(previous) => {
                    self.dormant.remove(&resource.name);
                    outcome.revived.push(resource.name.clone());
                    (previous.handle, previous.generation, previous.frames_valid + 1, false)
                }
                Placement::Allocate {
                    handle,
                    generation,
                    replaces,
                } => {
                    match replaces {
                        Some(previous) => {
                            self.dormant.remove(&resource.name);
                            doomed.push((previous.name, previous.handle));
                            outcome.reallocated.push(resource.name.clone());
                        }
                        None => outcome.created.push(resource.name.clone()),
                    }
                    (handle, generation, 0, true)
                }
            };

            resources.push(ResolvedResource {
                name: resource.name,
                descriptor,
                handle,
                access: resource.access,
                flags: resource.flags,
                generation,
                cleared: cleared || fresh,
                frames_valid,
                contributors: resource.contributors,
                backup_of: resource.backup_of,
                backup: resource.backup,
            });
        }

        let next = ResourcePlan::from_resources(resources);
        let previous = std::mem::replace(&mut self.plan, next);
        for resource in previous.into_resources() {
            if self.plan.contains(&resource.name) {
                continue;
            }
            if resource.flags.contains(ResourceFlags::OPTIONAL_KEEP) {
                log::debug!(
                    "Keeping '{}' (generation {}) allocated while unrequested",
                    resource.name,
                    resource.generation
                );
                outcome.retained.push(resource.name.clone());
                self.dormant.insert(resource.name.clone(), resource);
            } else {
                outcome.destroyed.push(resource.name.clone());
                doomed.push((resource.name, resource.handle));
            }
        }

        if !doomed.is_empty() {
            backend.wait_idle();
            for (name, handle) in doomed {
                log::trace!("Destroying shared resource '{}'", name);
                release(backend, handle);
            }
        }

        self.passes += 1;
        if !outcome.is_unchanged() {
            log::debug!(
                "Resolve pass {}: {} created, {} reallocated, {} revived, {} destroyed, {} retained, {} reused",
                self.passes,
                outcome.created.len(),
                outcome.reallocated.len(),
                outcome.revived.len(),
                outcome.destroyed.len(),
                outcome.retained.len(),
                outcome.reused.len()
            );
        }
        outcome
    }

    /// Destroy every live and dormant allocation.
    pub fn release_all(&mut self, backend: &dyn GpuBackend) {
        let plan = std::mem::take(&mut self.plan);
        let dormant = std::mem::take(&mut self.dormant);
        if plan.is_empty() && dormant.is_empty() {
            return;
        }

        backend.wait_idle();
        let count = plan.len() + dormant.len();
        for resource in plan.into_resources().into_iter().chain(dormant.into_values()) {
            release(backend, resource.handle);
        }
        log::debug!("Released {} shared resource(s)", count);
    }
}

fn descriptor_for(resource: &MergedResource) -> ResourceDescriptor {
    match resource.shape {
        MergedShape::Texture {
            format,
            dimensions,
            mip_levels,
            ..
        } => {
            let mut usage =
                TextureUsage::COPY_SRC | TextureUsage::COPY_DST | TextureUsage::TEXTURE_BINDING;
            if resource.access.contains(Access::WRITE) {
                usage |= TextureUsage::RENDER_ATTACHMENT;
                if !format.is_depth() {
                    usage |= TextureUsage::STORAGE_BINDING;
                }
            }
            ResourceDescriptor::Texture(
                TextureDescriptor::new_2d(dimensions.width, dimensions.height, format, usage)
                    .with_mip_levels(mip_levels)
                    .with_label(resource.name.clone()),
            )
        }
        MergedShape::Buffer { size, stride } => {
            let mut usage = BufferUsage::STORAGE | BufferUsage::COPY_DST;
            if resource.access.contains(Access::WRITE) {
                usage |= BufferUsage::COPY_SRC;
            }
            ResourceDescriptor::Buffer(
                BufferDescriptor::new(size, usage)
                    .with_stride(stride)
                    .with_label(resource.name.clone()),
            )
        }
    }
}

fn allocate(
    backend: &dyn GpuBackend,
    descriptor: &ResourceDescriptor,
) -> Result<GpuResource, crate::backend::BackendError> {
    match descriptor {
        ResourceDescriptor::Texture(texture) => {
            backend.create_texture(texture).map(GpuResource::Texture)
        }
        ResourceDescriptor::Buffer(buffer) => backend.create_buffer(buffer).map(GpuResource::Buffer),
    }
}

fn release(backend: &dyn GpuBackend, handle: GpuResource) {
    match handle {
        GpuResource::Texture(texture) => backend.destroy_texture(texture),
        GpuResource::Buffer(buffer) => backend.destroy_buffer(buffer),
    }
}

/// Destroy the allocations made by an aborted pass. They were never handed
/// out, so no flush is needed.
fn rollback(backend: &dyn GpuBackend, placements: &[Placement]) {
    for placement in placements {
        if let Placement::Allocate { handle, .. } = placement {
            release(backend, *handle);
        }
    }
}
