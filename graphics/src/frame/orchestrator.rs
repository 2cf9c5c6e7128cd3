//! The per-frame driver.

use std::collections::HashSet;
use std::sync::Arc;

use lumen_core::OptionRegistry;

use super::{ContributorSlot, ContributorState, FrameReport};
use crate::backend::GpuBackend;
use crate::contributor::{
    Contributor, ContributorFactory, ContributorKind, DeclarationContext, FrameContext, FrameInfo,
};
use crate::error::{LookupError, ResolveError, SetupError};
use crate::graph::{GpuResource, ResourceFlags, ResourcePlan, ResourceResolver};
use crate::types::Extent2d;

/// Name of the debug view that disables debug output.
pub const NO_DEBUG_VIEW: &str = "None";

/// Drives the contributors through their lifecycle and resolves the shared
/// resources once per frame.
///
/// Components always precede techniques in execution order, and every
/// component precedes the components and techniques that depend on it.
pub struct FrameOrchestrator {
    backend: Arc<dyn GpuBackend>,
    options: OptionRegistry,
    resolver: ResourceResolver,
    components: Vec<ContributorSlot>,
    techniques: Vec<ContributorSlot>,
    window: Extent2d,
    render_scale: f32,
    frame_index: u64,
    dimensions_changed: bool,
    debug_view: Option<String>,
    last_resolve_error: Option<ResolveError>,
    shut_down: bool,
}

impl FrameOrchestrator {
    /// Create an orchestrator without contributors.
    pub fn new(backend: Arc<dyn GpuBackend>, window: Extent2d) -> Self {
        log::info!(
            "Frame orchestrator created on {} backend at {}",
            backend.name(),
            window
        );
        Self {
            backend,
            options: OptionRegistry::new(),
            resolver: ResourceResolver::new(),
            components: Vec::new(),
            techniques: Vec::new(),
            window,
            render_scale: 1.0,
            frame_index: 0,
            dimensions_changed: false,
            debug_view: None,
            last_resolve_error: None,
            shut_down: false,
        }
    }

    /// Create an orchestrator running the named techniques.
    pub fn from_techniques<S: AsRef<str>>(
        backend: Arc<dyn GpuBackend>,
        window: Extent2d,
        factory: &ContributorFactory,
        techniques: &[S],
    ) -> Result<Self, SetupError> {
        let mut orchestrator = Self::new(backend, window);
        orchestrator.set_techniques(factory, techniques)?;
        Ok(orchestrator)
    }

    /// Replace every contributor with the named techniques and the
    /// components they depend on.
    ///
    /// Existing contributors are terminated first. Option values persist.
    /// Each contributor is placed by the kind it was registered with in the
    /// factory. On error the orchestrator is left without contributors and
    /// with the options it had before the call.
    pub fn set_techniques<S: AsRef<str>>(
        &mut self,
        factory: &ContributorFactory,
        techniques: &[S],
    ) -> Result<(), SetupError> {
        self.terminate_contributors();
        self.components.clear();
        self.techniques.clear();
        self.shut_down = false;

        let options = self.options.clone();
        if let Err(err) = self.install_techniques(factory, techniques) {
            log::error!("Technique setup failed: {}", err);
            self.components.clear();
            self.techniques.clear();
            self.options = options;
            return Err(err);
        }
        log::info!(
            "Contributors: {}",
            self.contributor_names().collect::<Vec<_>>().join(", ")
        );
        Ok(())
    }

    fn install_techniques<S: AsRef<str>>(
        &mut self,
        factory: &ContributorFactory,
        techniques: &[S],
    ) -> Result<(), SetupError> {
        let mut components: Vec<(ContributorKind, Box<dyn Contributor>)> = Vec::new();
        let mut created: Vec<(ContributorKind, Box<dyn Contributor>)> = Vec::new();
        for name in techniques {
            let name = name.as_ref();
            if created.iter().any(|(_, technique)| technique.name() == name) {
                return Err(SetupError::DuplicateContributor(name.to_string()));
            }
            let (kind, technique) = factory.instantiate(name)?;
            let mut stack = vec![name.to_string()];
            instantiate_components(factory, &technique.components(), &mut stack, &mut components)?;
            created.push((kind, technique));
        }

        for (kind, contributor) in components.into_iter().chain(created) {
            self.insert_contributor(contributor, kind)?;
        }
        Ok(())
    }

    /// Add a single contributor after the existing ones of its kind, as
    /// reported by [`Contributor::kind`].
    ///
    /// Every component it depends on must already be present.
    pub fn add_contributor(&mut self, contributor: Box<dyn Contributor>) -> Result<(), SetupError> {
        let kind = contributor.kind();
        self.insert_contributor(contributor, kind)
    }

    fn insert_contributor(
        &mut self,
        contributor: Box<dyn Contributor>,
        kind: ContributorKind,
    ) -> Result<(), SetupError> {
        let name = contributor.name().to_string();
        if self.slot(&name).is_some() {
            return Err(SetupError::DuplicateContributor(name));
        }
        if let Some(missing) = contributor
            .components()
            .into_iter()
            .find(|dependency| !self.components.iter().any(|slot| slot.name == *dependency))
        {
            return Err(SetupError::UnknownContributor(missing));
        }

        let mut options = self.options.clone();
        options.register_all(&contributor.options())?;
        self.options = options;

        let slot = ContributorSlot::new(contributor, &self.options);
        log::debug!("Added {} '{}'", kind, name);
        match kind {
            ContributorKind::Component => self.components.push(slot),
            ContributorKind::Technique => self.techniques.push(slot),
        }
        Ok(())
    }

    /// Run one frame.
    pub fn render_frame(&mut self) -> FrameReport {
        let mut report = FrameReport {
            frame_index: self.frame_index,
            ..FrameReport::default()
        };
        if self.shut_down {
            log::warn!("render_frame called after shutdown");
            return report;
        }

        let render = self.render_dimensions();
        self.react_to_option_changes();

        // Declaration.
        let declaration =
            DeclarationContext::new(&self.options, self.window, render, self.frame_index);
        let requests: Vec<_> = self
            .components
            .iter_mut()
            .chain(self.techniques.iter_mut())
            .filter(|slot| slot.state.is_active())
            .map(|slot| slot.declare(&declaration))
            .filter(|requests| !requests.is_empty())
            .collect();

        // Resolution.
        let mut skipped: HashSet<String> = HashSet::new();
        let resolved = match self.resolver.resolve(
            &requests,
            &self.options,
            render,
            self.backend.as_ref(),
        ) {
            Ok(outcome) => {
                for slot in self.components.iter_mut().chain(self.techniques.iter_mut()) {
                    if slot.state.is_initialized()
                        && outcome.reallocated.iter().any(|name| slot.declared(name))
                    {
                        log::debug!("'{}' uses a reallocated resource, reinitialising", slot.name);
                        slot.reinit_pending = true;
                    }
                }
                self.last_resolve_error = None;
                report.outcome = Some(outcome);
                true
            }
            Err(err) => {
                log::error!(
                    "Frame {}: {}. Keeping the previous plan",
                    self.frame_index,
                    err
                );
                skipped.extend(err.contributors().into_iter().map(str::to_string));
                self.last_resolve_error = Some(err.clone());
                report.resolve_error = Some(err);
                false
            }
        };

        let info = FrameInfo {
            frame_index: self.frame_index,
            window: self.window,
            render,
            dimensions_changed: self.dimensions_changed,
            debug_view: self.debug_view.clone(),
        };
        let backend = self.backend.as_ref();
        let options = &self.options;
        let plan = self.resolver.plan();

        // Initialisation.
        let flush_needed = self
            .components
            .iter()
            .chain(self.techniques.iter())
            .any(|slot| {
                slot.reinit_pending && slot.state.is_initialized() && !skipped.contains(&slot.name)
            });
        if flush_needed {
            backend.wait_idle();
        }
        for_each_slot(&mut self.components, &mut self.techniques, |slot, preceding| {
            if skipped.contains(&slot.name) {
                return;
            }
            let ctx = FrameContext::new(backend, options, plan, &info, preceding);
            prepare_slot(slot, &ctx, backend, &mut report);
        });

        clear_resources(plan, resolved, backend);

        // Execution.
        let mut history_swaps = Vec::new();
        for_each_slot(&mut self.components, &mut self.techniques, |slot, preceding| {
            if skipped.contains(&slot.name) {
                if slot.state.is_active() {
                    report.skipped.push(slot.name.clone());
                }
                return;
            }
            if !slot.state.is_initialized() {
                return;
            }
            let mut ctx = FrameContext::new(backend, options, plan, &info, preceding);
            match slot.contributor.run(&mut ctx) {
                Ok(()) => {
                    slot.state = ContributorState::Running;
                    report.executed.push(slot.name.clone());
                }
                Err(err) => {
                    log::warn!("'{}' failed on frame {}: {}", slot.name, info.frame_index, err);
                    report.failed.push(slot.name.clone());
                }
            }
            history_swaps.extend(ctx.into_history_swaps());
        });

        for name in history_swaps {
            if let Err(err) = self.resolver.plan_mut().swap_history(&name) {
                log::warn!("Cannot swap history of '{}': {}", name, err);
            }
        }

        if report.is_degraded() {
            log::warn!(
                "Frame {} degraded: {} skipped, {} disabled, {} failed",
                self.frame_index,
                report.skipped.len(),
                report.disabled.len(),
                report.failed.len()
            );
        }
        self.frame_index += 1;
        self.dimensions_changed = false;
        report
    }

    /// Compare every contributor's options against its last snapshot and
    /// let it react.
    fn react_to_option_changes(&mut self) {
        let options = &self.options;
        for slot in self.components.iter_mut().chain(self.techniques.iter_mut()) {
            let changed = slot.changed_options(options);
            if changed.is_empty() || !slot.state.is_initialized() {
                continue;
            }
            if slot.contributor.on_options_changed(&changed, options) {
                log::debug!("'{}' requests reinit after {:?} changed", slot.name, changed);
                slot.reinit_pending = true;
            }
        }
    }

    /// Change the window size. Every initialised contributor is
    /// reinitialised before its next run.
    pub fn resize(&mut self, window: Extent2d) {
        if window == self.window {
            return;
        }
        log::debug!("Window resized {} -> {}", self.window, window);
        self.window = window;
        self.dimensions_changed = true;
        self.mark_all_for_reinit();
    }

    /// Set the ratio of render to window size, clamped to `(0, 1]`.
    pub fn set_render_scale(&mut self, scale: f32) {
        if !scale.is_finite() || scale <= 0.0 {
            log::warn!("Ignoring invalid render scale {}", scale);
            return;
        }
        let scale = scale.min(1.0);
        let previous = self.render_dimensions();
        self.render_scale = scale;
        if self.render_dimensions() != previous {
            log::debug!("Render size {} -> {}", previous, self.render_dimensions());
            self.dimensions_changed = true;
            self.mark_all_for_reinit();
        }
    }

    /// Reinitialise a contributor before its next run.
    pub fn request_reinit(&mut self, name: &str) -> Result<(), LookupError> {
        let slot = self
            .slot_mut(name)
            .ok_or_else(|| LookupError::not_found("contributor", name))?;
        slot.reinit_pending = true;
        Ok(())
    }

    fn mark_all_for_reinit(&mut self) {
        for slot in self.components.iter_mut().chain(self.techniques.iter_mut()) {
            if slot.state.is_initialized() {
                slot.reinit_pending = true;
            }
        }
    }

    pub fn options(&self) -> &OptionRegistry {
        &self.options
    }

    /// Mutable options. Changes are picked up by the next frame.
    pub fn options_mut(&mut self) -> &mut OptionRegistry {
        &mut self.options
    }

    /// Plan of the last successful resolve.
    pub fn plan(&self) -> &ResourcePlan {
        self.resolver.plan()
    }

    pub fn resolver(&self) -> &ResourceResolver {
        &self.resolver
    }

    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    /// Error of the last resolve, cleared by the next successful one.
    pub fn last_resolve_error(&self) -> Option<&ResolveError> {
        self.last_resolve_error.as_ref()
    }

    /// Index of the next frame.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn window_dimensions(&self) -> Extent2d {
        self.window
    }

    pub fn render_scale(&self) -> f32 {
        self.render_scale
    }

    /// `max(1, round(window * scale))` per axis.
    pub fn render_dimensions(&self) -> Extent2d {
        if self.render_scale >= 1.0 {
            self.window
        } else {
            self.window.scaled(self.render_scale)
        }
    }

    /// Lifecycle state of a contributor.
    pub fn state_of(&self, name: &str) -> Option<ContributorState> {
        self.slot(name).map(|slot| slot.state)
    }

    /// Contributor names in execution order.
    pub fn contributor_names(&self) -> impl Iterator<Item = &str> {
        self.slots().map(|slot| slot.name.as_str())
    }

    /// Contributor slots in execution order.
    pub fn slots(&self) -> impl Iterator<Item = &ContributorSlot> {
        self.components.iter().chain(self.techniques.iter())
    }

    /// Look up a component by name and type.
    pub fn component<T: Contributor>(&self, name: &str) -> Option<&T> {
        self.components
            .iter()
            .find(|slot| slot.name == name)
            .and_then(|slot| slot.contributor.as_any().downcast_ref::<T>())
    }

    /// Look up any contributor by name and type.
    pub fn contributor<T: Contributor>(&self, name: &str) -> Option<&T> {
        self.slot(name)
            .and_then(|slot| slot.contributor.as_any().downcast_ref::<T>())
    }

    fn slot(&self, name: &str) -> Option<&ContributorSlot> {
        self.slots().find(|slot| slot.name == name)
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut ContributorSlot> {
        self.components
            .iter_mut()
            .chain(self.techniques.iter_mut())
            .find(|slot| slot.name == name)
    }

    /// Every selectable debug view: `"None"`, the contributors' named views
    /// and every resolved texture.
    pub fn debug_views(&self) -> Vec<String> {
        let mut views = vec![NO_DEBUG_VIEW.to_string()];
        let named = self
            .slots()
            .filter(|slot| slot.state.is_active())
            .flat_map(|slot| slot.contributor.debug_views());
        let textures = self.plan().textures().map(|texture| texture.name.clone());
        for view in named.chain(textures) {
            if !views.contains(&view) {
                views.push(view);
            }
        }
        views
    }

    /// Currently selected debug view.
    pub fn debug_view(&self) -> Option<&str> {
        self.debug_view.as_deref()
    }

    /// Select a debug view. `"None"` clears the selection.
    pub fn set_debug_view(&mut self, name: &str) -> Result<(), LookupError> {
        if name == NO_DEBUG_VIEW {
            self.debug_view = None;
            return Ok(());
        }
        if !self.debug_views().iter().any(|view| view == name) {
            return Err(LookupError::not_found("debug view", name));
        }
        log::debug!("Debug view set to '{}'", name);
        self.debug_view = Some(name.to_string());
        Ok(())
    }

    /// Flush, terminate every contributor in reverse execution order and
    /// release every shared resource. Calling it again does nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.terminate_contributors();
        self.resolver.release_all(self.backend.as_ref());
        self.shut_down = true;
        log::info!("Frame orchestrator shut down after {} frame(s)", self.frame_index);
    }

    fn terminate_contributors(&mut self) {
        if self.slots().all(|slot| !slot.state.is_initialized()) {
            for slot in self.components.iter_mut().chain(self.techniques.iter_mut()) {
                slot.state = ContributorState::Terminated;
            }
            return;
        }

        let backend = self.backend.as_ref();
        backend.wait_idle();
        for slot in self
            .techniques
            .iter_mut()
            .rev()
            .chain(self.components.iter_mut().rev())
        {
            if slot.state.is_initialized() {
                log::debug!("Terminating '{}'", slot.name);
                slot.contributor.terminate(backend);
            }
            slot.state = ContributorState::Terminated;
            slot.reinit_pending = false;
        }
    }
}

impl Drop for FrameOrchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for FrameOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameOrchestrator")
            .field("backend", &self.backend.name())
            .field("components", &self.components)
            .field("techniques", &self.techniques)
            .field("window", &self.window)
            .field("render_scale", &self.render_scale)
            .field("frame_index", &self.frame_index)
            .finish()
    }
}

static_assertions::assert_impl_all!(FrameOrchestrator: Send);

/// Create the components in `names` and, first, the components they
/// depend on. `stack` holds the current dependency chain.
fn instantiate_components(
    factory: &ContributorFactory,
    names: &[String],
    stack: &mut Vec<String>,
    created: &mut Vec<(ContributorKind, Box<dyn Contributor>)>,
) -> Result<(), SetupError> {
    for name in names {
        if let Some(position) = stack.iter().position(|entry| entry == name) {
            let mut cycle = stack[position..].to_vec();
            cycle.push(name.clone());
            return Err(SetupError::DependencyCycle(cycle));
        }
        if created.iter().any(|(_, component)| component.name() == name) {
            continue;
        }

        let (kind, component) = factory.instantiate(name)?;
        stack.push(name.clone());
        instantiate_components(factory, &component.components(), stack, created)?;
        stack.pop();
        created.push((kind, component));
    }
    Ok(())
}

/// Visit every slot in execution order together with the components that
/// precede it.
fn for_each_slot(
    components: &mut [ContributorSlot],
    techniques: &mut [ContributorSlot],
    mut visit: impl FnMut(&mut ContributorSlot, &[ContributorSlot]),
) {
    for index in 0..components.len() {
        let (preceding, rest) = components.split_at_mut(index);
        visit(&mut rest[0], preceding);
    }
    for slot in techniques.iter_mut() {
        visit(slot, components);
    }
}

/// Run the first `init`, or `terminate` then `init` for a pending reinit.
///
/// Every `init` attempt is paired with one `terminate`. A failed attempt is
/// terminated straight away, so a failing reinit terminates twice in a row.
fn prepare_slot(
    slot: &mut ContributorSlot,
    ctx: &FrameContext<'_>,
    backend: &dyn GpuBackend,
    report: &mut FrameReport,
) {
    let reinit = match slot.state {
        ContributorState::Uninitialized => false,
        ContributorState::Initialized | ContributorState::Running if slot.reinit_pending => {
            log::debug!("Reinitialising '{}'", slot.name);
            slot.contributor.terminate(backend);
            true
        }
        _ => return,
    };
    slot.reinit_pending = false;

    match slot.contributor.init(ctx) {
        Ok(()) => {
            slot.state = ContributorState::Initialized;
            if reinit {
                report.reinitialized.push(slot.name.clone());
            } else {
                log::debug!("Initialised '{}'", slot.name);
                report.initialized.push(slot.name.clone());
            }
        }
        Err(err) => {
            log::error!("'{}' failed to initialise and is disabled: {}", slot.name, err);
            slot.contributor.terminate(backend);
            slot.state = ContributorState::Disabled;
            report.disabled.push(slot.name.clone());
        }
    }
}

/// Zero-fill resources that clear every frame, plus freshly allocated ones
/// when the plan was rebuilt this frame.
fn clear_resources(plan: &ResourcePlan, resolved: bool, backend: &dyn GpuBackend) {
    for resource in plan.iter() {
        let clear = resource.flags.contains(ResourceFlags::CLEAR) || (resolved && resource.cleared);
        if !clear {
            continue;
        }
        let result = match resource.handle {
            GpuResource::Texture(texture) => backend.clear_texture(texture),
            GpuResource::Buffer(buffer) => backend.clear_buffer(buffer),
        };
        if let Err(err) = result {
            log::warn!("Cannot clear '{}': {}", resource.name, err);
        }
    }
}
