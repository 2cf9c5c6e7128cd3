//! Common utilities for orchestration integration tests.
//!
//! Provides a scriptable contributor that records every lifecycle call into
//! a shared log, plus helpers to build orchestrators on the dummy backend.

#![allow(dead_code)]

use std::any::Any;
use std::sync::Arc;

use lumen_core::{OptionList, OptionRegistry, OptionValue};
use lumen_graphics::{
    Contributor, ContributorError, ContributorKind, DeclarationContext, DummyBackend, Extent2d,
    FrameContext, FrameOrchestrator, GpuBackend, SharedBuffer, SharedTexture,
};
use parking_lot::Mutex;

pub const HD: Extent2d = Extent2d::new(1920, 1080);

/// Shared record of lifecycle events, formatted as `"Name:event"`.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn new_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Events of the log that end with `suffix`.
pub fn events(log: &EventLog, suffix: &str) -> Vec<String> {
    log.lock()
        .iter()
        .filter(|event| event.ends_with(suffix))
        .cloned()
        .collect()
}

/// Create an orchestrator on a fresh dummy backend.
pub fn orchestrator(window: Extent2d) -> (Arc<DummyBackend>, FrameOrchestrator) {
    init_logging();
    let backend = Arc::new(DummyBackend::new());
    let shared: Arc<dyn GpuBackend> = backend.clone();
    (backend, FrameOrchestrator::new(shared, window))
}

/// A contributor whose declarations and behaviour are set up by the test.
pub struct Scripted {
    name: String,
    kind: ContributorKind,
    components: Vec<String>,
    options: OptionList,
    textures: Vec<SharedTexture>,
    buffers: Vec<SharedBuffer>,
    debug_views: Vec<String>,
    /// Declarations are only made while this option is truthy.
    gate: Option<String>,
    /// Options whose change requests a reinit.
    reinit_on: Vec<String>,
    /// Names checked with `has_resource` on every run.
    checks: Vec<String>,
    /// Textures whose history is swapped on every run.
    swaps: Vec<String>,
    fail_init: bool,
    /// Only the first `init` succeeds.
    fail_reinit: bool,
    fail_run: bool,
    inits: u32,
    log: EventLog,
}

impl Scripted {
    pub fn technique(name: &str, log: &EventLog) -> Self {
        Self {
            name: name.to_string(),
            kind: ContributorKind::Technique,
            components: Vec::new(),
            options: OptionList::new(),
            textures: Vec::new(),
            buffers: Vec::new(),
            debug_views: Vec::new(),
            gate: None,
            reinit_on: Vec::new(),
            checks: Vec::new(),
            swaps: Vec::new(),
            fail_init: false,
            fail_reinit: false,
            fail_run: false,
            inits: 0,
            log: Arc::clone(log),
        }
    }

    pub fn component(name: &str, log: &EventLog) -> Self {
        Self {
            kind: ContributorKind::Component,
            ..Self::technique(name, log)
        }
    }

    pub fn with_component(mut self, name: &str) -> Self {
        self.components.push(name.to_string());
        self
    }

    pub fn with_option(mut self, name: &str, default: impl Into<OptionValue>) -> Self {
        self.options.push(name, default);
        self
    }

    pub fn with_texture(mut self, texture: SharedTexture) -> Self {
        self.textures.push(texture);
        self
    }

    pub fn with_buffer(mut self, buffer: SharedBuffer) -> Self {
        self.buffers.push(buffer);
        self
    }

    pub fn with_debug_view(mut self, view: &str) -> Self {
        self.debug_views.push(view.to_string());
        self
    }

    pub fn gated_by(mut self, option: &str) -> Self {
        self.gate = Some(option.to_string());
        self
    }

    pub fn reinit_on(mut self, option: &str) -> Self {
        self.reinit_on.push(option.to_string());
        self
    }

    pub fn checking(mut self, name: &str) -> Self {
        self.checks.push(name.to_string());
        self
    }

    pub fn swapping(mut self, name: &str) -> Self {
        self.swaps.push(name.to_string());
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn failing_reinit(mut self) -> Self {
        self.fail_reinit = true;
        self
    }

    pub fn failing_run(mut self) -> Self {
        self.fail_run = true;
        self
    }

    pub fn boxed(self) -> Box<dyn Contributor> {
        Box::new(self)
    }

    fn record(&self, event: impl std::fmt::Display) {
        self.log.lock().push(format!("{}:{}", self.name, event));
    }

    fn declaring(&self, ctx: &DeclarationContext<'_>) -> bool {
        self.gate.as_deref().map_or(true, |gate| ctx.is_enabled(gate))
    }
}

impl Contributor for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ContributorKind {
        self.kind
    }

    fn options(&self) -> OptionList {
        self.options.clone()
    }

    fn components(&self) -> Vec<String> {
        self.components.clone()
    }

    fn shared_textures(&self, ctx: &DeclarationContext<'_>) -> Vec<SharedTexture> {
        if self.declaring(ctx) {
            self.textures.clone()
        } else {
            Vec::new()
        }
    }

    fn shared_buffers(&self, ctx: &DeclarationContext<'_>) -> Vec<SharedBuffer> {
        if self.declaring(ctx) {
            self.buffers.clone()
        } else {
            Vec::new()
        }
    }

    fn debug_views(&self) -> Vec<String> {
        self.debug_views.clone()
    }

    fn on_options_changed(&mut self, changed: &[String], _options: &OptionRegistry) -> bool {
        self.record(format!("changed={}", changed.join(",")));
        changed.iter().any(|name| self.reinit_on.contains(name))
    }

    fn init(&mut self, _ctx: &FrameContext<'_>) -> Result<(), ContributorError> {
        self.record("init");
        self.inits += 1;
        if self.fail_init || (self.fail_reinit && self.inits > 1) {
            return Err(ContributorError::InitializationFailed(format!(
                "{} is scripted to fail",
                self.name
            )));
        }
        Ok(())
    }

    fn run(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), ContributorError> {
        self.record("run");
        for check in &self.checks {
            self.record(format!("has:{}={}", check, ctx.has_resource(check)));
        }
        for swap in &self.swaps {
            ctx.swap_history(swap)?;
        }
        if self.fail_run {
            return Err(ContributorError::ExecutionFailed("scripted".to_string()));
        }
        Ok(())
    }

    fn terminate(&mut self, _backend: &dyn GpuBackend) {
        self.record("terminate");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
