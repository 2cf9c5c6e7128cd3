use crate::error::ResolveError;
use crate::graph::ResolveOutcome;

/// What happened during one [`FrameOrchestrator::render_frame`](super::FrameOrchestrator::render_frame).
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    /// Index of the executed frame.
    pub frame_index: u64,
    /// Contributors that ran, in execution order.
    pub executed: Vec<String>,
    /// Contributors skipped because the resolve error names them.
    pub skipped: Vec<String>,
    /// Contributors initialised for the first time.
    pub initialized: Vec<String>,
    /// Contributors terminated and initialised again.
    pub reinitialized: Vec<String>,
    /// Contributors disabled by a failing `init` this frame.
    pub disabled: Vec<String>,
    /// Contributors whose `run` returned an error.
    pub failed: Vec<String>,
    /// Error of this frame's resolve pass. The previous plan was kept.
    pub resolve_error: Option<ResolveError>,
    /// Outcome of this frame's resolve pass, when it succeeded.
    pub outcome: Option<ResolveOutcome>,
}

impl FrameReport {
    /// Returns true if anything was skipped, disabled or failed.
    pub fn is_degraded(&self) -> bool {
        self.resolve_error.is_some()
            || !self.skipped.is_empty()
            || !self.disabled.is_empty()
            || !self.failed.is_empty()
    }
}
