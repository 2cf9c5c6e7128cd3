/// Lifecycle state of a contributor.
///
/// ```text
/// Uninitialized -> Initialized -> Running -> Terminated
///        \              \
///         +--------------+--> Disabled (init failed)
/// ```
///
/// A reinit goes back through `terminate` and `init` and lands in
/// `Initialized` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContributorState {
    /// Created, `init` not called yet.
    #[default]
    Uninitialized,
    /// `init` succeeded, not run since.
    Initialized,
    /// Ran at least once since the last `init`.
    Running,
    /// `init` failed. The contributor is never declared or run again.
    Disabled,
    /// `terminate` was called during shutdown.
    Terminated,
}

impl ContributorState {
    /// Returns true for `Initialized` and `Running`.
    pub fn is_initialized(self) -> bool {
        matches!(self, Self::Initialized | Self::Running)
    }

    /// Returns false for `Disabled` and `Terminated`.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Disabled | Self::Terminated)
    }
}

impl std::fmt::Display for ContributorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Disabled => "disabled",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}
