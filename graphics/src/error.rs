//! Graphics error types.

use lumen_core::OptionError;
use thiserror::Error;

use crate::backend::BackendError;
use crate::types::TextureFormat;

/// Why two declarations of the same resource cannot be merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    /// One requester clears every frame, another accumulates across frames.
    ClearAndAccumulate,
    /// The name is requested both as a texture and as a buffer.
    TextureAndBuffer,
    /// Two requesters name different concrete formats.
    Format(TextureFormat, TextureFormat),
    /// Two requesters name different buffer strides.
    Stride(u32, u32),
    /// Two requesters name different backup twins.
    BackupName(String, String),
    /// A backup twin is requested directly with a shape that differs from
    /// its primary.
    BackupShape { primary: String },
}

impl std::fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClearAndAccumulate => write!(f, "Clear and Accumulate are mutually exclusive"),
            Self::TextureAndBuffer => write!(f, "requested both as a texture and as a buffer"),
            Self::Format(a, b) => write!(f, "formats {a:?} and {b:?} differ"),
            Self::Stride(a, b) => write!(f, "strides {a} and {b} differ"),
            Self::BackupName(a, b) => write!(f, "backup names '{a}' and '{b}' differ"),
            Self::BackupShape { primary } => {
                write!(f, "shape differs from its primary '{primary}'")
            }
        }
    }
}

/// Errors produced while resolving the frame's shared resources.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// Two declarations of the same name cannot be merged.
    #[error("conflicting declarations of '{name}' by '{first}' and '{second}': {reason}")]
    Conflict {
        name: String,
        reason: ConflictReason,
        first: String,
        second: String,
    },
    /// A mandatory request's `require` predicate does not hold.
    #[error("'{contributor}' requires '{require}' for resource '{name}', which does not hold")]
    UnsatisfiableRequire {
        name: String,
        contributor: String,
        require: String,
    },
    /// The backend could not allocate a resource.
    #[error("failed to allocate '{name}' for {contributors:?}: {source}")]
    AllocationFailed {
        name: String,
        contributors: Vec<String>,
        #[source]
        source: BackendError,
    },
}

impl ResolveError {
    /// Name of the resource the error is about.
    pub fn resource(&self) -> &str {
        match self {
            Self::Conflict { name, .. }
            | Self::UnsatisfiableRequire { name, .. }
            | Self::AllocationFailed { name, .. } => name.as_str(),
        }
    }

    /// Contributors whose declarations caused the error.
    pub fn contributors(&self) -> Vec<&str> {
        match self {
            Self::Conflict { first, second, .. } => {
                let mut names = vec![first.as_str()];
                if second != first {
                    names.push(second.as_str());
                }
                names
            }
            Self::UnsatisfiableRequire { contributor, .. } => vec![contributor.as_str()],
            Self::AllocationFailed { contributors, .. } => {
                contributors.iter().map(String::as_str).collect()
            }
        }
    }
}

/// Errors returned by resource and registry lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Nothing of this kind exists under the name.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
    /// The name exists but refers to another kind of object.
    #[error("'{name}' is not a {expected}")]
    KindMismatch {
        name: String,
        expected: &'static str,
    },
}

impl LookupError {
    pub(crate) fn not_found(kind: &'static str, name: &str) -> Self {
        Self::NotFound {
            kind,
            name: name.to_string(),
        }
    }
}

/// Errors returned by contributor callbacks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContributorError {
    /// The contributor could not initialise and must stay inactive.
    #[error("initialization failed: {0}")]
    InitializationFailed(String),
    /// The contributor failed during its frame step.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    /// A backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// A resource or component lookup failed.
    #[error(transparent)]
    Lookup(#[from] LookupError),
    /// An option lookup failed.
    #[error(transparent)]
    Option(#[from] OptionError),
}

/// Errors raised while assembling the set of contributors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// No factory entry exists under the name.
    #[error("unknown contributor '{0}'")]
    UnknownContributor(String),
    /// A contributor with this name was already added.
    #[error("contributor '{0}' is already registered")]
    DuplicateContributor(String),
    /// Components depend on each other in a cycle.
    #[error("component dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),
    /// Two contributors declare the same option with different kinds.
    #[error(transparent)]
    Option(#[from] OptionError),
}
