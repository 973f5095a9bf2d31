//! Error types for graph construction and resolution.

use std::fmt;
use std::sync::Arc;

/// Boxed error returned by fallible producers and cleanup hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared form of a producer error, so `DiError` stays `Clone`.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Errors raised while defining, building or resolving a graph.
///
/// Build-time variants (`InvalidProducer`, `UnknownLifetime`,
/// `DuplicateDefinition`, `MissingDependency`, `CircularDependency`) are
/// fatal: no graph is returned. Resolve-time variants are handed back to the
/// caller of `resolve`, `curry` or `invoke` and are never retried.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::DiError;
///
/// let circular = DiError::CircularDependency(vec!["dyn A", "dyn B", "dyn A"]);
/// assert_eq!(circular.to_string(), "circular dependency: dyn A -> dyn B -> dyn A");
///
/// let missing = DiError::DefMissing { type_name: "dyn Cache", chain: vec!["dyn Service"] };
/// assert_eq!(
///     missing.to_string(),
///     "no definition found for dyn Cache in path: dyn Service => dyn Cache"
/// );
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum DiError {
    /// The producer's signature cannot be registered.
    #[error("invalid producer {producer}: {reason}")]
    InvalidProducer {
        producer: &'static str,
        reason: String,
    },

    /// A lifetime value that names none of the known lifetimes.
    #[error("unknown lifetime: {0}")]
    UnknownLifetime(String),

    /// Two definitions for the same type disagree on producer or lifetime.
    #[error("duplicate definition for {type_name}: {existing} conflicts with {incoming}")]
    DuplicateDefinition {
        type_name: &'static str,
        existing: &'static str,
        incoming: &'static str,
    },

    /// Every input type that neither a node nor an ambient binding satisfies.
    #[error("missing dependencies: {}", render_missing(.0))]
    MissingDependency(Vec<MissingDependency>),

    /// No node and no ambient binding for the requested type.
    #[error("no definition found for {type_name} in path: {}", render_path(.chain, .type_name))]
    DefMissing {
        type_name: &'static str,
        chain: Vec<&'static str>,
    },

    /// A cycle, from the first repeated type to its repetition.
    #[error("circular dependency: {}", .0.join(" -> "))]
    CircularDependency(Vec<&'static str>),

    /// A producer returned an error; nothing was cached.
    #[error("could not resolve {type_name} in path: {}, err: {source}", render_path(.chain, .type_name))]
    ResolutionFailed {
        type_name: &'static str,
        chain: Vec<&'static str>,
        #[source]
        source: SharedError,
    },

    /// A stored value could not be downcast to the requested type.
    #[error("type mismatch for: {0}")]
    TypeMismatch(&'static str),

    /// A curried function was called with the wrong number of arguments.
    #[error("expected {expected} argument(s), got {supplied}")]
    ArgumentCount { expected: usize, supplied: usize },

    /// `invoke` found parameters that resolution could not bind.
    #[error("unbound parameters: {}", .0.join(", "))]
    UnboundParameters(Vec<&'static str>),

    /// The invoked function returned its own error.
    #[error(transparent)]
    InvokeFailed(SharedError),

    /// A scope handle outlived both its scope and its graph.
    #[error("scope has ended")]
    ScopeEnded,

    /// One or more cleanup hooks failed while a scope ended.
    #[error("{} cleanup hook(s) failed: {}", .0.len(), render_cleanups(.0))]
    CleanupFailed(Vec<CleanupFailure>),

    /// Graph options could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DiError {
    /// True for a `DefMissing` raised for the requested type itself rather
    /// than for one of its transitive inputs.
    pub fn is_top_level_missing(&self) -> bool {
        matches!(self, DiError::DefMissing { chain, .. } if chain.is_empty())
    }

    /// The types leading up to the failing type, when the error carries one.
    pub fn dependency_chain(&self) -> Option<&[&'static str]> {
        match self {
            DiError::DefMissing { chain, .. } | DiError::ResolutionFailed { chain, .. } => {
                Some(chain)
            }
            _ => None,
        }
    }
}

/// An input type that nothing in the graph can supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDependency {
    pub required_by: &'static str,
    pub missing: &'static str,
}

impl fmt::Display for MissingDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} requires {}", self.required_by, self.missing)
    }
}

/// A cleanup hook that returned an error or panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    pub type_name: &'static str,
    pub message: String,
}

impl fmt::Display for CleanupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

fn render_path(chain: &[&str], last: &str) -> String {
    if chain.is_empty() {
        return "[]".to_string();
    }
    let mut path = chain.join(" => ");
    path.push_str(" => ");
    path.push_str(last);
    path
}

fn render_missing(missing: &[MissingDependency]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn render_cleanups(failures: &[CleanupFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for graph operations.
///
/// ```rust
/// use ferrous_wire::{DiError, DiResult};
///
/// fn parse(raw: &str) -> DiResult<u8> {
///     raw.parse().map_err(|_| DiError::UnknownLifetime(raw.to_string()))
/// }
///
/// assert!(parse("7").is_ok());
/// ```
pub type DiResult<T> = Result<T, DiError>;
