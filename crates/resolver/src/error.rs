//! Error types produced by the `resolver` crate.
//!
//! Context failures are deliberately soft: on the resolution hot path they
//! surface through the cache listener and degrade the affected condition to
//! a non-match instead of failing the resolution. Everything else is a
//! typed, returned error.

use std::fmt;

use thiserror::Error;

/// Errors from reading or updating the runtime context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContextError {
    #[error("unknown qualifier '{0}'")]
    UnknownQualifier(String),
    #[error("qualifier '{0}' has no value in the current context")]
    NotSet(String),
    #[error("invalid value for qualifier '{qualifier}': {message}")]
    InvalidValue { qualifier: String, message: String },
}

/// Composition-specific failures: the merge is object-oriented.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompositionError {
    #[error("partial candidate is not a JSON object")]
    NonObjectPartial,
    #[error("cannot merge partial candidates onto a non-object base")]
    NonObjectBase,
}

/// Errors from resolving a single resource.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ResolveError {
    /// No candidate matched under the current context.
    #[error("no candidate matched for resource '{id}'")]
    NoMatch { id: String },
    /// The requested id is not part of the loaded collection.
    #[error("unknown resource id '{0}'")]
    UnknownResource(String),
    #[error("composition failed for resource '{id}': {source}")]
    Composition {
        id: String,
        #[source]
        source: CompositionError,
    },
    /// An index escaped its arena array or cache. Unreachable after a
    /// well-formed load; indicates a programmer error.
    #[error("invariant violation: {0}")]
    Invariant(String),
}

/// One failed node in a tree composition, anchored to its dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFailure {
    pub path: String,
    pub message: String,
}

impl fmt::Display for TreeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Errors from composing a resource subtree.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum TreeResolveError {
    /// The requested root id names no branch or leaf in the tree.
    UnknownId(String),
    /// One or more nodes failed; every failure is reported together.
    Failed(Vec<TreeFailure>),
}

impl fmt::Display for TreeResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeResolveError::UnknownId(id) => {
                write!(f, "resource id '{id}' is not present in the resource tree")
            }
            TreeResolveError::Failed(failures) => {
                writeln!(f, "tree composition failed ({} failure(s)):", failures.len())?;
                for failure in failures {
                    writeln!(f, "  {failure}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for TreeResolveError {}
