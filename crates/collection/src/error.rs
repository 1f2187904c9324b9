//! Error types produced by the `collection` crate.
//!
//! Loading aggregates every violation it can find into one [`LoadError`]
//! rather than stopping at the first, so authors see the whole damage
//! report at once.

use std::fmt;

use thiserror::Error;

/// A single wire-format violation, anchored to its position in the
/// compiled collection (`"conditions[3]"`, `"resources[0]"`, ...).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{position}: {message}")]
pub struct LoadIssue {
    pub position: String,
    pub message: String,
}

/// Aggregated wire-format violations from a failed load.
///
/// Always carries at least one issue. `Display` renders one issue per line.
#[derive(Debug, Clone)]
pub struct LoadError {
    issues: Vec<LoadIssue>,
}

impl LoadError {
    pub(crate) fn new(issues: Vec<LoadIssue>) -> Self {
        Self { issues }
    }

    /// The individual violations, in wire order.
    pub fn issues(&self) -> &[LoadIssue] {
        &self.issues
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "failed to load compiled collection ({} issue(s)):",
            self.issues.len()
        )?;
        for issue in &self.issues {
            writeln!(f, "  {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for LoadError {}

/// Errors from reading a loaded collection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CollectionError {
    /// An entity index does not fall inside its arena array. With a
    /// well-formed load this indicates a programmer error, not bad data.
    #[error("{kind} index {index} is out of range ({size} loaded)")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        size: usize,
    },
}
