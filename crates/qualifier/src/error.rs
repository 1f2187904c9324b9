//! Error types produced by the `qualifier` crate.
use thiserror::Error;

/// Errors raised while configuring qualifier types or validating values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QualifierError {
    #[error("unknown qualifier type: {0}")]
    UnknownType(String),
    #[error("invalid qualifier type config: {0}")]
    InvalidConfig(String),
    #[error("invalid qualifier value: {0}")]
    InvalidValue(String),
}
