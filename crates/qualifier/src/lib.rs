//! Qualifier types for the qres resolution engine.
//!
//! A *qualifier* is a named dimension of the runtime context (`language`,
//! `platform`, ...). A *qualifier type* is the strategy that scores a
//! context value against a condition value. This crate defines the scoring
//! contract ([`QualifierMatcher`]), the operator vocabulary ([`Operator`]),
//! a name-indexed [`QualifierTypeRegistry`] used when loading a compiled
//! collection, and the built-in matchers every deployment gets for free.
//!
//! ## Scoring contract
//!
//! `matches(condition_value, context_value, operator)` returns an `f32` in
//! `[0.0, 1.0]`. `0.0` means "no match"; any positive score is a match and
//! feeds the resolver's tie-break ordering. The engine treats the score as
//! opaque beyond that.
//!
//! ## Registering custom types
//!
//! ```
//! use qualifier::{Operator, QualifierMatcher, QualifierTypeRegistry};
//!
//! struct AnyValue;
//!
//! impl QualifierMatcher for AnyValue {
//!     fn matches(&self, _condition: &str, _context: &str, _op: Operator) -> f32 {
//!         1.0
//!     }
//! }
//!
//! let mut registry = QualifierTypeRegistry::with_builtins();
//! registry.register("any-value", |_config| Ok(std::sync::Arc::new(AnyValue)));
//! assert!(registry.contains("any-value"));
//! ```

mod builtins;
mod error;
mod matcher;
mod operator;
mod registry;

pub use crate::builtins::{StringEqualsMatcher, StringListMatcher, StringPrefixMatcher};
pub use crate::error::QualifierError;
pub use crate::matcher::QualifierMatcher;
pub use crate::operator::Operator;
pub use crate::registry::QualifierTypeRegistry;
