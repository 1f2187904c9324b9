use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison operator carried by a binary condition.
///
/// The wire format admits one operator per condition; only `matches` is
/// defined today. The enum is closed but `#[non_exhaustive]` so operators
/// can be added without a breaking release. Unknown operator strings are
/// rejected when the compiled collection is parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub enum Operator {
    /// Score the context value against the condition value.
    #[default]
    Matches,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Matches => f.write_str("matches"),
        }
    }
}
