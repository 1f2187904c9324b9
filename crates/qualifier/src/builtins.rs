//! Built-in qualifier types.
//!
//! Three matchers cover the common cases: exact string comparison, a
//! membership test against a separator-joined list, and a segmented prefix
//! match that grades partial matches (useful for hierarchical tags such as
//! `en` vs `en-US`). Each is constructed from the `config` blob its
//! qualifier type carries in the compiled collection.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::QualifierError;
use crate::matcher::QualifierMatcher;
use crate::operator::Operator;

/// Deserialize a config blob, treating JSON `null` (or an absent blob) as
/// "all defaults".
fn parse_config<T: Default + DeserializeOwned>(config: &JsonValue) -> Result<T, QualifierError> {
    if config.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(config.clone()).map_err(|e| QualifierError::InvalidConfig(e.to_string()))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StringEqualsConfig {
    case_insensitive: bool,
}

/// Exact string comparison. Scores 1.0 on equality, 0.0 otherwise.
#[derive(Debug, Clone)]
pub struct StringEqualsMatcher {
    case_insensitive: bool,
}

impl StringEqualsMatcher {
    /// Registry name for this type.
    pub const NAME: &'static str = "string-equals";

    pub fn from_config(config: &JsonValue) -> Result<Self, QualifierError> {
        let cfg: StringEqualsConfig = parse_config(config)?;
        Ok(Self {
            case_insensitive: cfg.case_insensitive,
        })
    }

    fn equals(&self, a: &str, b: &str) -> bool {
        if self.case_insensitive {
            a.eq_ignore_ascii_case(b)
        } else {
            a == b
        }
    }
}

impl QualifierMatcher for StringEqualsMatcher {
    fn matches(&self, condition_value: &str, context_value: &str, _operator: Operator) -> f32 {
        if self.equals(condition_value, context_value) {
            1.0
        } else {
            0.0
        }
    }
}

fn default_separator() -> String {
    ",".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StringListConfig {
    separator: String,
    case_insensitive: bool,
}

impl Default for StringListConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            case_insensitive: false,
        }
    }
}

/// Membership test against a separator-joined condition value.
///
/// A condition value of `"en,fr,de"` matches context values `en`, `fr`,
/// or `de`. List elements are trimmed, so `"en, fr"` behaves the same.
#[derive(Debug, Clone)]
pub struct StringListMatcher {
    separator: String,
    case_insensitive: bool,
}

impl StringListMatcher {
    /// Registry name for this type.
    pub const NAME: &'static str = "string-list";

    pub fn from_config(config: &JsonValue) -> Result<Self, QualifierError> {
        let cfg: StringListConfig = parse_config(config)?;
        if cfg.separator.is_empty() {
            return Err(QualifierError::InvalidConfig(
                "separator must not be empty".to_string(),
            ));
        }
        Ok(Self {
            separator: cfg.separator,
            case_insensitive: cfg.case_insensitive,
        })
    }

    fn equals(&self, a: &str, b: &str) -> bool {
        if self.case_insensitive {
            a.eq_ignore_ascii_case(b)
        } else {
            a == b
        }
    }
}

impl QualifierMatcher for StringListMatcher {
    fn matches(&self, condition_value: &str, context_value: &str, _operator: Operator) -> f32 {
        let hit = condition_value
            .split(self.separator.as_str())
            .map(str::trim)
            .any(|element| self.equals(element, context_value));
        if hit {
            1.0
        } else {
            0.0
        }
    }

    fn validate_value(&self, value: &str) -> Result<(), QualifierError> {
        if value.is_empty() {
            return Err(QualifierError::InvalidValue(
                "value must not be empty".to_string(),
            ));
        }
        // Context values are single entries; a separator in the value is
        // almost certainly a list pasted into the wrong place.
        if value.contains(self.separator.as_str()) {
            return Err(QualifierError::InvalidValue(format!(
                "value must be a single entry without '{}'",
                self.separator
            )));
        }
        Ok(())
    }
}

fn default_delimiter() -> String {
    "-".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StringPrefixConfig {
    delimiter: String,
    case_insensitive: bool,
}

impl Default for StringPrefixConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            case_insensitive: false,
        }
    }
}

/// Segmented prefix match over delimiter-separated tags.
///
/// The condition value matches a context value when it equals the context
/// value or is a whole-segment prefix of it: condition `en` matches context
/// `en-US` but not `enx`. The score is the fraction of context segments the
/// condition covers, so more specific conditions rank higher under the
/// resolver's tie-break.
#[derive(Debug, Clone)]
pub struct StringPrefixMatcher {
    delimiter: String,
    case_insensitive: bool,
}

impl StringPrefixMatcher {
    /// Registry name for this type.
    pub const NAME: &'static str = "string-prefix";

    pub fn from_config(config: &JsonValue) -> Result<Self, QualifierError> {
        let cfg: StringPrefixConfig = parse_config(config)?;
        if cfg.delimiter.is_empty() {
            return Err(QualifierError::InvalidConfig(
                "delimiter must not be empty".to_string(),
            ));
        }
        Ok(Self {
            delimiter: cfg.delimiter,
            case_insensitive: cfg.case_insensitive,
        })
    }

    fn equals(&self, a: &str, b: &str) -> bool {
        if self.case_insensitive {
            a.eq_ignore_ascii_case(b)
        } else {
            a == b
        }
    }
}

impl QualifierMatcher for StringPrefixMatcher {
    fn matches(&self, condition_value: &str, context_value: &str, _operator: Operator) -> f32 {
        let condition: Vec<&str> = condition_value.split(self.delimiter.as_str()).collect();
        let context: Vec<&str> = context_value.split(self.delimiter.as_str()).collect();
        if condition.is_empty() || condition.len() > context.len() {
            return 0.0;
        }
        let prefix_matches = condition
            .iter()
            .zip(context.iter())
            .all(|(c, v)| self.equals(c, v));
        if prefix_matches {
            condition.len() as f32 / context.len() as f32
        } else {
            0.0
        }
    }
}
