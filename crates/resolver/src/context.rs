//! The runtime context: qualifier values a resolver matches against.

use std::sync::Arc;

use collection::{Qualifier, ResourceCollection};
use hashbrown::HashMap;

use crate::error::ContextError;

/// A validated mapping from qualifier name to string value, bound to one
/// collection.
///
/// Values are checked against the qualifier's type on every [`set`]; a
/// rejected assignment is reported and leaves the stored context untouched.
/// A context is fixed for the lifetime of one resolver; to resolve under a
/// different context, build a new resolver via
/// [`crate::ResourceResolver::with_context`].
///
/// [`set`]: RuntimeContext::set
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    collection: Arc<ResourceCollection>,
    values: HashMap<String, String>,
}

impl RuntimeContext {
    /// An empty context over `collection`.
    pub fn new(collection: Arc<ResourceCollection>) -> Self {
        Self {
            collection,
            values: HashMap::new(),
        }
    }

    /// Build a context from `(qualifier, value)` pairs, validating each.
    pub fn with_values<I, K, V>(
        collection: Arc<ResourceCollection>,
        values: I,
    ) -> Result<Self, ContextError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut context = Self::new(collection);
        for (name, value) in values {
            context.set(name.as_ref(), value.as_ref())?;
        }
        Ok(context)
    }

    /// Assign `value` to the qualifier named `name`.
    ///
    /// Fails when the qualifier is unknown or its type rejects the value;
    /// the context is unchanged on failure.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), ContextError> {
        let qualifier = self
            .collection
            .qualifier_by_name(name)
            .ok_or_else(|| ContextError::UnknownQualifier(name.to_string()))?;
        let qualifier_type = self.collection.qualifier_type_of(qualifier);
        qualifier_type
            .validate_value(value)
            .map_err(|err| ContextError::InvalidValue {
                qualifier: name.to_string(),
                message: err.to_string(),
            })?;
        self.values.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// The raw value for `name`, if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// The hot-path lookup: the current value for `qualifier`.
    pub fn value_for(&self, qualifier: &Qualifier) -> Result<&str, ContextError> {
        self.values
            .get(&qualifier.name)
            .map(String::as_str)
            .ok_or_else(|| ContextError::NotSet(qualifier.name.clone()))
    }

    /// The collection this context is bound to.
    pub fn collection(&self) -> &Arc<ResourceCollection> {
        &self.collection
    }

    /// Number of qualifiers currently set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qualifier::QualifierTypeRegistry;
    use serde_json::json;

    fn collection() -> Arc<ResourceCollection> {
        let wire = serde_json::from_value(json!({
            "qualifierTypes": [
                { "name": "string-equals" },
                { "name": "string-list" }
            ],
            "qualifiers": [
                { "name": "language", "type": 0, "defaultPriority": 100 },
                { "name": "platform", "type": 1, "defaultPriority": 50 }
            ]
        }))
        .expect("fixture should parse");
        Arc::new(
            collection::load_collection(wire, &QualifierTypeRegistry::with_builtins())
                .expect("fixture should load"),
        )
    }

    #[test]
    fn set_and_get_round_trip() {
        let mut context = RuntimeContext::new(collection());
        context.set("language", "en").expect("valid assignment");
        assert_eq!(context.get("language"), Some("en"));
        assert_eq!(context.len(), 1);
    }

    #[test]
    fn unknown_qualifier_is_rejected() {
        let mut context = RuntimeContext::new(collection());
        let err = context
            .set("territory", "US")
            .expect_err("unknown qualifier should fail");
        assert!(matches!(err, ContextError::UnknownQualifier(name) if name == "territory"));
    }

    #[test]
    fn invalid_value_does_not_poison_the_context() {
        let mut context = RuntimeContext::new(collection());
        context.set("platform", "web").expect("valid assignment");

        // string-list rejects values containing its separator.
        let err = context
            .set("platform", "web,mobile")
            .expect_err("list-shaped value should fail");
        assert!(matches!(err, ContextError::InvalidValue { .. }));
        assert_eq!(context.get("platform"), Some("web"));

        context.set("platform", "mobile").expect("still usable");
        assert_eq!(context.get("platform"), Some("mobile"));
    }

    #[test]
    fn value_for_reports_unset_qualifiers() {
        let collection = collection();
        let context = RuntimeContext::new(collection.clone());
        let qualifier = collection
            .qualifier_by_name("language")
            .expect("qualifier exists");
        let err = context
            .value_for(qualifier)
            .expect_err("unset qualifier should fail");
        assert!(matches!(err, ContextError::NotSet(name) if name == "language"));
    }

    #[test]
    fn with_values_validates_every_pair() {
        let result = RuntimeContext::with_values(collection(), [("language", "")]);
        assert!(matches!(result, Err(ContextError::InvalidValue { .. })));

        let context = RuntimeContext::with_values(collection(), [("language", "en")])
            .expect("valid pairs should build");
        assert_eq!(context.get("language"), Some("en"));
    }
}
