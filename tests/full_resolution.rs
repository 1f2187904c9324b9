use std::sync::Arc;

use qres::{
    load_collection_from_value, QualifierTypeRegistry, ResolveError, ResolverOptions,
    ResourceCollection, ResourceResolver, RuntimeContext,
};
use serde_json::json;

/// One language qualifier plus a graded locale qualifier, with resources
/// covering single-condition selection, default fallback, and layered
/// composition.
fn collection() -> Arc<ResourceCollection> {
    load_collection_from_value(
        json!({
            "qualifierTypes": [
                { "name": "string-equals" },
                { "name": "string-prefix" }
            ],
            "qualifiers": [
                { "name": "language", "type": 0, "defaultPriority": 100 },
                { "name": "locale", "type": 1, "defaultPriority": 50 }
            ],
            "resourceTypes": [{ "name": "json" }],
            "conditions": [
                { "qualifierIndex": 0, "value": "en", "priority": 100 },
                { "qualifierIndex": 0, "value": "fr", "priority": 100, "scoreAsDefault": 0.5 },
                { "qualifierIndex": 1, "value": "en-US", "priority": 50 },
                { "qualifierIndex": 0, "value": "en", "priority": 100, "scoreAsDefault": 0.8 }
            ],
            "conditionSets": [
                { "conditions": [0] },
                { "conditions": [1] },
                { "conditions": [0, 2] },
                { "conditions": [3] }
            ],
            "decisions": [
                { "conditionSets": [0] },
                { "conditionSets": [0, 1] },
                { "conditionSets": [2, 0] },
                { "conditionSets": [3, 1] }
            ],
            "resources": [
                {
                    "id": "app.greeting", "type": 0, "decision": 0,
                    "candidates": [{ "json": { "text": "Hello" } }]
                },
                {
                    "id": "app.salutation", "type": 0, "decision": 1,
                    "candidates": [
                        { "json": { "text": "Hello" } },
                        { "json": { "text": "Bonjour" } }
                    ]
                },
                {
                    "id": "app.panel", "type": 0, "decision": 2,
                    "candidates": [
                        { "json": { "b": { "y": 3 } }, "isPartial": true, "mergeMethod": "augment" },
                        { "json": { "a": 1, "b": { "x": 2 } } }
                    ]
                },
                {
                    "id": "app.cleanup", "type": 0, "decision": 2,
                    "candidates": [
                        { "json": { "b": null }, "isPartial": true, "mergeMethod": "augment" },
                        { "json": { "a": 1, "b": 2, "c": 3 } }
                    ]
                },
                {
                    "id": "app.dueling_defaults", "type": 0, "decision": 3,
                    "candidates": [
                        { "json": { "text": "Hello" } },
                        { "json": { "text": "Bonjour" } }
                    ]
                }
            ]
        }),
        &QualifierTypeRegistry::with_builtins(),
    )
    .expect("collection should load")
}

fn resolver(pairs: &[(&str, &str)]) -> ResourceResolver {
    let context = RuntimeContext::with_values(collection(), pairs.iter().copied())
        .expect("context should validate");
    ResourceResolver::new(context, ResolverOptions::default())
}

#[test]
fn single_qualifier_match_selects_the_candidate() {
    let mut resolver = resolver(&[("language", "en")]);
    let value = resolver
        .resolve_composed_by_id("app.greeting")
        .expect("greeting should resolve");
    assert_eq!(value, json!({ "text": "Hello" }));
}

#[test]
fn mismatched_context_yields_no_match() {
    let mut resolver = resolver(&[("language", "fr")]);
    let err = resolver
        .resolve_composed_by_id("app.greeting")
        .expect_err("french context should not match the en-only resource");
    assert!(matches!(err, ResolveError::NoMatch { id } if id == "app.greeting"));
}

#[test]
fn matching_slot_beats_the_default_slot() {
    // "fr" matches its own condition outright; the en slot loses.
    let mut resolver = resolver(&[("language", "fr")]);
    let value = resolver
        .resolve_composed_by_id("app.salutation")
        .expect("salutation should resolve");
    assert_eq!(value, json!({ "text": "Bonjour" }));
}

#[test]
fn default_scored_slot_carries_an_unmatched_context() {
    // Neither condition matches "de", but the fr slot declares a default
    // score and fills in.
    let mut resolver = resolver(&[("language", "de")]);
    let value = resolver
        .resolve_composed_by_id("app.salutation")
        .expect("default slot should carry the resolution");
    assert_eq!(value, json!({ "text": "Bonjour" }));
}

#[test]
fn full_match_outranks_any_default_match() {
    // Under "fr", the en slot is a default (0.8) while fr matches at 1.0;
    // under "en" the roles flip. A full match wins either way.
    let mut resolver = resolver(&[("language", "fr")]);
    assert_eq!(
        resolver
            .resolve_composed_by_id("app.dueling_defaults")
            .expect("resolves"),
        json!({ "text": "Bonjour" })
    );

    let mut resolver = resolver_with_language("en");
    assert_eq!(
        resolver
            .resolve_composed_by_id("app.dueling_defaults")
            .expect("resolves"),
        json!({ "text": "Hello" })
    );
}

fn resolver_with_language(language: &str) -> ResourceResolver {
    resolver(&[("language", language)])
}

#[test]
fn partial_candidate_layers_over_the_base() {
    let mut resolver = resolver(&[("language", "en"), ("locale", "en-US")]);
    let value = resolver
        .resolve_composed_by_id("app.panel")
        .expect("panel should compose");
    assert_eq!(value, json!({ "a": 1, "b": { "x": 2, "y": 3 } }));
}

#[test]
fn partial_is_skipped_when_its_condition_does_not_match() {
    let mut resolver = resolver(&[("language", "en")]);
    let value = resolver
        .resolve_composed_by_id("app.panel")
        .expect("panel should compose from the base alone");
    assert_eq!(value, json!({ "a": 1, "b": { "x": 2 } }));
}

#[test]
fn null_in_a_partial_deletes_the_key() {
    let mut resolver = resolver(&[("language", "en"), ("locale", "en-US")]);
    let value = resolver
        .resolve_composed_by_id("app.cleanup")
        .expect("cleanup should compose");
    assert_eq!(value, json!({ "a": 1, "c": 3 }));
}

#[test]
fn suppressing_null_as_delete_writes_null_through() {
    let context = RuntimeContext::with_values(
        collection(),
        [("language", "en"), ("locale", "en-US")],
    )
    .expect("context should validate");
    let mut resolver = ResourceResolver::new(
        context,
        ResolverOptions::new().with_suppress_null_as_delete(true),
    );
    let value = resolver
        .resolve_composed_by_id("app.cleanup")
        .expect("cleanup should compose");
    assert_eq!(value, json!({ "a": 1, "b": null, "c": 3 }));
}

#[test]
fn resolve_by_id_returns_the_winning_candidate() {
    let mut resolver = resolver(&[("language", "en")]);
    let candidate = resolver
        .resolve_by_id("app.salutation")
        .expect("salutation should resolve");
    assert_eq!(candidate.json, json!({ "text": "Hello" }));
    assert!(!candidate.is_partial);
}
