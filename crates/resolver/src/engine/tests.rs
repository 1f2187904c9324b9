use std::sync::Arc;

use collection::{load_collection, ConditionIndex, ConditionSetIndex, ResourceCollection};
use qualifier::QualifierTypeRegistry;
use serde_json::json;

use super::*;
use crate::error::ContextError;
use crate::listener::CacheMetrics;

/// Two qualifiers (exact-match language, graded-prefix locale), a spread of
/// conditions including defaults and unconditionals, and resources covering
/// selection, ordering, and composition.
fn test_collection() -> Arc<ResourceCollection> {
    let wire = serde_json::from_value(json!({
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
            { "qualifierIndex": 1, "value": "en", "priority": 50 },
            { "qualifierIndex": 1, "value": "en-US", "priority": 50 },
            { "always": true },
            { "always": false }
        ],
        "conditionSets": [
            { "conditions": [0] },
            { "conditions": [1] },
            { "conditions": [0, 2] },
            { "conditions": [0, 3] },
            { "conditions": [4] },
            { "conditions": [5] }
        ],
        "decisions": [
            { "conditionSets": [0, 1] },
            { "conditionSets": [3, 2, 0] },
            { "conditionSets": [4] },
            { "conditionSets": [5] }
        ],
        "resources": [
            {
                "id": "app.greeting", "type": 0, "decision": 0,
                "candidates": [
                    { "json": { "text": "Hello" } },
                    { "json": { "text": "Bonjour" } }
                ]
            },
            {
                "id": "app.specific", "type": 0, "decision": 1,
                "candidates": [
                    { "json": { "v": "en-US" } },
                    { "json": { "v": "en-any" } },
                    { "json": { "v": "base" } }
                ]
            },
            {
                "id": "app.theme", "type": 0, "decision": 1,
                "candidates": [
                    { "json": { "b": { "y": 3 } }, "isPartial": true, "mergeMethod": "augment" },
                    { "json": { "a": 1, "b": { "x": 2 } } },
                    { "json": { "z": 9 } }
                ]
            },
            {
                "id": "app.cleanup", "type": 0, "decision": 1,
                "candidates": [
                    { "json": { "b": null }, "isPartial": true, "mergeMethod": "augment" },
                    { "json": { "a": 1, "b": 2, "c": 3 } },
                    { "json": { "unused": true } }
                ]
            },
            {
                "id": "app.layers", "type": 0, "decision": 1,
                "candidates": [
                    { "json": { "top": 1, "shared": "top" }, "isPartial": true },
                    { "json": { "mid": 2, "shared": "mid" }, "isPartial": true },
                    { "json": { "base": 3 }, "isPartial": true }
                ]
            },
            {
                "id": "app.scalar", "type": 0, "decision": 2,
                "candidates": [{ "json": "plain-string" }]
            },
            {
                "id": "app.never", "type": 0, "decision": 3,
                "candidates": [{ "json": { "text": "unreachable" } }]
            },
            {
                "id": "app.bad_partial", "type": 0, "decision": 1,
                "candidates": [
                    { "json": 5, "isPartial": true },
                    { "json": { "a": 1 } },
                    { "json": {} }
                ]
            },
            {
                "id": "app.bad_base", "type": 0, "decision": 1,
                "candidates": [
                    { "json": { "a": 1 }, "isPartial": true },
                    { "json": { "b": 2 }, "isPartial": true },
                    { "json": 5, "isPartial": true }
                ]
            }
        ]
    }))
    .expect("fixture should parse");
    Arc::new(
        load_collection(wire, &QualifierTypeRegistry::with_builtins())
            .expect("fixture should load"),
    )
}

fn resolver_for(pairs: &[(&str, &str)]) -> ResourceResolver {
    let context = RuntimeContext::with_values(test_collection(), pairs.iter().copied())
        .expect("context values should validate");
    ResourceResolver::new(context, ResolverOptions::default())
}

fn composed(resolver: &mut ResourceResolver, id: &str) -> JsonValue {
    resolver
        .resolve_composed_by_id(id)
        .unwrap_or_else(|err| panic!("{id} should compose: {err}"))
}

#[test]
fn condition_scores_match_against_the_context() {
    let mut resolver = resolver_for(&[("language", "en")]);

    let en = resolver
        .resolve_condition(ConditionIndex::new(0))
        .expect("condition resolves");
    assert_eq!(en.kind, MatchKind::Match);
    assert_eq!(en.priority, 100);
    assert_eq!(en.score, 1.0);

    // "fr" mismatches but carries a default score.
    let fr = resolver
        .resolve_condition(ConditionIndex::new(1))
        .expect("condition resolves");
    assert_eq!(fr.kind, MatchKind::MatchAsDefault);
    assert_eq!(fr.score, 0.5);
}

#[test]
fn unconditional_conditions_are_constant() {
    let mut resolver = resolver_for(&[]);

    let always = resolver
        .resolve_condition(ConditionIndex::new(4))
        .expect("condition resolves");
    assert_eq!(always.kind, MatchKind::Match);
    assert_eq!(always.priority, 0);

    let never = resolver
        .resolve_condition(ConditionIndex::new(5))
        .expect("condition resolves");
    assert_eq!(never.kind, MatchKind::NoMatch);
}

#[test]
fn unset_qualifier_reports_a_context_error_and_scores_zero() {
    let metrics = Arc::new(CacheMetrics::new());
    let context = RuntimeContext::new(test_collection());
    let mut resolver = ResourceResolver::new(
        context,
        ResolverOptions::new().with_cache_listener(metrics.clone()),
    );

    let result = resolver
        .resolve_condition(ConditionIndex::new(0))
        .expect("context failure must not fail resolution");
    assert_eq!(result.kind, MatchKind::NoMatch);
    assert_eq!(metrics.context_errors(), 1);

    // A default-scored condition still falls back when the qualifier is
    // unset.
    let with_default = resolver
        .resolve_condition(ConditionIndex::new(1))
        .expect("context failure must not fail resolution");
    assert_eq!(with_default.kind, MatchKind::MatchAsDefault);
    assert_eq!(metrics.context_errors(), 2);
}

#[test]
fn condition_set_stops_at_the_first_non_match() {
    let mut resolver = resolver_for(&[("language", "fr"), ("locale", "en-US")]);

    // Set 2 is [language == "en", locale prefix "en"]; the first condition
    // fails, so the second is never evaluated but the partial trace stays.
    let result = resolver
        .resolve_condition_set(ConditionSetIndex::new(2))
        .expect("set resolves");
    assert_eq!(result.kind, MatchKind::NoMatch);
    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.matches[0].kind, MatchKind::NoMatch);
}

#[test]
fn condition_set_downgrades_to_default_when_any_member_is_default() {
    let mut resolver = resolver_for(&[("language", "de")]);

    let result = resolver
        .resolve_condition_set(ConditionSetIndex::new(1))
        .expect("set resolves");
    assert_eq!(result.kind, MatchKind::MatchAsDefault);
    assert_eq!(result.matches.len(), 1);
}

#[test]
fn decision_orders_slots_by_priority_score_then_length() {
    let collection = test_collection();
    let mut resolver = resolver_for(&[("language", "en"), ("locale", "en-US")]);
    let resource = collection
        .resource_by_id("app.specific")
        .expect("resource exists");

    let decision = resolver
        .resolve_decision(resource.decision)
        .expect("decision resolves");
    // Slot 0 carries the exact locale (score 1.0), slot 1 the graded
    // prefix (score 0.5), slot 2 only the language condition.
    assert_eq!(decision.matching, vec![0, 1, 2]);
    assert!(decision.default_matching.is_empty());

    let all: Vec<_> = resolver
        .resolve_all_candidates(resource)
        .expect("candidates resolve")
        .iter()
        .map(|c| c.json["v"].as_str().map(str::to_string))
        .collect();
    assert_eq!(
        all,
        vec![
            Some("en-US".to_string()),
            Some("en-any".to_string()),
            Some("base".to_string())
        ]
    );
}

#[test]
fn shorter_locale_reorders_the_same_decision() {
    let collection = test_collection();
    let mut resolver = resolver_for(&[("language", "en"), ("locale", "en")]);
    let resource = collection
        .resource_by_id("app.specific")
        .expect("resource exists");

    let best = resolver.resolve_resource(resource).expect("resolves");
    assert_eq!(best.json, json!({ "v": "en-any" }));
}

#[test]
fn full_matches_beat_defaults_regardless_of_priority() {
    let collection = test_collection();
    let mut resolver = resolver_for(&[("language", "fr")]);
    let resource = collection
        .resource_by_id("app.greeting")
        .expect("resource exists");

    let best = resolver.resolve_resource(resource).expect("resolves");
    assert_eq!(best.json, json!({ "text": "Bonjour" }));

    // Under "en" the en slot is a full match and the fr default loses.
    let mut resolver = resolver_for(&[("language", "en")]);
    let best = resolver.resolve_resource(resource).expect("resolves");
    assert_eq!(best.json, json!({ "text": "Hello" }));
}

#[test]
fn default_slot_resolves_when_nothing_matches_fully() {
    let collection = test_collection();
    let mut resolver = resolver_for(&[("language", "de")]);
    let resource = collection
        .resource_by_id("app.greeting")
        .expect("resource exists");

    let decision = resolver
        .resolve_decision(resource.decision)
        .expect("decision resolves");
    assert!(decision.matching.is_empty());
    assert_eq!(decision.default_matching, vec![1]);

    let best = resolver.resolve_resource(resource).expect("resolves");
    assert_eq!(best.json, json!({ "text": "Bonjour" }));
}

#[test]
fn no_matching_candidate_is_a_typed_error() {
    let collection = test_collection();
    let mut resolver = resolver_for(&[("language", "en")]);
    let resource = collection
        .resource_by_id("app.never")
        .expect("resource exists");

    let err = resolver
        .resolve_resource(resource)
        .expect_err("never-matching decision should fail");
    assert!(matches!(err, ResolveError::NoMatch { id } if id == "app.never"));
}

#[test]
fn composed_value_merges_partials_over_the_base() {
    let mut resolver = resolver_for(&[("language", "en"), ("locale", "en-US")]);
    let value = composed(&mut resolver, "app.theme");
    assert_eq!(value, json!({ "a": 1, "b": { "x": 2, "y": 3 } }));
}

#[test]
fn composed_value_of_a_single_full_candidate_is_that_candidate() {
    let mut resolver = resolver_for(&[("language", "en")]);
    let value = composed(&mut resolver, "app.greeting");
    assert_eq!(value, json!({ "text": "Hello" }));
}

#[test]
fn null_deletes_unless_suppressed() {
    let mut resolver = resolver_for(&[("language", "en"), ("locale", "en-US")]);
    let value = composed(&mut resolver, "app.cleanup");
    assert_eq!(value, json!({ "a": 1, "c": 3 }));

    let context = RuntimeContext::with_values(
        test_collection(),
        [("language", "en"), ("locale", "en-US")],
    )
    .expect("context values should validate");
    let mut resolver = ResourceResolver::new(
        context,
        ResolverOptions::new().with_suppress_null_as_delete(true),
    );
    let value = composed(&mut resolver, "app.cleanup");
    assert_eq!(value, json!({ "a": 1, "b": null, "c": 3 }));
}

#[test]
fn all_partial_candidates_fall_back_to_the_worst_as_base() {
    let mut resolver = resolver_for(&[("language", "en"), ("locale", "en-US")]);
    let value = composed(&mut resolver, "app.layers");
    assert_eq!(
        value,
        json!({ "base": 3, "mid": 2, "top": 1, "shared": "top" })
    );
}

#[test]
fn non_object_base_passes_through_when_nothing_merges() {
    let mut resolver = resolver_for(&[("language", "en")]);
    let value = composed(&mut resolver, "app.scalar");
    assert_eq!(value, json!("plain-string"));
}

#[test]
fn non_object_partial_is_a_composition_error() {
    let mut resolver = resolver_for(&[("language", "en"), ("locale", "en-US")]);
    let err = resolver
        .resolve_composed_by_id("app.bad_partial")
        .expect_err("non-object partial should fail");
    assert!(matches!(
        err,
        ResolveError::Composition {
            source: CompositionError::NonObjectPartial,
            ..
        }
    ));
}

#[test]
fn non_object_base_under_partials_is_a_composition_error() {
    let mut resolver = resolver_for(&[("language", "en"), ("locale", "en-US")]);
    let err = resolver
        .resolve_composed_by_id("app.bad_base")
        .expect_err("merging onto a scalar base should fail");
    assert!(matches!(
        err,
        ResolveError::Composition {
            source: CompositionError::NonObjectBase,
            ..
        }
    ));
}

#[test]
fn unknown_resource_id_is_a_typed_error() {
    let mut resolver = resolver_for(&[("language", "en")]);
    let err = resolver
        .resolve_composed_by_id("app.missing")
        .expect_err("unknown id should fail");
    assert!(matches!(err, ResolveError::UnknownResource(id) if id == "app.missing"));
}

#[test]
fn out_of_range_condition_index_is_an_invariant_violation() {
    let metrics = Arc::new(CacheMetrics::new());
    let context = RuntimeContext::new(test_collection());
    let mut resolver = ResourceResolver::new(
        context,
        ResolverOptions::new().with_cache_listener(metrics.clone()),
    );

    let err = resolver
        .resolve_condition(ConditionIndex::new(999))
        .expect_err("index outside the arena should fail");
    assert!(matches!(err, ResolveError::Invariant(_)));
    assert_eq!(metrics.stats(CacheKind::Condition).errors, 1);
}

#[test]
fn repeated_resolution_hits_the_decision_cache() {
    let metrics = Arc::new(CacheMetrics::new());
    let context = RuntimeContext::with_values(test_collection(), [("language", "en")])
        .expect("context values should validate");
    let mut resolver = ResourceResolver::new(
        context,
        ResolverOptions::new().with_cache_listener(metrics.clone()),
    );
    let collection = resolver.collection().clone();
    let resource = collection
        .resource_by_id("app.greeting")
        .expect("resource exists");

    let first = resolver.resolve_resource(resource).expect("resolves").json.clone();
    let condition_misses = metrics.stats(CacheKind::Condition).misses;
    let set_misses = metrics.stats(CacheKind::ConditionSet).misses;
    let decision_misses = metrics.stats(CacheKind::Decision).misses;
    assert_eq!(condition_misses, 2);
    assert_eq!(set_misses, 2);
    assert_eq!(decision_misses, 1);

    let second = resolver.resolve_resource(resource).expect("resolves").json.clone();
    assert_eq!(first, second);
    // The decision cache answers the repeat; nothing below it is touched.
    assert_eq!(metrics.stats(CacheKind::Decision).hits, 1);
    assert_eq!(metrics.stats(CacheKind::Condition).misses, condition_misses);
    assert_eq!(metrics.stats(CacheKind::ConditionSet).misses, set_misses);
    assert_eq!(metrics.stats(CacheKind::Decision).misses, decision_misses);
}

#[test]
fn clear_cache_restores_the_cold_state() {
    let metrics = Arc::new(CacheMetrics::new());
    let context = RuntimeContext::with_values(test_collection(), [("language", "en")])
        .expect("context values should validate");
    let mut resolver = ResourceResolver::new(
        context,
        ResolverOptions::new().with_cache_listener(metrics.clone()),
    );

    resolver
        .resolve_composed_by_id("app.greeting")
        .expect("first resolution succeeds");
    let cold_misses = metrics.stats(CacheKind::Condition).misses;

    resolver.clear_cache();
    assert_eq!(metrics.stats(CacheKind::Condition).clears, 1);
    assert_eq!(metrics.stats(CacheKind::ConditionSet).clears, 1);
    assert_eq!(metrics.stats(CacheKind::Decision).clears, 1);

    resolver
        .resolve_composed_by_id("app.greeting")
        .expect("resolution after clear succeeds");
    assert_eq!(metrics.stats(CacheKind::Condition).misses, cold_misses * 2);
    assert_eq!(metrics.stats(CacheKind::Condition).hits, 0);
}

#[test]
fn with_context_starts_cold_and_resolves_differently() {
    let collection = test_collection();
    let context = RuntimeContext::with_values(collection.clone(), [("language", "en")])
        .expect("context values should validate");
    let mut resolver = ResourceResolver::new(context, ResolverOptions::default());
    assert_eq!(
        composed(&mut resolver, "app.greeting"),
        json!({ "text": "Hello" })
    );

    let french = RuntimeContext::with_values(collection, [("language", "fr")])
        .expect("context values should validate");
    let mut resolver = resolver.with_context(french);
    assert_eq!(
        composed(&mut resolver, "app.greeting"),
        json!({ "text": "Bonjour" })
    );
}

#[test]
fn context_errors_do_not_fail_resource_resolution() {
    let collection = test_collection();
    let mut resolver = resolver_for(&[("language", "en")]);
    let resource = collection
        .resource_by_id("app.specific")
        .expect("resource exists");

    // locale is unset: the locale-qualified slots drop out and the
    // language-only slot wins.
    let best = resolver.resolve_resource(resource).expect("resolves");
    assert_eq!(best.json, json!({ "v": "base" }));
}

#[test]
fn context_validation_still_guards_assignments() {
    let mut context = RuntimeContext::new(test_collection());
    let err = context
        .set("language", "")
        .expect_err("empty value should be rejected");
    assert!(matches!(err, ContextError::InvalidValue { .. }));
}
