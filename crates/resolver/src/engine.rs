//! The resource resolver: three-level cache and the resolution algorithms.
//!
//! A resolver binds one collection to one context. Conditions, condition
//! sets, and decisions each get a cache array sized to the arena at
//! construction; entity indices are the cache keys, so every lookup is one
//! bounds check and a slot read. Results never change while the context is
//! unchanged, which makes every operation idempotent and the caches safe to
//! keep for the resolver's lifetime.

use std::fmt;
use std::sync::Arc;

use collection::{
    Condition, ConditionIndex, ConditionSetIndex, DecisionIndex, Resource, ResourceCandidate,
    ResourceCollection,
};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, trace};

use crate::context::RuntimeContext;
use crate::error::{CompositionError, ResolveError};
use crate::listener::{CacheKind, CacheListener, NoopCacheListener};
use crate::merge::merge_object;
use crate::types::{ConditionMatch, ConditionSetMatch, DecisionMatch, MatchKind};

#[cfg(test)]
mod tests;

/// Options governing one resolver instance.
#[derive(Clone, Default)]
pub struct ResolverOptions {
    /// Write JSON `null` through literally during composition instead of
    /// treating it as a key deletion.
    pub suppress_null_as_delete: bool,
    /// Observer for cache activity. Defaults to a no-op.
    pub cache_listener: Option<Arc<dyn CacheListener>>,
}

impl ResolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_suppress_null_as_delete(mut self, suppress: bool) -> Self {
        self.suppress_null_as_delete = suppress;
        self
    }

    pub fn with_cache_listener(mut self, listener: Arc<dyn CacheListener>) -> Self {
        self.cache_listener = Some(listener);
        self
    }
}

impl fmt::Debug for ResolverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverOptions")
            .field("suppress_null_as_delete", &self.suppress_null_as_delete)
            .field("cache_listener", &self.cache_listener.is_some())
            .finish()
    }
}

/// Resolves resources of one collection against one runtime context.
///
/// The resolver owns its caches exclusively; reads populate them, and
/// [`clear_cache`] is the only other mutation. Two threads sharing one
/// resolver must synchronize externally; the cheap alternative is one
/// resolver per thread over the shared collection.
///
/// [`clear_cache`]: ResourceResolver::clear_cache
pub struct ResourceResolver {
    collection: Arc<ResourceCollection>,
    context: RuntimeContext,
    options: ResolverOptions,
    listener: Arc<dyn CacheListener>,
    condition_cache: Vec<Option<ConditionMatch>>,
    condition_set_cache: Vec<Option<ConditionSetMatch>>,
    decision_cache: Vec<Option<DecisionMatch>>,
}

impl ResourceResolver {
    /// Build a resolver over the context's collection. Cache arrays are
    /// sized here, once, and never reallocated.
    pub fn new(context: RuntimeContext, options: ResolverOptions) -> Self {
        let collection = context.collection().clone();
        let listener = options
            .cache_listener
            .clone()
            .unwrap_or_else(|| Arc::new(NoopCacheListener));
        Self {
            condition_cache: vec![None; collection.condition_count()],
            condition_set_cache: vec![None; collection.condition_set_count()],
            decision_cache: vec![None; collection.decision_count()],
            collection,
            context,
            options,
            listener,
        }
    }

    pub fn collection(&self) -> &Arc<ResourceCollection> {
        &self.collection
    }

    pub fn context(&self) -> &RuntimeContext {
        &self.context
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// A fresh resolver with the same options, a new context, and cold
    /// caches.
    pub fn with_context(&self, context: RuntimeContext) -> Self {
        Self::new(context, self.options.clone())
    }

    /// Drop every cached result, returning the resolver to its cold state.
    /// This is the only mutation a resolver supports after construction.
    pub fn clear_cache(&mut self) {
        self.condition_cache.fill(None);
        self.condition_set_cache.fill(None);
        self.decision_cache.fill(None);
        self.listener.on_clear(CacheKind::Condition);
        self.listener.on_clear(CacheKind::ConditionSet);
        self.listener.on_clear(CacheKind::Decision);
        debug!("resolver caches cleared");
    }

    /// Resolve one condition against the current context.
    ///
    /// A failed or empty context lookup is reported to the listener and
    /// scores zero; it never fails the resolution. A zero score with a
    /// positive `score_as_default` downgrades to a match-as-default.
    pub fn resolve_condition(
        &mut self,
        index: ConditionIndex,
    ) -> Result<ConditionMatch, ResolveError> {
        let slot = index.as_usize();
        if slot >= self.condition_cache.len() {
            self.listener.on_error(CacheKind::Condition, slot);
            return Err(ResolveError::Invariant(format!(
                "condition index {index} outside cache of {}",
                self.condition_cache.len()
            )));
        }
        if let Some(cached) = self.condition_cache[slot] {
            self.listener.on_hit(CacheKind::Condition, slot);
            return Ok(cached);
        }

        let collection = self.collection.clone();
        let condition = match collection.condition_at(index) {
            Ok(condition) => condition,
            Err(err) => {
                self.listener.on_error(CacheKind::Condition, slot);
                return Err(ResolveError::Invariant(err.to_string()));
            }
        };
        let result = match condition {
            Condition::Unconditional(c) => ConditionMatch {
                priority: 0,
                kind: if c.always {
                    MatchKind::Match
                } else {
                    MatchKind::NoMatch
                },
                score: if c.always { 1.0 } else { 0.0 },
            },
            Condition::Binary(c) => {
                let qualifier = match collection.qualifier_at(c.qualifier) {
                    Ok(qualifier) => qualifier,
                    Err(err) => {
                        self.listener.on_error(CacheKind::Condition, slot);
                        return Err(ResolveError::Invariant(err.to_string()));
                    }
                };
                let qualifier_type = collection.qualifier_type_of(qualifier);
                let raw_score = match self.context.value_for(qualifier) {
                    Ok(value) => qualifier_type.matches(&c.value, value, c.operator),
                    Err(err) => {
                        debug!(qualifier = %qualifier.name, error = %err, "context lookup failed");
                        self.listener
                            .on_context_error(&qualifier.name, &err.to_string());
                        0.0
                    }
                };
                let (kind, score) = if raw_score > 0.0 {
                    (MatchKind::Match, raw_score)
                } else {
                    match c.score_as_default {
                        Some(default) if default > 0.0 => (MatchKind::MatchAsDefault, default),
                        _ => (MatchKind::NoMatch, 0.0),
                    }
                };
                ConditionMatch {
                    priority: c.priority,
                    kind,
                    score,
                }
            }
        };

        self.condition_cache[slot] = Some(result);
        self.listener.on_miss(CacheKind::Condition, slot);
        trace!(condition = %index, kind = %result.kind, score = result.score, "condition resolved");
        Ok(result)
    }

    /// Resolve a condition set: walk its conditions in declared order,
    /// stopping at the first non-match. Results computed before the stop
    /// are retained for diagnostics and cached with the set.
    pub fn resolve_condition_set(
        &mut self,
        index: ConditionSetIndex,
    ) -> Result<ConditionSetMatch, ResolveError> {
        let slot = index.as_usize();
        if slot >= self.condition_set_cache.len() {
            self.listener.on_error(CacheKind::ConditionSet, slot);
            return Err(ResolveError::Invariant(format!(
                "condition set index {index} outside cache of {}",
                self.condition_set_cache.len()
            )));
        }
        if let Some(cached) = &self.condition_set_cache[slot] {
            let cached = cached.clone();
            self.listener.on_hit(CacheKind::ConditionSet, slot);
            return Ok(cached);
        }

        let collection = self.collection.clone();
        let set = match collection.condition_set_at(index) {
            Ok(set) => set,
            Err(err) => {
                self.listener.on_error(CacheKind::ConditionSet, slot);
                return Err(ResolveError::Invariant(err.to_string()));
            }
        };
        let mut matches = Vec::with_capacity(set.conditions.len());
        let mut kind = MatchKind::Match;
        for &condition in &set.conditions {
            let resolved = self.resolve_condition(condition)?;
            matches.push(resolved);
            match resolved.kind {
                MatchKind::NoMatch => {
                    kind = MatchKind::NoMatch;
                    break;
                }
                MatchKind::MatchAsDefault => kind = MatchKind::MatchAsDefault,
                MatchKind::Match => {}
            }
        }

        let result = ConditionSetMatch { kind, matches };
        self.condition_set_cache[slot] = Some(result.clone());
        self.listener.on_miss(CacheKind::ConditionSet, slot);
        Ok(result)
    }

    /// Resolve a decision: every slot's condition set is resolved, slots
    /// are split into full and default matches, and both buckets are
    /// ordered best-first.
    pub fn resolve_decision(&mut self, index: DecisionIndex) -> Result<DecisionMatch, ResolveError> {
        let slot = index.as_usize();
        if slot >= self.decision_cache.len() {
            self.listener.on_error(CacheKind::Decision, slot);
            return Err(ResolveError::Invariant(format!(
                "decision index {index} outside cache of {}",
                self.decision_cache.len()
            )));
        }
        if let Some(cached) = &self.decision_cache[slot] {
            let cached = cached.clone();
            self.listener.on_hit(CacheKind::Decision, slot);
            return Ok(cached);
        }

        let collection = self.collection.clone();
        let decision = match collection.decision_at(index) {
            Ok(decision) => decision,
            Err(err) => {
                self.listener.on_error(CacheKind::Decision, slot);
                return Err(ResolveError::Invariant(err.to_string()));
            }
        };
        let mut matching: Vec<(usize, ConditionSetMatch)> = Vec::new();
        let mut default_matching: Vec<(usize, ConditionSetMatch)> = Vec::new();
        for (candidate_slot, &condition_set) in decision.condition_sets.iter().enumerate() {
            let resolved = self.resolve_condition_set(condition_set)?;
            match resolved.kind {
                MatchKind::Match => matching.push((candidate_slot, resolved)),
                MatchKind::MatchAsDefault => default_matching.push((candidate_slot, resolved)),
                MatchKind::NoMatch => {}
            }
        }
        // Best first. The sort is stable, so fully tied slots keep their
        // declaration order.
        matching.sort_by(|a, b| b.1.compare(&a.1));
        default_matching.sort_by(|a, b| b.1.compare(&a.1));

        let result = DecisionMatch {
            matching: matching.into_iter().map(|(slot, _)| slot).collect(),
            default_matching: default_matching.into_iter().map(|(slot, _)| slot).collect(),
        };
        self.decision_cache[slot] = Some(result.clone());
        self.listener.on_miss(CacheKind::Decision, slot);
        Ok(result)
    }

    /// Resolve the single best candidate for `resource`: the best full
    /// match, falling back to the best default match.
    pub fn resolve_resource<'r>(
        &mut self,
        resource: &'r Resource,
    ) -> Result<&'r ResourceCandidate, ResolveError> {
        let decision = self.resolve_decision(resource.decision)?;
        let best = decision.best().ok_or_else(|| ResolveError::NoMatch {
            id: resource.id.clone(),
        })?;
        resource.candidates.get(best).ok_or_else(|| {
            ResolveError::Invariant(format!(
                "slot {best} outside the candidate list of '{}'",
                resource.id
            ))
        })
    }

    /// All matching candidates, full matches before defaults, best first.
    /// Empty when nothing matched.
    pub fn resolve_all_candidates<'r>(
        &mut self,
        resource: &'r Resource,
    ) -> Result<Vec<&'r ResourceCandidate>, ResolveError> {
        let decision = self.resolve_decision(resource.decision)?;
        decision
            .ordered_slots()
            .map(|slot| {
                resource.candidates.get(slot).ok_or_else(|| {
                    ResolveError::Invariant(format!(
                        "slot {slot} outside the candidate list of '{}'",
                        resource.id
                    ))
                })
            })
            .collect()
    }

    /// Merge every matching candidate into one composed value.
    ///
    /// The base is the best non-partial candidate (or the worst candidate
    /// overall when everything is partial); the partials ranked above it
    /// are then applied worst-to-best, so the best partial has the last
    /// word. Non-object partials are an error; a non-object base passes
    /// through untouched when nothing needs merging onto it.
    pub fn resolve_composed(&mut self, resource: &Resource) -> Result<JsonValue, ResolveError> {
        let candidates = self.resolve_all_candidates(resource)?;
        let (base, partials) = match candidates.iter().position(|c| !c.is_partial) {
            Some(first_full) => (candidates[first_full], &candidates[..first_full]),
            None => match candidates.split_last() {
                Some((last, earlier)) => (*last, earlier),
                None => {
                    return Err(ResolveError::NoMatch {
                        id: resource.id.clone(),
                    })
                }
            },
        };

        let null_as_delete = !self.options.suppress_null_as_delete;
        let base_object = match &base.json {
            JsonValue::Object(map) => map,
            other => {
                return if partials.is_empty() {
                    Ok(other.clone())
                } else {
                    Err(ResolveError::Composition {
                        id: resource.id.clone(),
                        source: CompositionError::NonObjectBase,
                    })
                };
            }
        };

        let mut composed = Map::new();
        merge_object(&mut composed, base_object, null_as_delete);
        for partial in partials.iter().rev() {
            match &partial.json {
                JsonValue::Object(map) => merge_object(&mut composed, map, null_as_delete),
                _ => {
                    return Err(ResolveError::Composition {
                        id: resource.id.clone(),
                        source: CompositionError::NonObjectPartial,
                    })
                }
            }
        }
        Ok(JsonValue::Object(composed))
    }

    /// Convenience: the best candidate for the resource at `id`, cloned.
    pub fn resolve_by_id(&mut self, id: &str) -> Result<ResourceCandidate, ResolveError> {
        let collection = self.collection.clone();
        let resource = collection
            .resource_by_id(id)
            .ok_or_else(|| ResolveError::UnknownResource(id.to_string()))?;
        self.resolve_resource(resource).cloned()
    }

    /// Convenience: the composed value for the resource at `id`.
    pub fn resolve_composed_by_id(&mut self, id: &str) -> Result<JsonValue, ResolveError> {
        let collection = self.collection.clone();
        let resource = collection
            .resource_by_id(id)
            .ok_or_else(|| ResolveError::UnknownResource(id.to_string()))?;
        self.resolve_composed(resource)
    }
}

impl fmt::Debug for ResourceResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceResolver")
            .field("collection", &self.collection)
            .field("options", &self.options)
            .field("cached_conditions", &count_filled(&self.condition_cache))
            .field(
                "cached_condition_sets",
                &count_filled(&self.condition_set_cache),
            )
            .field("cached_decisions", &count_filled(&self.decision_cache))
            .finish()
    }
}

fn count_filled<T>(cache: &[Option<T>]) -> usize {
    cache.iter().filter(|slot| slot.is_some()).count()
}
