//! Cache activity observers.
//!
//! A resolver emits one event per cache interaction: hit, miss, error, and
//! clear, per cache kind, plus context-lookup failures that the resolution
//! itself swallows. Listeners run inline on the hot path, so they must be
//! cheap, allocation-free, and must not call back into the resolver.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Which of the three resolver caches an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Condition,
    ConditionSet,
    Decision,
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CacheKind::Condition => "condition",
            CacheKind::ConditionSet => "condition-set",
            CacheKind::Decision => "decision",
        };
        f.write_str(label)
    }
}

/// Observer of resolver cache activity. All methods default to no-ops so
/// implementations only override what they care about.
pub trait CacheListener: Send + Sync {
    fn on_hit(&self, kind: CacheKind, index: usize) {
        let _ = (kind, index);
    }

    fn on_miss(&self, kind: CacheKind, index: usize) {
        let _ = (kind, index);
    }

    fn on_error(&self, kind: CacheKind, index: usize) {
        let _ = (kind, index);
    }

    fn on_clear(&self, kind: CacheKind) {
        let _ = kind;
    }

    /// A context lookup failed during condition resolution. The condition
    /// scored zero; resolution continued.
    fn on_context_error(&self, qualifier: &str, message: &str) {
        let _ = (qualifier, message);
    }
}

/// The default listener: ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCacheListener;

impl CacheListener for NoopCacheListener {}

/// Counter snapshot for one cache kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub clears: u64,
}

impl CacheStats {
    /// Lookups observed (hits plus misses).
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hits per lookup, `0.0` when nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.hits as f64 / self.total() as f64
        }
    }

    /// Errors per lookup, `0.0` when nothing was looked up.
    pub fn error_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.errors as f64 / self.total() as f64
        }
    }
}

#[derive(Debug, Default)]
struct KindCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    clears: AtomicU64,
}

impl KindCounters {
    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
        }
    }
}

/// Lock-free aggregate listener maintaining per-kind counters.
///
/// Share one instance behind an `Arc` with the resolver options and read
/// [`CacheMetrics::stats`] whenever a snapshot is needed.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    condition: KindCounters,
    condition_set: KindCounters,
    decision: KindCounters,
    context_errors: AtomicU64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self, kind: CacheKind) -> &KindCounters {
        match kind {
            CacheKind::Condition => &self.condition,
            CacheKind::ConditionSet => &self.condition_set,
            CacheKind::Decision => &self.decision,
        }
    }

    /// Counter snapshot for `kind`.
    pub fn stats(&self, kind: CacheKind) -> CacheStats {
        self.counters(kind).snapshot()
    }

    /// Context lookup failures observed so far.
    pub fn context_errors(&self) -> u64 {
        self.context_errors.load(Ordering::Relaxed)
    }
}

impl CacheListener for CacheMetrics {
    fn on_hit(&self, kind: CacheKind, _index: usize) {
        self.counters(kind).hits.fetch_add(1, Ordering::Relaxed);
    }

    fn on_miss(&self, kind: CacheKind, _index: usize) {
        self.counters(kind).misses.fetch_add(1, Ordering::Relaxed);
    }

    fn on_error(&self, kind: CacheKind, _index: usize) {
        self.counters(kind).errors.fetch_add(1, Ordering::Relaxed);
    }

    fn on_clear(&self, kind: CacheKind) {
        self.counters(kind).clears.fetch_add(1, Ordering::Relaxed);
    }

    fn on_context_error(&self, _qualifier: &str, _message: &str) {
        self.context_errors.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_count_per_kind() {
        let metrics = CacheMetrics::new();
        metrics.on_miss(CacheKind::Condition, 0);
        metrics.on_hit(CacheKind::Condition, 0);
        metrics.on_hit(CacheKind::Condition, 0);
        metrics.on_clear(CacheKind::Decision);
        metrics.on_context_error("language", "not set");

        let condition = metrics.stats(CacheKind::Condition);
        assert_eq!(condition.hits, 2);
        assert_eq!(condition.misses, 1);
        assert_eq!(condition.total(), 3);
        assert!((condition.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);

        assert_eq!(metrics.stats(CacheKind::Decision).clears, 1);
        assert_eq!(metrics.stats(CacheKind::ConditionSet), CacheStats::default());
        assert_eq!(metrics.context_errors(), 1);
    }

    #[test]
    fn empty_stats_report_zero_rates() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.error_rate(), 0.0);
    }
}
