//! Resolution result types and their tie-break ordering.

use std::cmp::Ordering;
use std::fmt;

/// Outcome of evaluating a condition or condition set.
///
/// Variants are declared worst-to-best so the derived `Ord` ranks
/// `Match > MatchAsDefault > NoMatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchKind {
    NoMatch,
    MatchAsDefault,
    Match,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchKind::NoMatch => "noMatch",
            MatchKind::MatchAsDefault => "matchAsDefault",
            MatchKind::Match => "match",
        };
        f.write_str(label)
    }
}

/// Cached result of resolving one condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionMatch {
    pub priority: u16,
    pub kind: MatchKind,
    /// Effective score: the matcher's score for a match, the configured
    /// default score for a match-as-default, `0.0` otherwise.
    pub score: f32,
}

/// Cached result of resolving a condition set: the overall outcome plus the
/// per-condition results in declared order (kept for diagnostics even when
/// evaluation stopped at a non-matching condition).
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionSetMatch {
    pub kind: MatchKind,
    pub matches: Vec<ConditionMatch>,
}

impl ConditionSetMatch {
    /// Tie-break comparison for ordering candidates within a decision.
    /// `Greater` means `self` ranks ahead of `other`.
    ///
    /// Outcome kind dominates; otherwise per-condition priority, then
    /// score, each descending, decide; a longer match list (more satisfied
    /// conditions) wins a remaining tie. This is a strict weak order, which
    /// is all a sort needs.
    pub fn compare(&self, other: &Self) -> Ordering {
        match self.kind.cmp(&other.kind) {
            Ordering::Equal => {}
            ord => return ord,
        }
        for (a, b) in self.matches.iter().zip(other.matches.iter()) {
            match a.priority.cmp(&b.priority) {
                Ordering::Equal => {}
                ord => return ord,
            }
            match a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        self.matches.len().cmp(&other.matches.len())
    }
}

/// Cached result of resolving a decision: candidate slot positions split
/// into full matches and default matches, each bucket best-first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionMatch {
    pub matching: Vec<usize>,
    pub default_matching: Vec<usize>,
}

impl DecisionMatch {
    /// The winning slot: best full match, else best default match.
    pub fn best(&self) -> Option<usize> {
        self.matching
            .first()
            .or_else(|| self.default_matching.first())
            .copied()
    }

    /// Every matching slot, full matches before defaults, best first.
    pub fn ordered_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.matching
            .iter()
            .chain(self.default_matching.iter())
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.matching.is_empty() && self.default_matching.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(kind: MatchKind, matches: &[(u16, f32)]) -> ConditionSetMatch {
        ConditionSetMatch {
            kind,
            matches: matches
                .iter()
                .map(|&(priority, score)| ConditionMatch {
                    priority,
                    kind,
                    score,
                })
                .collect(),
        }
    }

    #[test]
    fn kind_ordering_ranks_match_above_default_above_no_match() {
        assert!(MatchKind::Match > MatchKind::MatchAsDefault);
        assert!(MatchKind::MatchAsDefault > MatchKind::NoMatch);
    }

    #[test]
    fn kind_dominates_priorities_and_scores() {
        let strong_default = result(MatchKind::MatchAsDefault, &[(1000, 1.0)]);
        let weak_match = result(MatchKind::Match, &[(1, 0.1)]);
        assert_eq!(weak_match.compare(&strong_default), Ordering::Greater);
    }

    #[test]
    fn higher_priority_wins_before_score() {
        let high_priority = result(MatchKind::Match, &[(200, 0.2)]);
        let high_score = result(MatchKind::Match, &[(100, 1.0)]);
        assert_eq!(high_priority.compare(&high_score), Ordering::Greater);
    }

    #[test]
    fn score_breaks_priority_ties() {
        let better = result(MatchKind::Match, &[(100, 0.9)]);
        let worse = result(MatchKind::Match, &[(100, 0.4)]);
        assert_eq!(better.compare(&worse), Ordering::Greater);
        assert_eq!(worse.compare(&better), Ordering::Less);
    }

    #[test]
    fn longer_match_list_wins_a_full_tie() {
        let two_conditions = result(MatchKind::Match, &[(100, 1.0), (50, 1.0)]);
        let one_condition = result(MatchKind::Match, &[(100, 1.0)]);
        assert_eq!(two_conditions.compare(&one_condition), Ordering::Greater);
    }

    #[test]
    fn comparison_is_reflexive_and_antisymmetric() {
        let a = result(MatchKind::Match, &[(100, 1.0)]);
        let b = result(MatchKind::Match, &[(100, 0.5)]);
        assert_eq!(a.compare(&a), Ordering::Equal);
        assert_eq!(a.compare(&b), b.compare(&a).reverse());
    }

    #[test]
    fn best_prefers_full_matches_over_defaults() {
        let decision = DecisionMatch {
            matching: vec![2, 0],
            default_matching: vec![1],
        };
        assert_eq!(decision.best(), Some(2));
        assert_eq!(decision.ordered_slots().collect::<Vec<_>>(), vec![2, 0, 1]);

        let defaults_only = DecisionMatch {
            matching: vec![],
            default_matching: vec![1],
        };
        assert_eq!(defaults_only.best(), Some(1));
    }
}
