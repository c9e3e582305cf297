// src/domain/resolution/value_objects.rs
//
// Resolution Value Objects
//
// Pure, immutable data structures representing resolution outcomes.
// These are the bridge between the strategy chain and the update step.
//
// CRITICAL INVARIANTS:
// - No side effects
// - No I/O operations
// - Deterministic construction (no timestamps, no random IDs)

use serde::{Deserialize, Serialize};

use crate::domain::entry::{SourceEntry, TargetEntry};

/// Strategy name recorded for mappings produced by force-sync mode
pub const FORCE_SYNC_STRATEGY: &str = "force_sync";

// ============================================================================
// RESOLVED MAPPING
// ============================================================================

/// One source entry paired with the target a strategy found for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMapping {
    pub source: SourceEntry,

    pub target: TargetEntry,

    /// Name of the strategy that produced the match
    pub strategy_name: String,

    /// Position of that strategy in the chain; lower wins
    pub strategy_index: usize,
}

impl ResolvedMapping {
    pub fn new(
        source: SourceEntry,
        target: TargetEntry,
        strategy_name: impl Into<String>,
        strategy_index: usize,
    ) -> Self {
        Self {
            source,
            target,
            strategy_name: strategy_name.into(),
            strategy_index,
        }
    }

    /// Destination key this mapping claims
    pub fn target_id(&self) -> u64 {
        self.target.id
    }

    /// Source title equals target title, ignoring case
    pub fn is_exact_title_match(&self) -> bool {
        self.source.titles.primary.to_lowercase() == self.target.titles.primary.to_lowercase()
    }
}

// ============================================================================
// CONFLICT
// ============================================================================

/// A mapping discarded by deduplication because another source claimed the
/// same target with equal or higher priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub loser: SourceEntry,

    pub winner: SourceEntry,

    pub target: TargetEntry,

    pub loser_strategy: String,

    pub winner_strategy: String,
}

impl Conflict {
    pub fn between(loser: &ResolvedMapping, winner: &ResolvedMapping) -> Self {
        Self {
            loser: loser.source.clone(),
            winner: winner.source.clone(),
            target: winner.target.clone(),
            loser_strategy: loser.strategy_name.clone(),
            winner_strategy: winner.strategy_name.clone(),
        }
    }
}

// ============================================================================
// UNRESOLVED
// ============================================================================

/// A source that left the pass without a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unresolved {
    pub source: SourceEntry,

    pub reason: UnresolvedReason,

    /// Error text for diagnostics
    pub detail: String,
}

impl Unresolved {
    pub fn new(source: SourceEntry, reason: UnresolvedReason, detail: impl Into<String>) -> Self {
        Self {
            source,
            reason,
            detail: detail.into(),
        }
    }
}

/// Why a source was not resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// Every strategy declined
    NoMatch,

    /// A strategy's lookup errored
    StrategyFailed,

    /// Force-sync was requested but the source has no foreign ID
    MissingForeignId,
}

impl std::fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnresolvedReason::NoMatch => write!(f, "no_match"),
            UnresolvedReason::StrategyFailed => write!(f, "strategy_failed"),
            UnresolvedReason::MissingForeignId => write!(f, "missing_foreign_id"),
        }
    }
}

// ============================================================================
// PASS AND DEDUP OUTCOMES
// ============================================================================

/// Everything one resolution pass produced, before deduplication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassOutcome {
    /// One mapping per resolved source, possibly with duplicate targets
    pub mappings: Vec<ResolvedMapping>,

    pub unresolved: Vec<Unresolved>,

    /// Sources excluded before resolution (empty status, ignore rules)
    pub skipped: usize,

    /// Sources the pass was asked to visit
    pub total: usize,

    /// True when cancellation cut the pass short
    pub cancelled: bool,
}

/// Deduplicated mappings plus the conflicts recorded on the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DedupOutcome {
    /// At most one mapping per target, in pass order
    pub kept: Vec<ResolvedMapping>,

    pub conflicts: Vec<Conflict>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entry::{MediaEntry, MediaProgress};

    fn entry(id: u64, title: &str) -> MediaEntry {
        MediaEntry::new(id, title, MediaProgress::episodic(0, 12))
    }

    #[test]
    fn test_exact_title_match_ignores_case() {
        let mapping = ResolvedMapping::new(entry(1, "ERASED"), entry(31043, "Erased"), "title", 3);
        assert!(mapping.is_exact_title_match());

        let mapping = ResolvedMapping::new(
            entry(1, "Boku dake ga Inai Machi"),
            entry(31043, "Erased"),
            "title",
            3,
        );
        assert!(!mapping.is_exact_title_match());
    }

    #[test]
    fn test_conflict_carries_both_strategies() {
        let winner = ResolvedMapping::new(entry(1, "Erased"), entry(9, "Erased"), "exact_id", 0);
        let loser = ResolvedMapping::new(entry(2, "Erased OVA"), entry(9, "Erased"), "title", 3);

        let conflict = Conflict::between(&loser, &winner);
        assert_eq!(conflict.loser.id, 2);
        assert_eq!(conflict.winner.id, 1);
        assert_eq!(conflict.target.id, 9);
        assert_eq!(conflict.loser_strategy, "title");
        assert_eq!(conflict.winner_strategy, "exact_id");
    }

    #[test]
    fn test_unresolved_reason_display() {
        assert_eq!(UnresolvedReason::NoMatch.to_string(), "no_match");
        assert_eq!(UnresolvedReason::StrategyFailed.to_string(), "strategy_failed");
        assert_eq!(UnresolvedReason::MissingForeignId.to_string(), "missing_foreign_id");
    }
}
