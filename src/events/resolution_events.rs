// src/events/resolution_events.rs
//
// Resolution Events
//
// Structured warnings and results of a resolution pass. The report layer
// renders them; nothing here formats operator-facing text.
//
// CRITICAL INVARIANTS:
// - No timestamps in event payloads
// - Event IDs are derived deterministically from fingerprints
// - occurred_at() returns SENTINEL_TIMESTAMP (Unix epoch) for trait compliance

use crate::events::DomainEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Sentinel timestamp for resolution events (Unix epoch).
const SENTINEL_TIMESTAMP: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

fn fingerprint(prefix: &str, parts: &[&dyn HashPart]) -> String {
    let mut hasher = DefaultHasher::new();
    for part in parts {
        part.feed(&mut hasher);
    }
    format!("{}:{:016x}", prefix, hasher.finish())
}

/// Object-safe adapter so mixed field types can feed one hasher
trait HashPart {
    fn feed(&self, hasher: &mut DefaultHasher);
}

impl<T: Hash> HashPart for T {
    fn feed(&self, hasher: &mut DefaultHasher) {
        self.hash(hasher);
    }
}

// ============================================================================
// TARGET RESOLVED EVENT
// ============================================================================

/// Emitted when the chain (or force-sync) found a target for a source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetResolved {
    pub source_id: u64,
    pub source_title: String,
    pub target_id: u64,
    pub target_title: String,
    pub strategy: String,
    pub strategy_index: usize,

    /// Deterministic fingerprint for idempotency
    pub fingerprint: String,
}

impl TargetResolved {
    pub fn new(
        source_id: u64,
        source_title: String,
        target_id: u64,
        target_title: String,
        strategy: String,
        strategy_index: usize,
    ) -> Self {
        let fingerprint = fingerprint("res", &[&source_id, &target_id, &strategy]);
        Self {
            source_id,
            source_title,
            target_id,
            target_title,
            strategy,
            strategy_index,
            fingerprint,
        }
    }
}

impl DomainEvent for TargetResolved {
    fn event_id(&self) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, self.fingerprint.as_bytes())
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        SENTINEL_TIMESTAMP
    }

    fn event_type(&self) -> &'static str {
        "TargetResolved"
    }
}

// ============================================================================
// RESOLUTION FAILED EVENT
// ============================================================================

/// Emitted when a source leaves the pass without a target.
/// Failures are explicit and structured, never silent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolutionFailed {
    pub source_id: u64,
    pub source_title: String,

    /// Structured reason (no_match, strategy_failed, missing_foreign_id)
    pub reason: String,

    /// Underlying error text
    pub detail: String,

    pub fingerprint: String,
}

impl ResolutionFailed {
    pub fn new(source_id: u64, source_title: String, reason: String, detail: String) -> Self {
        let fingerprint = fingerprint("fail", &[&source_id, &reason]);
        Self {
            source_id,
            source_title,
            reason,
            detail,
            fingerprint,
        }
    }
}

impl DomainEvent for ResolutionFailed {
    fn event_id(&self) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, self.fingerprint.as_bytes())
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        SENTINEL_TIMESTAMP
    }

    fn event_type(&self) -> &'static str {
        "ResolutionFailed"
    }
}

// ============================================================================
// MAPPING CONFLICT EVENT
// ============================================================================

/// Emitted for every mapping deduplication discarded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MappingConflictDetected {
    pub target_id: u64,
    pub target_title: String,
    pub loser_id: u64,
    pub loser_title: String,
    pub loser_strategy: String,
    pub winner_id: u64,
    pub winner_title: String,
    pub winner_strategy: String,
    pub fingerprint: String,
}

impl MappingConflictDetected {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        target_id: u64,
        target_title: String,
        loser_id: u64,
        loser_title: String,
        loser_strategy: String,
        winner_id: u64,
        winner_title: String,
        winner_strategy: String,
    ) -> Self {
        let fingerprint = fingerprint("conflict", &[&target_id, &loser_id, &winner_id]);
        Self {
            target_id,
            target_title,
            loser_id,
            loser_title,
            loser_strategy,
            winner_id,
            winner_title,
            winner_strategy,
            fingerprint,
        }
    }
}

impl DomainEvent for MappingConflictDetected {
    fn event_id(&self) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, self.fingerprint.as_bytes())
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        SENTINEL_TIMESTAMP
    }

    fn event_type(&self) -> &'static str {
        "MappingConflictDetected"
    }
}

// ============================================================================
// PASS COMPLETED EVENT
// ============================================================================

/// Emitted once per pass, after deduplication.
///
/// `duration_ms` is excluded from the fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolutionPassCompleted {
    pub total: usize,
    pub resolved: usize,
    pub not_found: usize,
    pub skipped: usize,
    pub conflicts: usize,
    pub cancelled: bool,
    pub duration_ms: u64,
    pub fingerprint: String,
}

impl ResolutionPassCompleted {
    pub fn new(
        total: usize,
        resolved: usize,
        not_found: usize,
        skipped: usize,
        conflicts: usize,
        cancelled: bool,
        duration_ms: u64,
    ) -> Self {
        let fingerprint = fingerprint(
            "pass",
            &[&total, &resolved, &not_found, &skipped, &conflicts, &cancelled],
        );
        Self {
            total,
            resolved,
            not_found,
            skipped,
            conflicts,
            cancelled,
            duration_ms,
            fingerprint,
        }
    }
}

impl DomainEvent for ResolutionPassCompleted {
    fn event_id(&self) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, self.fingerprint.as_bytes())
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        SENTINEL_TIMESTAMP
    }

    fn event_type(&self) -> &'static str {
        "ResolutionPassCompleted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(strategy: &str, index: usize) -> TargetResolved {
        TargetResolved::new(
            1,
            "Monster".into(),
            19,
            "Monster".into(),
            strategy.into(),
            index,
        )
    }

    #[test]
    fn test_identical_input_produces_identical_events() {
        let a = resolved("exact_id", 0);
        let b = resolved("exact_id", 0);

        assert_eq!(a, b);
        assert_eq!(a.event_id(), b.event_id());
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_different_strategies_produce_different_ids() {
        let a = resolved("exact_id", 0);
        let b = resolved("title", 4);
        assert_ne!(a.event_id(), b.event_id());
    }

    #[test]
    fn test_pass_fingerprint_ignores_duration() {
        let a = ResolutionPassCompleted::new(10, 8, 1, 1, 0, false, 15);
        let b = ResolutionPassCompleted::new(10, 8, 1, 1, 0, false, 900);
        assert_eq!(a.event_id(), b.event_id());
    }

    #[test]
    fn test_sentinel_timestamp() {
        let event = ResolutionFailed::new(7, "Trigun".into(), "no_match".into(), String::new());
        assert_eq!(event.occurred_at(), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(event.event_type(), "ResolutionFailed");
    }

    #[test]
    fn test_conflict_fingerprint_depends_on_sides() {
        let conflict = |loser: (u64, &str), winner: (u64, &str)| {
            MappingConflictDetected::new(
                9,
                "Erased".into(),
                loser.0,
                loser.1.into(),
                "title".into(),
                winner.0,
                winner.1.into(),
                "title".into(),
            )
        };
        let a = conflict((2, "Erased OVA"), (1, "Erased"));
        let b = conflict((1, "Erased"), (2, "Erased OVA"));
        assert_ne!(a.fingerprint, b.fingerprint);
    }
}
