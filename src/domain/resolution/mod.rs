// src/domain/resolution/mod.rs
//
// Resolution Domain
//
// Value objects describing what a resolution pass and deduplication produced.
//
// CRITICAL RULES:
// - All types are pure value objects
// - No persistence
// - No event emission (that's the service's job)

pub mod value_objects;

pub use value_objects::{
    Conflict, DedupOutcome, PassOutcome, ResolvedMapping, Unresolved, UnresolvedReason,
    FORCE_SYNC_STRATEGY,
};
