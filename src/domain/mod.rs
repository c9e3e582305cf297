// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod entry;
pub mod resolution;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Catalog entries
pub use entry::{
    validate_entry, EntryTitles, ListStatus, MediaEntry, MediaKind, MediaProgress, SourceEntry,
    TargetEntry,
};

// Resolution outcomes
pub use resolution::{
    Conflict, DedupOutcome, PassOutcome, ResolvedMapping, Unresolved, UnresolvedReason,
    FORCE_SYNC_STRATEGY,
};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
