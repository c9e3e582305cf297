// src/lib.rs
// AnimeSync - Entity resolution for anime/manga list synchronization
//
// Architecture:
// - Domain-centric: catalog entries and resolution outcomes live in `domain`
// - Strategy chain: ordered match strategies, first success wins
// - Explicit: every source ends resolved, unresolved, or skipped; never silent
// - Deterministic: same lists and config give the same mappings and events
// - Cancellable: every network-bound step observes the run's token

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod matching;

// ============================================================================
// RESOLUTION
// ============================================================================

pub mod infrastructure;
pub mod integrations;
pub mod services;
pub mod strategies;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    validate_entry,
    // Resolution outcomes
    Conflict,
    DedupOutcome,
    DomainError,
    // Catalog entries
    EntryTitles,
    ListStatus,
    MediaEntry,
    MediaKind,
    MediaProgress,
    PassOutcome,
    ResolvedMapping,
    SourceEntry,
    TargetEntry,
    Unresolved,
    UnresolvedReason,
    FORCE_SYNC_STRATEGY,
};

// ============================================================================
// PUBLIC API - Configuration & Errors
// ============================================================================

pub use config::{
    CrosswalkConfig, IgnoreRules, LiveServiceConfig, ManualMapping, RunConfig, StrategyToggles,
    SyncDirection,
};

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    create_event_bus, DomainEvent, EventBus, EventLogEntry, MappingConflictDetected,
    ResolutionFailed, ResolutionPassCompleted, TargetResolved, TargetUpdateFailed, TargetUpdated,
};

// ============================================================================
// PUBLIC API - Strategies & Integrations
// ============================================================================

pub use strategies::{index_targets, KnownTargets, MatchStrategy, RunContext};

pub use integrations::{
    AniListClient, CachedCrosswalk, CrosswalkSource, DestinationService, LiveCrosswalkService,
    OfflineCrosswalkTable,
};

pub use infrastructure::{CrosswalkCache, CrosswalkCaches};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    CatalogWriter, ChainDependencies, Deduplicator, PassSummary, ReportSink, ResolutionReport,
    ResolutionService, StrategyChain, SyncReport, SyncService, UpdateOutcome, UpdateSummary,
};

// Re-export the token type so callers need not depend on tokio-util directly
pub use tokio_util::sync::CancellationToken;
