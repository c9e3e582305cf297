// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod deduplicator;
pub mod report_sink;
pub mod resolution_service;
pub mod strategy_chain;
pub mod sync_service;
pub mod update_service;



// Re-export all services and their types
pub use deduplicator::Deduplicator;

pub use report_sink::{EventBusReportSink, PassSummary, ReportSink};

pub use resolution_service::{PassState, ResolutionReport, ResolutionService};

pub use strategy_chain::{ChainDependencies, ChainMatch, StrategyChain};

pub use sync_service::{SyncReport, SyncService};

pub use update_service::{
    needs_update, CatalogWriter, UpdateOutcome, UpdateService, UpdateSummary,
};
