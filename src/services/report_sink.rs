// src/services/report_sink.rs
//
// Report Sink
//
// Where the resolution pass and the deduplicator send their outcomes.
//
// CRITICAL RULES:
// - Outcomes are structured; no operator-facing text is built here
// - Reporting never fails the pass

use std::sync::Arc;

use crate::domain::{Conflict, ResolvedMapping, Unresolved};
use crate::events::{
    EventBus, MappingConflictDetected, ResolutionFailed, ResolutionPassCompleted, TargetResolved,
};

/// Counters for one finished pass, after deduplication
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub total: usize,
    pub resolved: usize,
    pub not_found: usize,
    pub skipped: usize,
    pub conflicts: usize,
    pub cancelled: bool,
    pub duration_ms: u64,
}

pub trait ReportSink: Send + Sync {
    fn target_resolved(&self, mapping: &ResolvedMapping);

    fn not_found(&self, unresolved: &Unresolved);

    fn conflict(&self, conflict: &Conflict);

    fn pass_completed(&self, summary: &PassSummary);
}

/// Forwards every outcome to the event bus as a typed event.
pub struct EventBusReportSink {
    event_bus: Arc<EventBus>,
}

impl EventBusReportSink {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self { event_bus }
    }
}

impl ReportSink for EventBusReportSink {
    fn target_resolved(&self, mapping: &ResolvedMapping) {
        self.event_bus.emit(TargetResolved::new(
            mapping.source.id,
            mapping.source.title().to_string(),
            mapping.target.id,
            mapping.target.title().to_string(),
            mapping.strategy_name.clone(),
            mapping.strategy_index,
        ));
    }

    fn not_found(&self, unresolved: &Unresolved) {
        self.event_bus.emit(ResolutionFailed::new(
            unresolved.source.id,
            unresolved.source.title().to_string(),
            unresolved.reason.to_string(),
            unresolved.detail.clone(),
        ));
    }

    fn conflict(&self, conflict: &Conflict) {
        self.event_bus.emit(MappingConflictDetected::new(
            conflict.target.id,
            conflict.target.title().to_string(),
            conflict.loser.id,
            conflict.loser.title().to_string(),
            conflict.loser_strategy.clone(),
            conflict.winner.id,
            conflict.winner.title().to_string(),
            conflict.winner_strategy.clone(),
        ));
    }

    fn pass_completed(&self, summary: &PassSummary) {
        self.event_bus.emit(ResolutionPassCompleted::new(
            summary.total,
            summary.resolved,
            summary.not_found,
            summary.skipped,
            summary.conflicts,
            summary.cancelled,
            summary.duration_ms,
        ));
    }
}
