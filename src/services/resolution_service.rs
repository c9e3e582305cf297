// src/services/resolution_service.rs
//
// Resolution Service
//
// Drives the strategy chain over every source entry of one catalog against
// the user's destination list, then deduplicates the result.
//
// CRITICAL RULES:
// - Sources are visited once each, in input order
// - Sources with empty status or matching an ignore rule are skipped, not failed
// - Per-source failures are absorbed into the outcome, never returned
// - Cancellation ends the pass early; mappings found so far are kept and
//   still deduplicated
// - Deterministic: same input → same output
//
// STATE MACHINE (per pass):
//   Idle → Resolving → Deduplicating → Done
//   cancellation: Resolving → Deduplicating (partial) → Done

use std::sync::Arc;
use std::time::Instant;

use crate::domain::{
    DedupOutcome, MediaEntry, MediaProgress, PassOutcome, ResolvedMapping, SourceEntry,
    TargetEntry, Unresolved, UnresolvedReason, FORCE_SYNC_STRATEGY,
};
use crate::error::AppError;
use crate::services::deduplicator::Deduplicator;
use crate::services::report_sink::{PassSummary, ReportSink};
use crate::services::strategy_chain::StrategyChain;
use crate::strategies::{KnownTargets, RunContext};

// ============================================================================
// PASS STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Resolving,
    Deduplicating,
    Done,
}

impl std::fmt::Display for PassState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PassState::Idle => "idle",
            PassState::Resolving => "resolving",
            PassState::Deduplicating => "deduplicating",
            PassState::Done => "done",
        };
        write!(f, "{}", s)
    }
}

/// Pass outcome plus its deduplicated mappings
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionReport {
    pub pass: PassOutcome,
    pub dedup: DedupOutcome,
    pub summary: PassSummary,
}

impl ResolutionReport {
    /// Mappings safe to apply to the destination
    pub fn kept(&self) -> &[ResolvedMapping] {
        &self.dedup.kept
    }

    /// True when cancellation cut the pass short
    pub fn is_partial(&self) -> bool {
        self.pass.cancelled
    }
}

// ============================================================================
// RESOLUTION SERVICE
// ============================================================================

pub struct ResolutionService {
    chain: Arc<StrategyChain>,
    sink: Arc<dyn ReportSink>,
}

impl ResolutionService {
    pub fn new(chain: Arc<StrategyChain>, sink: Arc<dyn ReportSink>) -> Self {
        Self { chain, sink }
    }

    /// Run one full pass: resolve, deduplicate, report.
    pub async fn resolve(
        &self,
        sources: &[SourceEntry],
        known: &KnownTargets,
        ctx: &RunContext,
    ) -> ResolutionReport {
        let start_time = Instant::now();
        let mut state = PassState::Idle;

        Self::transition(&mut state, PassState::Resolving);
        let pass = self.run_pass(sources, known, ctx).await;

        Self::transition(&mut state, PassState::Deduplicating);
        let dedup = Deduplicator::deduplicate(pass.mappings.clone());
        for conflict in &dedup.conflicts {
            self.sink.conflict(conflict);
        }

        Self::transition(&mut state, PassState::Done);
        let summary = PassSummary {
            total: pass.total,
            resolved: dedup.kept.len(),
            not_found: pass.unresolved.len(),
            skipped: pass.skipped,
            conflicts: dedup.conflicts.len(),
            cancelled: pass.cancelled,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };
        self.sink.pass_completed(&summary);

        log::info!(
            "Resolution pass {}: {} resolved, {} not found, {} skipped, {} conflicts of {} sources",
            if pass.cancelled { "cancelled" } else { "completed" },
            summary.resolved,
            summary.not_found,
            summary.skipped,
            summary.conflicts,
            summary.total
        );

        ResolutionReport {
            pass,
            dedup,
            summary,
        }
    }

    /// Resolve every eligible source. Mappings may still share targets.
    pub async fn run_pass(
        &self,
        sources: &[SourceEntry],
        known: &KnownTargets,
        ctx: &RunContext,
    ) -> PassOutcome {
        let mut outcome = PassOutcome {
            total: sources.len(),
            ..PassOutcome::default()
        };

        for source in sources {
            if ctx.is_cancelled() {
                log::warn!("Resolution cancelled before {}", source);
                outcome.cancelled = true;
                break;
            }

            if source.status.is_none() {
                log::debug!("Skipping {}: not on the origin list", source);
                outcome.skipped += 1;
                continue;
            }
            if ctx.config.ignore.matches(source.id, source.title()) {
                log::debug!("Skipping {}: ignored", source);
                outcome.skipped += 1;
                continue;
            }

            if ctx.config.force_sync {
                self.force_sync(source, known, &mut outcome);
                continue;
            }

            match self.chain.resolve(source, known, ctx).await {
                Ok(found) => {
                    log::info!(
                        "Resolved {} -> {} via {}",
                        source,
                        found.target,
                        found.strategy_name
                    );
                    let mapping = ResolvedMapping::new(
                        source.clone(),
                        found.target,
                        found.strategy_name,
                        found.strategy_index,
                    );
                    self.sink.target_resolved(&mapping);
                    outcome.mappings.push(mapping);
                }
                Err(e) if e.is_cancelled() => {
                    log::warn!("Resolution cancelled while resolving {}", source);
                    outcome.cancelled = true;
                    break;
                }
                Err(e) => {
                    let reason = match &e {
                        AppError::NoTargetFound(_) => {
                            log::debug!("{}", e);
                            UnresolvedReason::NoMatch
                        }
                        _ => {
                            log::warn!("Could not resolve {}: {}", source, e);
                            UnresolvedReason::StrategyFailed
                        }
                    };
                    self.record_unresolved(
                        Unresolved::new(source.clone(), reason, e.to_string()),
                        &mut outcome,
                    );
                }
            }
        }

        outcome
    }

    /// Trust the source's declared foreign ID without matching
    fn force_sync(&self, source: &SourceEntry, known: &KnownTargets, outcome: &mut PassOutcome) {
        if source.foreign_id == 0 {
            self.record_unresolved(
                Unresolved::new(
                    source.clone(),
                    UnresolvedReason::MissingForeignId,
                    "force sync requires a foreign ID",
                ),
                outcome,
            );
            return;
        }

        let target = known
            .get(&source.foreign_id)
            .cloned()
            .unwrap_or_else(|| Self::unlisted_target(source));

        let mapping = ResolvedMapping::new(source.clone(), target, FORCE_SYNC_STRATEGY, 0);
        self.sink.target_resolved(&mapping);
        outcome.mappings.push(mapping);
    }

    /// Stand-in for a destination entry the user has not listed yet
    fn unlisted_target(source: &SourceEntry) -> TargetEntry {
        let progress = match source.progress {
            MediaProgress::Episodic { total_episodes, .. } => {
                MediaProgress::episodic(0, total_episodes)
            }
            MediaProgress::Chaptered {
                total_chapters,
                total_volumes,
                ..
            } => MediaProgress::Chaptered {
                chapters_read: 0,
                volumes_read: 0,
                total_chapters,
                total_volumes,
            },
        };

        MediaEntry::new(source.foreign_id, source.title(), progress)
            .with_foreign_id(source.id)
            .with_titles(source.titles.clone())
    }

    fn record_unresolved(&self, unresolved: Unresolved, outcome: &mut PassOutcome) {
        self.sink.not_found(&unresolved);
        outcome.unresolved.push(unresolved);
    }

    fn transition(state: &mut PassState, next: PassState) {
        log::debug!("Resolution pass: {} -> {}", state, next);
        *state = next;
    }
}
