// src/services/update_service.rs
//
// Update Service
//
// Applies deduplicated mappings to the destination catalog.
//
// CRITICAL RULES:
// - Only kept mappings reach this service; conflicts are never applied
// - Cancellation is checked before every write
// - Dry-run never calls the writer
// - A failed write is counted and the loop moves on

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::domain::{ResolvedMapping, SourceEntry, TargetEntry};
use crate::error::AppResult;
use crate::events::{EventBus, TargetUpdateFailed, TargetUpdated};
use crate::strategies::RunContext;

/// Writes the source's list state onto a destination entry
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogWriter: Send + Sync {
    async fn update(
        &self,
        source: &SourceEntry,
        target: &TargetEntry,
        cancel: &CancellationToken,
    ) -> AppResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    DryRun,
    Unchanged,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub updated: usize,
    pub dry_run: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl UpdateSummary {
    /// Mappings that reached a final outcome
    pub fn total(&self) -> usize {
        self.updated + self.dry_run + self.unchanged + self.failed
    }

    fn record(&mut self, outcome: &UpdateOutcome) {
        match outcome {
            UpdateOutcome::Updated => self.updated += 1,
            UpdateOutcome::DryRun => self.dry_run += 1,
            UpdateOutcome::Unchanged => self.unchanged += 1,
            UpdateOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Whether the destination differs from the source
pub fn needs_update(source: &SourceEntry, target: &TargetEntry) -> bool {
    !source.same_progress(target)
}

pub struct UpdateService {
    writer: Arc<dyn CatalogWriter>,
    event_bus: Arc<EventBus>,
}

impl UpdateService {
    pub fn new(writer: Arc<dyn CatalogWriter>, event_bus: Arc<EventBus>) -> Self {
        Self { writer, event_bus }
    }

    pub async fn apply(&self, kept: &[ResolvedMapping], ctx: &RunContext) -> UpdateSummary {
        let mut summary = UpdateSummary::default();

        for mapping in kept {
            if ctx.is_cancelled() {
                log::warn!(
                    "Updates cancelled, {} mappings not applied",
                    kept.len() - summary.total()
                );
                summary.cancelled = true;
                break;
            }

            match self.apply_one(mapping, ctx).await {
                Some(outcome) => summary.record(&outcome),
                None => {
                    log::warn!("Update of {} interrupted by cancellation", mapping.target);
                    summary.cancelled = true;
                    break;
                }
            }
        }

        summary
    }

    /// `None` when the write was interrupted by cancellation
    async fn apply_one(
        &self,
        mapping: &ResolvedMapping,
        ctx: &RunContext,
    ) -> Option<UpdateOutcome> {
        let (source, target) = (&mapping.source, &mapping.target);

        if !needs_update(source, target) {
            log::debug!("{} already up to date", target);
            return Some(UpdateOutcome::Unchanged);
        }

        if ctx.config.dry_run {
            log::info!("[dry run] would update {} from {}", target, source);
            self.event_bus.emit(TargetUpdated::new(
                source.id,
                target.id,
                target.title().to_string(),
                true,
            ));
            return Some(UpdateOutcome::DryRun);
        }

        match self.writer.update(source, target, &ctx.cancel).await {
            Ok(()) => {
                log::info!("Updated {} from {}", target, source);
                self.event_bus.emit(TargetUpdated::new(
                    source.id,
                    target.id,
                    target.title().to_string(),
                    false,
                ));
                Some(UpdateOutcome::Updated)
            }
            Err(e) if e.is_cancelled() => None,
            Err(e) => {
                log::warn!("Failed to update {}: {}", target, e);
                self.event_bus
                    .emit(TargetUpdateFailed::new(source.id, target.id, e.to_string()));
                Some(UpdateOutcome::Failed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::domain::MediaProgress;
    use crate::error::AppError;
    use crate::strategies::test_support::*;

    fn mapping(source_id: u64, watched: u32, target_id: u64) -> ResolvedMapping {
        let mut source = anime(source_id, "Source", 12);
        source.progress = MediaProgress::episodic(watched, 12);
        let target = anime(target_id, "Target", 12);
        ResolvedMapping::new(source, target, "exact_id", 0)
    }

    fn service(writer: MockCatalogWriter) -> (UpdateService, Arc<EventBus>) {
        let bus = Arc::new(EventBus::new());
        (UpdateService::new(Arc::new(writer), Arc::clone(&bus)), bus)
    }

    #[test]
    fn test_needs_update_only_when_destination_differs() {
        let changed = mapping(1, 3, 10);
        assert!(needs_update(&changed.source, &changed.target));

        let same = mapping(1, 0, 10);
        assert!(!needs_update(&same.source, &same.target));
    }

    #[tokio::test]
    async fn test_changed_mappings_are_written() {
        let mut writer = MockCatalogWriter::new();
        writer.expect_update().times(2).returning(|_, _, _| Ok(()));
        let (service, bus) = service(writer);

        let summary = service
            .apply(&[mapping(1, 3, 10), mapping(2, 5, 20)], &ctx())
            .await;

        assert_eq!(summary.updated, 2);
        assert!(!summary.cancelled);
        assert_eq!(bus.get_event_log().len(), 2);
    }

    #[tokio::test]
    async fn test_unchanged_mapping_skipped() {
        let mut writer = MockCatalogWriter::new();
        writer.expect_update().times(0);
        let (service, _) = service(writer);

        let summary = service.apply(&[mapping(1, 0, 10)], &ctx()).await;
        assert_eq!(summary.unchanged, 1);
    }

    #[tokio::test]
    async fn test_dry_run_never_writes() {
        let mut writer = MockCatalogWriter::new();
        writer.expect_update().times(0);
        let (service, bus) = service(writer);

        let ctx = ctx_with(RunConfig {
            dry_run: true,
            ..RunConfig::default()
        });
        let summary = service.apply(&[mapping(1, 3, 10)], &ctx).await;

        assert_eq!(summary.dry_run, 1);
        assert_eq!(bus.get_event_log()[0].event_type, "TargetUpdated");
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_loop() {
        let mut writer = MockCatalogWriter::new();
        writer
            .expect_update()
            .withf(|source, _, _| source.id == 1)
            .returning(|_, _, _| Err(AppError::ExternalService("HTTP 500".to_string())));
        writer
            .expect_update()
            .withf(|source, _, _| source.id == 2)
            .returning(|_, _, _| Ok(()));
        let (service, _) = service(writer);

        let summary = service
            .apply(&[mapping(1, 3, 10), mapping(2, 5, 20)], &ctx())
            .await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.updated, 1);
    }

    #[tokio::test]
    async fn test_cancellation_checked_before_each_write() {
        let mut writer = MockCatalogWriter::new();
        writer.expect_update().times(0);
        let (service, _) = service(writer);

        let summary = service.apply(&[mapping(1, 3, 10)], &cancelled_ctx()).await;
        assert!(summary.cancelled);
        assert_eq!(summary.total(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_write_stops_without_counting_failure() {
        let mut writer = MockCatalogWriter::new();
        writer
            .expect_update()
            .times(1)
            .returning(|_, _, _| Err(AppError::Cancelled));
        let (service, _) = service(writer);

        let summary = service
            .apply(&[mapping(1, 3, 10), mapping(2, 5, 20)], &ctx())
            .await;
        assert!(summary.cancelled);
        assert_eq!(summary.failed, 0);
    }
}
