// src/services/sync_service.rs
//
// Sync Service
//
// One direction, one media kind: resolve, deduplicate, apply.
// The caller fetches both lists and decides how many passes to run; the
// crosswalk caches are shared between them and flushed once at the end.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::{RunConfig, SyncDirection};
use crate::domain::{Conflict, SourceEntry, Unresolved};
use crate::error::AppResult;
use crate::events::EventBus;
use crate::infrastructure::CrosswalkCaches;
use crate::integrations::DestinationService;
use crate::services::report_sink::EventBusReportSink;
use crate::services::resolution_service::{ResolutionReport, ResolutionService};
use crate::services::strategy_chain::{ChainDependencies, StrategyChain};
use crate::services::update_service::{CatalogWriter, UpdateService, UpdateSummary};
use crate::strategies::{KnownTargets, RunContext};

/// Everything one sync pass produced
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub direction: SyncDirection,
    pub resolution: ResolutionReport,
    pub updates: UpdateSummary,
}

impl SyncReport {
    pub fn conflicts(&self) -> &[Conflict] {
        &self.resolution.dedup.conflicts
    }

    pub fn unresolved(&self) -> &[Unresolved] {
        &self.resolution.pass.unresolved
    }

    /// Cancellation stopped resolution or updates early
    pub fn is_partial(&self) -> bool {
        self.resolution.is_partial() || self.updates.cancelled
    }
}

pub struct SyncService {
    config: Arc<RunConfig>,
    resolution: ResolutionService,
    updates: UpdateService,
    caches: Arc<CrosswalkCaches>,
}

impl SyncService {
    pub fn new(
        config: Arc<RunConfig>,
        chain: Arc<StrategyChain>,
        writer: Arc<dyn CatalogWriter>,
        event_bus: Arc<EventBus>,
        caches: Arc<CrosswalkCaches>,
    ) -> Self {
        let sink = Arc::new(EventBusReportSink::new(Arc::clone(&event_bus)));
        Self {
            config,
            resolution: ResolutionService::new(chain, sink),
            updates: UpdateService::new(writer, event_bus),
            caches,
        }
    }

    /// Validate `config` and assemble the strategy chain it describes
    pub fn from_config(
        config: RunConfig,
        destination: Option<Arc<dyn DestinationService>>,
        writer: Arc<dyn CatalogWriter>,
        event_bus: Arc<EventBus>,
        caches: Arc<CrosswalkCaches>,
    ) -> AppResult<Self> {
        config.validate()?;

        let deps = ChainDependencies::from_config(&config, destination, &caches)?;
        let chain = StrategyChain::from_toggles(&config.strategies, deps);

        Ok(Self::new(
            Arc::new(config),
            Arc::new(chain),
            writer,
            event_bus,
            caches,
        ))
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub async fn run(
        &self,
        sources: &[SourceEntry],
        known: &KnownTargets,
        cancel: CancellationToken,
    ) -> SyncReport {
        let ctx = RunContext::new(Arc::clone(&self.config), cancel);
        log::info!(
            "Syncing {} sources ({}){}",
            sources.len(),
            self.config.direction,
            if self.config.dry_run { " [dry run]" } else { "" }
        );

        let resolution = self.resolution.resolve(sources, known, &ctx).await;
        let updates = self.updates.apply(resolution.kept(), &ctx).await;

        SyncReport {
            direction: self.config.direction,
            resolution,
            updates,
        }
    }

    /// Persist crosswalk caches that changed. Call once, after the last pass.
    pub fn flush_caches(&self) -> usize {
        self.caches.flush_all()
    }
}
