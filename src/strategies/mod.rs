// src/strategies/mod.rs
//
// Match strategies
//
// Each strategy tries to locate the destination entry for one source entry
// using a different signal. A strategy that has nothing to say returns
// `Ok(None)`; only a failed lookup is an error. Strategies that touch the
// network check the run's cancellation token first.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::RunConfig;
use crate::domain::{SourceEntry, TargetEntry};
use crate::error::{AppError, AppResult};

pub mod api_search;
pub mod crosswalk;
pub mod exact_id;
pub mod foreign_id_search;
pub mod manual_mapping;
pub mod title;

pub use api_search::ApiSearchStrategy;
pub use crosswalk::CrosswalkStrategy;
pub use exact_id::ExactIdStrategy;
pub use foreign_id_search::ForeignIdSearchStrategy;
pub use manual_mapping::ManualMappingStrategy;
pub use title::TitleStrategy;

/// Entries already on the user's destination list, keyed by destination ID
pub type KnownTargets = HashMap<u64, TargetEntry>;

/// Key the user's destination list by destination ID. On duplicate IDs the
/// later entry wins.
pub fn index_targets(entries: impl IntoIterator<Item = TargetEntry>) -> KnownTargets {
    entries.into_iter().map(|entry| (entry.id, entry)).collect()
}

/// Per-run state handed to every strategy invocation
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: Arc<RunConfig>,
    pub cancel: CancellationToken,
}

impl RunContext {
    pub fn new(config: Arc<RunConfig>, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Checkpoint before any network-bound call
    pub fn ensure_active(&self) -> AppResult<()> {
        if self.cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        Ok(())
    }
}

/// A policy for finding the target of one source entry.
#[async_trait]
pub trait MatchStrategy: Send + Sync {
    /// Stable name used for priority bookkeeping and diagnostics
    fn name(&self) -> &str;

    /// `Ok(Some(target))` on a match, `Ok(None)` when this signal has no
    /// answer, `Err` only when the underlying lookup failed.
    async fn attempt(
        &self,
        source: &SourceEntry,
        known: &KnownTargets,
        ctx: &RunContext,
    ) -> AppResult<Option<TargetEntry>>;
}

/// Prefer the user's own copy of a fetched target.
///
/// Looks up by destination ID first, then by a shared non-zero foreign ID.
pub(crate) fn prefer_known(fetched: TargetEntry, known: &KnownTargets) -> TargetEntry {
    if let Some(existing) = known.get(&fetched.id) {
        return existing.clone();
    }
    if fetched.foreign_id != 0 {
        let mut same_foreign: Vec<&TargetEntry> = known
            .values()
            .filter(|t| t.foreign_id == fetched.foreign_id && t.kind() == fetched.kind())
            .collect();
        same_foreign.sort_by_key(|t| t.id);
        if let Some(existing) = same_foreign.first() {
            return (*existing).clone();
        }
    }
    fetched
}
