// src/strategies/manual_mapping.rs

use async_trait::async_trait;

use crate::domain::{SourceEntry, TargetEntry};
use crate::error::AppResult;
use crate::strategies::{KnownTargets, MatchStrategy, RunContext};

/// Operator-supplied origin -> destination pairs from the run config.
///
/// A pair whose destination is not on the user's list does not match here;
/// fetching it is left to the search strategies.
pub struct ManualMappingStrategy;

#[async_trait]
impl MatchStrategy for ManualMappingStrategy {
    fn name(&self) -> &str {
        "manual_mapping"
    }

    async fn attempt(
        &self,
        source: &SourceEntry,
        known: &KnownTargets,
        ctx: &RunContext,
    ) -> AppResult<Option<TargetEntry>> {
        let Some(destination_id) = ctx.config.manual_destination(source.kind(), source.id) else {
            return Ok(None);
        };

        match known.get(&destination_id) {
            Some(target) => Ok(Some(target.clone())),
            None => {
                log::debug!(
                    "Manual mapping {} -> {} is not on the destination list",
                    source.id,
                    destination_id
                );
                Ok(None)
            }
        }
    }
}
