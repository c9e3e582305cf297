// src/strategies/exact_id.rs

use async_trait::async_trait;

use crate::domain::{SourceEntry, TargetEntry};
use crate::error::AppResult;
use crate::strategies::{KnownTargets, MatchStrategy, RunContext};

/// Looks up the source's declared foreign ID among the user's targets.
pub struct ExactIdStrategy;

#[async_trait]
impl MatchStrategy for ExactIdStrategy {
    fn name(&self) -> &str {
        "exact_id"
    }

    async fn attempt(
        &self,
        source: &SourceEntry,
        known: &KnownTargets,
        _ctx: &RunContext,
    ) -> AppResult<Option<TargetEntry>> {
        if source.foreign_id == 0 {
            return Ok(None);
        }
        Ok(known
            .get(&source.foreign_id)
            .filter(|target| target.kind() == source.kind())
            .cloned())
    }
}
