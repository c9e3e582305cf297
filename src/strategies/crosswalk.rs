// src/strategies/crosswalk.rs

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{SourceEntry, TargetEntry};
use crate::error::AppResult;
use crate::integrations::CrosswalkSource;
use crate::strategies::{KnownTargets, MatchStrategy, RunContext};

/// Translates the origin ID through a crosswalk source, then requires the
/// translated ID on the user's list.
pub struct CrosswalkStrategy {
    name: String,
    source: Arc<dyn CrosswalkSource>,
}

impl CrosswalkStrategy {
    pub fn new(source: Arc<dyn CrosswalkSource>) -> Self {
        Self {
            name: format!("crosswalk_{}", source.name()),
            source,
        }
    }
}

#[async_trait]
impl MatchStrategy for CrosswalkStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(
        &self,
        source: &SourceEntry,
        known: &KnownTargets,
        ctx: &RunContext,
    ) -> AppResult<Option<TargetEntry>> {
        let Some(destination_id) = self
            .source
            .lookup(source.kind(), source.id, &ctx.cancel)
            .await?
        else {
            return Ok(None);
        };

        Ok(known
            .get(&destination_id)
            .filter(|target| target.kind() == source.kind())
            .cloned())
    }
}
