// src/strategies/api_search.rs

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{SourceEntry, TargetEntry};
use crate::error::AppResult;
use crate::integrations::DestinationService;
use crate::matching::{titles_equal, titles_similar};
use crate::strategies::{prefer_known, KnownTargets, MatchStrategy, RunContext};

/// Last resort: fetch the declared destination ID, or search by title.
pub struct ApiSearchStrategy {
    destination: Arc<dyn DestinationService>,
}

impl ApiSearchStrategy {
    pub fn new(destination: Arc<dyn DestinationService>) -> Self {
        Self { destination }
    }

    async fn fetch_declared(
        &self,
        source: &SourceEntry,
        known: &KnownTargets,
        ctx: &RunContext,
    ) -> AppResult<Option<TargetEntry>> {
        let fetched = self
            .destination
            .get_by_id(source.foreign_id, &ctx.cancel)
            .await?;

        if fetched.kind() != source.kind() {
            log::warn!(
                "Destination ID {} is {}, source {} is {}; skipping",
                fetched.id,
                fetched.kind(),
                source,
                source.kind()
            );
            return Ok(None);
        }
        Ok(Some(prefer_known(fetched, known)))
    }

    async fn search_title(
        &self,
        source: &SourceEntry,
        known: &KnownTargets,
        ctx: &RunContext,
    ) -> AppResult<Option<TargetEntry>> {
        let results = self
            .destination
            .search_by_title(source.title(), &ctx.cancel)
            .await?;

        let mut matches = Vec::new();
        for result in results {
            if result.kind() != source.kind() {
                log::debug!(
                    "Search result {} is {}, wanted {}; skipping",
                    result,
                    result.kind(),
                    source.kind()
                );
                continue;
            }
            if titles_equal(source, &result) || titles_similar(source, &result) {
                matches.push(result);
            }
        }

        // The user's own entry carries their progress
        if let Some(on_list) = matches.iter().find_map(|m| known.get(&m.id)) {
            return Ok(Some(on_list.clone()));
        }
        Ok(matches
            .into_iter()
            .next()
            .map(|found| prefer_known(found, known)))
    }
}

#[async_trait]
impl MatchStrategy for ApiSearchStrategy {
    fn name(&self) -> &str {
        "api_search"
    }

    async fn attempt(
        &self,
        source: &SourceEntry,
        known: &KnownTargets,
        ctx: &RunContext,
    ) -> AppResult<Option<TargetEntry>> {
        ctx.ensure_active()?;

        if source.foreign_id != 0 {
            return self.fetch_declared(source, known, ctx).await;
        }
        self.search_title(source, known, ctx).await
    }
}
