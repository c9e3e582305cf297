// src/strategies/foreign_id_search.rs

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{SourceEntry, TargetEntry};
use crate::error::AppResult;
use crate::integrations::DestinationService;
use crate::matching::{titles_equal, titles_similar};
use crate::strategies::{prefer_known, KnownTargets, MatchStrategy, RunContext};

/// Asks the destination catalog which of its entries cross-reference this
/// source, for sources whose declared destination ID is not on the user's
/// list.
///
/// The lookup key is the source's own ID: the destination stores origin IDs
/// as its cross-reference (AniList `idMal`). Results that carry a different
/// cross-reference are dropped. A single survivor is trusted. Several are
/// narrowed by kind and title, and the lowest destination ID wins.
pub struct ForeignIdSearchStrategy {
    destination: Arc<dyn DestinationService>,
}

impl ForeignIdSearchStrategy {
    pub fn new(destination: Arc<dyn DestinationService>) -> Self {
        Self { destination }
    }

    fn pick(source: &SourceEntry, results: Vec<TargetEntry>) -> Option<TargetEntry> {
        let mut linked: Vec<TargetEntry> = results
            .into_iter()
            .filter(|r| r.foreign_id == source.id)
            .collect();

        if linked.len() <= 1 {
            return linked.pop();
        }

        linked.retain(|r| r.kind() == source.kind());
        linked.retain(|r| titles_equal(source, r) || titles_similar(source, r));
        linked.sort_by_key(|r| r.id);

        if linked.is_empty() {
            log::debug!("No entry cross-referencing {} resembles it", source);
        }
        linked.into_iter().next()
    }
}

#[async_trait]
impl MatchStrategy for ForeignIdSearchStrategy {
    fn name(&self) -> &str {
        "foreign_id_search"
    }

    async fn attempt(
        &self,
        source: &SourceEntry,
        known: &KnownTargets,
        ctx: &RunContext,
    ) -> AppResult<Option<TargetEntry>> {
        // Only for a declared destination ID the user has not listed
        if source.foreign_id == 0 || known.contains_key(&source.foreign_id) {
            return Ok(None);
        }

        ctx.ensure_active()?;
        let results = self
            .destination
            .get_by_foreign_id(source.id, &ctx.cancel)
            .await?;

        Ok(Self::pick(source, results).map(|found| prefer_known(found, known)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MediaProgress;
    use crate::error::AppError;
    use crate::integrations::MockDestinationService;
    use crate::strategies::test_support::*;
    use mockall::predicate::{always, eq};

    fn strategy(mock: MockDestinationService) -> ForeignIdSearchStrategy {
        ForeignIdSearchStrategy::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_single_result_prefers_users_copy() {
        let mut mock = MockDestinationService::new();
        mock.expect_get_by_foreign_id()
            .with(eq(37341u64), always())
            .times(1)
            .returning(|_, _| Ok(vec![anime(101348, "Vinland Saga", 24).with_foreign_id(37341)]));

        let mut mine = anime(60000, "Vinland Saga", 24).with_foreign_id(37341);
        mine.progress = MediaProgress::episodic(17, 24);
        let targets = known(vec![mine.clone()]);

        let source = anime(37341, "Vinland Saga", 24).with_foreign_id(101348);
        let found = strategy(mock).attempt(&source, &targets, &ctx()).await.unwrap();

        assert_eq!(found, Some(mine));
    }

    #[tokio::test]
    async fn test_queries_by_source_id_not_declared_destination_id() {
        let mut mock = MockDestinationService::new();
        mock.expect_get_by_foreign_id()
            .with(eq(37521u64), always())
            .times(1)
            .returning(|_, _| Ok(vec![anime(101348, "Vinland Saga", 24).with_foreign_id(37521)]));

        let source = anime(37521, "Vinland Saga", 24).with_foreign_id(101348);
        let found = strategy(mock).attempt(&source, &known(vec![]), &ctx()).await.unwrap();
        assert_eq!(found.map(|t| t.id), Some(101348));
    }

    #[tokio::test]
    async fn test_single_result_trusted_outright() {
        let mut mock = MockDestinationService::new();
        mock.expect_get_by_foreign_id()
            .returning(|_, _| {
                Ok(vec![anime(7, "Completely Different Name", 3).with_foreign_id(1)])
            });

        let source = anime(1, "Original Title", 12).with_foreign_id(7);
        let found = strategy(mock).attempt(&source, &known(vec![]), &ctx()).await.unwrap();
        assert_eq!(found.map(|t| t.id), Some(7));
    }

    #[tokio::test]
    async fn test_results_with_other_cross_reference_dropped() {
        let mut mock = MockDestinationService::new();
        mock.expect_get_by_foreign_id()
            .returning(|_, _| {
                Ok(vec![anime(999, "Some Unrelated Show", 12).with_foreign_id(5)])
            });

        let source = anime(1, "Vinland Saga", 24).with_foreign_id(101348);
        let found = strategy(mock).attempt(&source, &known(vec![]), &ctx()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_multiple_results_filtered_by_title_and_kind() {
        let mut mock = MockDestinationService::new();
        mock.expect_get_by_foreign_id().returning(|_, _| {
            Ok(vec![
                anime(10, "Unrelated Show", 12).with_foreign_id(34599),
                manga(11, "Made in Abyss", 60).with_foreign_id(34599),
                anime(12, "Made in Abyss", 13).with_foreign_id(34599),
            ])
        });

        let source = anime(34599, "Made in Abyss", 13).with_foreign_id(97986);
        let found = strategy(mock).attempt(&source, &known(vec![]), &ctx()).await.unwrap();
        assert_eq!(found.map(|t| t.id), Some(12));
    }

    #[tokio::test]
    async fn test_skipped_without_foreign_id_or_when_known() {
        let mut mock = MockDestinationService::new();
        mock.expect_get_by_foreign_id().times(0);
        let strategy = strategy(mock);

        let bare = anime(1, "Monster", 74);
        assert!(strategy.attempt(&bare, &known(vec![]), &ctx()).await.unwrap().is_none());

        let declared = anime(1, "Monster", 74).with_foreign_id(19);
        let targets = known(vec![anime(19, "Monster", 74)]);
        assert!(strategy.attempt(&declared, &targets, &ctx()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancelled_before_network() {
        let mut mock = MockDestinationService::new();
        mock.expect_get_by_foreign_id().times(0);

        let source = anime(1, "Monster", 74).with_foreign_id(19);
        let result = strategy(mock).attempt(&source, &known(vec![]), &cancelled_ctx()).await;
        assert!(matches!(result, Err(AppError::Cancelled)));
    }
}
