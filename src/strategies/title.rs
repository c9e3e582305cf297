// src/strategies/title.rs

use async_trait::async_trait;

use crate::domain::{SourceEntry, TargetEntry};
use crate::error::AppResult;
use crate::matching::{best_title_similarity, counts_compatible, titles_equal, SIMILARITY_THRESHOLD};
use crate::strategies::{KnownTargets, MatchStrategy, RunContext};

/// Matches against the user's targets by title.
///
/// Candidates are scanned in title order so equal inputs give equal answers.
/// An exact title wins outright. A fuzzy hit must share the media kind and
/// is dropped when the source claims a different destination ID or when the
/// unit counts are too far apart (an OVA against its main series).
pub struct TitleStrategy;

impl TitleStrategy {
    fn sorted_candidates(known: &KnownTargets) -> Vec<&TargetEntry> {
        let mut candidates: Vec<&TargetEntry> = known.values().collect();
        candidates.sort_by(|a, b| a.title().cmp(b.title()).then(a.id.cmp(&b.id)));
        candidates
    }

    fn fuzzy_match(source: &SourceEntry, candidate: &TargetEntry) -> bool {
        if source.kind() != candidate.kind() {
            return false;
        }

        let similarity = best_title_similarity(source, candidate);
        if similarity < SIMILARITY_THRESHOLD {
            return false;
        }

        if source.foreign_id != 0 && source.foreign_id != candidate.id {
            log::debug!(
                "Rejecting title match {} -> {}: source claims destination ID {}",
                source,
                candidate,
                source.foreign_id
            );
            return false;
        }

        if !counts_compatible(source.unit_total(), candidate.unit_total()) {
            log::debug!(
                "Rejecting title match {} -> {}: unit counts {} vs {}",
                source,
                candidate,
                source.unit_total(),
                candidate.unit_total()
            );
            return false;
        }

        true
    }
}

#[async_trait]
impl MatchStrategy for TitleStrategy {
    fn name(&self) -> &str {
        "title"
    }

    async fn attempt(
        &self,
        source: &SourceEntry,
        known: &KnownTargets,
        _ctx: &RunContext,
    ) -> AppResult<Option<TargetEntry>> {
        let candidates = Self::sorted_candidates(known);

        if let Some(exact) = candidates.iter().find(|c| titles_equal(source, c)) {
            return Ok(Some((*exact).clone()));
        }

        Ok(candidates
            .into_iter()
            .find(|c| Self::fuzzy_match(source, c))
            .cloned())
    }
}
