// src/services/deduplicator.rs
//
// Deduplicator
//
// Post-processes a pass's mappings so each target is claimed at most once.
//
// CRITICAL RULES:
// - Lowest strategy index wins a shared target
// - Ties go to the single exact (case-insensitive) title match, otherwise to
//   the first mapping in (strategy index, source ID, source title) order
// - Every other claimant becomes a Conflict and is never applied
// - Kept mappings stay in pass order

use std::collections::{HashMap, HashSet};

use crate::domain::{Conflict, DedupOutcome, ResolvedMapping};

pub struct Deduplicator;

impl Deduplicator {
    pub fn deduplicate(mappings: Vec<ResolvedMapping>) -> DedupOutcome {
        let mut groups: HashMap<u64, Vec<usize>> = HashMap::new();
        let mut group_order: Vec<u64> = Vec::new();
        for (position, mapping) in mappings.iter().enumerate() {
            let group = groups.entry(mapping.target_id()).or_default();
            if group.is_empty() {
                group_order.push(mapping.target_id());
            }
            group.push(position);
        }

        let mut dropped: HashSet<usize> = HashSet::new();
        let mut conflicts = Vec::new();

        for target_id in group_order {
            let Some(members) = groups.get_mut(&target_id) else {
                continue;
            };
            if members.len() < 2 {
                continue;
            }

            members.sort_by(|&a, &b| {
                let (a, b) = (&mappings[a], &mappings[b]);
                a.strategy_index
                    .cmp(&b.strategy_index)
                    .then(a.source.id.cmp(&b.source.id))
                    .then_with(|| a.source.title().cmp(b.source.title()))
            });

            let winner = Self::pick_winner(&mappings, members);

            for &loser in members.iter().filter(|&&m| m != winner) {
                let conflict = Conflict::between(&mappings[loser], &mappings[winner]);
                log::warn!(
                    "Conflict on {}: keeping {} ({}), dropping {} ({})",
                    conflict.target,
                    conflict.winner,
                    conflict.winner_strategy,
                    conflict.loser,
                    conflict.loser_strategy
                );
                dropped.insert(loser);
                conflicts.push(conflict);
            }
        }

        let kept = mappings
            .into_iter()
            .enumerate()
            .filter(|(position, _)| !dropped.contains(position))
            .map(|(_, mapping)| mapping)
            .collect();

        DedupOutcome { kept, conflicts }
    }

    /// `members` must already be sorted
    fn pick_winner(mappings: &[ResolvedMapping], members: &[usize]) -> usize {
        let best_index = mappings[members[0]].strategy_index;
        let tied: Vec<usize> = members
            .iter()
            .copied()
            .take_while(|&m| mappings[m].strategy_index == best_index)
            .collect();

        let exact: Vec<usize> = tied
            .iter()
            .copied()
            .filter(|&m| mappings[m].is_exact_title_match())
            .collect();

        match exact.as_slice() {
            [only] => *only,
            _ => tied[0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MediaEntry, MediaProgress};

    fn entry(id: u64, title: &str) -> MediaEntry {
        MediaEntry::new(id, title, MediaProgress::episodic(0, 12))
    }

    fn mapping(
        source_id: u64,
        source_title: &str,
        target_id: u64,
        target_title: &str,
        index: usize,
    ) -> ResolvedMapping {
        let strategy = match index {
            0 => "exact_id",
            4 => "title",
            _ => "api_search",
        };
        ResolvedMapping::new(
            entry(source_id, source_title),
            entry(target_id, target_title),
            strategy,
            index,
        )
    }

    #[test]
    fn test_unique_targets_pass_through() {
        let input = vec![mapping(1, "A", 10, "A", 0), mapping(2, "B", 20, "B", 4)];
        let outcome = Deduplicator::deduplicate(input.clone());
        assert_eq!(outcome.kept, input);
        assert!(outcome.conflicts.is_empty());
    }

    #[test]
    fn test_lower_index_wins() {
        let outcome = Deduplicator::deduplicate(vec![
            mapping(1, "Clannad", 2167, "Clannad", 4),
            mapping(2, "Clannad After Story", 2167, "Clannad", 0),
        ]);

        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.kept[0].source.id, 2);
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.conflicts[0].loser.id, 1);
        assert_eq!(outcome.conflicts[0].loser_strategy, "title");
        assert_eq!(outcome.conflicts[0].winner_strategy, "exact_id");
    }

    #[test]
    fn test_tie_prefers_exact_title() {
        let outcome = Deduplicator::deduplicate(vec![
            mapping(1, "Toradora! SOS", 4224, "Toradora!", 4),
            mapping(2, "TORADORA!", 4224, "Toradora!", 4),
        ]);

        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.kept[0].source.id, 2);
        assert_eq!(outcome.conflicts[0].loser.id, 1);
    }

    #[test]
    fn test_tie_without_exact_title_falls_back_to_sort_order() {
        let outcome = Deduplicator::deduplicate(vec![
            mapping(9, "Haikyu!! OVA", 20464, "Haikyuu!!", 4),
            mapping(3, "Haikyu!! Movie", 20464, "Haikyuu!!", 4),
        ]);
        assert_eq!(outcome.kept[0].source.id, 3);
    }

    #[test]
    fn test_multiple_exact_titles_fall_back_to_sort_order() {
        let outcome = Deduplicator::deduplicate(vec![
            mapping(8, "Monster", 19, "Monster", 4),
            mapping(5, "monster", 19, "Monster", 4),
        ]);
        assert_eq!(outcome.kept[0].source.id, 5);
        assert_eq!(outcome.conflicts.len(), 1);
    }

    #[test]
    fn test_kept_mappings_keep_pass_order() {
        let outcome = Deduplicator::deduplicate(vec![
            mapping(1, "Z", 100, "Z", 4),
            mapping(2, "Y", 200, "Y", 0),
            mapping(3, "Z", 100, "Z", 0),
            mapping(4, "X", 300, "X", 4),
        ]);

        let ids: Vec<u64> = outcome.kept.iter().map(|m| m.source.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_three_way_conflict_records_two_losers() {
        let outcome = Deduplicator::deduplicate(vec![
            mapping(1, "Gintama'", 918, "Gintama", 4),
            mapping(2, "Gintama", 918, "Gintama", 4),
            mapping(3, "Gintama.", 918, "Gintama", 6),
        ]);

        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.kept[0].source.id, 2);
        let losers: Vec<u64> = outcome.conflicts.iter().map(|c| c.loser.id).collect();
        assert_eq!(losers, vec![1, 3]);
    }
}
