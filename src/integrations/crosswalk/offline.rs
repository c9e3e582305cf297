// src/integrations/crosswalk/offline.rs
//
// Static offline mapping table.
//
// File format: a JSON array of records, each naming a media kind and the IDs
// the title carries in every catalog the table knows about:
//
//   [{ "kind": "anime", "ids": { "anilist": 1, "myanimelist": 1 } }]
//
// Missing or null IDs are allowed; such records are skipped for the
// directions that need them.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::config::SyncDirection;
use crate::domain::MediaKind;
use crate::error::AppResult;
use crate::integrations::crosswalk::CrosswalkSource;

#[derive(Debug, Deserialize)]
struct OfflineRecord {
    kind: MediaKind,
    #[serde(default)]
    ids: HashMap<String, Option<u64>>,
}

pub struct OfflineCrosswalkTable {
    pairs: HashMap<(MediaKind, u64), u64>,
}

impl OfflineCrosswalkTable {
    pub fn from_json(content: &str, direction: SyncDirection) -> AppResult<Self> {
        let records: Vec<OfflineRecord> = serde_json::from_str(content)?;
        let origin = direction.origin_service();
        let destination = direction.destination_service();

        let mut pairs = HashMap::new();
        for record in records {
            let from = record.ids.get(origin).copied().flatten();
            let to = record.ids.get(destination).copied().flatten();
            if let (Some(from), Some(to)) = (from, to) {
                if from != 0 && to != 0 {
                    // First record wins on duplicates
                    pairs.entry((record.kind, from)).or_insert(to);
                }
            }
        }

        log::debug!(
            "Offline crosswalk table holds {} pairs for {}",
            pairs.len(),
            direction
        );
        Ok(Self { pairs })
    }

    pub fn load(path: &Path, direction: SyncDirection) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content, direction)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[async_trait]
impl CrosswalkSource for OfflineCrosswalkTable {
    fn name(&self) -> &str {
        "offline"
    }

    async fn lookup(
        &self,
        kind: MediaKind,
        origin_id: u64,
        _cancel: &CancellationToken,
    ) -> AppResult<Option<u64>> {
        Ok(self.pairs.get(&(kind, origin_id)).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"[
        { "kind": "anime", "ids": { "anilist": 21, "myanimelist": 21 } },
        { "kind": "anime", "ids": { "anilist": 101922, "myanimelist": 38000, "kitsu": 41370 } },
        { "kind": "manga", "ids": { "anilist": 30013, "myanimelist": 13 } },
        { "kind": "anime", "ids": { "anilist": 5, "myanimelist": null } }
    ]"#;

    #[tokio::test]
    async fn test_lookup_follows_direction() {
        let cancel = CancellationToken::new();

        let forward =
            OfflineCrosswalkTable::from_json(TABLE, SyncDirection::AnilistToMal).unwrap();
        assert_eq!(
            forward.lookup(MediaKind::Anime, 101922, &cancel).await.unwrap(),
            Some(38000)
        );

        let backward =
            OfflineCrosswalkTable::from_json(TABLE, SyncDirection::MalToAnilist).unwrap();
        assert_eq!(
            backward.lookup(MediaKind::Anime, 38000, &cancel).await.unwrap(),
            Some(101922)
        );
    }

    #[tokio::test]
    async fn test_lookup_is_kind_scoped() {
        let table = OfflineCrosswalkTable::from_json(TABLE, SyncDirection::AnilistToMal).unwrap();
        let cancel = CancellationToken::new();

        assert_eq!(table.lookup(MediaKind::Manga, 30013, &cancel).await.unwrap(), Some(13));
        assert_eq!(table.lookup(MediaKind::Anime, 30013, &cancel).await.unwrap(), None);
    }

    #[test]
    fn test_incomplete_records_skipped() {
        let table = OfflineCrosswalkTable::from_json(TABLE, SyncDirection::AnilistToMal).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_malformed_table_is_an_error() {
        assert!(OfflineCrosswalkTable::from_json("{", SyncDirection::AnilistToMal).is_err());
    }
}
