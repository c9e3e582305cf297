// src/infrastructure/crosswalk_cache.rs
//
// Crosswalk Cache
//
// PURPOSE:
// - Remember live crosswalk answers across runs
// - Share one map between the passes of a run (anime/manga × both directions)
//
// CRITICAL RULES:
// - Keys are "{service}_{kind}_{id}", where service is the catalog the ID belongs to
// - A cached `null` is a remembered miss, distinct from "never asked"
// - Loaded once, flushed once, and only when something changed

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::RunConfig;
use crate::domain::MediaKind;
use crate::error::AppResult;

pub struct CrosswalkCache {
    path: Option<PathBuf>,
    entries: RwLock<HashMap<String, Option<u64>>>,
    dirty: AtomicBool,
}

impl CrosswalkCache {
    /// Cache that never touches disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: RwLock::new(HashMap::new()),
            dirty: AtomicBool::new(false),
        }
    }

    /// Empty cache that will be written to `path` on flush
    pub fn empty_at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            entries: RwLock::new(HashMap::new()),
            dirty: AtomicBool::new(false),
        }
    }

    /// Load the cache file at `path`. A missing file yields an empty cache
    /// that will be created on first flush.
    pub fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let entries: HashMap<String, Option<u64>> = serde_json::from_str(&content)?;
            log::debug!(
                "Loaded {} crosswalk cache entries from {}",
                entries.len(),
                path.display()
            );
            entries
        } else {
            log::debug!("No crosswalk cache at {}, starting empty", path.display());
            HashMap::new()
        };

        Ok(Self {
            path: Some(path),
            entries: RwLock::new(entries),
            dirty: AtomicBool::new(false),
        })
    }

    pub fn key(service: &str, kind: MediaKind, id: u64) -> String {
        format!("{}_{}_{}", service, kind, id)
    }

    /// `None` on a cache miss, `Some(None)` for a remembered negative answer
    pub fn get(&self, key: &str) -> Option<Option<u64>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }

    pub fn insert(&self, key: String, value: Option<u64>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.get(&key) != Some(&value) {
            entries.insert(key, value);
            self.dirty.store(true, Ordering::SeqCst);
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Persist when modified. Returns whether a file was written.
    ///
    /// The dirty flag is cleared under the same lock as the snapshot, so an
    /// insert racing the write leaves the cache dirty for the next flush.
    pub fn flush(&self) -> AppResult<bool> {
        let Some(path) = &self.path else {
            return Ok(false);
        };

        // Sorted for stable diffs
        let snapshot: BTreeMap<String, Option<u64>> = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if !self.dirty.swap(false, Ordering::SeqCst) {
                return Ok(false);
            }
            entries.iter().map(|(k, v)| (k.clone(), *v)).collect()
        };

        if let Err(e) = Self::write_snapshot(path, &snapshot) {
            self.dirty.store(true, Ordering::SeqCst);
            return Err(e);
        }

        log::info!(
            "Saved {} crosswalk cache entries to {}",
            snapshot.len(),
            path.display()
        );
        Ok(true)
    }

    fn write_snapshot(path: &Path, snapshot: &BTreeMap<String, Option<u64>>) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(snapshot)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// One cache per configured live service, shared by every pass of a run
#[derive(Default)]
pub struct CrosswalkCaches {
    by_service: HashMap<String, Arc<CrosswalkCache>>,
}

impl CrosswalkCaches {
    /// Load the cache of every live service in `config`.
    /// An unreadable cache file is replaced by an empty one.
    pub fn load(config: &RunConfig) -> AppResult<Self> {
        let mut by_service = HashMap::new();
        for service in &config.crosswalk.live_services {
            let path = config.cache_path(&service.name)?;
            let cache = match CrosswalkCache::load(&path) {
                Ok(cache) => cache,
                Err(e) => {
                    log::warn!(
                        "Discarding unreadable crosswalk cache {}: {}",
                        path.display(),
                        e
                    );
                    CrosswalkCache::empty_at(path)
                }
            };
            by_service.insert(service.name.clone(), Arc::new(cache));
        }
        Ok(Self { by_service })
    }

    pub fn insert(&mut self, service: impl Into<String>, cache: Arc<CrosswalkCache>) {
        self.by_service.insert(service.into(), cache);
    }

    pub fn get(&self, service: &str) -> Option<Arc<CrosswalkCache>> {
        self.by_service.get(service).cloned()
    }

    /// Flush every dirty cache. Failures are logged and do not stop the
    /// others. Returns the number of files written.
    pub fn flush_all(&self) -> usize {
        let mut written = 0;
        for (service, cache) in &self.by_service {
            match cache.flush() {
                Ok(true) => written += 1,
                Ok(false) => {}
                Err(e) => log::error!("Failed to save {} crosswalk cache: {}", service, e),
            }
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_format() {
        assert_eq!(
            CrosswalkCache::key("anilist", MediaKind::Anime, 21),
            "anilist_anime_21"
        );
    }

    #[test]
    fn test_negative_result_is_distinct_from_miss() {
        let cache = CrosswalkCache::in_memory();
        cache.insert("anilist_anime_1".to_string(), None);

        assert_eq!(cache.get("anilist_anime_1"), Some(None));
        assert_eq!(cache.get("anilist_anime_2"), None);
    }

    #[test]
    fn test_flush_skipped_when_clean() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arm_crosswalk_cache.json");
        let cache = CrosswalkCache::load(&path).unwrap();

        assert!(!cache.flush().unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_reinserting_same_value_keeps_clean() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, r#"{"anilist_anime_1": 1}"#).unwrap();

        let cache = CrosswalkCache::load(&path).unwrap();
        cache.insert("anilist_anime_1".to_string(), Some(1));
        assert!(!cache.is_dirty());
    }

    #[test]
    fn test_flush_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("arm_crosswalk_cache.json");

        let cache = CrosswalkCache::load(&path).unwrap();
        cache.insert(CrosswalkCache::key("anilist", MediaKind::Anime, 1), Some(1));
        cache.insert(CrosswalkCache::key("myanimelist", MediaKind::Manga, 2), None);
        assert!(cache.is_dirty());

        assert!(cache.flush().unwrap());
        assert!(!cache.is_dirty());
        assert!(!cache.flush().unwrap());

        let reloaded = CrosswalkCache::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("anilist_anime_1"), Some(Some(1)));
        assert_eq!(reloaded.get("myanimelist_manga_2"), Some(None));
    }

    #[test]
    fn test_insert_after_flush_is_persisted_by_next_flush() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arm_crosswalk_cache.json");

        let cache = CrosswalkCache::load(&path).unwrap();
        cache.insert("anilist_anime_1".to_string(), Some(1));
        assert!(cache.flush().unwrap());

        cache.insert("anilist_anime_2".to_string(), None);
        assert!(cache.is_dirty());
        assert!(cache.flush().unwrap());

        let reloaded = CrosswalkCache::load(&path).unwrap();
        assert_eq!(reloaded.get("anilist_anime_2"), Some(None));
    }

    #[test]
    fn test_failed_flush_stays_dirty() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "").unwrap();

        let cache = CrosswalkCache::empty_at(blocker.join("arm_crosswalk_cache.json"));
        cache.insert("anilist_anime_1".to_string(), Some(1));

        assert!(cache.flush().is_err());
        assert!(cache.is_dirty());
    }

    #[test]
    fn test_caches_follow_live_services() {
        use crate::config::LiveServiceConfig;

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken_crosswalk_cache.json"), "not json").unwrap();

        let mut config = RunConfig::default();
        config.crosswalk.cache_dir = Some(dir.path().to_path_buf());
        config.crosswalk.live_services = ["arm", "broken"]
            .iter()
            .map(|name| LiveServiceConfig {
                name: name.to_string(),
                base_url: "http://localhost".to_string(),
                kinds: vec![MediaKind::Anime],
            })
            .collect();

        let caches = CrosswalkCaches::load(&config).unwrap();
        let arm = caches.get("arm").unwrap();
        let broken = caches.get("broken").unwrap();
        assert!(broken.is_empty());
        assert!(caches.get("other").is_none());

        arm.insert("anilist_anime_1".to_string(), Some(1));
        assert_eq!(caches.flush_all(), 1);
        assert!(dir.path().join("arm_crosswalk_cache.json").exists());
    }

    #[test]
    fn test_in_memory_never_writes() {
        let cache = CrosswalkCache::in_memory();
        cache.insert("x_anime_1".to_string(), Some(5));
        assert!(cache.is_dirty());
        assert!(!cache.flush().unwrap());
    }
}
