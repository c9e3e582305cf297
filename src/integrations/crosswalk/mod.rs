// src/integrations/crosswalk/mod.rs
//
// Crosswalk Sources
//
// A crosswalk answers "which destination ID does this origin ID map to".
// Each source is built for one sync direction, so callers only pass the
// media kind and the origin ID.
//
// CRITICAL RULES:
// - `Ok(None)` means the source has no pair for this ID
// - Errors are reserved for failed lookups (network, parse)
// - Only network-backed sources observe the cancellation token

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::domain::MediaKind;
use crate::error::AppResult;
use crate::infrastructure::CrosswalkCache;

pub mod live;
pub mod offline;

pub use live::LiveCrosswalkService;
pub use offline::OfflineCrosswalkTable;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrosswalkSource: Send + Sync {
    fn name(&self) -> &str;

    async fn lookup(
        &self,
        kind: MediaKind,
        origin_id: u64,
        cancel: &CancellationToken,
    ) -> AppResult<Option<u64>>;
}

/// Puts a [`CrosswalkCache`] in front of another source.
///
/// Both hits and misses are remembered; failed lookups are not.
pub struct CachedCrosswalk {
    inner: Arc<dyn CrosswalkSource>,
    cache: Arc<CrosswalkCache>,
    origin_service: String,
}

impl CachedCrosswalk {
    pub fn new(
        inner: Arc<dyn CrosswalkSource>,
        cache: Arc<CrosswalkCache>,
        origin_service: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            cache,
            origin_service: origin_service.into(),
        }
    }
}

#[async_trait]
impl CrosswalkSource for CachedCrosswalk {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn lookup(
        &self,
        kind: MediaKind,
        origin_id: u64,
        cancel: &CancellationToken,
    ) -> AppResult<Option<u64>> {
        let key = CrosswalkCache::key(&self.origin_service, kind, origin_id);

        if let Some(cached) = self.cache.get(&key) {
            log::trace!("Crosswalk cache hit for {}: {:?}", key, cached);
            return Ok(cached);
        }

        let answer = self.inner.lookup(kind, origin_id, cancel).await?;
        self.cache.insert(key, answer);
        Ok(answer)
    }
}
