// src/integrations/destination.rs
//
// Destination catalog lookups consumed by the search strategies.
//
// Implementations own the transport. Every call takes the run's
// cancellation token and must return `AppError::Cancelled` promptly once it
// fires.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::TargetEntry;
use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DestinationService: Send + Sync {
    /// Fetch one entry by destination ID
    async fn get_by_id(&self, id: u64, cancel: &CancellationToken) -> AppResult<TargetEntry>;

    /// Free-text title search
    async fn search_by_title(
        &self,
        title: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<TargetEntry>>;

    /// Entries whose stored cross-reference equals `origin_id`, an ID from
    /// the origin catalog (AniList `idMal` when MAL is the origin)
    async fn get_by_foreign_id(
        &self,
        origin_id: u64,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<TargetEntry>>;
}
