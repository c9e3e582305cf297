// src/integrations/anilist/client.rs
//
// AniList API Integration
//
// ARCHITECTURE:
// - GraphQL client for the AniList API
// - Handles authentication, rate limiting, cancellation
// - Maps external media → TargetEntry (no user progress attached)
// - Serves as the destination catalog when syncing MyAnimeList → AniList
//
// CRITICAL RULES:
// - This is INFRASTRUCTURE, not DOMAIN
// - Entries it returns are catalog objects, never the user's list entries

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::domain::{EntryTitles, MediaEntry, MediaKind, MediaProgress, TargetEntry};
use crate::error::{AppError, AppResult};
use crate::integrations::destination::DestinationService;

const ANILIST_URL: &str = "https://graphql.anilist.co";

const MEDIA_FIELDS: &str = r#"
    id
    idMal
    title {
        romaji
        english
        native
    }
    episodes
    chapters
    volumes
"#;

/// GraphQL response wrapper
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
    status: Option<i32>,
}

/// Paged results wrapper
#[derive(Debug, Deserialize)]
struct PageResponse {
    #[serde(rename = "Page")]
    page: PageData,
}

#[derive(Debug, Deserialize)]
struct PageData {
    media: Vec<MediaData>,
}

/// Single media query wrapper
#[derive(Debug, Deserialize)]
struct MediaResponse {
    #[serde(rename = "Media")]
    media: MediaData,
}

/// Media data from AniList
#[derive(Debug, Deserialize)]
struct MediaData {
    id: u64,
    #[serde(rename = "idMal")]
    id_mal: Option<u64>,
    title: TitleData,
    episodes: Option<u32>,
    chapters: Option<u32>,
    volumes: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TitleData {
    romaji: Option<String>,
    english: Option<String>,
    native: Option<String>,
}

/// Rate limiter state
struct RateLimiter {
    next_slot: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            next_slot: Instant::now(),
            min_interval,
        }
    }

    /// Claim the next request slot and return how long to wait for it
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let slot = self.next_slot.max(now);
        self.next_slot = slot + self.min_interval;
        slot - now
    }
}

/// AniList API Client, scoped to one media kind
pub struct AniListClient {
    base_url: String,
    http_client: Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    auth_token: Option<String>,
    kind: MediaKind,
}

impl AniListClient {
    /// Create a new AniList client for anime or manga lookups
    pub fn new(kind: MediaKind) -> AppResult<Self> {
        let http_client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url: ANILIST_URL.to_string(),
            http_client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(Duration::from_millis(1000)))),
            auth_token: None,
            kind,
        })
    }

    /// Attach an OAuth access token obtained elsewhere
    pub fn with_auth(mut self, token: String) -> Self {
        self.auth_token = Some(token);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    fn media_type(&self) -> &'static str {
        match self.kind {
            MediaKind::Anime => "ANIME",
            MediaKind::Manga => "MANGA",
        }
    }

    // ========================================================================
    // INTERNAL: GraphQL Execution
    // ========================================================================

    /// Execute a GraphQL query, honoring rate limit and cancellation
    async fn execute_query<T>(
        &self,
        query: &str,
        variables: serde_json::Value,
        cancel: &CancellationToken,
    ) -> AppResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let wait = self
            .rate_limiter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reserve();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            _ = tokio::time::sleep(wait) => {}
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AppError::Cancelled),
            result = self.send_query(query, variables) => result,
        }
    }

    async fn send_query<T>(&self, query: &str, variables: serde_json::Value) -> AppResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let body = json!({
            "query": query,
            "variables": variables
        });

        let mut request = self
            .http_client
            .post(&self.base_url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json");

        if let Some(token) = &self.auth_token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.json(&body).send().await?;

        // AniList reports 404 for unknown IDs with a GraphQL error body
        let status = response.status();
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::ExternalService(format!(
                "AniList API returned status: {}",
                status
            )));
        }

        let graphql_response: GraphQLResponse<T> = response.json().await?;
        Self::unwrap_response(graphql_response)
    }

    fn unwrap_response<T>(response: GraphQLResponse<T>) -> AppResult<T> {
        if let Some(errors) = response.errors {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| match e.status {
                    Some(status) => format!("{} ({})", e.message, status),
                    None => e.message.clone(),
                })
                .collect();

            return Err(AppError::ExternalService(format!(
                "AniList API errors: {}",
                messages.join(", ")
            )));
        }

        response
            .data
            .ok_or_else(|| AppError::ExternalService("AniList API returned no data".to_string()))
    }

    /// Map MediaData to a catalog-only TargetEntry
    fn map_media(&self, media: MediaData) -> TargetEntry {
        let progress = match self.kind {
            MediaKind::Anime => MediaProgress::episodic(0, media.episodes.unwrap_or(0)),
            MediaKind::Manga => MediaProgress::Chaptered {
                chapters_read: 0,
                volumes_read: 0,
                total_chapters: media.chapters.unwrap_or(0),
                total_volumes: media.volumes.unwrap_or(0),
            },
        };

        let primary = media
            .title
            .romaji
            .clone()
            .or_else(|| media.title.english.clone())
            .or_else(|| media.title.native.clone())
            .unwrap_or_default();

        MediaEntry::new(media.id, primary.clone(), progress)
            .with_foreign_id(media.id_mal.unwrap_or(0))
            .with_titles(EntryTitles {
                primary,
                english: media.title.english,
                native: media.title.native,
            })
    }
}

#[async_trait]
impl DestinationService for AniListClient {
    async fn get_by_id(&self, id: u64, cancel: &CancellationToken) -> AppResult<TargetEntry> {
        let query = format!(
            "query ($id: Int, $type: MediaType) {{ Media(id: $id, type: $type) {{ {} }} }}",
            MEDIA_FIELDS
        );
        let variables = json!({ "id": id, "type": self.media_type() });

        let response: MediaResponse = self.execute_query(&query, variables, cancel).await?;
        Ok(self.map_media(response.media))
    }

    async fn search_by_title(
        &self,
        title: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<TargetEntry>> {
        let query = format!(
            "query ($search: String, $type: MediaType) {{ Page(page: 1, perPage: 10) {{ \
             media(search: $search, type: $type) {{ {} }} }} }}",
            MEDIA_FIELDS
        );
        let variables = json!({ "search": title, "type": self.media_type() });

        let response: PageResponse = self.execute_query(&query, variables, cancel).await?;
        Ok(response
            .page
            .media
            .into_iter()
            .map(|m| self.map_media(m))
            .collect())
    }

    async fn get_by_foreign_id(
        &self,
        origin_id: u64,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<TargetEntry>> {
        let query = format!(
            "query ($idMal: Int, $type: MediaType) {{ Page(page: 1, perPage: 10) {{ \
             media(idMal: $idMal, type: $type) {{ {} }} }} }}",
            MEDIA_FIELDS
        );
        let variables = json!({ "idMal": origin_id, "type": self.media_type() });

        let response: PageResponse = self.execute_query(&query, variables, cancel).await?;
        Ok(response
            .page
            .media
            .into_iter()
            .map(|m| self.map_media(m))
            .collect())
    }
}
