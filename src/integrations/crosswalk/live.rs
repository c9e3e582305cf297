// src/integrations/crosswalk/live.rs
//
// Live ID lookup service.
//
// Queries `GET {base_url}/ids?source={origin}&id={id}` and reads the
// destination key out of the returned ID object. A 404 means the service
// does not know the title.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::{LiveServiceConfig, SyncDirection};
use crate::domain::MediaKind;
use crate::error::{AppError, AppResult};
use crate::integrations::crosswalk::CrosswalkSource;

const USER_AGENT: &str = concat!("animesync/", env!("CARGO_PKG_VERSION"));

pub struct LiveCrosswalkService {
    name: String,
    base_url: String,
    kinds: Vec<MediaKind>,
    origin_service: &'static str,
    destination_service: &'static str,
    http_client: Client,
}

impl LiveCrosswalkService {
    pub fn new(config: &LiveServiceConfig, direction: SyncDirection) -> AppResult<Self> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            name: config.name.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            kinds: config.kinds.clone(),
            origin_service: direction.origin_service(),
            destination_service: direction.destination_service(),
            http_client,
        })
    }

    pub fn supports(&self, kind: MediaKind) -> bool {
        self.kinds.contains(&kind)
    }

    fn lookup_url(&self, origin_id: u64) -> String {
        format!(
            "{}/ids?source={}&id={}",
            self.base_url, self.origin_service, origin_id
        )
    }

    fn extract(&self, ids: &HashMap<String, Option<u64>>) -> Option<u64> {
        ids.get(self.destination_service)
            .copied()
            .flatten()
            .filter(|id| *id != 0)
    }

    async fn fetch(&self, origin_id: u64) -> AppResult<Option<u64>> {
        let url = self.lookup_url(origin_id);
        log::debug!("Querying {} crosswalk: {}", self.name, url);

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AppError::ExternalService(format!(
                "{} crosswalk returned status: {}",
                self.name, status
            )));
        }

        // Body is `null` when the service has no record
        let ids: Option<HashMap<String, Option<u64>>> = response.json().await?;
        Ok(ids.as_ref().and_then(|ids| self.extract(ids)))
    }
}

#[async_trait]
impl CrosswalkSource for LiveCrosswalkService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(
        &self,
        kind: MediaKind,
        origin_id: u64,
        cancel: &CancellationToken,
    ) -> AppResult<Option<u64>> {
        if !self.supports(kind) {
            return Ok(None);
        }

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AppError::Cancelled),
            result = self.fetch(origin_id) => result,
        }
    }
}
