// src/config/mod.rs
//
// Run configuration
//
// One explicit value per run. Every flag the resolution pass or a strategy
// reads lives here and is passed down through `RunContext`; nothing is global.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::domain::{DomainError, MediaKind};
use crate::error::{AppError, AppResult};

/// Service key used by crosswalk tables for AniList IDs
pub const ANILIST_SERVICE: &str = "anilist";

/// Service key used by crosswalk tables for MyAnimeList IDs
pub const MAL_SERVICE: &str = "myanimelist";

/// Upper bound on configured live crosswalk services
pub const MAX_LIVE_SERVICES: usize = 2;

/// Which catalog is the origin of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    #[default]
    AnilistToMal,
    MalToAnilist,
}

impl SyncDirection {
    /// Crosswalk key of the origin catalog
    pub fn origin_service(&self) -> &'static str {
        match self {
            SyncDirection::AnilistToMal => ANILIST_SERVICE,
            SyncDirection::MalToAnilist => MAL_SERVICE,
        }
    }

    /// Crosswalk key of the destination catalog
    pub fn destination_service(&self) -> &'static str {
        match self {
            SyncDirection::AnilistToMal => MAL_SERVICE,
            SyncDirection::MalToAnilist => ANILIST_SERVICE,
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            SyncDirection::AnilistToMal => SyncDirection::MalToAnilist,
            SyncDirection::MalToAnilist => SyncDirection::AnilistToMal,
        }
    }
}

impl std::fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.origin_service(), self.destination_service())
    }
}

/// Operator-supplied origin -> destination pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualMapping {
    pub kind: MediaKind,
    pub origin_id: u64,
    pub destination_id: u64,
}

/// Sources excluded before resolution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IgnoreRules {
    #[serde(default)]
    pub ids: HashSet<u64>,

    /// Compared case-insensitively against the primary title
    #[serde(default)]
    pub titles: Vec<String>,
}

impl IgnoreRules {
    pub fn matches(&self, id: u64, title: &str) -> bool {
        if self.ids.contains(&id) {
            return true;
        }
        let title = title.to_lowercase();
        self.titles.iter().any(|t| t.to_lowercase() == title)
    }
}

/// Per-strategy enable flags. Disabled strategies are left out of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyToggles {
    pub exact_id: bool,
    pub manual_mapping: bool,
    pub offline_crosswalk: bool,
    pub live_crosswalk: bool,
    pub title: bool,
    pub foreign_id_search: bool,
    pub api_search: bool,
}

impl Default for StrategyToggles {
    fn default() -> Self {
        Self {
            exact_id: true,
            manual_mapping: true,
            offline_crosswalk: true,
            live_crosswalk: true,
            title: true,
            foreign_id_search: true,
            api_search: true,
        }
    }
}

/// A live ID lookup service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveServiceConfig {
    pub name: String,
    pub base_url: String,

    /// Media kinds the service indexes; other kinds are never queried
    #[serde(default = "default_live_kinds")]
    pub kinds: Vec<MediaKind>,
}

fn default_live_kinds() -> Vec<MediaKind> {
    vec![MediaKind::Anime]
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrosswalkConfig {
    /// Directory holding one JSON cache file per live service.
    /// Defaults to the data dir.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Static offline mapping table. Strategy is disabled when absent.
    #[serde(default)]
    pub offline_table_path: Option<PathBuf>,

    #[serde(default)]
    pub live_services: Vec<LiveServiceConfig>,
}

/// Everything a resolution run needs to know about how it should behave
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub direction: SyncDirection,

    /// Skip matching and trust each source's declared foreign ID
    #[serde(default)]
    pub force_sync: bool,

    /// Resolve and report, never write to the destination
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub ignore: IgnoreRules,

    #[serde(default)]
    pub manual_mappings: Vec<ManualMapping>,

    #[serde(default)]
    pub strategies: StrategyToggles,

    #[serde(default)]
    pub crosswalk: CrosswalkConfig,
}

impl RunConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        log::debug!("Loaded run config from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        for mapping in &self.manual_mappings {
            if mapping.origin_id == 0 || mapping.destination_id == 0 {
                return Err(DomainError::InvalidConfig(format!(
                    "manual mapping {} -> {} contains a zero ID",
                    mapping.origin_id, mapping.destination_id
                )));
            }
            if !seen.insert((mapping.kind, mapping.origin_id)) {
                return Err(DomainError::InvalidConfig(format!(
                    "origin ID {} ({}) is mapped more than once",
                    mapping.origin_id, mapping.kind
                )));
            }
        }

        if self.crosswalk.live_services.len() > MAX_LIVE_SERVICES {
            return Err(DomainError::InvalidConfig(format!(
                "at most {} live crosswalk services are supported, got {}",
                MAX_LIVE_SERVICES,
                self.crosswalk.live_services.len()
            )));
        }

        Ok(())
    }

    /// Cache file for one live service, under `{DATA_DIR}/animesync/` unless
    /// a cache directory is configured
    pub fn cache_path(&self, service_name: &str) -> AppResult<PathBuf> {
        let dir = match &self.crosswalk.cache_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .ok_or_else(|| {
                    AppError::Other("Could not determine app data directory".to_string())
                })?
                .join("animesync"),
        };
        Ok(dir.join(format!("{}_crosswalk_cache.json", service_name)))
    }

    /// Manual mapping for an origin ID, if the operator configured one
    pub fn manual_destination(&self, kind: MediaKind, origin_id: u64) -> Option<u64> {
        self.manual_mappings
            .iter()
            .find(|m| m.kind == kind && m.origin_id == origin_id)
            .map(|m| m.destination_id)
    }
}
