use serde::{Deserialize, Serialize};

/// One tracked item from either catalog.
///
/// Sources and targets share this shape. `id` addresses the entry inside its
/// own catalog; `foreign_id` is the cross-reference the catalog stores for the
/// counterpart service (0 when unknown). On a source, `foreign_id` is the
/// destination key the source already claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub id: u64,

    #[serde(default)]
    pub foreign_id: u64,

    pub titles: EntryTitles,

    pub progress: MediaProgress,

    /// `None` means the entry is not on the user's list.
    #[serde(default)]
    pub status: Option<ListStatus>,

    /// Score on a 0-10 scale, 0 when unscored
    #[serde(default)]
    pub score: u8,
}

/// Source entries come from the origin catalog
pub type SourceEntry = MediaEntry;

/// Target entries come from the destination catalog
pub type TargetEntry = MediaEntry;

impl MediaEntry {
    pub fn new(id: u64, primary_title: impl Into<String>, progress: MediaProgress) -> Self {
        Self {
            id,
            foreign_id: 0,
            titles: EntryTitles::primary(primary_title),
            progress,
            status: None,
            score: 0,
        }
    }

    pub fn with_foreign_id(mut self, foreign_id: u64) -> Self {
        self.foreign_id = foreign_id;
        self
    }

    pub fn with_status(mut self, status: ListStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_titles(mut self, titles: EntryTitles) -> Self {
        self.titles = titles;
        self
    }

    pub fn with_score(mut self, score: u8) -> Self {
        self.score = score;
        self
    }

    pub fn kind(&self) -> MediaKind {
        self.progress.kind()
    }

    /// Primary title, used for sorting and diagnostics
    pub fn title(&self) -> &str {
        &self.titles.primary
    }

    /// Episode count for anime, chapter count for manga. 0 when unknown.
    pub fn unit_total(&self) -> u32 {
        self.progress.unit_total()
    }

    /// Whether two entries carry the same list state, ignoring identity
    pub fn same_progress(&self, other: &MediaEntry) -> bool {
        self.status == other.status
            && self.score == other.score
            && self.progress.same_counters(&other.progress)
    }
}

impl std::fmt::Display for MediaEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{} #{}]", self.titles.primary, self.kind(), self.id)
    }
}

/// Title variants as the catalogs expose them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTitles {
    /// Romanized title (AniList romaji, MAL main title)
    pub primary: String,

    #[serde(default)]
    pub english: Option<String>,

    #[serde(default)]
    pub native: Option<String>,
}

impl EntryTitles {
    pub fn primary(title: impl Into<String>) -> Self {
        Self {
            primary: title.into(),
            english: None,
            native: None,
        }
    }

    /// All non-blank variants, primary first
    pub fn variants(&self) -> Vec<&str> {
        std::iter::once(self.primary.as_str())
            .chain(self.english.as_deref())
            .chain(self.native.as_deref())
            .filter(|t| !t.trim().is_empty())
            .collect()
    }
}

/// Discriminant of [`MediaProgress`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Anime,
    Manga,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Anime => write!(f, "anime"),
            MediaKind::Manga => write!(f, "manga"),
        }
    }
}

/// Progress counters, tagged by media kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MediaProgress {
    #[serde(rename = "anime")]
    Episodic { watched: u32, total_episodes: u32 },

    #[serde(rename = "manga")]
    Chaptered {
        chapters_read: u32,
        volumes_read: u32,
        total_chapters: u32,
        total_volumes: u32,
    },
}

impl MediaProgress {
    pub fn episodic(watched: u32, total_episodes: u32) -> Self {
        MediaProgress::Episodic {
            watched,
            total_episodes,
        }
    }

    pub fn chaptered(chapters_read: u32, total_chapters: u32) -> Self {
        MediaProgress::Chaptered {
            chapters_read,
            volumes_read: 0,
            total_chapters,
            total_volumes: 0,
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            MediaProgress::Episodic { .. } => MediaKind::Anime,
            MediaProgress::Chaptered { .. } => MediaKind::Manga,
        }
    }

    pub fn unit_total(&self) -> u32 {
        match self {
            MediaProgress::Episodic { total_episodes, .. } => *total_episodes,
            MediaProgress::Chaptered { total_chapters, .. } => *total_chapters,
        }
    }

    fn same_counters(&self, other: &MediaProgress) -> bool {
        match (self, other) {
            (
                MediaProgress::Episodic { watched: a, .. },
                MediaProgress::Episodic { watched: b, .. },
            ) => a == b,
            (
                MediaProgress::Chaptered {
                    chapters_read: ca,
                    volumes_read: va,
                    ..
                },
                MediaProgress::Chaptered {
                    chapters_read: cb,
                    volumes_read: vb,
                    ..
                },
            ) => ca == cb && va == vb,
            _ => false,
        }
    }
}

/// List status shared by both catalogs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStatus {
    Watching,
    Completed,
    OnHold,
    Dropped,
    Planning,
    Rewatching,
}

impl std::fmt::Display for ListStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ListStatus::Watching => "watching",
            ListStatus::Completed => "completed",
            ListStatus::OnHold => "on_hold",
            ListStatus::Dropped => "dropped",
            ListStatus::Planning => "planning",
            ListStatus::Rewatching => "rewatching",
        };
        write!(f, "{}", s)
    }
}
