use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Position of the next page inside a remote collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub collection: String,
    pub offset: u32,
}

/// One page of a cursor-paginated collection. `next == None` means exhausted.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<PageCursor>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next: Option<PageCursor>) -> Self {
        Self { items, next }
    }

    #[cfg(test)]
    pub fn exhausted() -> Self {
        Self {
            items: Vec::new(),
            next: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub total_tracks: usize,
}

/// A playlist as returned by the source service, with its first page of items.
#[derive(Debug, Clone)]
pub struct SourcePlaylist {
    pub name: String,
    pub description: String,
    pub tracks: Page<RawTrackItem>,
}

/// A playlist entry exactly as the source reports it. `track` is `None` for
/// removed tracks, podcast episodes and other entries with nothing to search for.
#[derive(Debug, Clone, Default)]
pub struct RawTrackItem {
    pub track: Option<RawTrack>,
}

#[derive(Debug, Clone, Default)]
pub struct RawTrack {
    pub name: String,
    pub artists: Vec<String>,
}

impl RawTrackItem {
    pub fn track(name: &str, artists: &[&str]) -> Self {
        Self {
            track: Some(RawTrack {
                name: name.to_string(),
                artists: artists.iter().map(|a| a.to_string()).collect(),
            }),
        }
    }

    pub fn missing() -> Self {
        Self { track: None }
    }
}

/// Track metadata used for resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub primary_artist: String,
}

impl Track {
    pub fn from_raw(item: &RawTrackItem) -> Option<Self> {
        let raw = item.track.as_ref()?;
        Some(Self {
            title: raw.name.clone(),
            primary_artist: raw.artists.first().cloned().unwrap_or_default(),
        })
    }

    /// Free-text query sent to the destination search.
    pub fn search_query(&self) -> String {
        // No trailing space when the source lists no artist.
        if self.primary_artist.is_empty() {
            return self.title.clone();
        }
        format!("{} {}", self.title, self.primary_artist)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub destination_track_id: String,
    pub display_title: String,
}

/// Read access to the service playlists are migrated from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceSession: Send + Sync {
    /// First page of the user's playlists when `cursor` is `None`.
    async fn user_playlists_page(&self, cursor: Option<PageCursor>) -> Result<Page<PlaylistSummary>>;

    async fn playlist(&self, playlist_id: &str) -> Result<SourcePlaylist>;

    async fn playlist_items_page(&self, cursor: PageCursor) -> Result<Page<RawTrackItem>>;
}

/// Write access to the service playlists are migrated to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DestinationSession: Send + Sync {
    /// Returns the new playlist's ID.
    async fn create_playlist(&self, name: &str, description: &str) -> Result<String>;

    /// Ranked song results, best first, at most `limit` of them.
    async fn search_songs(&self, query: &str, limit: usize) -> Result<Vec<SearchCandidate>>;

    /// Appends items to the playlist. Duplicates are kept.
    async fn add_playlist_items(&self, playlist_id: &str, item_ids: Vec<String>) -> Result<()>;

    fn max_items_per_call(&self) -> usize;
}

#[cfg(test)]
impl SourcePlaylist {
    /// Single-page playlist.
    pub fn mock(name: &str, items: Vec<RawTrackItem>) -> Self {
        Self {
            name: name.to_string(),
            description: format!("{} description", name),
            tracks: Page::new(items, None),
        }
    }
}
