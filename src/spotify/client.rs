use async_trait::async_trait;
use rspotify::{
    AuthCodeSpotify, ClientError, Credentials, OAuth,
    http::HttpError,
    model::{PlayableItem, PlaylistId, PlaylistItem},
    prelude::*,
    scopes,
};
use std::io::{self, Write};
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::session::{
    Page, PageCursor, PlaylistSummary, RawTrack, RawTrackItem, SourcePlaylist, SourceSession,
};

const PLAYLISTS_PAGE_SIZE: u32 = 50;
const ITEMS_PAGE_SIZE: u32 = 100;
const USER_PLAYLISTS: &str = "me";

pub struct SpotifyClient {
    client: AuthCodeSpotify,
}

impl SpotifyClient {
    pub async fn new(config: &Config) -> Result<Self> {
        let creds = Credentials::new(&config.spotify_client_id, &config.spotify_client_secret);

        let oauth = OAuth {
            redirect_uri: config.spotify_redirect_uri.clone(),
            scopes: scopes!("playlist-read-private", "playlist-read-collaborative"),
            ..Default::default()
        };

        let client = AuthCodeSpotify::new(creds, oauth);

        // Get authorization URL
        let auth_url = client.get_authorize_url(false)?;
        println!("\nOpen this URL in your browser to authorize Spotify:");
        println!("{}\n", auth_url);

        print!("Enter the URL you were redirected to: ");
        io::stdout().flush()?;

        let mut redirect_url = String::new();
        io::stdin().read_line(&mut redirect_url)?;

        let code = client
            .parse_response_code(redirect_url.trim())
            .ok_or_else(|| AppError::Unauthenticated("Failed to parse authorization code".into()))?;

        client.request_token(&code).await?;

        let user = client.current_user().await?;
        let display_name = user.display_name.unwrap_or_else(|| user.id.to_string());

        info!("Successfully authenticated as Spotify user: {}", display_name);

        Ok(Self { client })
    }
}

#[async_trait]
impl SourceSession for SpotifyClient {
    async fn user_playlists_page(&self, cursor: Option<PageCursor>) -> Result<Page<PlaylistSummary>> {
        let offset = cursor.map(|c| c.offset).unwrap_or(0);

        let page = self
            .client
            .current_user_playlists_manual(Some(PLAYLISTS_PAGE_SIZE), Some(offset))
            .await
            .map_err(|e| classify(e, "Listing playlists"))?;

        let items = page
            .items
            .iter()
            .map(|p| PlaylistSummary {
                id: p.id.id().to_string(),
                name: p.name.clone(),
                total_tracks: p.tracks.total as usize,
            })
            .collect();

        Ok(Page::new(
            items,
            next_cursor(USER_PLAYLISTS, page.next.as_deref(), page.offset, page.limit),
        ))
    }

    async fn playlist(&self, playlist_id: &str) -> Result<SourcePlaylist> {
        let id = PlaylistId::from_id(playlist_id)
            .map_err(|e| AppError::NotFound(format!("Invalid playlist ID {}: {}", playlist_id, e)))?;

        let playlist = self
            .client
            .playlist(id.clone_static(), None, None)
            .await
            .map_err(|e| classify(e, "Fetching playlist"))?;

        info!(
            "Fetched playlist: {} ({} tracks)",
            playlist.name, playlist.tracks.total
        );

        let tracks = Page::new(
            playlist.tracks.items.iter().map(raw_item).collect(),
            next_cursor(
                playlist_id,
                playlist.tracks.next.as_deref(),
                playlist.tracks.offset,
                playlist.tracks.limit,
            ),
        );

        Ok(SourcePlaylist {
            name: playlist.name,
            description: playlist.description.unwrap_or_default(),
            tracks,
        })
    }

    async fn playlist_items_page(&self, cursor: PageCursor) -> Result<Page<RawTrackItem>> {
        let id = PlaylistId::from_id(cursor.collection.as_str())
            .map_err(|e| AppError::NotFound(format!("Invalid playlist ID {}: {}", cursor.collection, e)))?;

        let page = self
            .client
            .playlist_items_manual(
                id.clone_static(),
                None,
                None,
                Some(ITEMS_PAGE_SIZE),
                Some(cursor.offset),
            )
            .await
            .map_err(|e| classify(e, "Fetching playlist items"))?;

        debug!(
            "Fetched {} items at offset {} of {}",
            page.items.len(),
            page.offset,
            cursor.collection
        );

        Ok(Page::new(
            page.items.iter().map(raw_item).collect(),
            next_cursor(&cursor.collection, page.next.as_deref(), page.offset, page.limit),
        ))
    }
}

fn next_cursor(collection: &str, next: Option<&str>, offset: u32, limit: u32) -> Option<PageCursor> {
    next.map(|_| PageCursor {
        collection: collection.to_string(),
        offset: offset + limit,
    })
}

/// Podcast episodes and removed tracks have nothing to search for.
fn raw_item(item: &PlaylistItem) -> RawTrackItem {
    match &item.track {
        Some(PlayableItem::Track(track)) => RawTrackItem {
            track: Some(RawTrack {
                name: track.name.clone(),
                artists: track.artists.iter().map(|a| a.name.clone()).collect(),
            }),
        },
        _ => RawTrackItem::missing(),
    }
}

/// Maps rspotify failures onto the session error kinds.
fn classify(err: ClientError, what: &str) -> AppError {
    if let ClientError::Http(http) = &err {
        if let HttpError::StatusCode(response) = http.as_ref() {
            return match response.status().as_u16() {
                401 => AppError::Unauthenticated(format!("{}: Spotify rejected the token", what)),
                404 => AppError::NotFound(format!("{}: not found on Spotify", what)),
                429 => AppError::RateLimited(format!("{}: Spotify rate limit hit", what)),
                code => AppError::Upstream(format!("{} failed with HTTP {}", what, code)),
            };
        }
    }
    AppError::SpotifyApi(err)
}

/// Extracts a playlist ID from a raw ID, a `spotify:playlist:` URI or an
/// `open.spotify.com` playlist URL.
pub fn parse_playlist_id(input: &str) -> Result<String> {
    let input = input.trim();

    if let Some(id) = input.strip_prefix("spotify:playlist:") {
        return Ok(id.to_string());
    }

    if !input.contains("://") {
        return Ok(input.to_string());
    }

    let url = Url::parse(input).map_err(|e| AppError::Config(format!("Invalid URL: {}", e)))?;

    let path_segments: Vec<&str> = url
        .path_segments()
        .ok_or_else(|| AppError::Config("Invalid Spotify URL".into()))?
        .collect();

    // Expect /playlist/{id}
    if path_segments.len() >= 2 && path_segments[0] == "playlist" {
        Ok(path_segments[1].to_string())
    } else {
        Err(AppError::Config(
            "URL does not appear to be a Spotify playlist URL".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_playlist_url() {
        assert_eq!(
            parse_playlist_id("https://open.spotify.com/playlist/37i9dQZF1E8NC99vGqLsaH?si=abc")
                .unwrap(),
            "37i9dQZF1E8NC99vGqLsaH"
        );
    }

    #[test]
    fn test_parse_playlist_uri_and_raw_id() {
        assert_eq!(
            parse_playlist_id("spotify:playlist:37i9dQZF1E8NC99vGqLsaH").unwrap(),
            "37i9dQZF1E8NC99vGqLsaH"
        );
        assert_eq!(
            parse_playlist_id(" 37i9dQZF1E8NC99vGqLsaH ").unwrap(),
            "37i9dQZF1E8NC99vGqLsaH"
        );
    }

    #[test]
    fn test_parse_rejects_non_playlist_url() {
        assert!(parse_playlist_id("https://open.spotify.com/album/1234").is_err());
    }

    #[test]
    fn test_next_cursor_only_when_more_pages() {
        assert_eq!(
            next_cursor("pl", Some("https://api.spotify.com/..."), 100, 100),
            Some(PageCursor {
                collection: "pl".to_string(),
                offset: 200,
            })
        );
        assert_eq!(next_cursor("pl", None, 100, 100), None);
    }
}
