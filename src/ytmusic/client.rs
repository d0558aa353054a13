use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::session::{DestinationSession, SearchCandidate};
use crate::ytmusic::auth::{BrowserHeaders, YTM_ORIGIN};
use crate::ytmusic::models::{
    Context, CreatePlaylistRequest, CreatePlaylistResponse, EditAction, EditPlaylistRequest,
    EditPlaylistResponse, SearchRequest, SearchResponse,
};

const YTM_API_BASE: &str = "https://music.youtube.com/youtubei/v1";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Search params restricting results to the "Songs" shelf.
const SONGS_FILTER: &str = "EgWKAQIIAWoMEA4QChADEAQQCRAF";

const MAX_ITEMS_PER_CALL: usize = 100;

pub struct YtMusicClient {
    http_client: Client,
    headers: BrowserHeaders,
}

impl YtMusicClient {
    pub fn new(headers: BrowserHeaders, request_timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(headers.user_agent().unwrap_or(DEFAULT_USER_AGENT).to_string());
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
            headers,
        })
    }

    /// Confirms the headers still belong to a signed-in account.
    pub async fn verify(&self) -> Result<()> {
        #[derive(Serialize)]
        struct AccountMenuRequest {
            context: Context,
        }

        let _: serde_json::Value = self
            .post(
                "account/account_menu",
                &AccountMenuRequest {
                    context: context(),
                },
            )
            .await?;

        info!("YouTube Music headers verified");
        Ok(())
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", YTM_API_BASE, endpoint);

        let response = self
            .http_client
            .post(&url)
            .query(&[("alt", "json")])
            .header("accept", "*/*")
            .header("origin", YTM_ORIGIN)
            .header("x-origin", YTM_ORIGIN)
            .header("cookie", self.headers.cookie())
            .header("x-goog-authuser", self.headers.auth_user())
            .header("authorization", self.headers.authorization(Utc::now().timestamp()))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            debug!("YouTube Music {} failed ({}): {}", endpoint, status, error_text);
            return Err(status_error(status, endpoint));
        }

        Ok(response.json().await?)
    }
}

fn context() -> Context {
    Context::web_remix(format!("1.{}.01.00", Utc::now().format("%Y%m%d")))
}

fn status_error(status: StatusCode, endpoint: &str) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthenticated(format!(
            "YouTube Music rejected the headers for {}",
            endpoint
        )),
        StatusCode::NOT_FOUND => AppError::NotFound(format!("YouTube Music {}", endpoint)),
        StatusCode::TOO_MANY_REQUESTS => {
            AppError::RateLimited(format!("YouTube Music {}", endpoint))
        }
        _ => AppError::Upstream(format!("YouTube Music {} failed with {}", endpoint, status)),
    }
}

#[async_trait]
impl DestinationSession for YtMusicClient {
    async fn create_playlist(&self, name: &str, description: &str) -> Result<String> {
        let request = CreatePlaylistRequest {
            context: context(),
            title: name,
            description,
            privacy_status: "PRIVATE",
        };

        let response: CreatePlaylistResponse = self.post("playlist/create", &request).await?;
        let playlist_id = response
            .playlist_id
            .ok_or_else(|| AppError::Upstream("Playlist creation returned no playlist ID".into()))?;

        info!("Created YouTube Music playlist: {}", name);
        Ok(playlist_id)
    }

    async fn search_songs(&self, query: &str, limit: usize) -> Result<Vec<SearchCandidate>> {
        let request = SearchRequest {
            context: context(),
            query,
            params: SONGS_FILTER,
        };

        let response: SearchResponse = self.post("search", &request).await?;

        let mut candidates = response.into_candidates();
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn add_playlist_items(&self, playlist_id: &str, item_ids: Vec<String>) -> Result<()> {
        if item_ids.is_empty() {
            return Ok(());
        }

        let request = EditPlaylistRequest {
            context: context(),
            playlist_id,
            actions: item_ids
                .iter()
                .map(|id| EditAction {
                    action: "ACTION_ADD_VIDEO",
                    added_video_id: id,
                    dedupe_option: "DEDUPE_OPTION_SKIP",
                })
                .collect(),
        };

        let response: EditPlaylistResponse = self.post("browse/edit_playlist", &request).await?;

        match response.status.as_deref() {
            Some(status) if status.contains("SUCCEEDED") => {
                info!("Added {} tracks to playlist", item_ids.len());
                Ok(())
            }
            other => {
                warn!("Failed to add tracks to playlist: {:?}", other);
                Err(AppError::Upstream(format!(
                    "Adding items returned status {}",
                    other.unwrap_or("none")
                )))
            }
        }
    }

    fn max_items_per_call(&self) -> usize {
        MAX_ITEMS_PER_CALL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_errors_keep_auth_distinct() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "search"),
            AppError::Unauthenticated(_)
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "search"),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "search"),
            AppError::RateLimited(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "search"),
            AppError::Upstream(_)
        ));
    }

    #[test]
    fn test_client_version_uses_current_date() {
        let version = context().client.client_version;
        assert!(version.starts_with("1.20"));
        assert!(version.ends_with(".01.00"));
        assert_eq!(version.len(), "1.20260101.01.00".len());
    }
}
