use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_redirect_uri: String,
    pub ytmusic_headers_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let spotify_client_id = std::env::var("SPOTIFY_CLIENT_ID").unwrap_or_default();
        let spotify_client_secret = std::env::var("SPOTIFY_CLIENT_SECRET").unwrap_or_default();

        let spotify_redirect_uri = std::env::var("SPOTIFY_REDIRECT_URI")
            .unwrap_or_else(|_| "http://127.0.0.1:8080/callback".to_string());

        let ytmusic_headers_file = std::env::var("YTMUSIC_HEADERS_FILE")
            .unwrap_or_else(|_| "ytmusic_headers.txt".to_string())
            .into();

        Self {
            spotify_client_id,
            spotify_client_secret,
            spotify_redirect_uri,
            ytmusic_headers_file,
        }
    }

    pub fn get_missing_config(&self) -> Vec<String> {
        let mut missing = Vec::new();

        if self.spotify_client_id.is_empty() {
            missing.push("SPOTIFY_CLIENT_ID".to_string());
        }
        if self.spotify_client_secret.is_empty() {
            missing.push("SPOTIFY_CLIENT_SECRET".to_string());
        }

        missing
    }

    pub fn validate_spotify_config(&self) -> bool {
        !self.spotify_client_id.is_empty() && !self.spotify_client_secret.is_empty()
    }
}

/// Knobs for one batch run.
#[derive(Debug, Clone)]
pub struct MigrationSettings {
    /// Playlists migrated at the same time.
    pub playlist_concurrency: usize,
    /// Search requests in flight per playlist.
    pub track_concurrency: usize,
    /// Limit for every single call to a remote service.
    pub call_timeout: Option<Duration>,
    /// Limit for the whole batch, measured from its start.
    pub batch_deadline: Option<Duration>,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            playlist_concurrency: 1,
            track_concurrency: 4,
            call_timeout: Some(Duration::from_secs(30)),
            batch_deadline: None,
        }
    }
}

impl MigrationSettings {
    pub(crate) fn playlist_workers(&self) -> usize {
        self.playlist_concurrency.max(1)
    }

    pub(crate) fn track_workers(&self) -> usize {
        self.track_concurrency.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_lists_empty_credentials() {
        let config = Config {
            spotify_client_id: String::new(),
            spotify_client_secret: "secret".to_string(),
            spotify_redirect_uri: "http://127.0.0.1:8080/callback".to_string(),
            ytmusic_headers_file: "headers.txt".into(),
        };

        assert_eq!(config.get_missing_config(), vec!["SPOTIFY_CLIENT_ID"]);
        assert!(!config.validate_spotify_config());
    }

    #[test]
    fn test_zero_concurrency_still_makes_progress() {
        let settings = MigrationSettings {
            playlist_concurrency: 0,
            track_concurrency: 0,
            ..MigrationSettings::default()
        };
        assert_eq!(settings.playlist_workers(), 1);
        assert_eq!(settings.track_workers(), 1);
    }
}
