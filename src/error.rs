use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication missing for {0}")]
    AuthMissing(&'static str),

    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Could not look up source playlist {playlist_id}: {source}")]
    SourceLookup {
        playlist_id: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Could not create destination playlist '{name}': {source}")]
    DestinationCreate {
        name: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Failed to fetch page: {source}")]
    UpstreamFetch {
        #[source]
        source: Box<AppError>,
    },

    #[error("{0} timed out")]
    Timeout(String),

    #[error("Batch deadline exceeded")]
    DeadlineExceeded,

    #[error("Unexpected failure: {0}")]
    Panicked(String),

    #[error("Spotify API error: {0}")]
    SpotifyApi(#[from] rspotify::ClientError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// True when the remote service rejected our credentials, at any wrapping depth.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            AppError::Unauthenticated(_) | AppError::AuthMissing(_) => true,
            AppError::SourceLookup { source, .. }
            | AppError::DestinationCreate { source, .. }
            | AppError::UpstreamFetch { source } => source.is_auth_failure(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_seen_through_wrappers() {
        let err = AppError::SourceLookup {
            playlist_id: "pl1".to_string(),
            source: Box::new(AppError::Unauthenticated("token expired".into())),
        };
        assert!(err.is_auth_failure());

        let err = AppError::UpstreamFetch {
            source: Box::new(AppError::RateLimited("slow down".into())),
        };
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn test_wrapped_error_message_names_playlist() {
        let err = AppError::SourceLookup {
            playlist_id: "bad-id".to_string(),
            source: Box::new(AppError::NotFound("playlist".into())),
        };
        assert_eq!(
            err.to_string(),
            "Could not look up source playlist bad-id: Not found: playlist"
        );
    }
}
