pub mod orchestrator;
pub mod paginator;
pub mod playlist;
pub mod report;
pub mod resolver;

pub use orchestrator::BatchOrchestrator;
pub use paginator::{fetch_all, fetch_user_playlists};
pub use playlist::PlaylistMigrator;
pub use report::{BatchReport, BatchSummary, EventLog, PlaylistMigrationOutcome};
pub use resolver::TrackResolver;

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Runs one remote call, giving up after `limit`. Dropping the call cancels it.
pub(crate) async fn bounded<T, F>(limit: Option<Duration>, what: &str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| AppError::Timeout(what.to_string()))?,
        None => call.await,
    }
}
