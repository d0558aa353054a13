use futures::FutureExt;
use futures::stream::{self, StreamExt};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::MigrationSettings;
use crate::error::{AppError, Result};
use crate::migrator::paginator::fetch_user_playlists;
use crate::migrator::playlist::PlaylistMigrator;
use crate::migrator::report::{BatchReport, EventLog, PlaylistMigrationOutcome, SEPARATOR};
use crate::session::{DestinationSession, PlaylistSummary, SourceSession};

/// Runs playlist migrations for one batch request and aggregates the results.
///
/// Either session may be absent (the user never signed in); a batch then
/// fails before any playlist is touched.
pub struct BatchOrchestrator<S, D> {
    source: Option<S>,
    destination: Option<D>,
    settings: MigrationSettings,
}

impl<S, D> BatchOrchestrator<S, D>
where
    S: SourceSession,
    D: DestinationSession,
{
    pub fn new(source: Option<S>, destination: Option<D>, settings: MigrationSettings) -> Self {
        Self {
            source,
            destination,
            settings,
        }
    }

    fn sessions(&self) -> Result<(&S, &D)> {
        let source = self
            .source
            .as_ref()
            .ok_or(AppError::AuthMissing("the source service"))?;
        let destination = self
            .destination
            .as_ref()
            .ok_or(AppError::AuthMissing("the destination service"))?;
        Ok((source, destination))
    }

    /// Every playlist the signed-in source user can see.
    pub async fn list_playlists(&self) -> Result<Vec<PlaylistSummary>> {
        let source = self
            .source
            .as_ref()
            .ok_or(AppError::AuthMissing("the source service"))?;
        fetch_user_playlists(source).await
    }

    /// Migrates all playlists of the source user.
    pub async fn run_all(&self) -> Result<BatchReport> {
        self.sessions()?;
        let ids: Vec<String> = self
            .list_playlists()
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        self.run_batch(&ids).await
    }

    /// Migrates the given playlists in order.
    ///
    /// Only a missing session is an error. Playlist failures of any kind end
    /// up in the returned log, and the playlist is left out of the summary.
    pub async fn run_batch(&self, playlist_ids: &[String]) -> Result<BatchReport> {
        let (source, destination) = self.sessions()?;

        info!("Starting migration of {} playlists", playlist_ids.len());

        let deadline = self.settings.batch_deadline.map(|d| Instant::now() + d);
        let migrator = PlaylistMigrator::new(source, destination, &self.settings);
        let migrator = &migrator;

        // Output order follows input order, so each playlist's log partition
        // and outcome are folded in the order requested.
        let results: Vec<_> = stream::iter(playlist_ids)
            .map(|id| async move { run_isolated(migrator, id, deadline).await })
            .buffered(self.settings.playlist_workers())
            .collect()
            .await;

        let mut report = BatchReport::default();
        for (playlist_id, (mut log, result)) in playlist_ids.iter().zip(results) {
            match result {
                Ok(outcome) => report.summary.record(outcome),
                Err(e) => {
                    warn!("Failed to migrate playlist {}: {}", playlist_id, e);
                    log.push(format!(
                        "!! An error occurred while processing playlist ID {}: {}",
                        playlist_id, e
                    ));
                }
            }
            log.push(SEPARATOR);
            report.log.append(log);
        }

        info!(
            "Batch finished: {} playlists migrated, {} songs found, {} not found",
            report.summary.playlists.len(),
            report.summary.total_success,
            report.summary.total_failed
        );

        Ok(report)
    }
}

/// Migrates one playlist, turning every way it can go wrong into an `Err`.
async fn run_isolated<S, D>(
    migrator: &PlaylistMigrator<'_, S, D>,
    playlist_id: &str,
    deadline: Option<Instant>,
) -> (EventLog, Result<PlaylistMigrationOutcome>)
where
    S: SourceSession + ?Sized,
    D: DestinationSession + ?Sized,
{
    let mut log = EventLog::new();

    if deadline.is_some_and(|d| Instant::now() >= d) {
        return (log, Err(AppError::DeadlineExceeded));
    }

    let caught = {
        let work = AssertUnwindSafe(migrator.migrate(playlist_id, &mut log)).catch_unwind();
        match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, work)
                .await
                .unwrap_or_else(|_| Ok(Err(AppError::DeadlineExceeded))),
            None => work.await,
        }
    };

    let result = caught.unwrap_or_else(|panic| Err(AppError::Panicked(panic_message(&*panic))));
    (log, result)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic".to_string()
    }
}
