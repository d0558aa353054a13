use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::config::MigrationSettings;
use crate::error::{AppError, Result};
use crate::migrator::bounded;
use crate::migrator::paginator::fetch_all;
use crate::migrator::report::{EventLog, PlaylistMigrationOutcome};
use crate::migrator::resolver::TrackResolver;
use crate::session::{DestinationSession, SourcePlaylist, SourceSession, Track};

/// Copies one source playlist to the destination service.
pub struct PlaylistMigrator<'a, S: ?Sized, D: ?Sized> {
    source: &'a S,
    destination: &'a D,
    settings: &'a MigrationSettings,
}

impl<'a, S, D> PlaylistMigrator<'a, S, D>
where
    S: SourceSession + ?Sized,
    D: DestinationSession + ?Sized,
{
    pub fn new(source: &'a S, destination: &'a D, settings: &'a MigrationSettings) -> Self {
        Self {
            source,
            destination,
            settings,
        }
    }

    /// Migrates the playlist, writing progress lines to `log`.
    ///
    /// Fails only when the source playlist cannot be read, the destination
    /// playlist cannot be created or a page of source tracks cannot be fetched.
    /// Search and insertion failures are logged and reflected in the outcome.
    pub async fn migrate(
        &self,
        playlist_id: &str,
        log: &mut EventLog,
    ) -> Result<PlaylistMigrationOutcome> {
        let call_timeout = self.settings.call_timeout;

        let SourcePlaylist {
            name,
            description,
            tracks: first_page,
        } = bounded(
            call_timeout,
            "Source playlist lookup",
            self.source.playlist(playlist_id),
        )
        .await
        .map_err(|e| AppError::SourceLookup {
            playlist_id: playlist_id.to_string(),
            source: Box::new(e),
        })?;

        info!("Migrating playlist: {}", name);
        log.push(format!("Processing playlist '{}'...", name));

        let destination_playlist_id = bounded(
            call_timeout,
            "Playlist creation",
            self.destination.create_playlist(&name, &description),
        )
        .await
        .map_err(|e| AppError::DestinationCreate {
            name: name.clone(),
            source: Box::new(e),
        })?;
        log.push(format!("  -> Created destination playlist '{}'.", name));

        let items = fetch_all(first_page, |cursor| {
            bounded(
                call_timeout,
                "Playlist page fetch",
                self.source.playlist_items_page(cursor),
            )
        })
        .await?;

        let tracks: Vec<Track> = items.iter().filter_map(Track::from_raw).collect();

        let mut outcome = PlaylistMigrationOutcome::new(name, destination_playlist_id);
        outcome.total_tracks = tracks.len();

        let resolver = TrackResolver::new(self.destination, call_timeout);
        let resolver = &resolver;
        // `buffered` yields in source order regardless of completion order.
        let resolutions: Vec<_> = stream::iter(&tracks)
            .map(|track| async move { (track.search_query(), resolver.resolve(track).await) })
            .buffered(self.settings.track_workers())
            .collect()
            .await;

        let mut queue = Vec::new();
        for (query, resolution) in resolutions {
            log.push(format!("  -> Searching for '{}'...", query));
            match resolution {
                Ok(Some(candidate)) => {
                    log.push(format!(
                        "     Found: '{}'. Adding to queue.",
                        candidate.display_title
                    ));
                    queue.push(candidate.destination_track_id);
                    outcome.found_count += 1;
                }
                Ok(None) => {
                    log.push("     NOT FOUND.");
                    outcome.not_found_queries.push(query);
                }
                Err(e) => {
                    warn!("Search for '{}' failed: {}", query, e);
                    log.push(format!("     Search failed: {}. NOT FOUND.", e));
                    outcome.not_found_queries.push(query);
                }
            }
        }

        if !queue.is_empty() {
            outcome.inserted_count = self
                .insert_items(
                    &outcome.destination_playlist_id,
                    &outcome.source_name,
                    &queue,
                    log,
                )
                .await;
        }

        info!(
            "Playlist migration completed: {} - {}/{} tracks matched ({:.1}% success rate)",
            outcome.source_name,
            outcome.found_count,
            outcome.total_tracks,
            outcome.success_rate()
        );

        Ok(outcome)
    }

    /// Adds the queued items in chunks of the destination's per-call limit.
    /// Returns how many were accepted.
    async fn insert_items(
        &self,
        playlist_id: &str,
        playlist_name: &str,
        item_ids: &[String],
        log: &mut EventLog,
    ) -> usize {
        let batch_size = self.destination.max_items_per_call().max(1);
        let mut inserted = 0;

        for (i, chunk) in item_ids.chunks(batch_size).enumerate() {
            let added = bounded(
                self.settings.call_timeout,
                "Adding playlist items",
                self.destination
                    .add_playlist_items(playlist_id, chunk.to_vec()),
            )
            .await;

            match added {
                Ok(()) => inserted += chunk.len(),
                Err(e) => {
                    warn!(
                        "Failed to add batch {} to playlist {}: {}",
                        i + 1,
                        playlist_name,
                        e
                    );
                    log.push(format!(
                        "  !! Failed to add {} songs to '{}': {}",
                        chunk.len(),
                        playlist_name,
                        e
                    ));
                }
            }
        }

        if inserted > 0 {
            log.push(format!("  -> Added {} songs to '{}'.", inserted, playlist_name));
        }

        inserted
    }
}
