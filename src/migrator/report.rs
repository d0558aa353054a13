use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;

pub const SEPARATOR: &str = "--------------------";

/// Result of migrating a single playlist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistMigrationOutcome {
    #[serde(rename = "name")]
    pub source_name: String,
    #[serde(rename = "total")]
    pub total_tracks: usize,
    #[serde(rename = "found")]
    pub found_count: usize,
    #[serde(rename = "not_found")]
    pub not_found_queries: Vec<String>,
    pub destination_playlist_id: String,
    /// Items the destination accepted. Lower than `found_count` when an add call failed.
    pub inserted_count: usize,
}

impl PlaylistMigrationOutcome {
    pub fn new(source_name: String, destination_playlist_id: String) -> Self {
        Self {
            source_name,
            destination_playlist_id,
            ..Self::default()
        }
    }

    pub fn not_found_count(&self) -> usize {
        self.not_found_queries.len()
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_tracks > 0 {
            (self.found_count as f64 / self.total_tracks as f64) * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    #[serde(rename = "success")]
    pub total_success: usize,
    #[serde(rename = "failed")]
    pub total_failed: usize,
    pub playlists: Vec<PlaylistMigrationOutcome>,
}

impl BatchSummary {
    /// Folds one playlist outcome into the running totals.
    pub fn record(&mut self, outcome: PlaylistMigrationOutcome) {
        self.total_success += outcome.found_count;
        self.total_failed += outcome.not_found_count();
        self.playlists.push(outcome);
    }

    pub fn total_tracks(&self) -> usize {
        self.playlists.iter().map(|p| p.total_tracks).sum()
    }
}

/// Append-only, human-readable trace of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    lines: Vec<String>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Appends every line of `other`, keeping them together.
    pub fn append(&mut self, other: EventLog) {
        self.lines.extend(other.lines);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl fmt::Display for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

/// Everything one batch request hands back to its caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub log: EventLog,
}

impl BatchReport {
    /// Writes the report as pretty JSON into `dir`, named after the current time.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");

        fs::create_dir_all(dir)?;

        let filename = dir.join(format!("migration_results_{}.json", timestamp));
        let json = serde_json::to_string_pretty(self)?;

        fs::write(&filename, json)?;

        info!("Migration results saved to: {}", filename.display());

        Ok(filename)
    }
}
