pub mod config;
pub mod error;
pub mod migrator;
pub mod session;
pub mod spotify;
pub mod ytmusic;

pub use config::{Config, MigrationSettings};
pub use error::{AppError, Result};
pub use migrator::{BatchOrchestrator, BatchReport, BatchSummary, EventLog, PlaylistMigrationOutcome};
pub use session::{DestinationSession, SearchCandidate, SourceSession, Track};
pub use spotify::SpotifyClient;
pub use ytmusic::{BrowserHeaders, YtMusicClient};
