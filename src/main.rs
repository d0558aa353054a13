use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use spotify2ytmusic::spotify::parse_playlist_id;
use spotify2ytmusic::{
    AppError, BatchOrchestrator, BatchReport, BrowserHeaders, Config, MigrationSettings,
    SpotifyClient, YtMusicClient,
};

#[derive(Parser)]
#[command(name = "spotify2ytmusic")]
#[command(about = "Migrate Spotify playlists to YouTube Music")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate all your Spotify playlists to YouTube Music
    MigrateAll {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Migrate specific playlists to YouTube Music
    Migrate {
        /// Spotify playlist IDs, URIs or URLs
        #[arg(required = true)]
        playlists: Vec<String>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// List all your Spotify playlists
    ListPlaylists,

    /// Check that the saved YouTube Music headers still work
    VerifyYtmusic,

    /// Show setup guide
    Setup,
}

#[derive(Args)]
struct RunArgs {
    /// Playlists migrated at the same time
    #[arg(long, env = "MIGRATE_PLAYLIST_CONCURRENCY", default_value_t = 1)]
    playlist_concurrency: usize,

    /// Song searches in flight per playlist
    #[arg(long, env = "MIGRATE_TRACK_CONCURRENCY", default_value_t = 4)]
    track_concurrency: usize,

    /// Timeout for each request, in seconds (0 disables it)
    #[arg(long, env = "MIGRATE_CALL_TIMEOUT_SECS", default_value_t = 30)]
    call_timeout_secs: u64,

    /// Give up on remaining playlists after this many seconds
    #[arg(long, env = "MIGRATE_DEADLINE_SECS")]
    deadline_secs: Option<u64>,

    /// Save the summary and log as JSON into migration_results/
    #[arg(long)]
    save_results: bool,
}

impl RunArgs {
    fn settings(&self) -> MigrationSettings {
        MigrationSettings {
            playlist_concurrency: self.playlist_concurrency,
            track_concurrency: self.track_concurrency,
            call_timeout: (self.call_timeout_secs > 0)
                .then(|| Duration::from_secs(self.call_timeout_secs)),
            batch_deadline: self.deadline_secs.map(Duration::from_secs),
        }
    }
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    match cli.command {
        Commands::MigrateAll { run } => {
            migrate(None, &run).await?;
        }
        Commands::Migrate { playlists, run } => {
            let ids = playlists
                .iter()
                .map(|p| parse_playlist_id(p.as_str()))
                .collect::<spotify2ytmusic::Result<Vec<_>>>()
                .context("Invalid playlist argument")?;
            migrate(Some(ids), &run).await?;
        }
        Commands::ListPlaylists => {
            list_playlists().await?;
        }
        Commands::VerifyYtmusic => {
            verify_ytmusic().await?;
        }
        Commands::Setup => {
            show_setup_guide();
        }
    }

    Ok(())
}

/// Signs in to Spotify when credentials are configured.
async fn connect_spotify(config: &Config) -> Result<Option<SpotifyClient>> {
    let missing = config.get_missing_config();
    if !missing.is_empty() {
        println!("{}", "Missing configuration:".red());
        for item in &missing {
            println!("   - {}", item);
        }
        return Ok(None);
    }

    let client = SpotifyClient::new(config)
        .await
        .context("Failed to connect to Spotify")?;
    Ok(Some(client))
}

/// Loads the saved browser headers, if there are any.
fn connect_ytmusic(path: &Path, timeout: Option<Duration>) -> Result<Option<YtMusicClient>> {
    if !path.exists() {
        println!(
            "{} {}",
            "No YouTube Music headers found at".red(),
            path.display()
        );
        return Ok(None);
    }

    let headers = BrowserHeaders::from_file(path)
        .with_context(|| format!("Failed to read YouTube Music headers from {}", path.display()))?;
    let client = YtMusicClient::new(headers, timeout).context("Failed to build HTTP client")?;
    Ok(Some(client))
}

async fn migrate(playlist_ids: Option<Vec<String>>, run: &RunArgs) -> Result<()> {
    println!("{}", "Spotify to YouTube Music Playlist Migrator".cyan().bold());
    println!("{}", "=".repeat(50));

    let config = Config::from_env();
    let settings = run.settings();

    // Spotify sign-in is interactive; skip it when there is nowhere to migrate to.
    let Some(ytmusic) = connect_ytmusic(&config.ytmusic_headers_file, settings.call_timeout)?
    else {
        anyhow::bail!("YouTube Music headers are required, see `spotify2ytmusic setup`");
    };
    let spotify = connect_spotify(&config).await?;

    let orchestrator = BatchOrchestrator::new(spotify, Some(ytmusic), settings);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .context("Invalid progress template")?,
    );
    spinner.set_message("Migrating playlists");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let report = match &playlist_ids {
        Some(ids) => orchestrator.run_batch(ids).await,
        None => orchestrator.run_all().await,
    };
    spinner.finish_and_clear();

    let report = report
        .inspect_err(print_auth_hint)
        .context("Migration could not start")?;

    println!("{}", report.log);
    print_summary(&report);

    if run.save_results {
        if let Err(e) = report.save(Path::new("migration_results")) {
            warn!("Could not save migration results: {}", e);
        }
    }

    println!("\n{}", "Migration completed!".green());

    Ok(())
}

async fn list_playlists() -> Result<()> {
    println!("{}", "Your Spotify Playlists".cyan().bold());
    println!("{}", "=".repeat(50));

    let config = Config::from_env();

    if !config.validate_spotify_config() {
        println!("{}", "Missing Spotify configuration".red());
        std::process::exit(1);
    }

    let spotify = connect_spotify(&config).await?;
    let orchestrator: BatchOrchestrator<_, YtMusicClient> =
        BatchOrchestrator::new(spotify, None, MigrationSettings::default());

    let playlists = orchestrator
        .list_playlists()
        .await
        .inspect_err(print_auth_hint)
        .context("Failed to fetch playlists")?;

    if playlists.is_empty() {
        println!("{}", "No playlists found".yellow());
        return Ok(());
    }

    for (i, playlist) in playlists.iter().enumerate() {
        println!(
            "{:2}. {} ({} tracks)  {}",
            i + 1,
            playlist.name.green(),
            playlist.total_tracks,
            playlist.id.dimmed()
        );
    }

    println!("\n{}", format!("Total: {} playlists", playlists.len()).cyan());

    Ok(())
}

async fn verify_ytmusic() -> Result<()> {
    let config = Config::from_env();

    let Some(client) = connect_ytmusic(&config.ytmusic_headers_file, None)? else {
        std::process::exit(1);
    };

    match client.verify().await {
        Ok(()) => println!("{}", "YouTube Music connection successful!".green()),
        Err(e) => {
            println!("{} {}", "Failed to verify YouTube Music headers:".red(), e);
            print_auth_hint(&e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn print_auth_hint(error: &AppError) {
    if error.is_auth_failure() {
        println!(
            "{}",
            "Sign in again: check the Spotify credentials in .env and re-copy the YouTube Music headers."
                .yellow()
        );
    }
}

fn print_summary(report: &BatchReport) {
    let summary = &report.summary;

    println!();
    println!("{}", "=".repeat(60));
    println!("{}", "MIGRATION SUMMARY".bold());
    println!("{}", "=".repeat(60));
    println!("Playlists migrated: {}", summary.playlists.len());
    println!("Total tracks processed: {}", summary.total_tracks());
    println!(
        "Total songs transferred: {}",
        summary.total_success.to_string().green()
    );
    println!(
        "Total songs not found: {}",
        summary.total_failed.to_string().red()
    );
    println!("{}", "=".repeat(60));

    println!("\nPlaylist breakdown:");
    for outcome in &summary.playlists {
        let rate = outcome.success_rate();
        let status = if rate >= 90.0 {
            format!("{:.1}%", rate).green()
        } else if rate >= 70.0 {
            format!("{:.1}%", rate).yellow()
        } else {
            format!("{:.1}%", rate).red()
        };

        println!(
            "  {}: {}/{} ({})",
            outcome.source_name, outcome.found_count, outcome.total_tracks, status
        );
        for query in &outcome.not_found_queries {
            println!("     {} {}", "not found:".dimmed(), query);
        }
    }
}

fn show_setup_guide() {
    println!("{}", "Spotify to YouTube Music Migrator Setup Guide".cyan().bold());
    println!("{}", "=".repeat(50));

    println!("\n{}", "1. Spotify API Setup".yellow());
    println!("   - Go to https://developer.spotify.com/dashboard/");
    println!("   - Create a new app");
    println!("   - Copy your Client ID and Client Secret");
    println!("   - Add 'http://127.0.0.1:8080/callback' as a redirect URI");

    println!("\n{}", "2. YouTube Music Headers".yellow());
    println!("   - Open https://music.youtube.com while signed in");
    println!("   - Open the browser dev tools, Network tab, filter on 'browse'");
    println!("   - Copy the request headers of an authenticated POST request");
    println!("   - Paste them into ytmusic_headers.txt (one 'name: value' per line)");

    println!("\n{}", "3. Configuration".yellow());
    println!("   - Create a .env file with:");
    println!("     SPOTIFY_CLIENT_ID=your_spotify_client_id");
    println!("     SPOTIFY_CLIENT_SECRET=your_spotify_client_secret");
    println!("     SPOTIFY_REDIRECT_URI=http://127.0.0.1:8080/callback");
    println!("     YTMUSIC_HEADERS_FILE=ytmusic_headers.txt");

    println!("\n{}", "4. Usage".yellow());
    println!("   - spotify2ytmusic list-playlists          (to see your playlists)");
    println!("   - spotify2ytmusic verify-ytmusic          (to check the headers)");
    println!("   - spotify2ytmusic migrate-all             (to migrate everything)");
    println!("   - spotify2ytmusic migrate <ID or URL>     (to migrate specific playlists)");

    println!("\n{}", "Ready to start migrating!".green());
}
