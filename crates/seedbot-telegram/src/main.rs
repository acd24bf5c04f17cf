//! Seedbot binary.
//!
//! Start the bot with:
//! ```bash
//! SEEDBOT_BOT_TOKEN=xxx seedbot --config config.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use seedbot_gateway::{QbtClient, TorrentClient, TorrentFilter};
use seedbot_telegram::{bot::SeedBot, jobs, AppState, Config};
use teloxide::Bot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Seedbot - control qBittorrent from Telegram
#[derive(Parser, Debug)]
#[command(name = "seedbot")]
#[command(about = "Telegram bot for managing a remote qBittorrent instance")]
struct Args {
    /// Path to the config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let _ = dotenvy::dotenv();

    let filter = match args.verbose {
        0 => "seedbot=info,seedbot_telegram=info,seedbot_gateway=info,teloxide=warn",
        1 => "seedbot=debug,seedbot_telegram=debug,seedbot_gateway=debug,teloxide=info",
        2 => "seedbot=trace,seedbot_telegram=trace,seedbot_gateway=trace,teloxide=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load(&args.config)?;
    let token = config.bot_token()?;

    let gateway: Arc<dyn TorrentClient> = Arc::new(QbtClient::new(
        &config.qbittorrent.url,
        &config.qbittorrent.username,
        &config.qbittorrent.password,
    )?);

    let state = Arc::new(AppState::new(config, Arc::clone(&gateway))?);
    let bot = Bot::new(token);

    // Jobs register only when qBittorrent answers at startup; there is no
    // later retry, a restart picks the connection back up
    match gateway.version().await {
        Ok(version) => {
            info!(%version, "connected to qbittorrent");
            startup_sync(&state).await;
            jobs::spawn_jobs(bot.clone(), Arc::clone(&state));
        }
        Err(e) => {
            warn!(error = %e, "qbittorrent is not online, running without scheduled jobs");
        }
    }

    SeedBot::new(bot, state).run().await?;
    Ok(())
}

/// One-time startup work against a reachable gateway: ensure the configured
/// tag exists and seed the dedup set with everything already completed, so
/// the first poll does not announce old torrents.
async fn startup_sync(state: &AppState) {
    if let Some(tag) = &state.config.qbittorrent.added_torrents_tag {
        if let Err(e) = state.gateway.create_tag(tag).await {
            warn!(%tag, error = %e, "could not create the added-torrents tag");
        }
    }

    match state.gateway.list(TorrentFilter::Completed).await {
        Ok(torrents) => {
            let hashes: Vec<String> = torrents.into_iter().map(|t| t.hash).collect();
            let count = hashes.len();
            if let Err(e) = state.completed.insert_all(hashes) {
                warn!(error = %e, "could not backfill the completed set");
            } else {
                info!(count, "backfilled already-completed torrents");
            }
        }
        Err(e) => {
            warn!(error = %e, "could not list completed torrents for backfill");
        }
    }
}
