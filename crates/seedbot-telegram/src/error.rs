//! Error types for the Telegram bot.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the Telegram bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Bot token not provided.
    #[error("Telegram bot token not set. Put it in the config file or set SEEDBOT_BOT_TOKEN.")]
    NoToken,

    /// Config file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Config file could not be parsed.
    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// `queue_toggle_time` is not a valid HH:MM wall-clock time.
    #[error("invalid queue_toggle_time {0:?}, expected HH:MM")]
    BadToggleTime(String),

    /// qBittorrent gateway error.
    #[error(transparent)]
    Gateway(#[from] seedbot_gateway::GatewayError),

    /// Persisted-state error. Fatal at startup: the bot must not run with
    /// unknown dedup state.
    #[error(transparent)]
    Persistence(#[from] seedbot_persistence::PersistenceError),

    /// Telegram API error.
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;
