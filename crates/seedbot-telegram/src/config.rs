//! Bot configuration.
//!
//! Settings load from a TOML file (see `config.example.toml`); the bot
//! token may instead come from the `SEEDBOT_BOT_TOKEN` environment variable
//! (including via a `.env` file). Persisted state lives under the state
//! directory, resolved from `SEEDBOT_STATE_DIR`, then the config file, then
//! `~/.seedbot`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::Deserialize;

use crate::error::{BotError, Result};

/// Environment variable for the bot token.
pub const BOT_TOKEN_ENV: &str = "SEEDBOT_BOT_TOKEN";

/// Environment variable for a custom state directory.
pub const STATE_DIR_ENV: &str = "SEEDBOT_STATE_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".seedbot";

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    120
}

fn default_toggle_time() -> String {
    "02:00".to_string()
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub qbittorrent: QbtConfig,
    #[serde(default)]
    pub state: StateConfig,
}

/// Telegram-side settings: identity, permissions, notification routing.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token; falls back to `SEEDBOT_BOT_TOKEN` when empty.
    #[serde(default)]
    pub token: String,

    /// User IDs allowed to mutate torrents (EDIT, implies READ).
    #[serde(default)]
    pub admin_user_ids: Vec<u64>,

    /// User IDs allowed to view torrents (READ).
    #[serde(default)]
    pub user_ids: Vec<u64>,

    /// Master switch for completion notifications.
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,

    /// Chat that receives completion notifications. Unset disables them.
    #[serde(default)]
    pub notify_chat_id: Option<i64>,

    /// Chat that receives job-failure reports. Optional.
    #[serde(default)]
    pub operator_chat_id: Option<i64>,

    /// Torrents carrying this tag (case-insensitive) are never announced.
    #[serde(default)]
    pub no_notify_tag: Option<String>,
}

/// qBittorrent connection and job settings.
#[derive(Debug, Clone, Deserialize)]
pub struct QbtConfig {
    /// Web UI base URL, e.g. `http://localhost:8080`.
    pub url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Tag created at startup so new torrents can be labelled. Optional.
    #[serde(default)]
    pub added_torrents_tag: Option<String>,

    /// Whether the nightly queue-toggle job does anything.
    #[serde(default)]
    pub queue_toggle_enabled: bool,

    /// Wall-clock HH:MM (local time) for the nightly queue toggle.
    #[serde(default = "default_toggle_time")]
    pub queue_toggle_time: String,

    /// Seconds between completion polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

/// Where persisted sets live.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Loads and validates a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| BotError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&raw).map_err(|source| BotError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        // Fail on a bad toggle time now, not at 02:00
        config.queue_toggle_time()?;
        Ok(config)
    }

    /// The bot token from config or environment.
    pub fn bot_token(&self) -> Result<String> {
        if !self.telegram.token.is_empty() {
            return Ok(self.telegram.token.clone());
        }
        std::env::var(BOT_TOKEN_ENV).map_err(|_| BotError::NoToken)
    }

    /// The parsed nightly toggle time.
    pub fn queue_toggle_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.qbittorrent.queue_toggle_time, "%H:%M")
            .map_err(|_| BotError::BadToggleTime(self.qbittorrent.queue_toggle_time.clone()))
    }

    /// The directory holding `completed.json` and `do_not_notify.json`.
    pub fn state_dir(&self) -> PathBuf {
        if let Ok(dir) = std::env::var(STATE_DIR_ENV) {
            return PathBuf::from(dir);
        }
        if let Some(dir) = &self.state.dir {
            return dir.clone();
        }
        dirs::home_dir()
            .map(|h| h.join(DEFAULT_STATE_DIR))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[telegram]
token = "123:abc"
admin_user_ids = [1]

[qbittorrent]
url = "http://localhost:8080"
"#;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_minimal_config_defaults() {
        let file = write_config(MINIMAL);
        let config = Config::load(file.path()).unwrap();

        assert!(config.telegram.notifications_enabled);
        assert_eq!(config.qbittorrent.poll_interval_secs, 120);
        assert_eq!(config.qbittorrent.queue_toggle_time, "02:00");
        assert!(!config.qbittorrent.queue_toggle_enabled);
        assert_eq!(config.bot_token().unwrap(), "123:abc");
    }

    #[test]
    fn test_toggle_time_parses() {
        let file = write_config(MINIMAL);
        let config = Config::load(file.path()).unwrap();

        let time = config.queue_toggle_time().unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(2, 0, 0).unwrap());
    }

    #[test]
    fn test_bad_toggle_time_fails_at_load() {
        let file = write_config(
            r#"
[telegram]
token = "t"

[qbittorrent]
url = "http://localhost:8080"
queue_toggle_time = "25:99"
"#,
        );
        let result = Config::load(file.path());
        assert!(matches!(result, Err(BotError::BadToggleTime(_))));
    }

    #[test]
    fn test_malformed_config_fails() {
        let file = write_config("telegram = nope");
        assert!(matches!(
            Config::load(file.path()),
            Err(BotError::ConfigParse { .. })
        ));
    }
}
