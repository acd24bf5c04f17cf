//! Telegram bot interface for qBittorrent.
//!
//! The bot receives commands and inline button presses, routes them through
//! a permission gate to torrent operations, and runs two background jobs:
//! a completion poller that announces finished downloads at most once per
//! torrent (persisted across restarts), and a nightly queue-toggle window.

pub mod bot;
pub mod config;
pub mod error;
pub mod format;
pub mod handlers;
pub mod jobs;
pub mod keyboards;
pub mod notifications;
pub mod permissions;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod test_util;

pub use bot::SeedBot;
pub use config::Config;
pub use error::{BotError, Result};
pub use state::AppState;
