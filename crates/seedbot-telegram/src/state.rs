//! Shared state for the Telegram bot.

use std::sync::Arc;

use seedbot_gateway::TorrentClient;
use seedbot_persistence::HashStore;
use tracing::info;

use crate::config::Config;
use crate::error::Result;

/// State shared across all handlers and jobs.
///
/// The gateway is injected here once at startup; nothing else in the crate
/// constructs or holds a client handle.
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<dyn TorrentClient>,
    /// Hashes already announced as completed. Only
    /// [`HashStore::mark_new`] inserts into this set.
    pub completed: HashStore,
    /// Hashes excluded from notification; may be edited externally and is
    /// refreshed every poll.
    pub do_not_notify: HashStore,
}

impl AppState {
    /// Opens the persisted sets and assembles the shared state.
    ///
    /// Fails when a state file exists but cannot be parsed: running with
    /// unknown dedup state would re-announce every completed torrent.
    pub fn new(config: Config, gateway: Arc<dyn TorrentClient>) -> Result<Self> {
        let state_dir = config.state_dir();
        let completed = HashStore::completed(&state_dir)?;
        let do_not_notify = HashStore::do_not_notify(&state_dir)?;

        info!(
            dir = %state_dir.display(),
            completed = completed.len(),
            suppressed = do_not_notify.len(),
            "loaded persisted state"
        );

        Ok(Self {
            config,
            gateway,
            completed,
            do_not_notify,
        })
    }
}
