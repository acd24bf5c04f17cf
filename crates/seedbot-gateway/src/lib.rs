//! Gateway to the qBittorrent Web API.
//!
//! The rest of seedbot talks to qBittorrent only through the
//! [`TorrentClient`] trait; [`QbtClient`] is the reqwest-backed
//! implementation speaking Web API v2 (cookie-session login, form-encoded
//! mutations). Tests substitute their own recording implementations.

pub mod client;
pub mod error;
pub mod models;

use async_trait::async_trait;

pub use client::QbtClient;
pub use error::{GatewayError, Result};
pub use models::{Torrent, TorrentFilter, TorrentSummary, Tracker};

/// Operations seedbot needs from the torrent client.
///
/// Every call can fail with [`GatewayError::Unreachable`] when the client is
/// offline; per-hash calls can additionally fail with
/// [`GatewayError::NotFound`] when the hash no longer references a live
/// torrent (deleted between keyboard render and button press).
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Returns the client's application version. Used as the startup
    /// reachability probe.
    async fn version(&self) -> Result<String>;

    /// Lists torrents matching `filter`.
    async fn list(&self, filter: TorrentFilter) -> Result<Vec<TorrentSummary>>;

    /// Fetches full detail for one torrent.
    async fn get(&self, hash: &str) -> Result<Torrent>;

    async fn pause(&self, hash: &str) -> Result<()>;

    async fn resume(&self, hash: &str) -> Result<()>;

    async fn set_force_start(&self, hash: &str, value: bool) -> Result<()>;

    async fn recheck(&self, hash: &str) -> Result<()>;

    /// Deletes a torrent, optionally removing its downloaded files.
    async fn delete(&self, hash: &str, with_files: bool) -> Result<()>;

    async fn increase_priority(&self, hash: &str) -> Result<()>;

    async fn max_priority(&self, hash: &str) -> Result<()>;

    /// Lists tracker records for one torrent.
    async fn trackers(&self, hash: &str) -> Result<Vec<Tracker>>;

    /// Whether the client-wide torrent queueing setting is active.
    async fn queueing_enabled(&self) -> Result<bool>;

    async fn set_queueing_enabled(&self, enabled: bool) -> Result<()>;

    /// Creates a tag if it does not already exist (idempotent on the
    /// client side).
    async fn create_tag(&self, name: &str) -> Result<()>;

    /// Free space on the client's default save path, in bytes, read live
    /// from the client.
    async fn free_space(&self) -> Result<u64>;
}
