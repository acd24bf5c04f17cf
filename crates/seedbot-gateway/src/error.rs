//! Error types for the qBittorrent gateway.

use thiserror::Error;

/// Errors returned by [`TorrentClient`](crate::TorrentClient) operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The client could not be reached at all (down, wrong address,
    /// network partition). Transient by nature: callers log and degrade
    /// rather than abort.
    #[error("qBittorrent unreachable: {0}")]
    Unreachable(String),

    /// The connection is fine but the hash does not reference a live
    /// torrent. A normal, reportable outcome, never fatal.
    #[error("torrent not found: {hash}")]
    NotFound { hash: String },

    /// The client refused the operation (bad credentials, invalid state
    /// transition, queueing disabled for priority moves, ...).
    #[error("qBittorrent rejected the request (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// The client answered with a payload we could not decode.
    #[error("unexpected qBittorrent response: {0}")]
    Protocol(String),

    /// The configured base URL does not parse.
    #[error("invalid qBittorrent URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl GatewayError {
    /// True for connectivity failures, which degrade scheduled jobs at
    /// startup instead of aborting the process.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, GatewayError::Unreachable(_))
    }

    /// True when the target torrent no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            GatewayError::Unreachable(e.to_string())
        } else if e.is_decode() {
            GatewayError::Protocol(e.to_string())
        } else {
            GatewayError::Rejected {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                detail: e.to_string(),
            }
        }
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
