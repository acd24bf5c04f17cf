//! Domain types read from the qBittorrent Web API.

use serde::Deserialize;

/// Server-side torrent list filter (`/torrents/info?filter=`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorrentFilter {
    All,
    Downloading,
    Completed,
    Paused,
    Active,
    Inactive,
}

impl TorrentFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            TorrentFilter::All => "all",
            TorrentFilter::Downloading => "downloading",
            TorrentFilter::Completed => "completed",
            TorrentFilter::Paused => "paused",
            TorrentFilter::Active => "active",
            TorrentFilter::Inactive => "inactive",
        }
    }

    /// Parses a user-supplied filter word, defaulting to `All`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "all" => Some(TorrentFilter::All),
            "downloading" => Some(TorrentFilter::Downloading),
            "completed" => Some(TorrentFilter::Completed),
            "paused" => Some(TorrentFilter::Paused),
            "active" => Some(TorrentFilter::Active),
            "inactive" => Some(TorrentFilter::Inactive),
            _ => None,
        }
    }
}

/// One row of `/torrents/info`, enough for lists and dedup.
#[derive(Debug, Clone, Deserialize)]
pub struct TorrentSummary {
    pub hash: String,
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub progress: f64,
}

/// Full torrent detail, fetched per hash.
#[derive(Debug, Clone, Deserialize)]
pub struct Torrent {
    pub hash: String,
    pub name: String,
    pub state: String,
    pub size: i64,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub dlspeed: i64,
    #[serde(default)]
    pub upspeed: i64,
    #[serde(default)]
    pub num_seeds: i64,
    #[serde(default)]
    pub num_leechs: i64,
    #[serde(default)]
    pub eta: i64,
    #[serde(default)]
    pub category: String,
    /// Comma-separated tag list, as the API reports it.
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub save_path: String,
    #[serde(default)]
    pub force_start: bool,
}

impl Torrent {
    /// Tags as individual trimmed strings.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// True once the torrent has all its data.
    pub fn is_completed(&self) -> bool {
        self.progress >= 1.0
    }
}

/// One tracker record from `/torrents/trackers`.
#[derive(Debug, Clone, Deserialize)]
pub struct Tracker {
    pub url: String,
    pub status: i32,
    #[serde(default)]
    pub num_peers: i64,
    #[serde(default)]
    pub msg: String,
}

impl Tracker {
    /// Human-readable tracker status, per the Web API status codes.
    pub fn status_text(&self) -> &'static str {
        match self.status {
            0 => "disabled",
            1 => "not contacted",
            2 => "working",
            3 => "updating",
            4 => "not working",
            _ => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_list_splits_and_trims() {
        let torrent = Torrent {
            hash: "a1".into(),
            name: "t".into(),
            state: "uploading".into(),
            size: 0,
            progress: 1.0,
            dlspeed: 0,
            upspeed: 0,
            num_seeds: 0,
            num_leechs: 0,
            eta: 0,
            category: String::new(),
            tags: "linux, iso ,".into(),
            save_path: String::new(),
            force_start: false,
        };

        assert_eq!(torrent.tag_list(), vec!["linux", "iso"]);
        assert!(torrent.is_completed());
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!(TorrentFilter::parse(""), Some(TorrentFilter::All));
        assert_eq!(TorrentFilter::parse("Completed"), Some(TorrentFilter::Completed));
        assert_eq!(TorrentFilter::parse("bogus"), None);
    }

    #[test]
    fn test_tracker_status_text() {
        let tracker = Tracker {
            url: "http://tracker.example/announce".into(),
            status: 2,
            num_peers: 12,
            msg: String::new(),
        };
        assert_eq!(tracker.status_text(), "working");
    }
}
