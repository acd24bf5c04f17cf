//! Shared test fixtures: a recording mock gateway and state builders.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use seedbot_gateway::{
    GatewayError, Result as GatewayResult, Torrent, TorrentClient, TorrentFilter, TorrentSummary,
    Tracker,
};
use tempfile::TempDir;

use crate::config::{Config, QbtConfig, StateConfig, TelegramConfig};
use crate::state::AppState;

/// In-memory gateway that records every call it receives.
#[derive(Default)]
pub(crate) struct MockGateway {
    torrents: Mutex<HashMap<String, Torrent>>,
    trackers: Mutex<Vec<Tracker>>,
    calls: Mutex<Vec<String>>,
    pub queueing_active: Mutex<bool>,
    pub free: Mutex<u64>,
    pub unreachable: Mutex<bool>,
}

impl MockGateway {
    pub fn add_torrent(&self, torrent: Torrent) {
        self.torrents
            .lock()
            .unwrap()
            .insert(torrent.hash.clone(), torrent);
    }

    pub fn set_trackers(&self, trackers: Vec<Tracker>) {
        *self.trackers.lock().unwrap() = trackers;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_reachable(&self) -> GatewayResult<()> {
        if *self.unreachable.lock().unwrap() {
            Err(GatewayError::Unreachable("mock offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TorrentClient for MockGateway {
    async fn version(&self) -> GatewayResult<String> {
        self.record("version".to_string());
        self.check_reachable()?;
        Ok("mock".to_string())
    }

    async fn list(&self, filter: TorrentFilter) -> GatewayResult<Vec<TorrentSummary>> {
        self.record(format!("list:{}", filter.as_str()));
        self.check_reachable()?;
        let torrents = self.torrents.lock().unwrap();
        Ok(torrents
            .values()
            .filter(|t| filter != TorrentFilter::Completed || t.is_completed())
            .map(|t| TorrentSummary {
                hash: t.hash.clone(),
                name: t.name.clone(),
                state: t.state.clone(),
                progress: t.progress,
            })
            .collect())
    }

    async fn get(&self, hash: &str) -> GatewayResult<Torrent> {
        self.record(format!("get:{hash}"));
        self.check_reachable()?;
        self.torrents
            .lock()
            .unwrap()
            .get(hash)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound {
                hash: hash.to_string(),
            })
    }

    async fn pause(&self, hash: &str) -> GatewayResult<()> {
        self.record(format!("pause:{hash}"));
        Ok(())
    }

    async fn resume(&self, hash: &str) -> GatewayResult<()> {
        self.record(format!("resume:{hash}"));
        Ok(())
    }

    async fn set_force_start(&self, hash: &str, value: bool) -> GatewayResult<()> {
        self.record(format!("set_force_start:{hash}:{value}"));
        Ok(())
    }

    async fn recheck(&self, hash: &str) -> GatewayResult<()> {
        self.record(format!("recheck:{hash}"));
        Ok(())
    }

    async fn delete(&self, hash: &str, with_files: bool) -> GatewayResult<()> {
        let mode = if with_files { "with_files" } else { "keep_files" };
        self.record(format!("delete:{hash}:{mode}"));
        self.torrents.lock().unwrap().remove(hash);
        Ok(())
    }

    async fn increase_priority(&self, hash: &str) -> GatewayResult<()> {
        self.record(format!("increase_priority:{hash}"));
        Ok(())
    }

    async fn max_priority(&self, hash: &str) -> GatewayResult<()> {
        self.record(format!("max_priority:{hash}"));
        Ok(())
    }

    async fn trackers(&self, hash: &str) -> GatewayResult<Vec<Tracker>> {
        self.record(format!("trackers:{hash}"));
        Ok(self.trackers.lock().unwrap().clone())
    }

    async fn queueing_enabled(&self) -> GatewayResult<bool> {
        self.record("queueing_enabled".to_string());
        self.check_reachable()?;
        Ok(*self.queueing_active.lock().unwrap())
    }

    async fn set_queueing_enabled(&self, enabled: bool) -> GatewayResult<()> {
        self.record(format!("set_queueing_enabled:{enabled}"));
        *self.queueing_active.lock().unwrap() = enabled;
        Ok(())
    }

    async fn create_tag(&self, name: &str) -> GatewayResult<()> {
        self.record(format!("create_tag:{name}"));
        Ok(())
    }

    async fn free_space(&self) -> GatewayResult<u64> {
        self.record("free_space".to_string());
        self.check_reachable()?;
        Ok(*self.free.lock().unwrap())
    }
}

/// A completed torrent fixture.
pub(crate) fn torrent(hash: &str, name: &str, size: i64, tags: &str) -> Torrent {
    Torrent {
        hash: hash.to_string(),
        name: name.to_string(),
        state: "uploading".to_string(),
        size,
        progress: 1.0,
        dlspeed: 0,
        upspeed: 0,
        num_seeds: 4,
        num_leechs: 2,
        eta: 0,
        category: String::new(),
        tags: tags.to_string(),
        save_path: "/downloads".to_string(),
        force_start: false,
    }
}

/// Config pointing at a fresh temp state dir: user 1 is EDIT, user 2 READ.
pub(crate) fn test_config(state_dir: &std::path::Path) -> Config {
    Config {
        telegram: TelegramConfig {
            token: "test-token".to_string(),
            admin_user_ids: vec![1],
            user_ids: vec![2],
            notifications_enabled: true,
            notify_chat_id: Some(100),
            operator_chat_id: None,
            no_notify_tag: None,
        },
        qbittorrent: QbtConfig {
            url: "http://localhost:8080".to_string(),
            username: String::new(),
            password: String::new(),
            added_torrents_tag: None,
            queue_toggle_enabled: false,
            queue_toggle_time: "02:00".to_string(),
            poll_interval_secs: 120,
        },
        state: StateConfig {
            dir: Some(state_dir.to_path_buf()),
        },
    }
}

/// Builds an [`AppState`] around the given mock, with a default config.
pub(crate) fn state_with(gateway: MockGateway) -> (AppState, Arc<MockGateway>, TempDir) {
    state_with_config(gateway, |_| {})
}

/// Builds an [`AppState`] around the given mock, letting the test tweak the
/// config first.
pub(crate) fn state_with_config(
    gateway: MockGateway,
    tweak: impl FnOnce(&mut Config),
) -> (AppState, Arc<MockGateway>, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(dir.path());
    tweak(&mut config);

    let gateway = Arc::new(gateway);
    let state = AppState::new(config, gateway.clone() as Arc<dyn TorrentClient>)
        .expect("state should open on an empty dir");
    (state, gateway, dir)
}
