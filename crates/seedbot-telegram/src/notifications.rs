//! Completion notification pipeline.
//!
//! Each poll lists completed torrents and announces the ones never seen
//! before. The completed set is marked *before* any suppression check or
//! delivery attempt: a torrent suppressed by tag or config, or whose
//! notice fails to send, is still recorded as seen. That ordering is what
//! makes delivery at-most-once across polls and restarts.

use seedbot_gateway::TorrentFilter;
use tracing::{info, warn};

use crate::error::Result;
use crate::format;
use crate::state::AppState;

/// One notice ready for delivery.
#[derive(Debug)]
pub struct CompletedNotice {
    pub hash: String,
    pub text: String,
}

/// Runs one poll cycle: dedup, suppression, formatting.
///
/// Returns the notices to deliver. Gateway failures on the initial list
/// abort the cycle (nothing was marked yet); failures on a single torrent's
/// detail fetch skip that torrent only.
pub async fn collect_completed(state: &AppState) -> Result<Vec<CompletedNotice>> {
    // The suppression file may have been edited by another process
    if let Err(e) = state.do_not_notify.refresh() {
        warn!(error = %e, "could not refresh the do-not-notify set, using cached entries");
    }

    let completed = state.gateway.list(TorrentFilter::Completed).await?;
    let config = &state.config.telegram;
    let mut notices = Vec::new();

    for summary in completed {
        if !state.completed.mark_new(&summary.hash)? {
            continue;
        }

        let torrent = match state.gateway.get(&summary.hash).await {
            Ok(t) => t,
            Err(e) if e.is_not_found() => {
                info!(hash = %summary.hash, "completed torrent vanished before detail fetch");
                continue;
            }
            Err(e) => {
                // Already marked: by design this torrent will not be
                // announced on a later poll either
                warn!(hash = %summary.hash, error = %e, "could not fetch completed torrent detail");
                continue;
            }
        };

        info!(hash = %torrent.hash, name = %torrent.name, "torrent completed");

        if !config.notifications_enabled || config.notify_chat_id.is_none() {
            continue;
        }

        if state.do_not_notify.contains(&torrent.hash) {
            info!(hash = %torrent.hash, name = %torrent.name, "notification disabled for this torrent");
            continue;
        }

        if let Some(no_notify_tag) = &config.no_notify_tag {
            let tagged = torrent
                .tag_list()
                .iter()
                .any(|t| t.eq_ignore_ascii_case(no_notify_tag));
            if tagged {
                info!(hash = %torrent.hash, tag = %no_notify_tag, "no-notify tag present, skipping");
                continue;
            }
        }

        // Queried live at send time, not cached
        let free_space = match state.gateway.free_space().await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, "could not read free space");
                None
            }
        };

        notices.push(CompletedNotice {
            hash: torrent.hash.clone(),
            text: format::completed_text(&torrent, free_space),
        });
    }

    Ok(notices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{state_with, state_with_config, torrent, MockGateway};

    const HASH: &str = "aaaabbbbccccddddeeeeffff0000111122223333";

    #[tokio::test]
    async fn test_single_completed_torrent_is_announced_once() {
        let gateway = MockGateway::default();
        gateway.add_torrent(torrent(HASH, "fedora.iso", 2 * 1024 * 1024 * 1024, ""));
        let (state, mock, _dir) = state_with(gateway);
        *mock.free.lock().unwrap() = 50 * 1024 * 1024 * 1024;

        let notices = collect_completed(&state).await.unwrap();

        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].hash, HASH);
        assert!(notices[0].text.contains("fedora.iso"));
        assert!(notices[0].text.contains("2.0 GiB"));
        assert!(notices[0].text.contains("free space: 50.0 GiB"));
        assert!(state.completed.contains(HASH));
    }

    #[tokio::test]
    async fn test_second_poll_does_not_reannounce() {
        let gateway = MockGateway::default();
        gateway.add_torrent(torrent(HASH, "fedora.iso", 1024, ""));
        let (state, _mock, _dir) = state_with(gateway);

        let first = collect_completed(&state).await.unwrap();
        let second = collect_completed(&state).await.unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_no_notify_tag_suppresses_but_still_marks() {
        let gateway = MockGateway::default();
        gateway.add_torrent(torrent(HASH, "quiet.iso", 1024, "linux, NoPing"));
        let (state, _mock, _dir) = state_with_config(gateway, |c| {
            c.telegram.no_notify_tag = Some("noping".to_string());
        });

        let notices = collect_completed(&state).await.unwrap();

        assert!(notices.is_empty());
        assert!(state.completed.contains(HASH), "skip must happen after marking");
    }

    #[tokio::test]
    async fn test_suppression_set_wins_over_everything() {
        let gateway = MockGateway::default();
        gateway.add_torrent(torrent(HASH, "muted.iso", 1024, ""));
        let (state, _mock, _dir) = state_with(gateway);
        state.do_not_notify.insert_all([HASH]).unwrap();

        let notices = collect_completed(&state).await.unwrap();

        assert!(notices.is_empty());
        assert!(state.completed.contains(HASH));
    }

    #[tokio::test]
    async fn test_disabled_notifications_still_mark() {
        let gateway = MockGateway::default();
        gateway.add_torrent(torrent(HASH, "silent.iso", 1024, ""));
        let (state, _mock, _dir) = state_with_config(gateway, |c| {
            c.telegram.notifications_enabled = false;
        });

        let notices = collect_completed(&state).await.unwrap();

        assert!(notices.is_empty());
        assert!(state.completed.contains(HASH));
    }

    #[tokio::test]
    async fn test_dedup_survives_restart() {
        let gateway = MockGateway::default();
        gateway.add_torrent(torrent(HASH, "fedora.iso", 1024, ""));
        let (state, mock, dir) = state_with(gateway);

        assert_eq!(collect_completed(&state).await.unwrap().len(), 1);
        drop(state);

        // New process, same state dir
        let gateway2 = MockGateway::default();
        gateway2.add_torrent(torrent(HASH, "fedora.iso", 1024, ""));
        let (state2, _mock2, _dir2) = crate::test_util::state_with_config(gateway2, |c| {
            c.state.dir = Some(dir.path().to_path_buf());
        });
        drop(mock);

        assert!(collect_completed(&state2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_gateway_aborts_cycle_without_marking() {
        let gateway = MockGateway::default();
        gateway.add_torrent(torrent(HASH, "fedora.iso", 1024, ""));
        *gateway.unreachable.lock().unwrap() = true;
        let (state, _mock, _dir) = state_with(gateway);

        let result = collect_completed(&state).await;

        assert!(result.is_err());
        assert!(!state.completed.contains(HASH));
    }
}
