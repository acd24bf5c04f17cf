//! Message formatting for Telegram HTML mode.

use seedbot_gateway::{Torrent, Tracker};

/// Telegram's hard limit on message text length.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// qBittorrent reports this ETA when it has no estimate.
const ETA_INFINITE: i64 = 8640000;

/// Escape HTML special characters for Telegram HTML mode.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Human-readable byte count (binary units).
pub fn size_pretty(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

fn speed_pretty(bytes_per_sec: i64) -> String {
    format!("{}/s", size_pretty(bytes_per_sec.max(0) as u64))
}

fn eta_pretty(eta: i64) -> String {
    if eta <= 0 || eta >= ETA_INFINITE {
        return "∞".to_string();
    }
    let hours = eta / 3600;
    let minutes = (eta % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes.max(1))
    }
}

/// Full torrent detail view, shown by the manage/refresh/info handlers.
pub fn torrent_text(torrent: &Torrent) -> String {
    let mut text = format!(
        "<code>{}</code>\n\
        State: {}\n\
        Progress: {:.1}%\n\
        Size: {}\n\
        Peers: {} seeds, {} leechers\n\
        Speed: ↓ {} ↑ {}\n\
        ETA: {}",
        html_escape(&torrent.name),
        html_escape(&torrent.state),
        torrent.progress * 100.0,
        size_pretty(torrent.size.max(0) as u64),
        torrent.num_seeds,
        torrent.num_leechs,
        speed_pretty(torrent.dlspeed),
        speed_pretty(torrent.upspeed),
        eta_pretty(torrent.eta),
    );

    if !torrent.category.is_empty() {
        text.push_str(&format!("\nCategory: {}", html_escape(&torrent.category)));
    }
    if !torrent.tags.is_empty() {
        text.push_str(&format!("\nTags: {}", html_escape(&torrent.tags)));
    }
    if torrent.force_start {
        text.push_str("\nForce-start: on");
    }

    text
}

/// Tracker list view. When the full list would exceed the Telegram message
/// limit, it collapses to per-status counts instead.
pub fn trackers_text(trackers: &[Tracker]) -> String {
    if trackers.is_empty() {
        return "No trackers".to_string();
    }

    let lines: Vec<String> = trackers
        .iter()
        .map(|t| {
            format!(
                "<b>{}:</b> {} <b>({})</b>",
                t.status_text(),
                html_escape(&t.url),
                t.num_peers
            )
        })
        .collect();
    let text = lines.join("\n");

    if text.len() <= MAX_MESSAGE_LEN {
        return text;
    }

    // Aggregate by status, preserving first-seen order
    let mut statuses: Vec<(&'static str, usize, i64)> = Vec::new();
    for tracker in trackers {
        let status = tracker.status_text();
        match statuses.iter_mut().find(|(s, _, _)| *s == status) {
            Some((_, count, peers)) => {
                *count += 1;
                *peers += tracker.num_peers;
            }
            None => statuses.push((status, 1, tracker.num_peers)),
        }
    }

    statuses
        .iter()
        .map(|(status, count, peers)| {
            format!("<b>{}</b>: {} trackers, {} peers", status, count, peers)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Completion notice: escaped name, human size, live free space.
pub fn completed_text(torrent: &Torrent, free_space: Option<u64>) -> String {
    let free = free_space
        .map(size_pretty)
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "<code>{}</code> completed ({}, free space: {})",
        html_escape(&torrent.name),
        size_pretty(torrent.size.max(0) as u64),
        free
    )
}
