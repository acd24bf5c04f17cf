//! Scheduled background jobs.
//!
//! Two independent tasks: the completion poll (first firing one interval
//! after startup, then fixed-rate forever) and the nightly queue toggle.
//! Job bodies return `Result`; the loops are the catch boundary. A failed
//! run is logged, reported to the operator chat when one is configured,
//! and never delays or cancels the next firing or the other job.
//!
//! Registration happens once at startup and only when qBittorrent was
//! reachable; there is no later retry to register (see DESIGN.md).

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime};
use seedbot_gateway::{GatewayError, TorrentClient};
use teloxide::prelude::*;
use teloxide::types::{LinkPreviewOptions, ParseMode};
use tokio::time::{interval_at, sleep, Instant};
use tracing::{error, info, warn};

use crate::error::BotError;
use crate::notifications::collect_completed;
use crate::state::AppState;

/// How long queueing stays disabled during the nightly toggle window.
pub const QUEUE_TOGGLE_HOLD: Duration = Duration::from_secs(10);

pub(crate) fn no_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

/// Registers both recurring jobs. Call once at startup, after a successful
/// gateway probe.
pub fn spawn_jobs(bot: Bot, state: Arc<AppState>) {
    info!("registering scheduled jobs");

    let poll_bot = bot.clone();
    let poll_state = Arc::clone(&state);
    tokio::spawn(async move {
        completed_poll_loop(poll_bot, poll_state).await;
    });

    tokio::spawn(async move {
        queue_toggle_loop(bot, state).await;
    });
}

/// Fixed-rate completion poll: first firing one full interval after
/// startup, then every interval.
async fn completed_poll_loop(bot: Bot, state: Arc<AppState>) {
    let period = Duration::from_secs(state.config.qbittorrent.poll_interval_secs);
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        ticker.tick().await;
        info!("running completed-torrents job");

        if let Err(e) = run_completed_poll(&bot, &state).await {
            error!(error = %e, "completed-torrents job failed");
            report_job_failure(&bot, &state, "completed-torrents job", &e).await;
        }
    }
}

/// One poll cycle: collect notices and deliver them.
///
/// Delivery failures are logged and never retried; the hash was marked
/// during collection, so a retry could only produce duplicates.
async fn run_completed_poll(bot: &Bot, state: &AppState) -> Result<(), BotError> {
    let notices = collect_completed(state).await?;
    let Some(chat_id) = state.config.telegram.notify_chat_id else {
        return Ok(());
    };

    for notice in notices {
        let send = bot
            .send_message(ChatId(chat_id), &notice.text)
            .parse_mode(ParseMode::Html)
            .disable_notification(true)
            .link_preview_options(no_preview())
            .await;

        match send {
            Ok(_) => info!(hash = %notice.hash, "completion notice sent"),
            Err(e) => {
                // At-most-once: the hash is already in the completed set
                warn!(hash = %notice.hash, error = %e, "failed to send completion notice, not retrying");
            }
        }
    }

    Ok(())
}

/// Daily queue-toggle loop, firing at the configured local wall-clock time.
async fn queue_toggle_loop(bot: Bot, state: Arc<AppState>) {
    // Validated at config load
    let Ok(target) = state.config.queue_toggle_time() else {
        error!("queue toggle time failed to parse, job not running");
        return;
    };

    loop {
        let now = Local::now().naive_local();
        let next = next_occurrence(now, target);
        let wait = (next - now)
            .to_std()
            .unwrap_or_else(|_| Duration::from_secs(60));
        info!(at = %next, "queue-toggle job sleeping until next firing");
        sleep(wait).await;

        info!("running queue-toggle job");
        let enabled = state.config.qbittorrent.queue_toggle_enabled;
        if let Err(e) = run_queue_toggle(state.gateway.as_ref(), enabled).await {
            error!(error = %e, "queue-toggle job failed");
            report_job_failure(&bot, &state, "queue-toggle job", &e.into()).await;
        }
    }
}

/// The queue-toggle body: disable queueing, hold, re-enable.
///
/// A no-op (toggle disabled in config, or queueing already inactive) is a
/// success, not a failure.
pub(crate) async fn run_queue_toggle(
    gateway: &dyn TorrentClient,
    toggle_enabled: bool,
) -> Result<(), GatewayError> {
    if !toggle_enabled {
        info!("queue toggling disabled in config, nothing to do");
        return Ok(());
    }
    if !gateway.queueing_enabled().await? {
        info!("torrent queueing not active, nothing to do");
        return Ok(());
    }

    gateway.set_queueing_enabled(false).await?;
    sleep(QUEUE_TOGGLE_HOLD).await;
    gateway.set_queueing_enabled(true).await?;

    info!("queueing toggled off and back on");
    Ok(())
}

/// The next time `target` occurs strictly after `now`.
fn next_occurrence(now: NaiveDateTime, target: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(target);
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// Best-effort failure report to the operator chat, if configured.
async fn report_job_failure(bot: &Bot, state: &AppState, job: &str, error: &BotError) {
    let Some(chat_id) = state.config.telegram.operator_chat_id else {
        return;
    };
    let text = format!("⚠️ {job} failed: {error}");
    if let Err(e) = bot.send_message(ChatId(chat_id), text).await {
        warn!(error = %e, "could not deliver job failure report");
    }
}
