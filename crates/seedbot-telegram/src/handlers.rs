//! Telegram command handlers and the callback transport shim.
//!
//! Handlers here own the Telegram plumbing only: extracting the caller,
//! sending and editing messages, answering callback queries. All decisions
//! about what a caller may do and what a button does live in
//! [`crate::router`]; gateway failures inside a command surface as a short
//! apology message instead of killing the update.

use std::sync::Arc;

use seedbot_gateway::{TorrentFilter, TorrentSummary};
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info};

use crate::error::BotError;
use crate::format;
use crate::jobs::no_preview;
use crate::permissions::{self, Permission};
use crate::router::{self, Reply};
use crate::state::AppState;

/// Commands the bot registers with Telegram.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "open a torrent from a deep link")]
    Start(String),
    #[command(description = "show this help")]
    Help,
    #[command(description = "list torrents, optionally filtered \
        (all, downloading, completed, paused, active, inactive)")]
    Torrents(String),
    #[command(description = "show free disk space")]
    Free,
}

/// Entry point for command updates.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<AppState>,
) -> Result<(), BotError> {
    let user_id = match msg.from.as_ref() {
        Some(user) => user.id.0,
        None => return Ok(()),
    };

    let level = permissions::resolve(user_id, &state.config.telegram);
    if !permissions::allows(level, Permission::Read) {
        info!(user_id, "command from unauthorized user");
        bot.send_message(msg.chat.id, "You are not allowed to do that")
            .await?;
        return Ok(());
    }

    match run_command(&bot, &msg, cmd, &state, user_id).await {
        Ok(()) => Ok(()),
        Err(BotError::Gateway(e)) => {
            error!(user_id, error = %e, "command failed against the gateway");
            bot.send_message(
                msg.chat.id,
                "Something went wrong, the operation was not completed",
            )
            .await?;
            Ok(())
        }
        Err(other) => Err(other),
    }
}

async fn run_command(
    bot: &Bot,
    msg: &Message,
    cmd: Command,
    state: &AppState,
    user_id: u64,
) -> Result<(), BotError> {
    match cmd {
        Command::Start(arg) => {
            let arg = arg.trim();
            if let Some(hash) = arg.strip_prefix("info") {
                let reply = router::dispatch_info_deeplink(state, user_id, hash).await;
                send_reply(bot, msg.chat.id, reply).await
            } else {
                bot.send_message(
                    msg.chat.id,
                    "Hi! Use /torrents to list torrents, /help for the full command list.",
                )
                .await?;
                Ok(())
            }
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
            Ok(())
        }
        Command::Torrents(arg) => {
            let Some(filter) = TorrentFilter::parse(arg.trim()) else {
                bot.send_message(
                    msg.chat.id,
                    "Unknown filter. Use one of: all, downloading, completed, \
                     paused, active, inactive",
                )
                .await?;
                return Ok(());
            };

            let torrents = state.gateway.list(filter).await?;
            let me = bot.get_me().await?;
            let text = torrents_list_text(&torrents, filter, me.username());

            bot.send_message(msg.chat.id, text)
                .parse_mode(ParseMode::Html)
                .link_preview_options(no_preview())
                .await?;
            Ok(())
        }
        Command::Free => {
            let free = state.gateway.free_space().await?;
            bot.send_message(
                msg.chat.id,
                format!("Free space: {}", format::size_pretty(free)),
            )
            .await?;
            Ok(())
        }
    }
}

/// Renders a torrent list with per-torrent deep links, trimmed to fit one
/// Telegram message.
fn torrents_list_text(
    torrents: &[TorrentSummary],
    filter: TorrentFilter,
    bot_username: &str,
) -> String {
    if torrents.is_empty() {
        return format!("No {} torrents", filter.as_str());
    }

    let lines: Vec<String> = torrents
        .iter()
        .map(|t| {
            format!(
                "• <a href=\"https://t.me/{}?start=info{}\">{}</a> ({}, {:.1}%)",
                bot_username,
                t.hash,
                format::html_escape(&t.name),
                format::html_escape(&t.state),
                t.progress * 100.0,
            )
        })
        .collect();

    // Leave headroom for the "…and N more" tail line
    let mut text = String::new();
    let mut shown = 0;
    for line in &lines {
        if text.len() + line.len() + 32 > format::MAX_MESSAGE_LEN {
            break;
        }
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(line);
        shown += 1;
    }
    if shown < lines.len() {
        text.push_str(&format!("\n…and {} more", lines.len() - shown));
    }
    text
}

/// Entry point for inline-button presses.
///
/// The router decides what happened; this shim applies the [`Reply`]:
/// edit the originating message when there is new text, then answer the
/// callback query (with the toast, if any) so the client stops its spinner.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> Result<(), BotError> {
    let data = q.data.as_deref().unwrap_or_default();
    let reply = router::dispatch_callback(&state, q.from.id.0, data).await;

    if let Some(text) = &reply.text {
        if let Some(message) = &q.message {
            let mut edit = bot
                .edit_message_text(message.chat().id, message.id(), text)
                .parse_mode(ParseMode::Html);
            if let Some(keyboard) = reply.keyboard.clone() {
                edit = edit.reply_markup(keyboard);
            }
            if let Err(e) = edit.await {
                // Telegram rejects edits that change nothing, e.g. a
                // refresh of an unchanged torrent
                debug!(error = %e, "message edit rejected");
            }
        }
    }

    let mut answer = bot.answer_callback_query(q.id.clone());
    if let Some(toast) = reply.toast {
        answer = answer.text(toast);
    }
    answer.await?;
    Ok(())
}

async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> Result<(), BotError> {
    if let Some(text) = reply.text {
        let mut send = bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .link_preview_options(no_preview());
        if let Some(keyboard) = reply.keyboard {
            send = send.reply_markup(keyboard);
        }
        send.await?;
    } else if let Some(toast) = reply.toast {
        bot.send_message(chat_id, toast).await?;
    }
    Ok(())
}
