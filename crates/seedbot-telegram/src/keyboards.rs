//! Inline keyboards attached to torrent messages.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::router::Action;

fn button(label: &str, action: Action, hash: &str) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label.to_string(), format!("{}:{}", action.tag(), hash))
}

/// Minimal markup: a single button expanding to the full action keyboard.
pub fn short_markup(hash: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("Manage", Action::Manage, hash)]])
}

/// The full management keyboard.
pub fn actions_keyboard(hash: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("⏸ Pause", Action::Pause, hash),
            button("▶ Resume", Action::Resume, hash),
            button("⏩ Force-resume", Action::ForceResume, hash),
        ],
        vec![
            button("Force-start on", Action::ForceStart, hash),
            button("Force-start off", Action::UnforceStart, hash),
        ],
        vec![
            button("Priority up", Action::PriorityUp, hash),
            button("Max priority", Action::MaxPriority, hash),
        ],
        vec![
            button("Trackers", Action::Trackers, hash),
            button("Re-check", Action::Recheck, hash),
            button("🔄 Refresh", Action::Refresh, hash),
        ],
        vec![button("🗑 Delete with files", Action::AskDeleteWithFiles, hash)],
        vec![button("Reduce keyboard", Action::Reduce, hash)],
    ])
}

/// Confirmation step for the destructive delete.
pub fn confirm_delete(hash: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        button("Yes, delete everything", Action::ConfirmDeleteWithFiles, hash),
        button("Cancel", Action::Manage, hash),
    ]])
}
