//! Permission-gated dispatch of inline-button presses and deep links.
//!
//! Callback data has the shape `action:hash`. Dispatch runs a fixed
//! pipeline around every handler: parse, permission gate, handler, error
//! capture. Handler bodies never see unauthorized callers, and no handler
//! error escapes this module: everything maps to a [`Reply`] so the process
//! cannot crash from a button press.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use seedbot_gateway::GatewayError;
use teloxide::types::InlineKeyboardMarkup;
use tracing::{error, info, warn};

use crate::format;
use crate::keyboards;
use crate::permissions::{self, Permission};
use crate::state::AppState;

/// Delay between resume and force-start in the force-resume action, giving
/// the client time to pick the torrent up before the flag flips.
const FORCE_RESUME_DELAY: Duration = Duration::from_secs(1);

/// Inline-button actions, one per registered callback tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Manage,
    Trackers,
    Refresh,
    Pause,
    Resume,
    ForceResume,
    ForceStart,
    UnforceStart,
    PriorityUp,
    MaxPriority,
    Recheck,
    AskDeleteWithFiles,
    ConfirmDeleteWithFiles,
    Reduce,
}

impl Action {
    /// The wire tag embedded in callback data.
    pub fn tag(self) -> &'static str {
        match self {
            Action::Manage => "manage",
            Action::Trackers => "trackers",
            Action::Refresh => "refresh",
            Action::Pause => "pause",
            Action::Resume => "resume",
            Action::ForceResume => "forceresume",
            Action::ForceStart => "forcestart",
            Action::UnforceStart => "unforcestart",
            Action::PriorityUp => "priorityup",
            Action::MaxPriority => "maxpriority",
            Action::Recheck => "recheck",
            Action::AskDeleteWithFiles => "deletewithfiles",
            Action::ConfirmDeleteWithFiles => "confirmdeletewithfiles",
            Action::Reduce => "reduce",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "manage" => Some(Action::Manage),
            "trackers" => Some(Action::Trackers),
            "refresh" => Some(Action::Refresh),
            "pause" => Some(Action::Pause),
            "resume" => Some(Action::Resume),
            "forceresume" => Some(Action::ForceResume),
            "forcestart" => Some(Action::ForceStart),
            "unforcestart" => Some(Action::UnforceStart),
            "priorityup" => Some(Action::PriorityUp),
            "maxpriority" => Some(Action::MaxPriority),
            "recheck" => Some(Action::Recheck),
            "deletewithfiles" => Some(Action::AskDeleteWithFiles),
            "confirmdeletewithfiles" => Some(Action::ConfirmDeleteWithFiles),
            "reduce" => Some(Action::Reduce),
            _ => None,
        }
    }

    /// Capability a caller needs before the handler body runs.
    pub fn required_permission(self) -> Permission {
        match self {
            Action::Manage
            | Action::Pause
            | Action::Resume
            | Action::ForceResume
            | Action::ForceStart
            | Action::UnforceStart
            | Action::PriorityUp
            | Action::MaxPriority
            | Action::Recheck
            | Action::AskDeleteWithFiles
            | Action::ConfirmDeleteWithFiles => Permission::Edit,
            Action::Trackers | Action::Refresh | Action::Reduce => Permission::Read,
        }
    }
}

/// A parsed `action:hash` callback.
#[derive(Debug)]
pub struct CallbackRequest {
    pub action: Action,
    pub hash: String,
}

/// What the transport layer should do in response to an interaction.
#[derive(Debug, Default)]
pub struct Reply {
    /// Replace the message text (HTML), when set.
    pub text: Option<String>,
    /// Keyboard to attach to the edited message.
    pub keyboard: Option<InlineKeyboardMarkup>,
    /// Short acknowledgement shown as a callback toast.
    pub toast: Option<String>,
}

impl Reply {
    fn toast(text: impl Into<String>) -> Self {
        Reply {
            toast: Some(text.into()),
            ..Default::default()
        }
    }

    fn message(text: String, keyboard: InlineKeyboardMarkup) -> Self {
        Reply {
            text: Some(text),
            keyboard: Some(keyboard),
            toast: None,
        }
    }

    fn with_toast(mut self, text: impl Into<String>) -> Self {
        self.toast = Some(text.into());
        self
    }
}

fn hash_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // v1 info-hashes are 40 hex chars, hybrid v2 ones 64
    RE.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{40}([0-9a-fA-F]{24})?$").expect("valid regex"))
}

/// True when `hash` has the shape of a torrent info-hash. Shape only: the
/// torrent may still have been deleted since the keyboard was rendered.
pub fn is_well_formed_hash(hash: &str) -> bool {
    hash_regex().is_match(hash)
}

/// Parses callback data into an action and target hash.
pub fn parse_callback(data: &str) -> Option<CallbackRequest> {
    let (tag, hash) = data.split_once(':')?;
    let action = Action::from_tag(tag)?;
    if !is_well_formed_hash(hash) {
        return None;
    }
    Some(CallbackRequest {
        action,
        hash: hash.to_string(),
    })
}

/// Dispatches one inline-button press.
pub async fn dispatch_callback(state: &AppState, user_id: u64, data: &str) -> Reply {
    let Some(request) = parse_callback(data) else {
        warn!(user_id, payload = data, "unparseable callback data");
        return Reply::toast("Unrecognized button");
    };

    let level = permissions::resolve(user_id, &state.config.telegram);
    if !permissions::allows(level, request.action.required_permission()) {
        info!(
            user_id,
            action = request.action.tag(),
            hash = %request.hash,
            "permission denied"
        );
        return Reply::toast("You are not allowed to do that");
    }

    info!(user_id, action = request.action.tag(), hash = %request.hash, "callback");

    match run_action(state, &request).await {
        Ok(reply) => reply,
        Err(e) if e.is_not_found() => Reply {
            text: Some("This torrent no longer exists".to_string()),
            keyboard: None,
            toast: Some("Torrent not found".to_string()),
        },
        Err(e) => {
            error!(
                user_id,
                payload = data,
                error = %e,
                "callback handler failed"
            );
            Reply::toast("Something went wrong, the operation was not completed")
        }
    }
}

/// Dispatches a `/start info<hash>` deep link.
pub async fn dispatch_info_deeplink(state: &AppState, user_id: u64, hash: &str) -> Reply {
    let level = permissions::resolve(user_id, &state.config.telegram);
    if !permissions::allows(level, Permission::Read) {
        info!(user_id, hash, "permission denied for info deep link");
        return Reply::toast("You are not allowed to do that");
    }
    if !is_well_formed_hash(hash) {
        warn!(user_id, hash, "malformed deep-link hash");
        return Reply::toast("Unrecognized torrent link");
    }

    info!(user_id, hash, "info deep link");

    match state.gateway.get(hash).await {
        Ok(torrent) => Reply::message(format::torrent_text(&torrent), keyboards::short_markup(hash)),
        Err(e) if e.is_not_found() => Reply {
            text: Some("This torrent no longer exists".to_string()),
            ..Default::default()
        },
        Err(e) => {
            error!(user_id, hash, error = %e, "info deep link failed");
            Reply::toast("Something went wrong, the operation was not completed")
        }
    }
}

/// The handler bodies. Every action resolves the torrent first so a stale
/// hash surfaces as NotFound, matching delete-then-press behaviour.
async fn run_action(state: &AppState, request: &CallbackRequest) -> Result<Reply, GatewayError> {
    let gateway = state.gateway.as_ref();
    let hash = request.hash.as_str();
    let torrent = gateway.get(hash).await?;

    let reply = match request.action {
        Action::Manage => Reply::message(format::torrent_text(&torrent), keyboards::actions_keyboard(hash))
            .with_toast("Use the keyboard to manage the torrent"),
        Action::Refresh => Reply::message(format::torrent_text(&torrent), keyboards::actions_keyboard(hash))
            .with_toast("Torrent info refreshed"),
        Action::Reduce => Reply::message(format::torrent_text(&torrent), keyboards::short_markup(hash))
            .with_toast("Keyboard reduced"),
        Action::Trackers => {
            let trackers = gateway.trackers(hash).await?;
            Reply::message(format::trackers_text(&trackers), keyboards::actions_keyboard(hash))
                .with_toast("Trackers list")
        }
        Action::Pause => {
            gateway.pause(hash).await?;
            Reply::toast("Paused")
        }
        Action::Resume => {
            gateway.resume(hash).await?;
            Reply::toast("Resumed")
        }
        Action::ForceResume => {
            gateway.resume(hash).await?;
            tokio::time::sleep(FORCE_RESUME_DELAY).await;
            gateway.set_force_start(hash, true).await?;
            Reply::toast("Force-resumed")
        }
        Action::ForceStart => {
            gateway.set_force_start(hash, true).await?;
            Reply::toast("Force-start enabled")
        }
        Action::UnforceStart => {
            gateway.set_force_start(hash, false).await?;
            Reply::toast("Force-start disabled")
        }
        Action::PriorityUp => {
            gateway.increase_priority(hash).await?;
            Reply::toast("Priority increased")
        }
        Action::MaxPriority => {
            gateway.max_priority(hash).await?;
            Reply::toast("Max priority set")
        }
        Action::Recheck => {
            gateway.recheck(hash).await?;
            Reply::toast("Re-check started")
        }
        Action::AskDeleteWithFiles => Reply::message(
            format!(
                "Are you sure you want to delete {}, <b>with all its files</b>?",
                format::html_escape(&torrent.name)
            ),
            keyboards::confirm_delete(hash),
        )
        .with_toast("Confirmation needed"),
        Action::ConfirmDeleteWithFiles => {
            gateway.delete(hash, true).await?;
            Reply {
                text: Some(format!(
                    "{} deleted (with files)",
                    format::html_escape(&torrent.name)
                )),
                keyboard: None,
                toast: None,
            }
        }
    };

    Ok(reply)
}
