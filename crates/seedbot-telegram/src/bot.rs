//! Dispatcher wiring for the Telegram bot.

use std::sync::Arc;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

use crate::error::Result;
use crate::handlers::{handle_callback, handle_command, Command};
use crate::state::AppState;

/// The bot: a teloxide handle plus the shared state every handler sees.
pub struct SeedBot {
    bot: Bot,
    state: Arc<AppState>,
}

impl SeedBot {
    pub fn new(bot: Bot, state: Arc<AppState>) -> Self {
        Self { bot, state }
    }

    /// Runs the dispatcher until shutdown (ctrl-c).
    pub async fn run(self) -> Result<()> {
        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!(error = %e, "could not register the command list");
        }

        let state_for_commands = Arc::clone(&self.state);
        let state_for_callbacks = Arc::clone(&self.state);

        let handler = dptree::entry()
            .branch(
                Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
                    let state = Arc::clone(&state_for_callbacks);
                    async move { handle_callback(bot, q, state).await }
                }),
            )
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let state = Arc::clone(&state_for_commands);
                        async move { handle_command(bot, msg, cmd, state).await }
                    }),
            );

        info!("bot is running");

        Dispatcher::builder(self.bot, handler)
            .default_handler(|upd| async move {
                warn!("unhandled update: {:?}", upd);
            })
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}
