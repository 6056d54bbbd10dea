use log::{error, info, warn};
use std::sync::Arc;
use teloxide::dispatching::repls::CommandReplExt;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use teloxide::utils::command::BotCommands;

use crate::error::{Error, Result};

pub mod commands;
pub mod html;
pub mod notifier;

pub use commands::{Command, CommandDispatcher, Reply};
pub use notifier::{format_buy_alert, Notifier, TelegramNotifier};

#[cfg(test)]
pub use notifier::MockNotifier;

/// Long-polls Telegram for commands and renders dispatcher replies.
pub struct TelegramBot {
    bot: Bot,
    dispatcher: Arc<CommandDispatcher>,
}

impl TelegramBot {
    pub fn new(bot: Bot, dispatcher: CommandDispatcher) -> Self {
        Self {
            bot,
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Runs until the process receives Ctrl-C. Messages that don't parse as
    /// a known command are ignored.
    pub async fn start(self: Arc<Self>) -> Result<()> {
        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!("Could not register command list with Telegram: {}", e);
        }
        let me = self.bot.get_me().await?;
        info!("Telegram bot started: @{}", me.username());

        let bot = self.bot.clone();
        let handler_instance = self.clone();
        Command::repl(bot, move |bot: Bot, msg: Message, cmd: Command| {
            let handler_instance = handler_instance.clone();
            async move {
                if let Err(e) = handler_instance.handle_command(&bot, &msg, cmd).await {
                    error!("Error handling command: {}", e);
                }
                respond(())
            }
        })
        .await;
        Ok(())
    }

    async fn handle_command(&self, bot: &Bot, msg: &Message, cmd: Command) -> Result<()> {
        let cmd_name = cmd.name();
        info!("Received /{} from chat {}", cmd_name, msg.chat.id);
        for reply in self.dispatcher.handle(cmd).await {
            match reply {
                Reply::Text(text) => {
                    bot.send_message(msg.chat.id, text).await?;
                }
                Reply::Html(text) => {
                    let sent = bot
                        .send_message(msg.chat.id, text.clone())
                        .parse_mode(ParseMode::Html)
                        .await;
                    if let Err(e) = sent {
                        warn!("HTML reply to /{} rejected ({}), resending as plain text", cmd_name, e);
                        bot.send_message(msg.chat.id, html::to_plain(&text)).await?;
                    }
                }
                Reply::Photo(url) => {
                    // A broken banner shouldn't cost the user the text reply.
                    if let Err(e) = send_photo(bot, msg.chat.id, &url).await {
                        warn!("Could not send photo {}: {}", url, e);
                    }
                }
            }
        }
        Ok(())
    }
}

async fn send_photo(bot: &Bot, chat_id: ChatId, url: &str) -> Result<()> {
    let url = reqwest::Url::parse(url).map_err(|e| Error::Telegram(e.to_string()))?;
    bot.send_photo(chat_id, InputFile::url(url)).await?;
    Ok(())
}
