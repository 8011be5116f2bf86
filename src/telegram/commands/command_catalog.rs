// Telegram commands module.
// Word list management lives in its own file; this one parses and routes.

pub mod words;

use crate::telegram::moderation::handle_message;
use crate::telegram::{Data, HandlerResult};
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Say hello.")]
    Start,
    #[command(description = "Show this help.")]
    Help,
    #[command(description = "Ban a word: /addword <word>")]
    AddWord(String),
    #[command(description = "Unban a word: /removeword <word>")]
    RemoveWord(String),
    #[command(description = "List banned words.")]
    ShowWords,
}

pub fn is_owner(data: &Data, user_id: Option<u64>) -> bool {
    matches!((data.owner_id, user_id), (Some(owner), Some(user)) if owner == user)
}

pub async fn handle_command(bot: Bot, msg: Message, cmd: Command, data: Data) -> HandlerResult {
    let sender = msg.from.as_ref().map(|user| user.id.0);

    // Anyone else typing a command is just another chat message
    if !is_owner(&data, sender) {
        tracing::debug!(chat_id = msg.chat.id.0, ?sender, ?cmd, "Ignoring command from non-owner");
        return handle_message(msg, data).await;
    }

    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, "Welcome to the Telegram moderator bot!")
                .await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::AddWord(word) => words::add_word(&bot, &msg, &data, &word).await?,
        Command::RemoveWord(word) => words::remove_word(&bot, &msg, &data, &word).await?,
        Command::ShowWords => words::show_words(&bot, &msg, &data).await?,
    }

    Ok(())
}
