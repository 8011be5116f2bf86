// Telegram layer - commands, callbacks and the message handler.

#[path = "commands/command_catalog.rs"]
pub mod commands;
#[path = "moderation/mod.rs"]
pub mod moderation;

use crate::core::moderation::{ModerationService, WordListService};
use crate::infra::moderation::SqliteWordStore;
use moderation::{TelegramMemberRoles, TelegramTransport};
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type HandlerResult = Result<(), Error>;

/// Shared state handed to every handler through the dispatcher.
#[derive(Clone)]
pub struct Data {
    pub moderation: Arc<ModerationService<TelegramTransport, TelegramMemberRoles>>,
    pub words: Arc<WordListService<SqliteWordStore>>,
    pub owner_id: Option<u64>,
}
