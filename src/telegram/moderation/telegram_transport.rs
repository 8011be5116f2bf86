// Telegram implementations of the core moderation ports.

use crate::core::moderation::{ChatKind, ExemptionPolicy, ModerationTransport, TransportError};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use teloxide::{ApiError, RequestError};

/// Deletes messages through the Bot API.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ModerationTransport for TelegramTransport {
    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await
            .map(|_| ())
            .map_err(map_request_error)
    }

    async fn delete_messages(
        &self,
        chat_id: i64,
        message_ids: &[i32],
    ) -> Result<(), TransportError> {
        let ids: Vec<MessageId> = message_ids.iter().map(|&id| MessageId(id)).collect();
        self.bot
            .delete_messages(ChatId(chat_id), ids)
            .await
            .map(|_| ())
            .map_err(map_request_error)
    }
}

/// Looks up the sender's membership to decide if they're above moderation.
#[derive(Clone)]
pub struct TelegramMemberRoles {
    bot: Bot,
}

impl TelegramMemberRoles {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ExemptionPolicy for TelegramMemberRoles {
    async fn is_exempt(
        &self,
        sender_id: u64,
        chat_id: i64,
        chat_kind: ChatKind,
    ) -> Result<bool, TransportError> {
        if chat_kind == ChatKind::Private {
            return Ok(false);
        }

        let member = self
            .bot
            .get_chat_member(ChatId(chat_id), UserId(sender_id))
            .await
            .map_err(map_request_error)?;

        // Owner and admins moderate themselves; left members can't be acted on
        Ok(member.is_privileged() || member.is_left())
    }
}

fn map_request_error(error: RequestError) -> TransportError {
    match &error {
        RequestError::Api(ApiError::MessageToDeleteNotFound) => {
            TransportError::AlreadyGone(error.to_string())
        }
        RequestError::Api(ApiError::MessageCantBeDeleted) => {
            TransportError::Forbidden(error.to_string())
        }
        _ => TransportError::Request(error.to_string()),
    }
}
