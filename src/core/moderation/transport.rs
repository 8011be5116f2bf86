// Ports to the chat platform.
//
// The core never talks to Telegram directly. It deletes messages and asks
// about member roles through these traits, and the Telegram layer provides
// the implementations.

use super::moderation_models::ChatKind;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// The bot isn't allowed to do this (missing rights, message too old)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The message is already gone
    #[error("Already gone: {0}")]
    AlreadyGone(String),

    /// Network or API failure
    #[error("Request failed: {0}")]
    Request(String),
}

/// Deletes messages on the chat platform.
#[async_trait]
pub trait ModerationTransport: Send + Sync + 'static {
    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError>;

    /// Delete several messages in one call. May fail as a whole.
    async fn delete_messages(&self, chat_id: i64, message_ids: &[i32])
        -> Result<(), TransportError>;
}

/// Decides whether a sender is above moderation in a chat
/// (chat owner, administrators, members who already left).
#[async_trait]
pub trait ExemptionPolicy: Send + Sync {
    async fn is_exempt(
        &self,
        sender_id: u64,
        chat_id: i64,
        chat_kind: ChatKind,
    ) -> Result<bool, TransportError>;
}

/// Delete one message, treating "already gone" as success.
pub async fn delete_tolerant<T: ModerationTransport + ?Sized>(
    transport: &T,
    chat_id: i64,
    message_id: i32,
) -> Result<(), TransportError> {
    match transport.delete_message(chat_id, message_id).await {
        Ok(()) => Ok(()),
        Err(TransportError::AlreadyGone(reason)) => {
            tracing::debug!(chat_id, message_id, %reason, "Message was already deleted");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
