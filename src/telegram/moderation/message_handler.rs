// Telegram message handler - feeds every inbound message to the core service.

use super::event_mapping::to_moderation_event;
use crate::telegram::{Data, HandlerResult};
use std::sync::Arc;
use teloxide::types::Message;

/// Moderate a message in its own task so one slow delete call never
/// holds up the rest of the chat.
pub async fn handle_message(msg: Message, data: Data) -> HandlerResult {
    let event = to_moderation_event(&msg);
    let moderation = Arc::clone(&data.moderation);

    tokio::spawn(async move {
        let outcome = moderation.handle(&event).await;
        tracing::trace!(
            chat_id = event.chat_id,
            message_id = event.message_id,
            ?outcome,
            pending_groups = moderation.pending_groups(),
            "Moderation finished"
        );
    });

    Ok(())
}
