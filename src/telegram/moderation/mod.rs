// Telegram-side moderation: event mapping, transport and the message handler.

pub mod event_mapping;
pub mod message_handler;
pub mod telegram_transport;

pub use message_handler::handle_message;
pub use telegram_transport::{TelegramMemberRoles, TelegramTransport};
