// Translates Telegram messages into platform-agnostic moderation events.
//
// This layer is THIN - no decisions are made here, we just pull out the
// parts of the message the classifier cares about.

use crate::core::moderation::{ChatKind, LinkEntity, ModerationEvent};
use teloxide::types::{MediaKind, Message, MessageEntityKind, MessageKind};

pub fn to_moderation_event(msg: &Message) -> ModerationEvent {
    let chat_kind = if msg.chat.is_private() {
        ChatKind::Private
    } else {
        ChatKind::MultiParty
    };

    ModerationEvent {
        chat_id: msg.chat.id.0,
        chat_kind,
        message_id: msg.id.0,
        sender_id: msg.from.as_ref().map(|user| user.id.0),
        anonymous_admin: is_anonymous_admin(msg),
        text: msg.text().map(str::to_string),
        caption: msg.caption().map(str::to_string),
        links: link_entities(msg),
        file_name: msg.document().and_then(|doc| doc.file_name.clone()),
        media_group_id: msg.media_group_id().map(ToString::to_string),
        is_story: is_story(msg),
    }
}

/// `url` and `text_link` entities from the text, or from the caption.
fn link_entities(msg: &Message) -> Vec<LinkEntity> {
    let entities = msg
        .parse_entities()
        .or_else(|| msg.parse_caption_entities())
        .unwrap_or_default();

    entities
        .iter()
        .filter_map(|entity| match entity.kind() {
            MessageEntityKind::Url => Some(LinkEntity::Url(entity.text().to_string())),
            MessageEntityKind::TextLink { url } => Some(LinkEntity::TextLink(url.to_string())),
            _ => None,
        })
        .collect()
}

/// Anonymous admins post with `sender_chat` set to the chat itself.
/// Linked channel posts carry a different chat and stay moderated.
fn is_anonymous_admin(msg: &Message) -> bool {
    msg.sender_chat
        .as_ref()
        .is_some_and(|sender| sender.id == msg.chat.id)
}

fn is_story(msg: &Message) -> bool {
    matches!(
        &msg.kind,
        MessageKind::Common(common) if matches!(common.media_kind, MediaKind::Story(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Message {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_message_with_links() {
        let msg = parse(json!({
            "message_id": 42,
            "date": 1700000000,
            "chat": { "id": -1001, "type": "supergroup", "title": "Test" },
            "from": { "id": 7, "is_bot": false, "first_name": "Ann" },
            "text": "see example.com or here",
            "entities": [
                { "type": "url", "offset": 4, "length": 11 },
                { "type": "text_link", "offset": 19, "length": 4, "url": "https://evil.example/" }
            ]
        }));

        let event = to_moderation_event(&msg);

        assert_eq!(event.chat_id, -1001);
        assert_eq!(event.chat_kind, ChatKind::MultiParty);
        assert_eq!(event.message_id, 42);
        assert_eq!(event.sender_id, Some(7));
        assert_eq!(event.content_text(), "see example.com or here");
        assert_eq!(
            event.links,
            vec![
                LinkEntity::Url("example.com".to_string()),
                LinkEntity::TextLink("https://evil.example/".to_string()),
            ]
        );
        assert!(event.media_group_id.is_none());
        assert!(!event.is_story);
        assert!(!event.anonymous_admin);
    }

    #[test]
    fn test_anonymous_admin_post() {
        let msg = parse(json!({
            "message_id": 44,
            "date": 1700000000,
            "chat": { "id": -1001, "type": "supergroup", "title": "Test" },
            "from": { "id": 1087968824, "is_bot": true, "first_name": "Group", "username": "GroupAnonymousBot" },
            "sender_chat": { "id": -1001, "type": "supergroup", "title": "Test" },
            "text": "@announcements here"
        }));

        let event = to_moderation_event(&msg);

        assert!(event.anonymous_admin);
        assert_eq!(event.sender_id, Some(1087968824));
    }

    #[test]
    fn test_linked_channel_post_is_not_anonymous_admin() {
        let msg = parse(json!({
            "message_id": 45,
            "date": 1700000000,
            "chat": { "id": -1001, "type": "supergroup", "title": "Test" },
            "from": { "id": 777000, "is_bot": false, "first_name": "Telegram" },
            "sender_chat": { "id": -1002, "type": "channel", "title": "News" },
            "text": "news"
        }));

        let event = to_moderation_event(&msg);

        assert!(!event.anonymous_admin);
    }

    #[test]
    fn test_document_in_media_group() {
        let msg = parse(json!({
            "message_id": 43,
            "date": 1700000000,
            "chat": { "id": -1001, "type": "supergroup", "title": "Test" },
            "from": { "id": 7, "is_bot": false, "first_name": "Ann" },
            "media_group_id": "13579",
            "caption": "free game",
            "document": {
                "file_id": "abc",
                "file_unique_id": "def",
                "file_name": "Game.apk",
                "file_size": 1024
            }
        }));

        let event = to_moderation_event(&msg);

        assert_eq!(event.content_text(), "free game");
        assert_eq!(event.file_name.as_deref(), Some("Game.apk"));
        assert_eq!(event.media_group_id.as_deref(), Some("13579"));
        assert!(event.links.is_empty());
    }

    #[test]
    fn test_private_chat() {
        let msg = parse(json!({
            "message_id": 1,
            "date": 1700000000,
            "chat": { "id": 7, "type": "private", "first_name": "Ann" },
            "from": { "id": 7, "is_bot": false, "first_name": "Ann" },
            "text": "hello"
        }));

        let event = to_moderation_event(&msg);

        assert_eq!(event.chat_kind, ChatKind::Private);
    }
}
