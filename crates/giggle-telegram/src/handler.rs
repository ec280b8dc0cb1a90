// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update filtering and conversion into channel-agnostic messages.

use giggle_core::{ConversationKey, InboundMessage, SenderProfile};
use teloxide::types::{ChatKind, Message, User};

/// Checks whether the sender may talk to the bot.
///
/// An empty `allowed_users` list admits everyone. Otherwise the sender's
/// numeric id or username (with or without `@`, case-insensitive) must be
/// listed. Messages without a sender are never authorized.
pub fn is_authorized(msg: &Message, allowed_users: &[String]) -> bool {
    let Some(user) = msg.from.as_ref() else {
        return false;
    };
    if allowed_users.is_empty() {
        return true;
    }

    let user_id = user.id.0.to_string();
    allowed_users.iter().any(|allowed| {
        *allowed == user_id
            || user.username.as_deref().is_some_and(|username| {
                username.eq_ignore_ascii_case(allowed.strip_prefix('@').unwrap_or(allowed))
            })
    })
}

/// Checks whether the message is from a private chat.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

pub fn sender_profile(user: &User) -> SenderProfile {
    SenderProfile {
        id: user.id.0.to_string(),
        username: user.username.clone(),
        full_name: user.full_name(),
    }
}

/// Converts a text message into an [`InboundMessage`] keyed by chat id.
///
/// Returns `None` for non-text messages and messages without a sender.
pub fn to_inbound_message(msg: &Message) -> Option<InboundMessage> {
    let text = msg.text()?;
    let sender = msg.from.as_ref().map(sender_profile)?;

    Some(InboundMessage {
        id: msg.id.0.to_string(),
        channel: "telegram".to_string(),
        conversation: ConversationKey(msg.chat.id.0.to_string()),
        sender,
        text: text.to_string(),
        timestamp: msg.date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn private_message(user_id: u64, username: Option<&str>, text: &str) -> Message {
        let mut from = json!({
            "id": user_id,
            "is_bot": false,
            "first_name": "Ann",
            "last_name": "Lee",
        });
        if let Some(username) = username {
            from["username"] = json!(username);
        }
        serde_json::from_value(json!({
            "message_id": 17,
            "date": 1_700_000_000i64,
            "chat": {"id": user_id as i64, "type": "private", "first_name": "Ann"},
            "from": from,
            "text": text,
        }))
        .expect("failed to deserialize mock message")
    }

    fn group_message(text: &str) -> Message {
        serde_json::from_value(json!({
            "message_id": 3,
            "date": 1_700_000_000i64,
            "chat": {"id": -100123i64, "type": "supergroup", "title": "Jokes"},
            "from": {"id": 5, "is_bot": false, "first_name": "Bo"},
            "text": text,
        }))
        .expect("failed to deserialize mock group message")
    }

    fn location_message() -> Message {
        serde_json::from_value(json!({
            "message_id": 4,
            "date": 1_700_000_000i64,
            "chat": {"id": 9i64, "type": "private", "first_name": "Ann"},
            "from": {"id": 9, "is_bot": false, "first_name": "Ann"},
            "location": {"latitude": 1.0, "longitude": 2.0},
        }))
        .expect("failed to deserialize mock location message")
    }

    #[test]
    fn empty_allow_list_admits_everyone() {
        let msg = private_message(12345, None, "hello");
        assert!(is_authorized(&msg, &[]));
    }

    #[test]
    fn allow_list_matches_id_or_username() {
        let msg = private_message(12345, Some("TestUser"), "hello");
        assert!(is_authorized(&msg, &["12345".into()]));
        assert!(is_authorized(&msg, &["@testuser".into()]));
        assert!(!is_authorized(&msg, &["99999".into(), "other".into()]));
    }

    #[test]
    fn chat_kind_detection() {
        assert!(is_dm(&private_message(1, None, "x")));
        assert!(!is_dm(&group_message("x")));
    }

    #[test]
    fn text_message_maps_to_inbound() {
        let msg = private_message(12345, Some("ann"), "tell me a joke");
        let inbound = to_inbound_message(&msg).unwrap();

        assert_eq!(inbound.id, "17");
        assert_eq!(inbound.channel, "telegram");
        assert_eq!(inbound.conversation, ConversationKey::from("12345"));
        assert_eq!(inbound.sender.id, "12345");
        assert_eq!(inbound.sender.username.as_deref(), Some("ann"));
        assert_eq!(inbound.sender.full_name, "Ann Lee");
        assert_eq!(inbound.text, "tell me a joke");
        assert_eq!(inbound.timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn group_conversation_is_keyed_by_chat() {
        let inbound = to_inbound_message(&group_message("hi")).unwrap();
        assert_eq!(inbound.conversation.as_str(), "-100123");
        assert_eq!(inbound.sender.id, "5");
    }

    #[test]
    fn non_text_message_is_skipped() {
        assert!(to_inbound_message(&location_message()).is_none());
    }
}
