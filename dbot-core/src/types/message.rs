//! Message and entity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{chat::Chat, user::User};

/// Type of a [`MessageEntity`]. Types this crate does not know deserialize to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageEntityKind {
    Mention,
    Hashtag,
    Cashtag,
    BotCommand,
    Url,
    Email,
    PhoneNumber,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Spoiler,
    Code,
    Pre,
    TextLink,
    TextMention,
    CustomEmoji,
    #[serde(other)]
    Unknown,
}

/// Special entity inside a message text. `offset` and `length` count UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: MessageEntityKind,
    pub offset: usize,
    pub length: usize,
}

impl MessageEntity {
    pub fn new(kind: MessageEntityKind, offset: usize, length: usize) -> Self {
        Self { kind, offset, length }
    }
}

/// A single Telegram message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default, with = "chrono::serde::ts_seconds")]
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<MessageEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caption_entities: Vec<MessageEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrate_to_chat_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrate_from_chat_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message: Option<Box<Message>>,
}

impl Message {
    /// Text message from `from` in `chat`; no entities.
    pub fn text(message_id: i64, chat: Chat, from: Option<User>, text: impl Into<String>) -> Self {
        Self {
            message_id,
            from,
            chat,
            date: Utc::now(),
            text: Some(text.into()),
            entities: Vec::new(),
            caption: None,
            caption_entities: Vec::new(),
            migrate_to_chat_id: None,
            migrate_from_chat_id: None,
            reply_to_message: None,
        }
    }

    /// Builder-style entity append.
    pub fn with_entity(mut self, entity: MessageEntity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Text covered by `entity`, sliced by UTF-16 offsets. `None` if there is no text or the
    /// entity points outside it.
    pub fn parse_entity(&self, entity: &MessageEntity) -> Option<String> {
        let text = self.text.as_deref()?;
        utf16_slice(text, entity.offset, entity.length)
    }

    /// First entity if it is a bot command starting at offset 0.
    pub fn leading_command_entity(&self) -> Option<&MessageEntity> {
        self.entities
            .first()
            .filter(|e| e.kind == MessageEntityKind::BotCommand && e.offset == 0)
    }

    /// True for service messages announcing a group ↔ supergroup migration.
    pub fn is_migration(&self) -> bool {
        self.migrate_to_chat_id.is_some() || self.migrate_from_chat_id.is_some()
    }
}

fn utf16_slice(text: &str, offset: usize, length: usize) -> Option<String> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let end = offset.checked_add(length)?;
    if end > units.len() {
        return None;
    }
    String::from_utf16(&units[offset..end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatType;

    #[test]
    fn test_parse_entity_ascii() {
        let msg = Message::text(1, Chat::new(1, ChatType::Private), None, "/start hello")
            .with_entity(MessageEntity::new(MessageEntityKind::BotCommand, 0, 6));
        let entity = msg.leading_command_entity().unwrap();
        assert_eq!(msg.parse_entity(entity).as_deref(), Some("/start"));
    }

    #[test]
    fn test_parse_entity_counts_utf16_units() {
        // The emoji takes two UTF-16 units.
        let msg = Message::text(1, Chat::new(1, ChatType::Private), None, "😀 /go");
        let entity = MessageEntity::new(MessageEntityKind::BotCommand, 3, 3);
        assert_eq!(msg.parse_entity(&entity).as_deref(), Some("/go"));
        assert!(msg.parse_entity(&MessageEntity::new(MessageEntityKind::Bold, 4, 10)).is_none());
    }

    #[test]
    fn test_leading_command_entity_requires_offset_zero() {
        let msg = Message::text(1, Chat::new(1, ChatType::Private), None, "hi /start")
            .with_entity(MessageEntity::new(MessageEntityKind::BotCommand, 3, 6));
        assert!(msg.leading_command_entity().is_none());
    }

    #[test]
    fn test_unknown_entity_kind_deserializes() {
        let entity: MessageEntity =
            serde_json::from_str(r#"{"type":"blockquote","offset":0,"length":3}"#).unwrap();
        assert_eq!(entity.kind, MessageEntityKind::Unknown);
    }
}
