//! Message filters for [`MessageHandler`](crate::handlers::MessageHandler),
//! [`CommandHandler`](crate::handlers::CommandHandler) and
//! [`PrefixHandler`](crate::handlers::PrefixHandler).
//!
//! A filter either rejects an update (`None`) or accepts it, possibly with regex evidence
//! (`Some(matches)`). Combine with `&`, `|` and `!`:
//!
//! ```
//! use dbot_dispatch::Filter;
//! let plain_text = Filter::Text & !Filter::Command;
//! ```

use std::ops::{BitAnd, BitOr, Not};

use dbot_core::{ChatType, Message, Update, UpdateKind};
use regex::Regex;

use crate::regex_match::{search, RegexMatch};

/// Which message-like update kinds an [`Filter::UpdateType`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTypes {
    Message,
    EditedMessage,
    ChannelPost,
    EditedChannelPost,
    /// `Message` or `EditedMessage`.
    Messages,
    /// `ChannelPost` or `EditedChannelPost`.
    ChannelPosts,
    /// `EditedMessage` or `EditedChannelPost`.
    Edited,
}

impl UpdateTypes {
    fn accepts(self, kind: &UpdateKind) -> bool {
        use UpdateKind as K;
        match self {
            Self::Message => matches!(kind, K::Message(_)),
            Self::EditedMessage => matches!(kind, K::EditedMessage(_)),
            Self::ChannelPost => matches!(kind, K::ChannelPost(_)),
            Self::EditedChannelPost => matches!(kind, K::EditedChannelPost(_)),
            Self::Messages => matches!(kind, K::Message(_) | K::EditedMessage(_)),
            Self::ChannelPosts => matches!(kind, K::ChannelPost(_) | K::EditedChannelPost(_)),
            Self::Edited => matches!(kind, K::EditedMessage(_) | K::EditedChannelPost(_)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Filter {
    /// Any message-like update.
    All,
    /// Message has text.
    Text,
    /// Text starts with a bot command entity.
    Command,
    /// Message has a caption.
    Caption,
    /// Regex searched anywhere in the text; the match becomes `context.matches`.
    Regex(Regex),
    ChatType(Vec<ChatType>),
    /// Sender id is in the list.
    User(Vec<i64>),
    /// Chat id is in the list.
    Chat(Vec<i64>),
    UpdateType(UpdateTypes),
    /// Group ↔ supergroup migration service message.
    Migrate,
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    /// Compiles `pattern` into a [`Filter::Regex`].
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Regex)
    }

    /// Evaluates the filter against an update. Only the four message-like kinds can pass;
    /// this never mutates the update.
    pub fn check(&self, update: &Update) -> Option<Vec<RegexMatch>> {
        let message = message_like(update)?;
        self.check_message(update, message)
    }

    fn check_message(&self, update: &Update, message: &Message) -> Option<Vec<RegexMatch>> {
        let pass = |ok: bool| ok.then(Vec::new);
        match self {
            Self::All => pass(true),
            Self::Text => pass(message.text.is_some()),
            Self::Command => pass(message.leading_command_entity().is_some()),
            Self::Caption => pass(message.caption.is_some()),
            Self::Regex(re) => message
                .text
                .as_deref()
                .and_then(|text| search(re, text))
                .map(|m| vec![m]),
            Self::ChatType(types) => pass(types.contains(&message.chat.chat_type)),
            Self::User(ids) => pass(message.from.as_ref().is_some_and(|u| ids.contains(&u.id))),
            Self::Chat(ids) => pass(ids.contains(&message.chat.id)),
            Self::UpdateType(types) => pass(types.accepts(&update.kind)),
            Self::Migrate => pass(message.is_migration()),
            Self::And(a, b) => {
                let mut left = a.check_message(update, message)?;
                let right = b.check_message(update, message)?;
                left.extend(right);
                Some(left)
            }
            Self::Or(a, b) => a
                .check_message(update, message)
                .or_else(|| b.check_message(update, message)),
            Self::Not(inner) => pass(inner.check_message(update, message).is_none()),
        }
    }
}

fn message_like(update: &Update) -> Option<&Message> {
    match &update.kind {
        UpdateKind::Message(m)
        | UpdateKind::EditedMessage(m)
        | UpdateKind::ChannelPost(m)
        | UpdateKind::EditedChannelPost(m) => Some(m),
        _ => None,
    }
}

impl BitAnd for Filter {
    type Output = Filter;

    fn bitand(self, rhs: Self) -> Self::Output {
        Filter::And(Box::new(self), Box::new(rhs))
    }
}

impl BitOr for Filter {
    type Output = Filter;

    fn bitor(self, rhs: Self) -> Self::Output {
        Filter::Or(Box::new(self), Box::new(rhs))
    }
}

impl Not for Filter {
    type Output = Filter;

    fn not(self) -> Self::Output {
        Filter::Not(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbot_core::{Chat, MessageEntity, MessageEntityKind, User};

    fn text_update(kind: fn(Message) -> UpdateKind, text: &str) -> Update {
        let mut message = Message::text(
            1,
            Chat::new(10, ChatType::Group),
            Some(User::new(5, "Ann")),
            text,
        );
        if text.starts_with('/') {
            let len = text.split_whitespace().next().map_or(0, |t| t.encode_utf16().count());
            message = message.with_entity(MessageEntity::new(MessageEntityKind::BotCommand, 0, len));
        }
        Update::new(1, kind(message))
    }

    #[test]
    fn test_text_and_not_command() {
        let filter = Filter::Text & !Filter::Command;
        assert!(filter.check(&text_update(UpdateKind::Message, "hello")).is_some());
        assert!(filter.check(&text_update(UpdateKind::Message, "/start")).is_none());
    }

    #[test]
    fn test_regex_filter_collects_matches_through_and() {
        let filter = Filter::regex(r"(\d+)").unwrap() & Filter::regex(r"[a-z]+").unwrap();
        let matches = filter.check(&text_update(UpdateKind::Message, "abc 123")).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].get(1), Some("123"));
        assert_eq!(matches[1].as_str(), "abc");
    }

    #[test]
    fn test_or_keeps_first_passing_side() {
        let filter = Filter::regex("zzz").unwrap() | Filter::regex("a+").unwrap();
        let matches = filter.check(&text_update(UpdateKind::Message, "baaa")).unwrap();
        assert_eq!(matches[0].as_str(), "aaa");
    }

    #[test]
    fn test_update_type_messages_excludes_channel_posts() {
        let filter = Filter::UpdateType(UpdateTypes::Messages);
        assert!(filter.check(&text_update(UpdateKind::EditedMessage, "x")).is_some());
        assert!(filter.check(&text_update(UpdateKind::ChannelPost, "x")).is_none());
    }

    #[test]
    fn test_user_and_chat_filters() {
        let update = text_update(UpdateKind::Message, "x");
        assert!(Filter::User(vec![5]).check(&update).is_some());
        assert!(Filter::User(vec![6]).check(&update).is_none());
        assert!(Filter::Chat(vec![10]).check(&update).is_some());
        assert!(Filter::ChatType(vec![ChatType::Private]).check(&update).is_none());
    }
}
