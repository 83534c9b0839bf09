//! Incoming update: one event from the Bot API with exactly one populated kind.

use serde::{Deserialize, Serialize};

use super::{
    callback_query::CallbackQuery,
    chat::Chat,
    chat_member::ChatMemberUpdated,
    inline_query::InlineQuery,
    message::Message,
    poll::{Poll, PollAnswer},
    user::User,
};

/// The single payload an [`Update`] carries.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateKind {
    Message(Message),
    EditedMessage(Message),
    ChannelPost(Message),
    EditedChannelPost(Message),
    InlineQuery(InlineQuery),
    CallbackQuery(CallbackQuery),
    Poll(Poll),
    PollAnswer(PollAnswer),
    MyChatMember(ChatMemberUpdated),
    ChatMember(ChatMemberUpdated),
    /// A kind this crate does not model.
    Unknown,
}

/// Immutable incoming event. (De)serializes to the Bot API JSON shape
/// `{"update_id": 1, "message": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawUpdate", into = "RawUpdate")]
pub struct Update {
    pub update_id: i64,
    pub kind: UpdateKind,
}

impl Update {
    pub fn new(update_id: i64, kind: UpdateKind) -> Self {
        Self { update_id, kind }
    }

    pub fn message(&self) -> Option<&Message> {
        match &self.kind {
            UpdateKind::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn edited_message(&self) -> Option<&Message> {
        match &self.kind {
            UpdateKind::EditedMessage(m) => Some(m),
            _ => None,
        }
    }

    pub fn callback_query(&self) -> Option<&CallbackQuery> {
        match &self.kind {
            UpdateKind::CallbackQuery(q) => Some(q),
            _ => None,
        }
    }

    pub fn inline_query(&self) -> Option<&InlineQuery> {
        match &self.kind {
            UpdateKind::InlineQuery(q) => Some(q),
            _ => None,
        }
    }

    pub fn poll(&self) -> Option<&Poll> {
        match &self.kind {
            UpdateKind::Poll(p) => Some(p),
            _ => None,
        }
    }

    pub fn poll_answer(&self) -> Option<&PollAnswer> {
        match &self.kind {
            UpdateKind::PollAnswer(a) => Some(a),
            _ => None,
        }
    }

    pub fn my_chat_member(&self) -> Option<&ChatMemberUpdated> {
        match &self.kind {
            UpdateKind::MyChatMember(c) => Some(c),
            _ => None,
        }
    }

    pub fn chat_member(&self) -> Option<&ChatMemberUpdated> {
        match &self.kind {
            UpdateKind::ChatMember(c) => Some(c),
            _ => None,
        }
    }

    /// The message of any message-like kind, or the message a callback query is attached to.
    pub fn effective_message(&self) -> Option<&Message> {
        match &self.kind {
            UpdateKind::Message(m)
            | UpdateKind::EditedMessage(m)
            | UpdateKind::ChannelPost(m)
            | UpdateKind::EditedChannelPost(m) => Some(m),
            UpdateKind::CallbackQuery(q) => q.message.as_ref(),
            _ => None,
        }
    }

    pub fn effective_chat(&self) -> Option<&Chat> {
        match &self.kind {
            UpdateKind::MyChatMember(c) | UpdateKind::ChatMember(c) => Some(&c.chat),
            _ => self.effective_message().map(|m| &m.chat),
        }
    }

    pub fn effective_user(&self) -> Option<&User> {
        match &self.kind {
            UpdateKind::Message(m) | UpdateKind::EditedMessage(m) => m.from.as_ref(),
            UpdateKind::ChannelPost(_) | UpdateKind::EditedChannelPost(_) => None,
            UpdateKind::InlineQuery(q) => Some(&q.from),
            UpdateKind::CallbackQuery(q) => Some(&q.from),
            UpdateKind::PollAnswer(a) => a.user.as_ref(),
            UpdateKind::MyChatMember(c) | UpdateKind::ChatMember(c) => Some(&c.from),
            UpdateKind::Poll(_) | UpdateKind::Unknown => None,
        }
    }
}

/// Wire shape: one optional field per kind.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawUpdate {
    update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    edited_message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    channel_post: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    edited_channel_post: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_query: Option<InlineQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    callback_query: Option<CallbackQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    poll: Option<Poll>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    poll_answer: Option<PollAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    my_chat_member: Option<ChatMemberUpdated>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    chat_member: Option<ChatMemberUpdated>,
}

impl From<RawUpdate> for Update {
    fn from(raw: RawUpdate) -> Self {
        let kind = if let Some(m) = raw.message {
            UpdateKind::Message(m)
        } else if let Some(m) = raw.edited_message {
            UpdateKind::EditedMessage(m)
        } else if let Some(m) = raw.channel_post {
            UpdateKind::ChannelPost(m)
        } else if let Some(m) = raw.edited_channel_post {
            UpdateKind::EditedChannelPost(m)
        } else if let Some(q) = raw.inline_query {
            UpdateKind::InlineQuery(q)
        } else if let Some(q) = raw.callback_query {
            UpdateKind::CallbackQuery(q)
        } else if let Some(p) = raw.poll {
            UpdateKind::Poll(p)
        } else if let Some(a) = raw.poll_answer {
            UpdateKind::PollAnswer(a)
        } else if let Some(c) = raw.my_chat_member {
            UpdateKind::MyChatMember(c)
        } else if let Some(c) = raw.chat_member {
            UpdateKind::ChatMember(c)
        } else {
            UpdateKind::Unknown
        };
        Self {
            update_id: raw.update_id,
            kind,
        }
    }
}

impl From<Update> for RawUpdate {
    fn from(update: Update) -> Self {
        let mut raw = RawUpdate {
            update_id: update.update_id,
            ..Default::default()
        };
        match update.kind {
            UpdateKind::Message(m) => raw.message = Some(m),
            UpdateKind::EditedMessage(m) => raw.edited_message = Some(m),
            UpdateKind::ChannelPost(m) => raw.channel_post = Some(m),
            UpdateKind::EditedChannelPost(m) => raw.edited_channel_post = Some(m),
            UpdateKind::InlineQuery(q) => raw.inline_query = Some(q),
            UpdateKind::CallbackQuery(q) => raw.callback_query = Some(q),
            UpdateKind::Poll(p) => raw.poll = Some(p),
            UpdateKind::PollAnswer(a) => raw.poll_answer = Some(a),
            UpdateKind::MyChatMember(c) => raw.my_chat_member = Some(c),
            UpdateKind::ChatMember(c) => raw.chat_member = Some(c),
            UpdateKind::Unknown => {}
        }
        raw
    }
}
