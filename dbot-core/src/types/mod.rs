//! Core types: the subset of the Bot API data model the dispatcher routes on.
//!
//! One file per main type; all types (de)serialize to the Bot API JSON field names.

mod callback_query;
mod chat;
mod chat_member;
mod inline_query;
mod message;
mod poll;
mod update;
mod user;

pub use callback_query::CallbackQuery;
pub use chat::{Chat, ChatType};
pub use chat_member::{ChatMember, ChatMemberStatus, ChatMemberUpdated};
pub use inline_query::InlineQuery;
pub use message::{Message, MessageEntity, MessageEntityKind};
pub use poll::{Poll, PollAnswer, PollOption};
pub use update::{Update, UpdateKind};
pub use user::User;
