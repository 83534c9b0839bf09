//! # dbot-core
//!
//! Core types and traits for dbot: the Bot API data model ([`Update`], [`Message`], ...),
//! the [`Bot`] trait, errors and tracing initialization. Transport-agnostic; used by
//! dbot-dispatch and dbot-telegram.

pub mod bot;
pub mod error;
pub mod logger;
pub mod types;

pub use bot::Bot;
pub use error::{DbotError, Result};
pub use logger::init_tracing;
pub use types::{
    CallbackQuery, Chat, ChatMember, ChatMemberStatus, ChatMemberUpdated, ChatType, InlineQuery,
    Message, MessageEntity, MessageEntityKind, Poll, PollAnswer, PollOption, Update, UpdateKind,
    User,
};
