//! Bot abstraction for talking back to the Bot API.
//!
//! [`Bot`] is transport-agnostic; `dbot-telegram` implements it via teloxide and tests use
//! in-memory mocks.

use crate::error::Result;
use crate::types::{Chat, Message, User};
use async_trait::async_trait;

/// Operations handlers commonly need. Implementations map to a transport (e.g. Telegram).
#[async_trait]
pub trait Bot: Send + Sync {
    /// Returns the bot's own user; used to learn the username for command matching.
    async fn get_me(&self) -> Result<User>;
    /// Sends a text message to the given chat.
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()>;
    /// Sends a reply to the given message (same chat).
    async fn reply_to(&self, message: &Message, text: &str) -> Result<()>;
    /// Acknowledges a callback query, optionally showing `text` to the user.
    async fn answer_callback_query(&self, callback_query_id: &str, text: Option<&str>) -> Result<()>;
}
