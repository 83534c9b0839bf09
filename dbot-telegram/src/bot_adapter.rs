//! Wraps teloxide::Bot and implements [`dbot_core::Bot`]. Tests substitute another Bot impl.

use async_trait::async_trait;
use dbot_core::{Bot as CoreBot, Chat, DbotError, Message, Result, User};
use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, ChatId, MessageId, ReplyParameters};

use crate::adapters::to_core_user;

/// Thin wrapper around teloxide::Bot that implements dbot-core's Bot trait.
#[derive(Clone)]
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }

    /// The underlying teloxide::Bot, for API calls the trait does not cover.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }
}

fn bot_error(e: teloxide::RequestError) -> DbotError {
    DbotError::Bot(e.to_string())
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn get_me(&self) -> Result<User> {
        let me = self.bot.get_me().await.map_err(bot_error)?;
        Ok(to_core_user(&me.user))
    }

    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat.id), text.to_string())
            .await
            .map_err(bot_error)?;
        Ok(())
    }

    async fn reply_to(&self, message: &Message, text: &str) -> Result<()> {
        let id = i32::try_from(message.message_id)
            .map_err(|_| DbotError::Bot(format!("message_id out of range: {}", message.message_id)))?;
        self.bot
            .send_message(ChatId(message.chat.id), text.to_string())
            .reply_parameters(ReplyParameters::new(MessageId(id)))
            .await
            .map_err(bot_error)?;
        Ok(())
    }

    async fn answer_callback_query(&self, callback_query_id: &str, text: Option<&str>) -> Result<()> {
        let request = self.bot.answer_callback_query(CallbackQueryId(callback_query_id.to_string()));
        let request = match text {
            Some(text) => request.text(text.to_string()),
            None => request,
        };
        request.await.map_err(bot_error)?;
        Ok(())
    }
}
