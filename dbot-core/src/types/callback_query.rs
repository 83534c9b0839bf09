//! Callback query (inline keyboard button press).

use serde::{Deserialize, Serialize};

use super::{message::Message, user::User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<String>,
    #[serde(default)]
    pub chat_instance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_short_name: Option<String>,
}

impl CallbackQuery {
    pub fn new(id: impl Into<String>, from: User, data: Option<String>) -> Self {
        Self {
            id: id.into(),
            from,
            message: None,
            inline_message_id: None,
            chat_instance: String::new(),
            data,
            game_short_name: None,
        }
    }
}
