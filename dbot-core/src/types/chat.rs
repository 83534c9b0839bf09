//! Chat identity type.

use serde::{Deserialize, Serialize};

/// Kind of chat as reported in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    #[default]
    Private,
    Group,
    Supergroup,
    Channel,
    /// Only appears as `chat_type` of inline queries sent from the bot's own chat.
    Sender,
}

/// Chat (private, group, supergroup or channel) identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub chat_type: ChatType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Chat {
    pub fn new(id: i64, chat_type: ChatType) -> Self {
        Self {
            id,
            chat_type,
            title: None,
            username: None,
        }
    }
}
