//! Inline query.

use serde::{Deserialize, Serialize};

use super::{chat::ChatType, user::User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub offset: String,
    /// Type of the chat the query was sent from; absent for secret chats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_type: Option<ChatType>,
}
