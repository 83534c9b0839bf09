//! Chat member status change handler.

use std::collections::HashSet;

use dbot_core::Update;

use super::CheckResult;

/// Which chat member update kinds a [`ChatMemberHandler`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatMemberMode {
    /// Only `my_chat_member` (the bot's own status changed).
    #[default]
    My,
    /// Only `chat_member` (another member's status changed).
    Chat,
    /// Either kind.
    Any,
}

#[derive(Debug, Clone, Default)]
pub struct ChatMemberHandler {
    mode: ChatMemberMode,
    chat_ids: Option<HashSet<i64>>,
}

impl ChatMemberHandler {
    pub fn new(mode: ChatMemberMode) -> Self {
        Self {
            mode,
            chat_ids: None,
        }
    }

    /// Restricts matching to updates from these chats.
    pub fn with_chat_ids(mut self, chat_ids: impl IntoIterator<Item = i64>) -> Self {
        self.chat_ids = Some(chat_ids.into_iter().collect());
        self
    }

    pub fn mode(&self) -> ChatMemberMode {
        self.mode
    }

    pub(crate) fn check(&self, update: &Update) -> Option<CheckResult> {
        let change = match self.mode {
            ChatMemberMode::My => update.my_chat_member(),
            ChatMemberMode::Chat => update.chat_member(),
            ChatMemberMode::Any => update.my_chat_member().or_else(|| update.chat_member()),
        }?;
        if let Some(ids) = &self.chat_ids {
            if !ids.contains(&change.chat.id) {
                return None;
            }
        }
        Some(CheckResult::Matched)
    }
}
